//! Settings service with validation, permission checks and cache refresh

use serde_json::{Map, Value};
use std::sync::Arc;

use super::cache::SettingsCache;
use super::types::FrozenSettingsRegistry;
use crate::prelude::*;
use taskmart_types::rbac::{has_permission, Principal};
use taskmart_types::settings_adapter::SettingsAdapter;
use taskmart_types::settings_tree::{merge, SettingsTree};

/// Settings service - main interface for reading and changing settings
pub struct SettingsService {
	registry: Arc<FrozenSettingsRegistry>,
	cache: Arc<SettingsCache>,
	store: Arc<dyn SettingsAdapter>,
}

impl SettingsService {
	pub fn new(
		registry: Arc<FrozenSettingsRegistry>,
		cache: Arc<SettingsCache>,
		store: Arc<dyn SettingsAdapter>,
	) -> Self {
		Self { registry, cache, store }
	}

	pub fn registry(&self) -> &Arc<FrozenSettingsRegistry> {
		&self.registry
	}

	pub fn cache(&self) -> &Arc<SettingsCache> {
		&self.cache
	}

	/// Effective tree (defaults + stored values)
	pub async fn list(&self) -> ClResult<Arc<SettingsTree>> {
		self.cache.snapshot().await
	}

	/// Effective subtree of one category
	pub async fn get_category(&self, category: &str) -> ClResult<Value> {
		if self.registry.get(category).is_none() {
			return Err(Error::NotFound);
		}
		let tree = self.cache.snapshot().await?;
		Ok(tree.category(category).cloned().unwrap_or_else(|| Value::Object(Map::new())))
	}

	/// Deep-merge `patch` into a category and return its new effective value
	pub async fn update_category(
		&self,
		principal: &Principal,
		category: &str,
		patch: &Value,
	) -> ClResult<Value> {
		let def = self.registry.get(category).ok_or(Error::NotFound)?;

		if !has_permission(Some(principal), &def.permission) {
			warn!(
				subject = %principal.user_id,
				category = category,
				required = %def.permission,
				"Settings update denied"
			);
			return Err(Error::PermissionDenied);
		}
		if !patch.is_object() {
			return Err(Error::ValidationError(format!(
				"Settings for '{}' must be a JSON object",
				category
			)));
		}

		let mut stored =
			self.store.read_category(category).await?.unwrap_or_else(|| Value::Object(Map::new()));
		merge(&mut stored, patch);

		let mut effective = def.defaults.clone();
		merge(&mut effective, &stored);
		def.validate(&effective)?;

		self.store.write_category(category, &stored).await?;
		let tree = self.cache.refresh().await?;
		info!(subject = %principal.user_id, category = category, "Settings category updated");

		Ok(tree.category(category).cloned().unwrap_or(effective))
	}

	/// Drop stored overrides of a category, restoring its defaults
	pub async fn reset_category(&self, principal: &Principal, category: &str) -> ClResult<Value> {
		let def = self.registry.get(category).ok_or(Error::NotFound)?;
		if !has_permission(Some(principal), &def.permission) {
			return Err(Error::PermissionDenied);
		}

		self.store.write_category(category, &Value::Object(Map::new())).await?;
		self.cache.refresh().await?;
		info!(subject = %principal.user_id, category = category, "Settings category reset");
		Ok(def.defaults.clone())
	}
}

impl std::fmt::Debug for SettingsService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingsService").field("categories", &self.registry.len()).finish()
	}
}


// vim: ts=4
