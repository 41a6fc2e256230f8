//! Settings category definitions
//!
//! Every top-level category of the settings tree is declared once at startup
//! with its default subtree, the permission needed to change it and an
//! optional validator. The registry is frozen before the app is built.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::prelude::*;
use crate::rbac::catalog::SETTINGS_MANAGE;
use taskmart_types::settings_tree::SettingsTree;

/// Validates a whole category subtree (stored values merged over defaults)
pub type CategoryValidator = Box<dyn Fn(&Value) -> ClResult<()> + Send + Sync>;

pub struct CategoryDefinition {
	/// Top-level key (e.g. "features")
	pub name: String,

	/// Human-readable description
	pub description: String,

	/// Default subtree, always an object
	pub defaults: Value,

	/// Permission key required to modify the category
	pub permission: Box<str>,

	pub validator: Option<CategoryValidator>,
}

impl Debug for CategoryDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CategoryDefinition")
			.field("name", &self.name)
			.field("description", &self.description)
			.field("defaults", &self.defaults)
			.field("permission", &self.permission)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl CategoryDefinition {
	pub fn builder(name: impl Into<String>) -> CategoryDefinitionBuilder {
		CategoryDefinitionBuilder::new(name)
	}

	pub fn validate(&self, value: &Value) -> ClResult<()> {
		match &self.validator {
			Some(validator) => validator(value),
			None => Ok(()),
		}
	}
}

/// Builder for CategoryDefinition with fluent API
pub struct CategoryDefinitionBuilder {
	name: String,
	description: Option<String>,
	defaults: Value,
	permission: Box<str>,
	validator: Option<CategoryValidator>,
}

impl CategoryDefinitionBuilder {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			description: None,
			defaults: Value::Object(Map::new()),
			permission: SETTINGS_MANAGE.into(),
			validator: None,
		}
	}

	/// Set the description (required)
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn defaults(mut self, defaults: Value) -> Self {
		self.defaults = defaults;
		self
	}

	/// Permission key needed to write the category (defaults to `settings.manage`)
	pub fn permission(mut self, permission: &str) -> Self {
		self.permission = permission.into();
		self
	}

	pub fn validator<F>(mut self, f: F) -> Self
	where
		F: Fn(&Value) -> ClResult<()> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(f));
		self
	}

	pub fn build(self) -> ClResult<CategoryDefinition> {
		let description = self
			.description
			.ok_or_else(|| Error::ConfigError("Category description is required".into()))?;

		if self.name.is_empty() || self.name.contains('.') {
			return Err(Error::ConfigError(format!("Invalid category name '{}'", self.name)));
		}
		if !self.defaults.is_object() {
			return Err(Error::ConfigError(format!(
				"Defaults of category '{}' must be an object",
				self.name
			)));
		}

		let def = CategoryDefinition {
			name: self.name,
			description,
			defaults: self.defaults,
			permission: self.permission,
			validator: self.validator,
		};
		def.validate(&def.defaults)?;
		Ok(def)
	}
}

/// Mutable registry used during app initialization
#[derive(Debug, Default)]
pub struct SettingsRegistry {
	definitions: BTreeMap<String, CategoryDefinition>,
}

impl SettingsRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, def: CategoryDefinition) -> ClResult<()> {
		if self.definitions.contains_key(&def.name) {
			return Err(Error::ConfigError(format!(
				"Settings category '{}' is already registered",
				def.name
			)));
		}

		debug!("Registering settings category: {}", def.name);
		self.definitions.insert(def.name.clone(), def);
		Ok(())
	}

	pub fn freeze(self) -> FrozenSettingsRegistry {
		info!("Freezing settings registry with {} categories", self.definitions.len());
		FrozenSettingsRegistry { definitions: self.definitions }
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

/// Immutable registry stored in AppState
#[derive(Debug)]
pub struct FrozenSettingsRegistry {
	definitions: BTreeMap<String, CategoryDefinition>,
}

impl FrozenSettingsRegistry {
	pub fn get(&self, name: &str) -> Option<&CategoryDefinition> {
		self.definitions.get(name)
	}

	pub fn list(&self) -> impl Iterator<Item = &CategoryDefinition> {
		self.definitions.values()
	}

	/// Tree holding every category's defaults
	pub fn defaults_tree(&self) -> SettingsTree {
		let root = self
			.definitions
			.values()
			.map(|def| (def.name.clone(), def.defaults.clone()))
			.collect::<Map<String, Value>>();
		SettingsTree::new(root)
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_builder_requires_description() {
		let res = CategoryDefinition::builder("limits").build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_builder_rejects_dotted_name_and_scalar_defaults() {
		let res = CategoryDefinition::builder("a.b").description("x").build();
		assert!(res.is_err());

		let res = CategoryDefinition::builder("limits").description("x").defaults(json!(3)).build();
		assert!(res.is_err());
	}

	#[test]
	fn test_duplicate_registration_fails() {
		let mut registry = SettingsRegistry::new();
		let def = || CategoryDefinition::builder("limits").description("Limits").build().unwrap();
		registry.register(def()).unwrap();
		assert!(registry.register(def()).is_err());
	}

	#[test]
	fn test_defaults_tree() {
		let mut registry = SettingsRegistry::new();
		registry
			.register(
				CategoryDefinition::builder("limits")
					.description("Limits")
					.defaults(json!({ "maxTasksPerUser": 10 }))
					.build()
					.unwrap(),
			)
			.unwrap();
		let frozen = registry.freeze();

		assert_eq!(frozen.defaults_tree().int("limits.maxTasksPerUser"), Some(10));
		assert!(frozen.get("features").is_none());
	}
}

// vim: ts=4
