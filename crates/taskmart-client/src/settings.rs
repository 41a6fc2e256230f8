//! Client mirror of the settings tree
//!
//! Fed with the body of `GET /api/settings` and persisted in the same
//! `SessionStore` as the permission hint. Reads serve the last tree even
//! after `HINT_TTL`; `is_stale` tells the caller to fetch again. Like the
//! hint, the result only gates UI; the server re-checks every request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hint::{SessionStore, HINT_TTL};
use crate::prelude::*;
use taskmart_types::settings_tree::{flag_value, MissingFlag, SettingsTree};
use taskmart_types::types::ApiResponse;

const STORAGE_KEY: &str = "taskmart.settings";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedSettings {
	tree: Value,
	cached_at: Timestamp,
}

#[derive(Debug)]
pub struct ClientSettingsCache<S: SessionStore> {
	store: S,
	missing_flag: MissingFlag,
}

impl<S: SessionStore> ClientSettingsCache<S> {
	pub fn new(store: S) -> Self {
		Self::with_missing_flag(store, MissingFlag::default())
	}

	pub fn with_missing_flag(store: S, missing_flag: MissingFlag) -> Self {
		Self { store, missing_flag }
	}

	/// Store the `data` of a `GET /api/settings` response body
	pub fn update_from_response(&self, body: &str, now: Timestamp) -> ClResult<()> {
		let response: ApiResponse<Value> = serde_json::from_str(body)?;
		if !response.data.is_object() {
			return Err(Error::ValidationError("Settings response is not an object".into()));
		}
		self.update(response.data, now);
		Ok(())
	}

	pub fn update(&self, tree: Value, now: Timestamp) {
		match serde_json::to_string(&CachedSettings { tree, cached_at: now }) {
			Ok(raw) => self.store.set(STORAGE_KEY, raw),
			Err(err) => warn!("Cannot persist settings: {}", err),
		}
	}

	/// Last stored tree, regardless of age
	pub fn tree(&self) -> Option<SettingsTree> {
		self.load().map(|cached| SettingsTree::from_value(cached.tree))
	}

	/// True when nothing is stored or the stored tree is older than `HINT_TTL`
	pub fn is_stale(&self, now: Timestamp) -> bool {
		self.load().is_none_or(|cached| now.0 - cached.cached_at.0 >= HINT_TTL)
	}

	pub fn get_flag(&self, path: &str) -> bool {
		let value = self.tree().and_then(|tree| flag_value(&tree, path));
		self.missing_flag.resolve(value)
	}

	pub fn get_limit(&self, path: &str, default: i64) -> i64 {
		self.tree().and_then(|tree| tree.int(path)).unwrap_or(default)
	}

	pub fn get_number(&self, path: &str, default: f64) -> f64 {
		self.tree().and_then(|tree| tree.number(path)).unwrap_or(default)
	}

	pub fn invalidate(&self) {
		self.store.remove(STORAGE_KEY);
	}

	fn load(&self) -> Option<CachedSettings> {
		let raw = self.store.get(STORAGE_KEY)?;
		match serde_json::from_str(&raw) {
			Ok(cached) => Some(cached),
			Err(err) => {
				debug!("Dropping unreadable settings mirror: {}", err);
				None
			}
		}
	}
}


// vim: ts=4
