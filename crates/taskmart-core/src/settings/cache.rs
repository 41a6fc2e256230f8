//! Read-through snapshot of the settings tree
//!
//! The whole tree (registered defaults with stored categories merged on top)
//! is cached as one immutable snapshot for `CACHE_TTL`. Store failures are
//! returned to the caller and never read as a missing path.
//!
//! `invalidate` and `refresh` bump a generation; a fetch that started
//! before the bump returns its tree but does not replace the snapshot.

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::types::FrozenSettingsRegistry;
use crate::cache::{CacheEntry, CACHE_TTL};
use crate::prelude::*;
use taskmart_types::settings_adapter::SettingsAdapter;
use taskmart_types::settings_tree::SettingsTree;

pub use taskmart_types::settings_tree::{flag_value, MissingFlag};

/// Resolve a flag under the given missing-path policy
pub fn resolve_flag(tree: &SettingsTree, path: &str, missing: MissingFlag) -> bool {
	missing.resolve(flag_value(tree, path))
}

pub struct SettingsCache {
	store: Arc<dyn SettingsAdapter>,
	registry: Arc<FrozenSettingsRegistry>,
	missing_flag: MissingFlag,
	ttl: Duration,
	snapshot: RwLock<Option<CacheEntry<Arc<SettingsTree>>>>,
	generation: AtomicU64,
	refresher: Mutex<Option<JoinHandle<()>>>,
}

impl SettingsCache {
	pub fn new(
		store: Arc<dyn SettingsAdapter>,
		registry: Arc<FrozenSettingsRegistry>,
		missing_flag: MissingFlag,
	) -> Self {
		Self::with_ttl(store, registry, missing_flag, CACHE_TTL)
	}

	pub fn with_ttl(
		store: Arc<dyn SettingsAdapter>,
		registry: Arc<FrozenSettingsRegistry>,
		missing_flag: MissingFlag,
		ttl: Duration,
	) -> Self {
		Self {
			store,
			registry,
			missing_flag,
			ttl,
			snapshot: RwLock::new(None),
			generation: AtomicU64::new(0),
			refresher: Mutex::new(None),
		}
	}

	pub fn missing_flag(&self) -> MissingFlag {
		self.missing_flag
	}

	/// Current tree, fetched from the store when absent or stale
	pub async fn snapshot(&self) -> ClResult<Arc<SettingsTree>> {
		if let Some(tree) = self.cached() {
			return Ok(tree);
		}
		self.fetch().await
	}

	/// Drop the snapshot and fetch synchronously
	pub async fn refresh(&self) -> ClResult<Arc<SettingsTree>> {
		self.invalidate();
		self.fetch().await
	}

	pub fn invalidate(&self) {
		let mut snapshot = self.snapshot.write();
		self.generation.fetch_add(1, Ordering::SeqCst);
		*snapshot = None;
	}

	pub async fn get_flag(&self, path: &str) -> ClResult<bool> {
		let tree = self.snapshot().await?;
		Ok(resolve_flag(&tree, path, self.missing_flag))
	}

	pub async fn get_limit(&self, path: &str, default: i64) -> ClResult<i64> {
		let tree = self.snapshot().await?;
		Ok(tree.int(path).unwrap_or(default))
	}

	pub async fn get_number(&self, path: &str, default: f64) -> ClResult<f64> {
		let tree = self.snapshot().await?;
		Ok(tree.number(path).unwrap_or(default))
	}

	/// Deserialize the subtree at `path`, falling back to `default`
	pub async fn get_policy<T: DeserializeOwned>(&self, path: &str, default: T) -> ClResult<T> {
		let tree = self.snapshot().await?;
		let Some(value) = tree.lookup(path) else {
			return Ok(default);
		};
		match serde_json::from_value(value.clone()) {
			Ok(policy) => Ok(policy),
			Err(err) => {
				warn!(path = path, "Invalid settings policy, using default: {}", err);
				Ok(default)
			}
		}
	}

	/// Keep the snapshot warm in the background
	///
	/// The task only holds a weak reference and ends once the cache is dropped.
	pub fn start_auto_refresh(self: &Arc<Self>) {
		let mut refresher = self.refresher.lock();
		if refresher.is_some() {
			return;
		}

		let weak: Weak<Self> = Arc::downgrade(self);
		let tick = (self.ttl / 4).max(Duration::from_millis(10));
		*refresher = Some(tokio::spawn(async move {
			let mut interval = tokio::time::interval(tick);
			loop {
				interval.tick().await;
				let Some(cache) = weak.upgrade() else { break };
				if cache.expires_within(tick) {
					if let Err(err) = cache.fetch().await {
						warn!("Settings auto-refresh failed: {}", err);
					}
				}
			}
		}));
		info!("Settings auto-refresh started (every {:?})", tick);
	}

	pub fn stop_auto_refresh(&self) {
		if let Some(handle) = self.refresher.lock().take() {
			handle.abort();
			info!("Settings auto-refresh stopped");
		}
	}

	fn cached(&self) -> Option<Arc<SettingsTree>> {
		self.snapshot
			.read()
			.as_ref()
			.filter(|entry| entry.is_fresh(self.ttl))
			.map(|entry| entry.value.clone())
	}

	/// True when the snapshot is absent or goes stale before `window` passes
	fn expires_within(&self, window: Duration) -> bool {
		match self.snapshot.read().as_ref() {
			Some(entry) => entry.age() + window >= self.ttl,
			None => true,
		}
	}

	async fn fetch(&self) -> ClResult<Arc<SettingsTree>> {
		let generation = self.generation.load(Ordering::SeqCst);
		let stored = self.store.read_settings().await?;
		let mut tree = self.registry.defaults_tree();
		for (category, value) in &stored {
			tree.merge_category(category, value);
		}
		let tree = Arc::new(tree);

		let mut snapshot = self.snapshot.write();
		if self.generation.load(Ordering::SeqCst) == generation {
			*snapshot = Some(CacheEntry::new(tree.clone()));
			debug!("Settings snapshot loaded ({} stored categories)", stored.len());
		} else {
			debug!("Settings invalidated during read, snapshot kept");
		}
		Ok(tree)
	}
}

impl Drop for SettingsCache {
	fn drop(&mut self) {
		if let Some(handle) = self.refresher.get_mut().take() {
			handle.abort();
		}
	}
}

impl std::fmt::Debug for SettingsCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingsCache")
			.field("missing_flag", &self.missing_flag)
			.field("ttl", &self.ttl)
			.field("auto_refresh", &self.refresher.lock().is_some())
			.finish_non_exhaustive()
	}
}


// vim: ts=4
