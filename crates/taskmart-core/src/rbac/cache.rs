//! Read-through cache of role permission rows
//!
//! Entries are keyed by role id and live for `CACHE_TTL`. Admin writes call
//! `invalidate` for each affected role so the next read goes to the store.
//!
//! Every invalidation bumps a generation. A miss records the generation
//! before reading the store and only caches its rows if nothing was
//! invalidated meanwhile, so a read racing an admin write cannot put the
//! old rows back.

use lru::LruCache;
use std::collections::HashMap;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheEntry, CACHE_TTL};
use crate::prelude::*;
use taskmart_types::policy_adapter::PolicyAdapter;
use taskmart_types::rbac::RolePermission;

pub type RoleRows = Arc<[RolePermission]>;

struct Entries {
	lru: LruCache<RoleId, CacheEntry<RoleRows>>,
	/// Bumped by `invalidate_all`
	epoch: u64,
	/// Bumped by `invalidate(role)`
	generations: HashMap<RoleId, u64>,
}

impl Entries {
	fn generation(&self, role_id: RoleId) -> (u64, u64) {
		(self.epoch, self.generations.get(&role_id).copied().unwrap_or(0))
	}
}

pub struct PermissionCache {
	store: Arc<dyn PolicyAdapter>,
	ttl: Duration,
	entries: RwLock<Entries>,
}

impl PermissionCache {
	pub fn new(store: Arc<dyn PolicyAdapter>, capacity: usize) -> Self {
		Self::with_ttl(store, capacity, CACHE_TTL)
	}

	pub fn with_ttl(store: Arc<dyn PolicyAdapter>, capacity: usize, ttl: Duration) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
		let entries =
			Entries { lru: LruCache::new(capacity), epoch: 0, generations: HashMap::new() };
		Self { store, ttl, entries: RwLock::new(entries) }
	}

	/// Permission rows of a role, from cache while fresh
	pub async fn get(&self, role_id: RoleId) -> ClResult<RoleRows> {
		let generation = {
			let entries = self.entries.read();
			let cached = entries
				.lru
				.peek(&role_id)
				.filter(|entry| entry.is_fresh(self.ttl))
				.map(|entry| entry.value.clone());
			if let Some(rows) = cached {
				return Ok(rows);
			}
			entries.generation(role_id)
		};

		debug!(role_id = %role_id, "Permission cache miss");
		let rows: RoleRows = self.store.list_role_permissions(role_id).await?.into();

		let mut entries = self.entries.write();
		if entries.generation(role_id) == generation {
			entries.lru.put(role_id, CacheEntry::new(rows.clone()));
		} else {
			debug!(role_id = %role_id, "Role invalidated during read, not caching");
		}
		Ok(rows)
	}

	pub fn invalidate(&self, role_id: RoleId) {
		let mut entries = self.entries.write();
		entries.lru.pop(&role_id);
		*entries.generations.entry(role_id).or_insert(0) += 1;
	}

	pub fn invalidate_all(&self) {
		let mut entries = self.entries.write();
		entries.lru.clear();
		entries.epoch += 1;
	}
}

impl std::fmt::Debug for PermissionCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PermissionCache")
			.field("ttl", &self.ttl)
			.field("entries", &self.entries.read().lru.len())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use taskmart_types::rbac::Mode;
	use taskmart_types::testing::MemoryStore;

	async fn setup() -> (Arc<MemoryStore>, RoleId, taskmart_types::types::PermissionId) {
		let store = Arc::new(MemoryStore::new());
		let role = store.create_role("moderator", "Moderator").await.unwrap();
		let perm = store.create_permission("orders.refund", "Refund orders", "orders").await.unwrap();
		store.upsert_role_permission(role.id, perm.id, Mode::All, false).await.unwrap();
		(store, role.id, perm.id)
	}

	#[tokio::test(start_paused = true)]
	async fn test_reads_within_ttl_hit_store_once() {
		let (store, role_id, _) = setup().await;
		let cache = PermissionCache::new(store.clone(), 16);

		let first = cache.get(role_id).await.unwrap();
		tokio::time::advance(Duration::from_secs(30)).await;
		let second = cache.get(role_id).await.unwrap();

		assert_eq!(store.policy_reads(), 1);
		assert_eq!(first, second);
	}

	#[tokio::test(start_paused = true)]
	async fn test_expired_entry_refetches() {
		let (store, role_id, perm_id) = setup().await;
		let cache = PermissionCache::new(store.clone(), 16);

		let rows = cache.get(role_id).await.unwrap();
		assert!(!rows[0].allow);

		store.upsert_role_permission(role_id, perm_id, Mode::All, true).await.unwrap();
		tokio::time::advance(Duration::from_secs(60)).await;

		let rows = cache.get(role_id).await.unwrap();
		assert!(rows[0].allow);
		assert_eq!(store.policy_reads(), 2);
	}

	#[tokio::test]
	async fn test_invalidate_forces_fresh_read() {
		let (store, role_id, perm_id) = setup().await;
		let cache = PermissionCache::new(store.clone(), 16);

		cache.get(role_id).await.unwrap();
		store.upsert_role_permission(role_id, perm_id, Mode::All, true).await.unwrap();

		// Stale until invalidated
		assert!(!cache.get(role_id).await.unwrap()[0].allow);

		cache.invalidate(role_id);
		assert!(cache.get(role_id).await.unwrap()[0].allow);

		cache.invalidate_all();
		cache.get(role_id).await.unwrap();
		assert_eq!(store.policy_reads(), 3);
	}

	#[tokio::test]
	async fn test_read_racing_invalidate_is_not_cached() {
		let (store, role_id, perm_id) = setup().await;
		let cache = Arc::new(PermissionCache::new(store.clone(), 16));

		let pause = store.pause_next_read();
		let reader = {
			let cache = cache.clone();
			tokio::spawn(async move { cache.get(role_id).await.unwrap() })
		};
		pause.reached.notified().await;

		// Admin write lands while the reader holds the old rows
		store.upsert_role_permission(role_id, perm_id, Mode::All, true).await.unwrap();
		cache.invalidate(role_id);
		pause.release.notify_one();

		let stale = reader.await.unwrap();
		assert!(!stale[0].allow);
		assert!(cache.get(role_id).await.unwrap()[0].allow);
		assert_eq!(store.policy_reads(), 2);
	}

	#[tokio::test]
	async fn test_read_racing_invalidate_all_is_not_cached() {
		let (store, role_id, perm_id) = setup().await;
		let cache = Arc::new(PermissionCache::new(store.clone(), 16));

		let pause = store.pause_next_read();
		let reader = {
			let cache = cache.clone();
			tokio::spawn(async move { cache.get(role_id).await.unwrap() })
		};
		pause.reached.notified().await;

		store.upsert_role_permission(role_id, perm_id, Mode::All, true).await.unwrap();
		cache.invalidate_all();
		pause.release.notify_one();
		reader.await.unwrap();

		assert!(cache.get(role_id).await.unwrap()[0].allow);
	}

	#[tokio::test]
	async fn test_store_failure_is_not_cached() {
		let (store, role_id, _) = setup().await;
		let cache = PermissionCache::new(store.clone(), 16);

		store.set_offline(true);
		assert!(matches!(cache.get(role_id).await, Err(Error::DbError)));

		store.set_offline(false);
		assert_eq!(cache.get(role_id).await.unwrap().len(), 1);
	}
}

// vim: ts=4
