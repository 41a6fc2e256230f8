//! Time-stamped cache entries shared by the permission and settings caches

use std::time::Duration;
use tokio::time::Instant;

/// Entries older than this are refetched on the next read
pub const CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
	pub value: T,
	pub fetched_at: Instant,
}

impl<T> CacheEntry<T> {
	pub fn new(value: T) -> Self {
		Self { value, fetched_at: Instant::now() }
	}

	pub fn age(&self) -> Duration {
		self.fetched_at.elapsed()
	}

	pub fn is_fresh(&self, ttl: Duration) -> bool {
		self.age() < ttl
	}
}


// vim: ts=4
