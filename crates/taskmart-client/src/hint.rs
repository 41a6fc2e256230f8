//! Advisory permission mirror
//!
//! The session token is decoded without signature verification, so the
//! result can only drive UI state (hiding buttons, greying out menus). A
//! `PermissionHint` has no conversion into a server `Principal`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::prelude::*;
use taskmart_types::rbac::{AccountMode, Role, SUPER_ADMIN};

/// Seconds a mirrored hint stays valid
pub const HINT_TTL: i64 = 60;

const STORAGE_KEY: &str = "taskmart.permissionHint";

/// Unverified session claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryClaims {
	pub sub: UserId,
	#[serde(default)]
	pub roles: Vec<Role>,
	#[serde(default)]
	pub permissions: Vec<Box<str>>,
	#[serde(default)]
	pub mode: Option<AccountMode>,
	#[serde(default)]
	pub tfa: bool,
	pub exp: Timestamp,
}

/// Decode the payload segment of a JWT without verifying it
pub fn decode_claims(token: &str) -> ClResult<AdvisoryClaims> {
	let mut segments = token.split('.');
	let (Some(_header), Some(payload), Some(_signature), None) =
		(segments.next(), segments.next(), segments.next(), segments.next())
	else {
		return Err(Error::ValidationError("Malformed session token".into()));
	};

	let bytes = URL_SAFE_NO_PAD
		.decode(payload.trim_end_matches('='))
		.map_err(|_| Error::ValidationError("Malformed session token payload".into()))?;
	Ok(serde_json::from_slice(&bytes)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionHint {
	pub user_id: UserId,
	pub roles: BTreeSet<Box<str>>,
	pub permissions: BTreeSet<Box<str>>,
	pub mode: Option<AccountMode>,
	pub expires_at: Timestamp,
}

impl PermissionHint {
	pub fn from_claims(claims: &AdvisoryClaims) -> Self {
		Self {
			user_id: claims.sub,
			roles: claims.roles.iter().map(|role| role.key.clone()).collect(),
			permissions: claims.permissions.iter().cloned().collect(),
			mode: claims.mode,
			expires_at: claims.exp,
		}
	}

	pub fn is_super_admin(&self) -> bool {
		self.roles.contains(SUPER_ADMIN)
	}

	pub fn can(&self, key: &str) -> bool {
		self.is_super_admin() || self.permissions.contains(key)
	}

	pub fn can_any(&self, keys: &[&str]) -> bool {
		self.is_super_admin() || keys.iter().any(|key| self.permissions.contains(*key))
	}

	pub fn can_all(&self, keys: &[&str]) -> bool {
		self.is_super_admin() || keys.iter().all(|key| self.permissions.contains(*key))
	}

	pub fn is_expired(&self, now: Timestamp) -> bool {
		now >= self.expires_at
	}
}

/// Tab-scoped key/value storage the hint is persisted in
pub trait SessionStore: Send + Sync {
	fn get(&self, key: &str) -> Option<String>;
	fn set(&self, key: &str, value: String);
	fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
	map: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl SessionStore for MemorySessionStore {
	fn get(&self, key: &str) -> Option<String> {
		self.map.lock().get(key).cloned()
	}

	fn set(&self, key: &str, value: String) {
		self.map.lock().insert(key.to_string(), value);
	}

	fn remove(&self, key: &str) {
		self.map.lock().remove(key);
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedHint {
	hint: PermissionHint,
	cached_at: Timestamp,
}

/// Hint cache keyed by the current token, stored in a `SessionStore`
#[derive(Debug)]
pub struct ClientPermissionCache<S: SessionStore> {
	store: S,
}

impl<S: SessionStore> ClientPermissionCache<S> {
	pub fn new(store: S) -> Self {
		Self { store }
	}

	pub fn hint(&self, token: Option<&str>) -> Option<PermissionHint> {
		self.hint_at(token, Timestamp::now())
	}

	/// Cached hint while fresh and matching `token`, otherwise re-decoded
	pub fn hint_at(&self, token: Option<&str>, now: Timestamp) -> Option<PermissionHint> {
		let Some(token) = token else {
			self.invalidate();
			return None;
		};

		let claims = match decode_claims(token) {
			Ok(claims) => claims,
			Err(err) => {
				debug!("Dropping permission hint: {}", err);
				self.invalidate();
				return None;
			}
		};

		if let Some(cached) = self.load() {
			let same_session = cached.hint.user_id == claims.sub && cached.hint.expires_at == claims.exp;
			if same_session && now.0 - cached.cached_at.0 < HINT_TTL {
				return Some(cached.hint);
			}
		}

		let hint = PermissionHint::from_claims(&claims);
		if hint.is_expired(now) {
			self.invalidate();
			return None;
		}
		self.save(&CachedHint { hint: hint.clone(), cached_at: now });
		Some(hint)
	}

	/// Drop the cached hint and rebuild it from `token`, e.g. after a role change
	pub fn refresh(&self, token: Option<&str>) -> Option<PermissionHint> {
		self.refresh_at(token, Timestamp::now())
	}

	pub fn refresh_at(&self, token: Option<&str>, now: Timestamp) -> Option<PermissionHint> {
		self.invalidate();
		self.hint_at(token, now)
	}

	pub fn invalidate(&self) {
		self.store.remove(STORAGE_KEY);
	}

	fn load(&self) -> Option<CachedHint> {
		let raw = self.store.get(STORAGE_KEY)?;
		serde_json::from_str(&raw).ok()
	}

	fn save(&self, cached: &CachedHint) {
		match serde_json::to_string(cached) {
			Ok(raw) => self.store.set(STORAGE_KEY, raw),
			Err(err) => warn!("Cannot persist permission hint: {}", err),
		}
	}
}


// vim: ts=4
