//! In-memory adapters for tests
//!
//! `MemoryStore` implements every adapter trait over plain maps and counts
//! reads, so cache tests can assert how often the store was hit. Setting
//! `offline` makes every call fail like an unreachable database, and
//! `pause_next_read` holds one matrix or settings read after it has loaded
//! its data, to interleave writes with an in-flight read.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::account_adapter::{AccountAdapter, AccountStatus};
use crate::policy_adapter::{PolicyAdapter, RoleRef};
use crate::prelude::*;
use crate::rbac::{Mode, Permission, Role, RolePermission};
use crate::settings_adapter::SettingsAdapter;
use crate::types::PermissionId;

#[derive(Debug, Default)]
struct Inner {
	roles: Vec<Role>,
	permissions: Vec<Permission>,
	matrix: BTreeMap<(RoleId, PermissionId, Mode), bool>,
	user_roles: Vec<(UserId, RoleId)>,
	settings: Map<String, Value>,
	accounts: BTreeMap<UserId, AccountStatus>,
}

/// Handshake for a held read: `reached` fires once the data is loaded,
/// the read returns after `release`
#[derive(Debug, Default)]
pub struct ReadPause {
	pub reached: Notify,
	pub release: Notify,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
	inner: Mutex<Inner>,
	pause: Mutex<Option<Arc<ReadPause>>>,
	pub policy_reads: AtomicUsize,
	pub settings_reads: AtomicUsize,
	pub offline: AtomicBool,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_offline(&self, offline: bool) {
		self.offline.store(offline, Ordering::SeqCst);
	}

	pub fn policy_reads(&self) -> usize {
		self.policy_reads.load(Ordering::SeqCst)
	}

	pub fn settings_reads(&self) -> usize {
		self.settings_reads.load(Ordering::SeqCst)
	}

	pub fn put_account(&self, status: AccountStatus) {
		self.inner.lock().accounts.insert(status.user_id, status);
	}

	/// Hold the next `list_role_permissions` or `read_settings` call
	pub fn pause_next_read(&self) -> Arc<ReadPause> {
		let pause = Arc::new(ReadPause::default());
		*self.pause.lock() = Some(pause.clone());
		pause
	}

	async fn hold_if_paused(&self) {
		let pause = self.pause.lock().take();
		if let Some(pause) = pause {
			pause.reached.notify_one();
			pause.release.notified().await;
		}
	}

	fn check_online(&self) -> ClResult<()> {
		if self.offline.load(Ordering::SeqCst) {
			return Err(Error::DbError);
		}
		Ok(())
	}
}

#[async_trait]
impl PolicyAdapter for MemoryStore {
	async fn list_roles(&self) -> ClResult<Vec<Role>> {
		self.check_online()?;
		Ok(self.inner.lock().roles.clone())
	}

	async fn read_role(&self, role: RoleRef<'_>) -> ClResult<Role> {
		self.check_online()?;
		let inner = self.inner.lock();
		inner
			.roles
			.iter()
			.find(|r| match role {
				RoleRef::Id(id) => r.id == id,
				RoleRef::Key(key) => r.key.as_ref() == key,
			})
			.cloned()
			.ok_or(Error::NotFound)
	}

	async fn list_permissions(&self) -> ClResult<Vec<Permission>> {
		self.check_online()?;
		Ok(self.inner.lock().permissions.clone())
	}

	async fn read_permission(&self, key: &str) -> ClResult<Permission> {
		self.check_online()?;
		let inner = self.inner.lock();
		inner.permissions.iter().find(|p| p.key.as_ref() == key).cloned().ok_or(Error::NotFound)
	}

	async fn list_role_permissions(&self, role_id: RoleId) -> ClResult<Vec<RolePermission>> {
		self.check_online()?;
		self.policy_reads.fetch_add(1, Ordering::SeqCst);
		let rows = {
			let inner = self.inner.lock();
			inner
				.matrix
				.iter()
				.filter(|((r, _, _), _)| *r == role_id)
				.filter_map(|((r, p, mode), allow)| {
					let permission = inner.permissions.iter().find(|perm| perm.id == *p)?;
					Some(RolePermission {
						role_id: *r,
						permission_id: *p,
						permission_key: permission.key.clone(),
						mode: *mode,
						allow: *allow,
					})
				})
				.collect()
		};
		self.hold_if_paused().await;
		Ok(rows)
	}

	async fn upsert_role_permission(
		&self,
		role_id: RoleId,
		permission_id: PermissionId,
		mode: Mode,
		allow: bool,
	) -> ClResult<bool> {
		self.check_online()?;
		let prev = self.inner.lock().matrix.insert((role_id, permission_id, mode), allow);
		Ok(prev != Some(allow))
	}

	async fn list_user_roles(&self, user_id: UserId) -> ClResult<Vec<Role>> {
		self.check_online()?;
		let inner = self.inner.lock();
		Ok(inner
			.user_roles
			.iter()
			.filter(|(u, _)| *u == user_id)
			.filter_map(|(_, role_id)| inner.roles.iter().find(|r| r.id == *role_id).cloned())
			.collect())
	}

	async fn assign_user_role(&self, user_id: UserId, role_id: RoleId) -> ClResult<()> {
		self.check_online()?;
		let mut inner = self.inner.lock();
		if !inner.user_roles.contains(&(user_id, role_id)) {
			inner.user_roles.push((user_id, role_id));
		}
		Ok(())
	}

	async fn create_role(&self, key: &str, label: &str) -> ClResult<Role> {
		self.check_online()?;
		let mut inner = self.inner.lock();
		if let Some(role) = inner.roles.iter().find(|r| r.key.as_ref() == key) {
			return Ok(role.clone());
		}
		#[allow(clippy::cast_possible_wrap)]
		let role = Role { id: RoleId(inner.roles.len() as i64 + 1), key: key.into(), label: label.into() };
		inner.roles.push(role.clone());
		Ok(role)
	}

	async fn create_permission(
		&self,
		key: &str,
		label: &str,
		group: &str,
	) -> ClResult<Permission> {
		self.check_online()?;
		let mut inner = self.inner.lock();
		if let Some(permission) = inner.permissions.iter().find(|p| p.key.as_ref() == key) {
			return Ok(permission.clone());
		}
		#[allow(clippy::cast_possible_wrap)]
		let permission = Permission {
			id: PermissionId(inner.permissions.len() as i64 + 1),
			key: key.into(),
			label: label.into(),
			group: group.into(),
		};
		inner.permissions.push(permission.clone());
		Ok(permission)
	}
}

#[async_trait]
impl SettingsAdapter for MemoryStore {
	async fn read_settings(&self) -> ClResult<Map<String, Value>> {
		self.check_online()?;
		self.settings_reads.fetch_add(1, Ordering::SeqCst);
		let settings = self.inner.lock().settings.clone();
		self.hold_if_paused().await;
		Ok(settings)
	}

	async fn read_category(&self, category: &str) -> ClResult<Option<Value>> {
		self.check_online()?;
		Ok(self.inner.lock().settings.get(category).cloned())
	}

	async fn write_category(&self, category: &str, value: &Value) -> ClResult<()> {
		self.check_online()?;
		self.inner.lock().settings.insert(category.to_string(), value.clone());
		Ok(())
	}
}

#[async_trait]
impl AccountAdapter for MemoryStore {
	async fn read_account_status(&self, user_id: UserId) -> ClResult<AccountStatus> {
		self.check_online()?;
		self.inner.lock().accounts.get(&user_id).cloned().ok_or(Error::NotFound)
	}
}

// vim: ts=4
