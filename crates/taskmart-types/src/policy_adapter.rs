//! Adapter that owns the durable role/permission matrix.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;
use crate::rbac::{Mode, Permission, Role, RolePermission};
use crate::types::PermissionId;

/// Reference to a role either by numeric id or by key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRef<'a> {
	Id(RoleId),
	Key(&'a str),
}

impl<'a> RoleRef<'a> {
	/// Numeric strings are ids, everything else is a key
	pub fn parse(s: &'a str) -> Self {
		match s.parse::<i64>() {
			Ok(id) => RoleRef::Id(RoleId(id)),
			Err(_) => RoleRef::Key(s),
		}
	}
}

impl std::fmt::Display for RoleRef<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RoleRef::Id(id) => write!(f, "#{}", id),
			RoleRef::Key(key) => f.write_str(key),
		}
	}
}

#[async_trait]
pub trait PolicyAdapter: Debug + Send + Sync {
	// Catalog
	//*********
	async fn list_roles(&self) -> ClResult<Vec<Role>>;

	/// Returns `Error::NotFound` for unknown roles
	async fn read_role(&self, role: RoleRef<'_>) -> ClResult<Role>;

	async fn list_permissions(&self) -> ClResult<Vec<Permission>>;

	/// Returns `Error::NotFound` for unknown permission keys
	async fn read_permission(&self, key: &str) -> ClResult<Permission>;

	// Matrix
	//********
	async fn list_role_permissions(&self, role_id: RoleId) -> ClResult<Vec<RolePermission>>;

	/// Insert or update one matrix row.
	///
	/// Returns `true` if the stored state changed (new row, or different
	/// `allow`), `false` if the row already had this value.
	async fn upsert_role_permission(
		&self,
		role_id: RoleId,
		permission_id: PermissionId,
		mode: Mode,
		allow: bool,
	) -> ClResult<bool>;

	// Users
	//*******
	async fn list_user_roles(&self, user_id: UserId) -> ClResult<Vec<Role>>;

	async fn assign_user_role(&self, user_id: UserId, role_id: RoleId) -> ClResult<()>;

	// Bootstrap
	//***********
	/// Create a role, or return the existing one with the same key
	async fn create_role(&self, key: &str, label: &str) -> ClResult<Role>;

	/// Create a catalog permission, or return the existing one with the same key
	async fn create_permission(&self, key: &str, label: &str, group: &str)
	-> ClResult<Permission>;
}


// vim: ts=4
