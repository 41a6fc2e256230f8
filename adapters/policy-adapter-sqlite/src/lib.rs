//! SQLite-backed policy store.
//!
//! One database file holds the role/permission catalog, the matrix, user
//! role assignments, the settings tree (one JSON row per category) and the
//! account flags read by requirement gates.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use taskmart_types::account_adapter::{AccountAdapter, AccountStatus};
use taskmart_types::policy_adapter::{PolicyAdapter, RoleRef};
use taskmart_types::prelude::*;
use taskmart_types::rbac::{Mode, Permission, Role, RolePermission};
use taskmart_types::settings_adapter::SettingsAdapter;
use taskmart_types::types::PermissionId;

mod account;
mod permission;
mod role;
mod schema;
mod setting;
mod utils;

const DB_FILE: &str = "policy.db";

#[derive(Debug)]
pub struct PolicyAdapterSqlite {
	db: SqlitePool,
}

impl PolicyAdapterSqlite {
	/// Open (or create) `policy.db` inside `dir`
	pub async fn new(dir: impl AsRef<Path>) -> ClResult<Self> {
		tokio::fs::create_dir_all(dir.as_ref()).await?;

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(dir.as_ref().join(DB_FILE))
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| error!("DB: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		schema::init_db(&db)
			.await
			.inspect_err(|err| error!("DB schema: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		Ok(Self { db })
	}

	/// Store account flags; accounts are owned by the marketplace, this only mirrors them
	pub async fn write_account_status(&self, status: &AccountStatus) -> ClResult<()> {
		account::write(&self.db, status).await
	}
}

#[async_trait]
impl PolicyAdapter for PolicyAdapterSqlite {
	async fn list_roles(&self) -> ClResult<Vec<Role>> {
		role::list(&self.db).await
	}

	async fn read_role(&self, role: RoleRef<'_>) -> ClResult<Role> {
		role::read(&self.db, role).await
	}

	async fn list_permissions(&self) -> ClResult<Vec<Permission>> {
		permission::list(&self.db).await
	}

	async fn read_permission(&self, key: &str) -> ClResult<Permission> {
		permission::read(&self.db, key).await
	}

	async fn list_role_permissions(&self, role_id: RoleId) -> ClResult<Vec<RolePermission>> {
		permission::list_for_role(&self.db, role_id).await
	}

	async fn upsert_role_permission(
		&self,
		role_id: RoleId,
		permission_id: PermissionId,
		mode: Mode,
		allow: bool,
	) -> ClResult<bool> {
		permission::upsert(&self.db, role_id, permission_id, mode, allow).await
	}

	async fn list_user_roles(&self, user_id: UserId) -> ClResult<Vec<Role>> {
		role::list_for_user(&self.db, user_id).await
	}

	async fn assign_user_role(&self, user_id: UserId, role_id: RoleId) -> ClResult<()> {
		role::assign(&self.db, user_id, role_id).await
	}

	async fn create_role(&self, key: &str, label: &str) -> ClResult<Role> {
		role::create(&self.db, key, label).await
	}

	async fn create_permission(&self, key: &str, label: &str, group: &str) -> ClResult<Permission> {
		permission::create(&self.db, key, label, group).await
	}
}

#[async_trait]
impl SettingsAdapter for PolicyAdapterSqlite {
	async fn read_settings(&self) -> ClResult<Map<String, Value>> {
		setting::list(&self.db).await
	}

	async fn read_category(&self, category: &str) -> ClResult<Option<Value>> {
		setting::read(&self.db, category).await
	}

	async fn write_category(&self, category: &str, value: &Value) -> ClResult<()> {
		setting::write(&self.db, category, value).await
	}
}

#[async_trait]
impl AccountAdapter for PolicyAdapterSqlite {
	async fn read_account_status(&self, user_id: UserId) -> ClResult<AccountStatus> {
		account::read(&self.db, user_id).await
	}
}

// vim: ts=4
