//! Policy store tests against a temporary database

use serde_json::json;
use tempfile::TempDir;

use taskmart_policy_adapter_sqlite::PolicyAdapterSqlite;
use taskmart_types::account_adapter::{AccountAdapter, AccountStatus};
use taskmart_types::error::Error;
use taskmart_types::policy_adapter::{PolicyAdapter, RoleRef};
use taskmart_types::rbac::Mode;
use taskmart_types::settings_adapter::SettingsAdapter;
use taskmart_types::types::{RoleId, UserId};

async fn create_test_adapter() -> (PolicyAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = PolicyAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

#[tokio::test]
async fn test_create_role_is_idempotent() {
	let (adapter, _temp) = create_test_adapter().await;

	let admin = adapter.create_role("admin", "Administrator").await.unwrap();
	let again = adapter.create_role("admin", "Other label").await.unwrap();
	assert_eq!(admin, again);
	assert_eq!(again.label.as_ref(), "Administrator");

	let by_id = adapter.read_role(RoleRef::Id(admin.id)).await.unwrap();
	assert_eq!(by_id.key.as_ref(), "admin");
	assert!(matches!(adapter.read_role(RoleRef::Key("nobody")).await, Err(Error::NotFound)));
	assert!(matches!(adapter.read_role(RoleRef::Id(RoleId(999))).await, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_upsert_reports_changes() {
	let (adapter, _temp) = create_test_adapter().await;
	let role = adapter.create_role("admin", "Administrator").await.unwrap();
	let perm = adapter.create_permission("users.ban", "Ban users", "users").await.unwrap();

	assert!(adapter.upsert_role_permission(role.id, perm.id, Mode::All, false).await.unwrap());
	assert!(!adapter.upsert_role_permission(role.id, perm.id, Mode::All, false).await.unwrap());
	assert!(adapter.upsert_role_permission(role.id, perm.id, Mode::All, true).await.unwrap());
	assert!(adapter.upsert_role_permission(role.id, perm.id, Mode::TaskDoer, false).await.unwrap());

	let rows = adapter.list_role_permissions(role.id).await.unwrap();
	assert_eq!(rows.len(), 2);
	let all = rows.iter().find(|row| row.mode == Mode::All).unwrap();
	assert!(all.allow);
	assert_eq!(all.permission_key.as_ref(), "users.ban");
	let doer = rows.iter().find(|row| row.mode == Mode::TaskDoer).unwrap();
	assert!(!doer.allow);
}

#[tokio::test]
async fn test_user_roles() {
	let (adapter, _temp) = create_test_adapter().await;
	let admin = adapter.create_role("admin", "Administrator").await.unwrap();
	let moderator = adapter.create_role("moderator", "Moderator").await.unwrap();

	adapter.assign_user_role(UserId(5), admin.id).await.unwrap();
	adapter.assign_user_role(UserId(5), moderator.id).await.unwrap();
	adapter.assign_user_role(UserId(5), moderator.id).await.unwrap();

	let roles = adapter.list_user_roles(UserId(5)).await.unwrap();
	let keys: Vec<&str> = roles.iter().map(|r| r.key.as_ref()).collect();
	assert_eq!(keys, ["admin", "moderator"]);
	assert!(adapter.list_user_roles(UserId(6)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_settings_roundtrip_and_persistence() {
	let temp_dir = TempDir::new().unwrap();
	{
		let adapter = PolicyAdapterSqlite::new(temp_dir.path()).await.unwrap();
		assert!(adapter.read_settings().await.unwrap().is_empty());
		assert_eq!(adapter.read_category("features").await.unwrap(), None);

		adapter.write_category("features", &json!({ "tasks": { "enabled": false } })).await.unwrap();
		adapter.write_category("features", &json!({ "tasks": { "enabled": true } })).await.unwrap();
	}

	let adapter = PolicyAdapterSqlite::new(temp_dir.path()).await.unwrap();
	let settings = adapter.read_settings().await.unwrap();
	assert_eq!(settings.len(), 1);
	assert_eq!(settings["features"], json!({ "tasks": { "enabled": true } }));
}

#[tokio::test]
async fn test_account_status() {
	let (adapter, _temp) = create_test_adapter().await;
	assert!(matches!(adapter.read_account_status(UserId(9)).await, Err(Error::NotFound)));

	let status = AccountStatus { user_id: UserId(9), verified: true, email_verified: false, balance: 12.5 };
	adapter.write_account_status(&status).await.unwrap();
	assert_eq!(adapter.read_account_status(UserId(9)).await.unwrap(), status);
}

// vim: ts=4
