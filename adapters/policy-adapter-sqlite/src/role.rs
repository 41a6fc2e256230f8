//! Roles and user role assignments

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::utils::{collect_res, db_err, map_res};
use taskmart_types::policy_adapter::RoleRef;
use taskmart_types::prelude::*;
use taskmart_types::rbac::Role;

fn role_from_row(row: SqliteRow) -> Result<Role, sqlx::Error> {
	Ok(Role {
		id: RoleId(row.try_get("role_id")?),
		key: row.try_get::<String, _>("key")?.into(),
		label: row.try_get::<String, _>("label")?.into(),
	})
}

pub(crate) async fn list(db: &SqlitePool) -> ClResult<Vec<Role>> {
	let rows = sqlx::query("SELECT role_id, key, label FROM roles ORDER BY role_id")
		.fetch_all(db)
		.await
		.map_err(db_err)?;
	collect_res(rows, role_from_row)
}

pub(crate) async fn read(db: &SqlitePool, role: RoleRef<'_>) -> ClResult<Role> {
	let res = match role {
		RoleRef::Id(id) => {
			sqlx::query("SELECT role_id, key, label FROM roles WHERE role_id = ?")
				.bind(id.0)
				.fetch_one(db)
				.await
		}
		RoleRef::Key(key) => {
			sqlx::query("SELECT role_id, key, label FROM roles WHERE key = ?")
				.bind(key)
				.fetch_one(db)
				.await
		}
	};
	map_res(res, role_from_row)
}

/// Insert a role unless one with the same key exists; returns the stored role
pub(crate) async fn create(db: &SqlitePool, key: &str, label: &str) -> ClResult<Role> {
	sqlx::query("INSERT INTO roles (key, label) VALUES (?, ?) ON CONFLICT(key) DO NOTHING")
		.bind(key)
		.bind(label)
		.execute(db)
		.await
		.map_err(db_err)?;
	read(db, RoleRef::Key(key)).await
}

pub(crate) async fn list_for_user(db: &SqlitePool, user_id: UserId) -> ClResult<Vec<Role>> {
	let rows = sqlx::query(
		"SELECT r.role_id, r.key, r.label FROM user_roles ur
		JOIN roles r ON r.role_id = ur.role_id
		WHERE ur.user_id = ?
		ORDER BY r.role_id",
	)
	.bind(user_id.0)
	.fetch_all(db)
	.await
	.map_err(db_err)?;
	collect_res(rows, role_from_row)
}

pub(crate) async fn assign(db: &SqlitePool, user_id: UserId, role_id: RoleId) -> ClResult<()> {
	sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
		.bind(user_id.0)
		.bind(role_id.0)
		.execute(db)
		.await
		.map_err(db_err)?;
	Ok(())
}

// vim: ts=4
