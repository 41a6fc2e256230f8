//! Permission catalog and the role/permission matrix

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::str::FromStr;

use crate::utils::{collect_res, db_err, map_res};
use taskmart_types::prelude::*;
use taskmart_types::rbac::{Mode, Permission, RolePermission};
use taskmart_types::types::PermissionId;

fn permission_from_row(row: SqliteRow) -> Result<Permission, sqlx::Error> {
	Ok(Permission {
		id: PermissionId(row.try_get("perm_id")?),
		key: row.try_get::<String, _>("key")?.into(),
		label: row.try_get::<String, _>("label")?.into(),
		group: row.try_get::<String, _>("grp")?.into(),
	})
}

fn matrix_row_from_row(row: SqliteRow) -> Result<RolePermission, sqlx::Error> {
	let mode: String = row.try_get("mode")?;
	let mode = Mode::from_str(&mode).map_err(|_| sqlx::Error::ColumnDecode {
		index: "mode".into(),
		source: format!("unknown mode '{}'", mode).into(),
	})?;
	Ok(RolePermission {
		role_id: RoleId(row.try_get("role_id")?),
		permission_id: PermissionId(row.try_get("perm_id")?),
		permission_key: row.try_get::<String, _>("key")?.into(),
		mode,
		allow: row.try_get("allow")?,
	})
}

pub(crate) async fn list(db: &SqlitePool) -> ClResult<Vec<Permission>> {
	let rows = sqlx::query("SELECT perm_id, key, label, grp FROM permissions ORDER BY grp, key")
		.fetch_all(db)
		.await
		.map_err(db_err)?;
	collect_res(rows, permission_from_row)
}

pub(crate) async fn read(db: &SqlitePool, key: &str) -> ClResult<Permission> {
	let res = sqlx::query("SELECT perm_id, key, label, grp FROM permissions WHERE key = ?")
		.bind(key)
		.fetch_one(db)
		.await;
	map_res(res, permission_from_row)
}

pub(crate) async fn create(
	db: &SqlitePool,
	key: &str,
	label: &str,
	group: &str,
) -> ClResult<Permission> {
	sqlx::query("INSERT INTO permissions (key, label, grp) VALUES (?, ?, ?) ON CONFLICT(key) DO NOTHING")
		.bind(key)
		.bind(label)
		.bind(group)
		.execute(db)
		.await
		.map_err(db_err)?;
	read(db, key).await
}

pub(crate) async fn list_for_role(db: &SqlitePool, role_id: RoleId) -> ClResult<Vec<RolePermission>> {
	let rows = sqlx::query(
		"SELECT rp.role_id, rp.perm_id, p.key, rp.mode, rp.allow FROM role_permissions rp
		JOIN permissions p ON p.perm_id = rp.perm_id
		WHERE rp.role_id = ?
		ORDER BY p.key, rp.mode",
	)
	.bind(role_id.0)
	.fetch_all(db)
	.await
	.map_err(db_err)?;
	collect_res(rows, matrix_row_from_row)
}

/// Insert or update one matrix row; `true` when the stored value changed
pub(crate) async fn upsert(
	db: &SqlitePool,
	role_id: RoleId,
	permission_id: PermissionId,
	mode: Mode,
	allow: bool,
) -> ClResult<bool> {
	// The WHERE clause turns a same-value update into a no-op, so
	// rows_affected only counts real changes
	let res = sqlx::query(
		"INSERT INTO role_permissions (role_id, perm_id, mode, allow) VALUES (?, ?, ?, ?)
		ON CONFLICT(role_id, perm_id, mode) DO UPDATE
		SET allow = excluded.allow, updated_at = unixepoch()
		WHERE allow != excluded.allow",
	)
	.bind(role_id.0)
	.bind(permission_id.0)
	.bind(mode.as_str())
	.bind(allow)
	.execute(db)
	.await
	.map_err(db_err)?;
	Ok(res.rows_affected() > 0)
}

// vim: ts=4
