//! Database schema initialization

use sqlx::SqlitePool;

/// Create all tables and indexes if they do not exist yet
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Catalog
	//*********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS roles (
		role_id integer PRIMARY KEY AUTOINCREMENT,
		key text NOT NULL,
		label text NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		UNIQUE(key)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS permissions (
		perm_id integer PRIMARY KEY AUTOINCREMENT,
		key text NOT NULL,
		label text NOT NULL,
		grp text NOT NULL,
		UNIQUE(key)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Matrix
	//********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS role_permissions (
		role_id integer NOT NULL,
		perm_id integer NOT NULL,
		mode text NOT NULL,
		allow boolean NOT NULL,
		updated_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(role_id, perm_id, mode)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS user_roles (
		user_id integer NOT NULL,
		role_id integer NOT NULL,
		PRIMARY KEY(user_id, role_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_roles_role ON user_roles(role_id)")
		.execute(&mut *tx)
		.await?;

	// Settings
	//**********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS settings (
		name text NOT NULL,
		value text,
		updated_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(name)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Accounts
	//**********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS accounts (
		user_id integer NOT NULL,
		verified boolean NOT NULL DEFAULT 0,
		email_verified boolean NOT NULL DEFAULT 0,
		balance real NOT NULL DEFAULT 0,
		PRIMARY KEY(user_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
