//! Settings categories stored as JSON text

use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};

use crate::utils::db_err;
use taskmart_types::prelude::*;

pub(crate) async fn list(db: &SqlitePool) -> ClResult<Map<String, Value>> {
	let rows = sqlx::query("SELECT name, value FROM settings").fetch_all(db).await.map_err(db_err)?;

	let mut settings = Map::new();
	for row in rows {
		let name: String = row.get("name");
		let value: Option<String> = row.get("value");
		match value.map(|v| serde_json::from_str(&v)) {
			Some(Ok(value)) => {
				settings.insert(name, value);
			}
			Some(Err(err)) => warn!("Ignoring unparsable settings category {}: {}", name, err),
			None => {}
		}
	}
	Ok(settings)
}

pub(crate) async fn read(db: &SqlitePool, name: &str) -> ClResult<Option<Value>> {
	let row = sqlx::query("SELECT value FROM settings WHERE name = ?")
		.bind(name)
		.fetch_optional(db)
		.await
		.map_err(db_err)?;

	Ok(row.and_then(|r| {
		let value: Option<String> = r.get("value");
		value.and_then(|v| serde_json::from_str(&v).ok())
	}))
}

pub(crate) async fn write(db: &SqlitePool, name: &str, value: &Value) -> ClResult<()> {
	sqlx::query(
		"INSERT INTO settings (name, value) VALUES (?, ?)
		ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = unixepoch()",
	)
	.bind(name)
	.bind(value.to_string())
	.execute(db)
	.await
	.map_err(db_err)?;
	Ok(())
}

// vim: ts=4
