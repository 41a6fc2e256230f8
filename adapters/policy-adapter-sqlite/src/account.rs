//! Account flags read by requirement gates

use sqlx::{Row, SqlitePool};

use crate::utils::{db_err, map_res};
use taskmart_types::account_adapter::AccountStatus;
use taskmart_types::prelude::*;

pub(crate) async fn read(db: &SqlitePool, user_id: UserId) -> ClResult<AccountStatus> {
	let res = sqlx::query(
		"SELECT user_id, verified, email_verified, balance FROM accounts WHERE user_id = ?",
	)
	.bind(user_id.0)
	.fetch_one(db)
	.await;
	map_res(res, |row| {
		Ok(AccountStatus {
			user_id: UserId(row.try_get("user_id")?),
			verified: row.try_get("verified")?,
			email_verified: row.try_get("email_verified")?,
			balance: row.try_get("balance")?,
		})
	})
}

pub(crate) async fn write(db: &SqlitePool, status: &AccountStatus) -> ClResult<()> {
	sqlx::query(
		"INSERT INTO accounts (user_id, verified, email_verified, balance) VALUES (?, ?, ?, ?)
		ON CONFLICT(user_id) DO UPDATE SET verified = excluded.verified,
			email_verified = excluded.email_verified, balance = excluded.balance",
	)
	.bind(status.user_id.0)
	.bind(status.verified)
	.bind(status.email_verified)
	.bind(status.balance)
	.execute(db)
	.await
	.map_err(db_err)?;
	Ok(())
}

// vim: ts=4
