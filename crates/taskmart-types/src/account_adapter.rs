//! Read access to account state needed by requirement gates.
//!
//! Accounts themselves are owned by the marketplace domain; this adapter
//! only exposes the flags and balance the mode/email gates look at.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
	pub user_id: UserId,
	pub verified: bool,
	pub email_verified: bool,
	pub balance: f64,
}

#[async_trait]
pub trait AccountAdapter: Debug + Send + Sync {
	/// Returns `Error::NotFound` for unknown users
	async fn read_account_status(&self, user_id: UserId) -> ClResult<AccountStatus>;
}

// vim: ts=4
