//! Role/permission model and the pure policy evaluator
//!
//! The matrix is a set of `(role, permission, mode, allow)` rows. A
//! principal's permission keys are materialized from those rows for its
//! active [`AccountMode`]; request-time checks only look at the
//! materialized set.
//!
//! Resolution is a permissive union: a permission is granted iff a row
//! `(mode = all, allow = true)` or `(mode = M, allow = true)` exists for the
//! active mode `M`. A mode-specific `false` never revokes an `all` grant,
//! and the absence of a matching row means "not granted".

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::prelude::*;
use crate::types::PermissionId;

/// Role key that satisfies every permission check
pub const SUPER_ADMIN: &str = "super_admin";

/// A named role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	pub id: RoleId,
	pub key: Box<str>,
	pub label: Box<str>,
}

/// Catalog entry for a permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
	pub id: PermissionId,
	/// Dot-namespaced key (e.g. "orders.refund")
	pub key: Box<str>,
	pub label: Box<str>,
	pub group: Box<str>,
}

/// Operational context a permission row is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
	#[serde(rename = "all")]
	All,
	#[serde(rename = "taskDoer")]
	TaskDoer,
	#[serde(rename = "taskGiver")]
	TaskGiver,
}

impl Mode {
	pub fn as_str(self) -> &'static str {
		match self {
			Mode::All => "all",
			Mode::TaskDoer => "taskDoer",
			Mode::TaskGiver => "taskGiver",
		}
	}

	/// Whether a row in this mode applies to a principal in `active` mode
	pub fn applies_to(self, active: Option<AccountMode>) -> bool {
		match self {
			Mode::All => true,
			mode => active.is_some_and(|active| Mode::from(active) == mode),
		}
	}
}

impl FromStr for Mode {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"all" => Ok(Mode::All),
			"taskDoer" => Ok(Mode::TaskDoer),
			"taskGiver" => Ok(Mode::TaskGiver),
			_ => Err(Error::ValidationError(format!("Invalid mode: {}", s))),
		}
	}
}

impl std::fmt::Display for Mode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The account type a principal is currently operating as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountMode {
	#[serde(rename = "taskGiver", alias = "task_giver")]
	TaskGiver,
	#[serde(rename = "taskDoer", alias = "task_doer", alias = "task_completer")]
	TaskDoer,
}

impl From<AccountMode> for Mode {
	fn from(mode: AccountMode) -> Self {
		match mode {
			AccountMode::TaskGiver => Mode::TaskGiver,
			AccountMode::TaskDoer => Mode::TaskDoer,
		}
	}
}

impl FromStr for AccountMode {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"taskGiver" | "task_giver" => Ok(AccountMode::TaskGiver),
			"taskDoer" | "task_doer" | "task_completer" => Ok(AccountMode::TaskDoer),
			_ => Err(Error::ValidationError(format!("Invalid account mode: {}", s))),
		}
	}
}

/// One row of the role/permission matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermission {
	pub role_id: RoleId,
	pub permission_id: PermissionId,
	pub permission_key: Box<str>,
	pub mode: Mode,
	pub allow: bool,
}

/// The authenticated actor of one request
///
/// Built from a verified session token; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
	pub user_id: UserId,
	pub roles: BTreeSet<Box<str>>,
	pub permissions: BTreeSet<Box<str>>,
	pub mode: Option<AccountMode>,
	/// Second factor confirmed during this session
	pub two_factor_verified: bool,
}

impl Principal {
	pub fn has_role(&self, key: &str) -> bool {
		self.roles.contains(key)
	}

	pub fn is_super_admin(&self) -> bool {
		self.has_role(SUPER_ADMIN)
	}
}

// Evaluator //
//***********//

pub fn has_permission(principal: Option<&Principal>, key: &str) -> bool {
	match principal {
		Some(p) if p.is_super_admin() => true,
		Some(p) => p.permissions.contains(key),
		None => false,
	}
}

pub fn has_any_permission<S: AsRef<str>>(principal: Option<&Principal>, keys: &[S]) -> bool {
	match principal {
		Some(p) if p.is_super_admin() => true,
		Some(p) => keys.iter().any(|key| p.permissions.contains(key.as_ref())),
		None => false,
	}
}

pub fn has_all_permissions<S: AsRef<str>>(principal: Option<&Principal>, keys: &[S]) -> bool {
	match principal {
		Some(p) if p.is_super_admin() => true,
		Some(p) => keys.iter().all(|key| p.permissions.contains(key.as_ref())),
		None => false,
	}
}

/// Whether `key` is granted by `rows` under the active mode
pub fn is_granted(rows: &[RolePermission], key: &str, mode: Option<AccountMode>) -> bool {
	rows.iter().any(|row| row.allow && row.permission_key.as_ref() == key && row.mode.applies_to(mode))
}

/// Materialize the granted permission keys from matrix rows
pub fn resolve_permissions<'a>(
	rows: impl IntoIterator<Item = &'a RolePermission>,
	mode: Option<AccountMode>,
) -> BTreeSet<Box<str>> {
	rows.into_iter()
		.filter(|row| row.allow && row.mode.applies_to(mode))
		.map(|row| row.permission_key.clone())
		.collect()
}


// vim: ts=4
