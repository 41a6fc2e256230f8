//! Wire types of the admin control plane, shared by server and client.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rbac::Mode;

/// One changed cell of the permission matrix (always `mode = all`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionUpdate {
	/// Role key
	pub role: Box<str>,
	pub permission_key: Box<str>,
	pub allow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
	pub updates: Vec<PermissionUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
	/// Number of rows whose stored value changed
	pub updated: usize,
}

/// Body of `POST /roles/{role}/permissions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRolePermission {
	pub permission_key: Box<str>,
	pub mode: Mode,
	pub allow: bool,
}

/// One row of the matrix view: permission metadata plus a column per role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRow {
	pub key: Box<str>,
	pub label: Box<str>,
	pub group: Box<str>,
	/// role key -> allowed (mode = all)
	pub roles: BTreeMap<Box<str>, bool>,
}

// vim: ts=4
