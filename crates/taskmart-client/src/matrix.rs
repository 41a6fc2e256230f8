//! Permission matrix editor state and change detection
//!
//! Only the cells that differ from the last loaded (or committed) snapshot
//! are submitted. An unchanged editor produces no request at all.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::prelude::*;
use taskmart_types::admin_types::{BulkUpdateRequest, MatrixRow, PermissionUpdate};

/// permission key -> role key -> allowed (mode = all)
pub type PermissionMatrix = BTreeMap<Box<str>, BTreeMap<Box<str>, bool>>;

pub fn matrix_from_rows(rows: &[MatrixRow]) -> PermissionMatrix {
	rows.iter().map(|row| (row.key.clone(), row.roles.clone())).collect()
}

/// Changed cells of `current` relative to `original`, in key order
///
/// Permissions missing from either side are ignored; a role column absent
/// from `original` counts as changed.
pub fn diff(original: &PermissionMatrix, current: &PermissionMatrix) -> Vec<PermissionUpdate> {
	let mut updates = Vec::new();
	for (key, roles) in current {
		let Some(before) = original.get(key) else { continue };
		for (role, allow) in roles {
			if before.get(role) != Some(allow) {
				updates.push(PermissionUpdate {
					role: role.clone(),
					permission_key: key.clone(),
					allow: *allow,
				});
			}
		}
	}
	updates
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
	NoChanges,
	Submit(BulkUpdateRequest),
}

#[derive(Debug, Clone, Default)]
pub struct MatrixEditor {
	snapshot: PermissionMatrix,
	current: PermissionMatrix,
}

impl MatrixEditor {
	pub fn new(matrix: PermissionMatrix) -> Self {
		Self { current: matrix.clone(), snapshot: matrix }
	}

	pub fn from_rows(rows: &[MatrixRow]) -> Self {
		Self::new(matrix_from_rows(rows))
	}

	pub fn get(&self, permission_key: &str, role: &str) -> Option<bool> {
		self.current.get(permission_key)?.get(role).copied()
	}

	/// Toggle one cell; unknown permissions are rejected
	pub fn set(&mut self, permission_key: &str, role: &str, allow: bool) -> ClResult<()> {
		let roles = self.current.get_mut(permission_key).ok_or_else(|| {
			Error::ValidationError(format!("Unknown permission: {}", permission_key))
		})?;
		roles.insert(role.into(), allow);
		Ok(())
	}

	pub fn changes(&self) -> Vec<PermissionUpdate> {
		diff(&self.snapshot, &self.current)
	}

	pub fn is_dirty(&self) -> bool {
		!self.changes().is_empty()
	}

	pub fn submission(&self) -> Submission {
		let updates = self.changes();
		if updates.is_empty() {
			Submission::NoChanges
		} else {
			Submission::Submit(BulkUpdateRequest { updates })
		}
	}

	/// Rebase onto the edited state after a successful submit
	pub fn commit(&mut self) {
		self.snapshot = self.current.clone();
	}

	/// Discard local edits
	pub fn reset(&mut self) {
		self.current = self.snapshot.clone();
	}
}

/// Changed leaves of a settings category, shaped for a deep-merge `PUT`
pub fn settings_diff(original: &Value, current: &Value) -> Option<Value> {
	match (original, current) {
		(Value::Object(before), Value::Object(after)) => {
			let changed: Map<String, Value> = after
				.iter()
				.filter_map(|(key, value)| {
					let prev = before.get(key).unwrap_or(&Value::Null);
					settings_diff(prev, value).map(|change| (key.clone(), change))
				})
				.collect();
			(!changed.is_empty()).then_some(Value::Object(changed))
		}
		_ if original == current => None,
		_ => Some(current.clone()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn matrix() -> PermissionMatrix {
		let mut matrix = PermissionMatrix::new();
		matrix.insert(
			"orders.refund".into(),
			BTreeMap::from([("admin".into(), true), ("moderator".into(), false)]),
		);
		matrix.insert(
			"users.ban".into(),
			BTreeMap::from([("admin".into(), false), ("moderator".into(), false)]),
		);
		matrix
	}

	#[test]
	fn test_diff_of_snapshot_with_itself_is_empty() {
		assert!(diff(&matrix(), &matrix()).is_empty());
		assert_eq!(MatrixEditor::new(matrix()).submission(), Submission::NoChanges);
	}

	#[test]
	fn test_diff_emits_only_changed_cells() {
		let mut editor = MatrixEditor::new(matrix());
		editor.set("users.ban", "admin", true).unwrap();
		editor.set("orders.refund", "moderator", false).unwrap();

		let Submission::Submit(request) = editor.submission() else {
			panic!("expected changes");
		};
		assert_eq!(
			request.updates,
			vec![PermissionUpdate {
				role: "admin".into(),
				permission_key: "users.ban".into(),
				allow: true
			}]
		);
	}

	#[test]
	fn test_toggle_back_is_not_a_change() {
		let mut editor = MatrixEditor::new(matrix());
		editor.set("users.ban", "admin", true).unwrap();
		editor.set("users.ban", "admin", false).unwrap();
		assert!(!editor.is_dirty());
	}

	#[test]
	fn test_commit_and_reset() {
		let mut editor = MatrixEditor::new(matrix());
		editor.set("users.ban", "moderator", true).unwrap();
		editor.commit();
		assert_eq!(editor.submission(), Submission::NoChanges);
		assert_eq!(editor.get("users.ban", "moderator"), Some(true));

		editor.set("orders.refund", "admin", false).unwrap();
		editor.reset();
		assert_eq!(editor.get("orders.refund", "admin"), Some(true));

		assert!(editor.set("nope", "admin", true).is_err());
	}

	#[test]
	fn test_settings_diff() {
		let original = json!({
			"transactions": { "approveEnabled": true, "refundEnabled": true },
			"tasks": { "enabled": true }
		});
		assert_eq!(settings_diff(&original, &original), None);

		let current = json!({
			"transactions": { "approveEnabled": false, "refundEnabled": true },
			"tasks": { "enabled": true },
			"disputes": { "enabled": false }
		});
		assert_eq!(
			settings_diff(&original, &current),
			Some(json!({
				"transactions": { "approveEnabled": false },
				"disputes": { "enabled": false }
			}))
		);
	}
}

// vim: ts=4
