//! Server side of the permission matrix editor
//!
//! Writes always go through `PolicyAdapter::upsert_role_permission` and end
//! with invalidating the permission cache of every role they touched.
//! Concurrent admins are not coordinated: the last write to a
//! (role, permission, mode) tuple wins.

use std::collections::{BTreeMap, BTreeSet};

use crate::prelude::*;
use taskmart_types::admin_types::{MatrixRow, PermissionUpdate};
use taskmart_types::policy_adapter::RoleRef;
use taskmart_types::rbac::{Mode, Role, RolePermission};
use taskmart_types::types::PermissionId;

/// Apply a batch of `mode = all` changes, returning the number of rows changed
///
/// Every role and permission key is resolved before the first write, so a
/// single unknown key rejects the whole batch.
pub async fn apply_bulk_update(app: &App, updates: &[PermissionUpdate]) -> ClResult<usize> {
	if updates.is_empty() {
		return Ok(0);
	}

	let roles = app.policy_adapter.list_roles().await?;
	let permissions = app.policy_adapter.list_permissions().await?;

	let mut resolved: Vec<(RoleId, PermissionId, bool)> = Vec::with_capacity(updates.len());
	for update in updates {
		let role = find_role(&roles, RoleRef::parse(&update.role)).ok_or_else(|| {
			Error::ValidationError(format!("Unknown role: {}", update.role))
		})?;
		let permission =
			permissions.iter().find(|p| p.key == update.permission_key).ok_or_else(|| {
				Error::ValidationError(format!("Unknown permission: {}", update.permission_key))
			})?;
		resolved.push((role.id, permission.id, update.allow));
	}

	let mut updated = 0;
	let mut affected = BTreeSet::new();
	let mut result = Ok(());
	for (role_id, permission_id, allow) in resolved {
		match app.policy_adapter.upsert_role_permission(role_id, permission_id, Mode::All, allow).await
		{
			Ok(changed) => {
				affected.insert(role_id);
				if changed {
					updated += 1;
				}
			}
			Err(err) => {
				result = Err(err);
				break;
			}
		}
	}

	// Invalidate even after a partial failure; earlier rows are already written
	for role_id in &affected {
		app.permission_cache.invalidate(*role_id);
	}
	result?;

	info!(rows = updates.len(), updated = updated, roles = affected.len(), "Permission matrix updated");
	Ok(updated)
}

/// Upsert a single (role, permission, mode) row
pub async fn apply_single_upsert(
	app: &App,
	role: RoleRef<'_>,
	permission_key: &str,
	mode: Mode,
	allow: bool,
) -> ClResult<RolePermission> {
	let role = app.policy_adapter.read_role(role).await?;
	let permission = match app.policy_adapter.read_permission(permission_key).await {
		Err(Error::NotFound) => {
			return Err(Error::ValidationError(format!("Unknown permission: {}", permission_key)));
		}
		res => res?,
	};

	let changed =
		app.policy_adapter.upsert_role_permission(role.id, permission.id, mode, allow).await?;
	app.permission_cache.invalidate(role.id);
	if changed {
		info!(role = %role.key, permission = permission_key, mode = %mode, allow = allow, "Role permission updated");
	}

	Ok(RolePermission {
		role_id: role.id,
		permission_id: permission.id,
		permission_key: permission.key,
		mode,
		allow,
	})
}

/// Matrix view: every permission with its `mode = all` value per role
pub async fn load_matrix(app: &App) -> ClResult<(Vec<Role>, Vec<MatrixRow>)> {
	let roles = app.policy_adapter.list_roles().await?;
	let permissions = app.policy_adapter.list_permissions().await?;

	let mut grants: BTreeMap<(&str, &str), bool> = BTreeMap::new();
	let mut role_rows = Vec::with_capacity(roles.len());
	for role in &roles {
		role_rows.push((role, app.permission_cache.get(role.id).await?));
	}
	for (role, rows) in &role_rows {
		for row in rows.iter().filter(|row| row.mode == Mode::All) {
			grants.insert((row.permission_key.as_ref(), role.key.as_ref()), row.allow);
		}
	}

	let matrix = permissions
		.iter()
		.map(|permission| MatrixRow {
			key: permission.key.clone(),
			label: permission.label.clone(),
			group: permission.group.clone(),
			roles: roles
				.iter()
				.map(|role| {
					let allow = grants
						.get(&(permission.key.as_ref(), role.key.as_ref()))
						.copied()
						.unwrap_or(false);
					(role.key.clone(), allow)
				})
				.collect(),
		})
		.collect();

	Ok((roles, matrix))
}

fn find_role<'a>(roles: &'a [Role], role: RoleRef<'_>) -> Option<&'a Role> {
	roles.iter().find(|r| match role {
		RoleRef::Id(id) => r.id == id,
		RoleRef::Key(key) => r.key.as_ref() == key,
	})
}


// vim: ts=4
