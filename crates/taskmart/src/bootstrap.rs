//! Startup seeding of the role/permission catalog
//!
//! Runs on every start. Roles and permissions are created idempotently;
//! default grants only land on roles that have no rows yet, so edits made
//! through the control plane survive a restart.

use std::collections::HashMap;

use crate::prelude::*;
use taskmart_core::rbac::catalog::{DEFAULT_GRANTS, PERMISSIONS, ROLES};
use taskmart_types::policy_adapter::RoleRef;
use taskmart_types::rbac::{Mode, SUPER_ADMIN};

pub async fn bootstrap(app: &App) -> ClResult<()> {
	let store = &app.policy_adapter;

	let mut roles = HashMap::new();
	for (key, label) in ROLES {
		let role = store.create_role(key, label).await?;
		roles.insert(*key, role);
	}

	let mut permissions = HashMap::new();
	for (key, label, group) in PERMISSIONS {
		let permission = store.create_permission(key, label, group).await?;
		permissions.insert(*key, permission.id);
	}

	let mut seeded = 0;
	for role in roles.values() {
		if !store.list_role_permissions(role.id).await?.is_empty() {
			continue;
		}
		for (_, permission, allow) in DEFAULT_GRANTS.iter().filter(|(r, _, _)| *r == &*role.key) {
			let Some(permission_id) = permissions.get(permission) else {
				return Err(Error::ConfigError(format!("unknown permission in defaults: {}", permission)));
			};
			if store.upsert_role_permission(role.id, *permission_id, Mode::All, *allow).await? {
				seeded += 1;
			}
		}
	}
	if seeded > 0 {
		info!("Seeded {} default role permissions", seeded);
	}

	if let Some(user_id) = app.opts.bootstrap_admin {
		let role = store.read_role(RoleRef::Key(SUPER_ADMIN)).await?;
		store.assign_user_role(user_id, role.id).await?;
		info!(subject = %user_id, "Bootstrap admin assigned {}", SUPER_ADMIN);
	}

	Ok(())
}

// vim: ts=4
