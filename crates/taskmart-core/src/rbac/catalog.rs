//! Built-in roles, permission catalog and default grants

use taskmart_types::rbac::SUPER_ADMIN;

pub const ADMIN: &str = "admin";
pub const MODERATOR: &str = "moderator";

// Permissions guarding this layer's own endpoints
pub const RBAC_VIEW: &str = "rbac.view";
pub const RBAC_MANAGE: &str = "rbac.manage";
pub const SETTINGS_VIEW: &str = "settings.view";
pub const SETTINGS_MANAGE: &str = "settings.manage";

/// (key, label)
pub const ROLES: &[(&str, &str)] =
	&[(SUPER_ADMIN, "Super administrator"), (ADMIN, "Administrator"), (MODERATOR, "Moderator")];

/// (key, label, group)
pub const PERMISSIONS: &[(&str, &str, &str)] = &[
	(RBAC_VIEW, "View roles and permissions", "rbac"),
	(RBAC_MANAGE, "Edit the permission matrix", "rbac"),
	(SETTINGS_VIEW, "View platform settings", "settings"),
	(SETTINGS_MANAGE, "Change platform settings", "settings"),
	("users.view", "View users", "users"),
	("users.ban", "Ban users", "users"),
	("orders.view", "View orders", "orders"),
	("orders.refund", "Refund orders", "orders"),
	("tasks.create", "Create tasks", "tasks"),
	("tasks.approve", "Approve task completions", "tasks"),
	("transactions.view", "View transactions", "transactions"),
	("transactions.approve", "Approve transactions", "transactions"),
	("disputes.resolve", "Resolve disputes", "disputes"),
];

/// Default `mode = all` grants as (role, permission, allow)
pub const DEFAULT_GRANTS: &[(&str, &str, bool)] = &[
	(ADMIN, RBAC_VIEW, true),
	(ADMIN, RBAC_MANAGE, true),
	(ADMIN, SETTINGS_VIEW, true),
	(ADMIN, SETTINGS_MANAGE, true),
	(ADMIN, "users.view", true),
	(ADMIN, "users.ban", false),
	(ADMIN, "orders.view", true),
	(ADMIN, "orders.refund", true),
	(ADMIN, "tasks.approve", true),
	(ADMIN, "transactions.view", true),
	(ADMIN, "transactions.approve", true),
	(ADMIN, "disputes.resolve", true),
	(MODERATOR, RBAC_VIEW, true),
	(MODERATOR, SETTINGS_VIEW, true),
	(MODERATOR, "users.view", true),
	(MODERATOR, "orders.view", true),
	(MODERATOR, "orders.refund", false),
	(MODERATOR, "tasks.approve", true),
	(MODERATOR, "disputes.resolve", true),
];


// vim: ts=4
