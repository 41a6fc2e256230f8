use axum::{
	middleware::{from_fn, from_fn_with_state},
	routing::{delete, get, post, put},
	Router,
};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::prelude::*;
use taskmart_admin::{handler as admin, settings};
use taskmart_core::enforce::middleware::{require_module, require_permission};
use taskmart_core::middleware::{optional_auth, request_id, require_auth};
use taskmart_core::rbac::catalog::{RBAC_MANAGE, RBAC_VIEW, SETTINGS_VIEW};

fn init_protected(app: &App) -> Router<App> {
	let rbac_view = Router::new()
		.route("/api/roles", get(admin::list_roles))
		.route("/api/permissions", get(admin::list_permissions))
		.route("/api/roles/{role}/permissions", get(admin::get_role_permissions))
		.route("/api/admin/permissions/matrix", get(admin::get_matrix))
		.route_layer(from_fn_with_state(app.clone(), require_permission(RBAC_VIEW)));

	let rbac_manage = Router::new()
		.route("/api/roles/{role}/permissions", post(admin::post_role_permission))
		.route("/api/admin/permissions/bulk-update", post(admin::post_bulk_update))
		.route("/api/rbac/cache/clear", post(admin::post_cache_clear))
		.route_layer(from_fn_with_state(app.clone(), require_permission(RBAC_MANAGE)));

	let settings_view = Router::new()
		.route("/api/settings", get(settings::get_settings))
		.route("/api/settings/{category}", get(settings::get_settings_category))
		.route_layer(from_fn_with_state(app.clone(), require_permission(SETTINGS_VIEW)));

	// Each category carries its own manage permission, checked by the service
	let settings_manage = Router::new()
		.route("/api/settings/{category}", put(settings::put_settings_category))
		.route("/api/settings/{category}", delete(settings::delete_settings_category));

	let session = Router::new()
		.route("/api/me/permissions", get(handler::get_me_permissions))
		.route("/api/auth/refresh", post(handler::post_auth_refresh));

	Router::new()
		.merge(rbac_view)
		.merge(rbac_manage)
		.merge(settings_view)
		.merge(settings_manage)
		.merge(session)
		.route_layer(from_fn_with_state(app.clone(), require_auth))
}

fn init_public(app: &App) -> Router<App> {
	Router::new()
		.route("/api/auth/password/check", post(handler::post_password_check))
		.route_layer(from_fn_with_state(app.clone(), optional_auth))
}

/// Domain route groups, each switched off by its `features.<name>` flags
fn init_modules(app: &App, modules: Vec<(Box<str>, Router<App>)>) -> Router<App> {
	let mut router = Router::new();
	for (name, module) in modules {
		debug!("Mounting module {}", name);
		router = router.merge(
			module
				.route_layer(from_fn_with_state(app.clone(), require_module(&name)))
				.route_layer(from_fn_with_state(app.clone(), optional_auth)),
		);
	}
	router
}

pub fn init(app: App, modules: Vec<(Box<str>, Router<App>)>) -> Router {
	let mut router = Router::new().merge(init_public(&app)).merge(init_protected(&app));
	if !modules.is_empty() {
		router = router.nest("/api", init_modules(&app, modules));
	}

	router.layer(from_fn(request_id)).layer(TraceLayer::new_for_http()).with_state(app)
}

// vim: ts=4
