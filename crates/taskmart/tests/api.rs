mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{call, setup, token, ADMIN_USER, MODERATOR_USER, PLAIN_USER};
use taskmart_types::account_adapter::AccountStatus;
use taskmart_types::policy_adapter::{PolicyAdapter, RoleRef};
use taskmart_types::settings_adapter::SettingsAdapter;

fn row<'a>(rows: &'a Value, key: &str) -> &'a Value {
	rows.as_array()
		.unwrap()
		.iter()
		.find(|row| row["permissionKey"] == key && row["mode"] == "all")
		.unwrap()
}

#[tokio::test]
async fn test_disabled_module_is_rejected() {
	let (app, router, store) = setup().await;
	let token = token(&app, PLAIN_USER).await;

	let (status, body) = call(&router, Method::GET, "/api/tasks", Some(&token), None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, "tasks");

	store.write_category("features", &json!({ "tasks": { "enabled": false } })).await.unwrap();
	app.settings_cache.invalidate();

	let (status, body) = call(&router, Method::GET, "/api/tasks", Some(&token), None).await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["success"], false);
	assert_eq!(body["code"], "FEATURE_DISABLED");
	assert_eq!(body["feature"], "features.tasks.moduleEnabled");
}

#[tokio::test]
async fn test_module_flag_needs_no_token() {
	let (app, router, store) = setup().await;
	store.write_category("features", &json!({ "tasks": { "moduleEnabled": false } })).await.unwrap();
	app.settings_cache.invalidate();

	let (status, body) = call(&router, Method::GET, "/api/tasks", None, None).await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["code"], "FEATURE_DISABLED");
}

#[tokio::test]
async fn test_bulk_update_then_read_back() {
	let (app, router, _store) = setup().await;
	let token = token(&app, ADMIN_USER).await;

	let (status, body) =
		call(&router, Method::GET, "/api/roles/admin/permissions", Some(&token), None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(row(&body["data"]["permissions"], "users.ban")["allow"], false);

	let updates = json!({ "updates": [{ "role": "admin", "permissionKey": "users.ban", "allow": true }] });
	let (status, body) = call(
		&router,
		Method::POST,
		"/api/admin/permissions/bulk-update",
		Some(&token),
		Some(updates.clone()),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["updated"], 1);

	let (_, body) =
		call(&router, Method::GET, "/api/roles/admin/permissions", Some(&token), None).await;
	assert_eq!(row(&body["data"]["permissions"], "users.ban")["allow"], true);

	// Applying the same batch again changes nothing
	let (_, body) = call(
		&router,
		Method::POST,
		"/api/admin/permissions/bulk-update",
		Some(&token),
		Some(updates),
	)
	.await;
	assert_eq!(body["data"]["updated"], 0);
}

#[tokio::test]
async fn test_bulk_update_rejects_unknown_keys() {
	let (app, router, _store) = setup().await;
	let token = token(&app, ADMIN_USER).await;

	let updates = json!({ "updates": [
		{ "role": "moderator", "permissionKey": "users.ban", "allow": true },
		{ "role": "moderator", "permissionKey": "no.such.permission", "allow": true }
	] });
	let (status, body) = call(
		&router,
		Method::POST,
		"/api/admin/permissions/bulk-update",
		Some(&token),
		Some(updates),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["code"], "VALIDATION_ERROR");

	let (_, body) =
		call(&router, Method::GET, "/api/roles/moderator/permissions", Some(&token), None).await;
	let rows = body["data"]["permissions"].as_array().unwrap();
	assert!(!rows.iter().any(|row| row["permissionKey"] == "users.ban"));
}

#[tokio::test]
async fn test_single_upsert_with_mode() {
	let (app, router, _store) = setup().await;
	let token = token(&app, ADMIN_USER).await;

	let body = json!({ "permissionKey": "tasks.create", "mode": "taskGiver", "allow": true });
	let (status, res) =
		call(&router, Method::POST, "/api/roles/moderator/permissions", Some(&token), Some(body))
			.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(res["data"]["mode"], "taskGiver");
	assert_eq!(res["data"]["allow"], true);

	let body = json!({ "permissionKey": "tasks.create", "mode": "all", "allow": true });
	let (status, res) =
		call(&router, Method::POST, "/api/roles/nobody/permissions", Some(&token), Some(body)).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(res["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_authentication_and_permission_errors() {
	let (app, router, _store) = setup().await;

	let (status, body) = call(&router, Method::GET, "/api/roles", None, None).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["code"], "UNAUTHORIZED");

	let (status, _) = call(&router, Method::GET, "/api/roles", Some("not-a-token"), None).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let plain = token(&app, PLAIN_USER).await;
	let (status, body) = call(&router, Method::GET, "/api/roles", Some(&plain), None).await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["code"], "PERMISSION_DENIED");
	assert_eq!(body["required"], json!(["rbac.view"]));

	// Moderators may look at the matrix but not edit it
	let moderator = token(&app, MODERATOR_USER).await;
	let (status, body) =
		call(&router, Method::GET, "/api/admin/permissions/matrix", Some(&moderator), None).await;
	assert_eq!(status, StatusCode::OK);
	assert!(body["data"]["roles"].as_array().unwrap().len() >= 3);

	let (status, _) =
		call(&router, Method::POST, "/api/rbac/cache/clear", Some(&moderator), None).await;
	assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_refresh_picks_up_new_grants() {
	let (app, router, store) = setup().await;
	store.put_account(AccountStatus {
		user_id: MODERATOR_USER,
		verified: false,
		email_verified: true,
		balance: 0.0,
	});
	let admin = token(&app, ADMIN_USER).await;
	let moderator = token(&app, MODERATOR_USER).await;

	let (_, body) = call(&router, Method::GET, "/api/me/permissions", Some(&moderator), None).await;
	let permissions = body["data"]["permissions"].as_array().unwrap().clone();
	assert!(!permissions.contains(&json!("orders.refund")));

	let updates =
		json!({ "updates": [{ "role": "moderator", "permissionKey": "orders.refund", "allow": true }] });
	let (status, _) = call(
		&router,
		Method::POST,
		"/api/admin/permissions/bulk-update",
		Some(&admin),
		Some(updates),
	)
	.await;
	assert_eq!(status, StatusCode::OK);

	let (status, body) = call(
		&router,
		Method::POST,
		"/api/auth/refresh",
		Some(&moderator),
		Some(json!({ "mode": "taskDoer" })),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["mode"], "taskDoer");
	let refreshed = body["data"]["token"].as_str().unwrap().to_string();

	let (_, body) = call(&router, Method::GET, "/api/me/permissions", Some(&refreshed), None).await;
	let permissions = body["data"]["permissions"].as_array().unwrap();
	assert!(permissions.contains(&json!("orders.refund")));
	assert_eq!(body["data"]["mode"], "taskDoer");
}

#[tokio::test]
async fn test_mode_switch_checks_account_requirements() {
	let (app, router, store) = setup().await;
	store.put_account(AccountStatus {
		user_id: PLAIN_USER,
		verified: false,
		email_verified: false,
		balance: 0.0,
	});
	let token = token(&app, PLAIN_USER).await;

	let (status, body) = call(
		&router,
		Method::POST,
		"/api/auth/refresh",
		Some(&token),
		Some(json!({ "mode": "taskGiver" })),
	)
	.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["code"], "VERIFICATION_REQUIRED");

	let (status, body) = call(
		&router,
		Method::POST,
		"/api/auth/refresh",
		Some(&token),
		Some(json!({ "mode": "taskDoer" })),
	)
	.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["code"], "EMAIL_VERIFICATION_REQUIRED");

	// Verified but below the configured minimum balance
	store.put_account(AccountStatus {
		user_id: PLAIN_USER,
		verified: true,
		email_verified: true,
		balance: 5.0,
	});
	store.write_category("modes", &json!({ "taskGiver": { "minBalance": 20 } })).await.unwrap();
	app.settings_cache.invalidate();
	let (status, body) = call(
		&router,
		Method::POST,
		"/api/auth/refresh",
		Some(&token),
		Some(json!({ "mode": "taskGiver" })),
	)
	.await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["code"], "INSUFFICIENT_BALANCE");

	store.put_account(AccountStatus {
		user_id: PLAIN_USER,
		verified: true,
		email_verified: true,
		balance: 25.0,
	});
	let (status, body) = call(
		&router,
		Method::POST,
		"/api/auth/refresh",
		Some(&token),
		Some(json!({ "mode": "taskGiver" })),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["mode"], "taskGiver");

	// Refreshing without a mode keeps the token's mode and needs no account check
	let (status, _) = call(&router, Method::POST, "/api/auth/refresh", Some(&token), None).await;
	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_settings_update_and_reset() {
	let (app, router, _store) = setup().await;
	let admin = token(&app, ADMIN_USER).await;
	let moderator = token(&app, MODERATOR_USER).await;

	let patch = json!({ "maxTasksPerUser": 25 });
	let (status, body) =
		call(&router, Method::PUT, "/api/settings/limits", Some(&admin), Some(patch.clone())).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["maxTasksPerUser"], 25);
	assert_eq!(body["data"]["maxBidsPerTask"], 50);
	assert_eq!(app.settings_cache.get_limit("limits.maxTasksPerUser", 0).await.unwrap(), 25);

	let fractional = json!({ "maxTasksPerUser": 2.9 });
	let (status, body) =
		call(&router, Method::PUT, "/api/settings/limits", Some(&admin), Some(fractional)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["code"], "VALIDATION_ERROR");
	assert_eq!(app.settings_cache.get_limit("limits.maxTasksPerUser", 0).await.unwrap(), 25);

	let (status, _) =
		call(&router, Method::PUT, "/api/settings/limits", Some(&moderator), Some(patch)).await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let (status, body) =
		call(&router, Method::GET, "/api/settings/limits", Some(&moderator), None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["maxTasksPerUser"], 25);

	let (status, body) =
		call(&router, Method::DELETE, "/api/settings/limits", Some(&admin), None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["maxTasksPerUser"], 10);

	let (status, _) =
		call(&router, Method::GET, "/api/settings/unknown", Some(&admin), None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_password_check_is_public() {
	let (_app, router, _store) = setup().await;

	let (status, body) = call(
		&router,
		Method::POST,
		"/api/auth/password/check",
		None,
		Some(json!({ "password": "short" })),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["valid"], false);
	assert!(!body["data"]["errors"].as_array().unwrap().is_empty());

	let (_, body) = call(
		&router,
		Method::POST,
		"/api/auth/password/check",
		None,
		Some(json!({ "password": "Sufficient1" })),
	)
	.await;
	assert_eq!(body["data"]["valid"], true);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
	let (app, router, _store) = setup().await;
	let token = token(&app, ADMIN_USER).await;

	let (_, body) = call(&router, Method::GET, "/api/roles", Some(&token), None).await;
	assert!(body["reqId"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_restart_keeps_matrix_edits() {
	let (app, _router, store) = setup().await;
	let role = store.read_role(RoleRef::Key("admin")).await.unwrap();
	let permission = store.read_permission("users.ban").await.unwrap();
	store
		.upsert_role_permission(role.id, permission.id, taskmart_types::rbac::Mode::All, true)
		.await
		.unwrap();
	drop(app);

	let (app, _router) = common::builder(&store).build().await.unwrap();
	let rows = app.permission_cache.get(role.id).await.unwrap();
	let row = rows.iter().find(|row| row.permission_key.as_ref() == "users.ban").unwrap();
	assert!(row.allow);
}

// vim: ts=4
