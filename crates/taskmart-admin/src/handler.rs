//! RBAC endpoints: catalog, per-role rows, matrix view and bulk updates

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use serde::Serialize;

use crate::control;
use crate::prelude::*;
use taskmart_core::extract::{Auth, OptionalRequestId};
use taskmart_types::admin_types::{
	BulkUpdateRequest, BulkUpdateResponse, MatrixRow, UpsertRolePermission,
};
use taskmart_types::policy_adapter::RoleRef;
use taskmart_types::rbac::{Permission, Role, RolePermission};
use taskmart_types::types::ApiResponse;

type ApiResult<T> = ClResult<(StatusCode, Json<ApiResponse<T>>)>;

fn ok<T>(data: T, req_id: Option<String>) -> ApiResult<T> {
	Ok((StatusCode::OK, Json(ApiResponse::new(data).with_req_id(req_id.unwrap_or_default()))))
}

pub async fn list_roles(
	State(app): State<App>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ApiResult<Vec<Role>> {
	ok(app.policy_adapter.list_roles().await?, req_id)
}

pub async fn list_permissions(
	State(app): State<App>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ApiResult<Vec<Permission>> {
	ok(app.policy_adapter.list_permissions().await?, req_id)
}

#[derive(Debug, Serialize)]
pub struct RolePermissionsView {
	pub role: Role,
	pub permissions: Vec<RolePermission>,
}

/// GET /roles/{role}/permissions, `role` is an id or a key
pub async fn get_role_permissions(
	State(app): State<App>,
	Path(role): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ApiResult<RolePermissionsView> {
	let role = app.policy_adapter.read_role(RoleRef::parse(&role)).await?;
	let rows = app.permission_cache.get(role.id).await?;
	ok(RolePermissionsView { role, permissions: rows.to_vec() }, req_id)
}

pub async fn post_role_permission(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(role): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(body): Json<UpsertRolePermission>,
) -> ApiResult<RolePermission> {
	let row = control::apply_single_upsert(
		&app,
		RoleRef::parse(&role),
		&body.permission_key,
		body.mode,
		body.allow,
	)
	.await?;
	info!(subject = %auth.user_id, role = %role, permission = %body.permission_key, "Role permission set");
	ok(row, req_id)
}

#[derive(Debug, Serialize)]
pub struct MatrixView {
	pub roles: Vec<Role>,
	pub permissions: Vec<MatrixRow>,
}

pub async fn get_matrix(
	State(app): State<App>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ApiResult<MatrixView> {
	let (roles, permissions) = control::load_matrix(&app).await?;
	ok(MatrixView { roles, permissions }, req_id)
}

pub async fn post_bulk_update(
	State(app): State<App>,
	Auth(auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(body): Json<BulkUpdateRequest>,
) -> ApiResult<BulkUpdateResponse> {
	let updated = control::apply_bulk_update(&app, &body.updates).await?;
	info!(subject = %auth.user_id, updated = updated, "Bulk permission update applied");
	ok(BulkUpdateResponse { updated }, req_id)
}

#[derive(Debug, Serialize)]
pub struct CacheCleared {
	pub cleared: bool,
}

/// Drop both server-side caches
pub async fn post_cache_clear(
	State(app): State<App>,
	Auth(auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ApiResult<CacheCleared> {
	app.permission_cache.invalidate_all();
	app.settings_cache.invalidate();
	info!(subject = %auth.user_id, "RBAC caches cleared");
	ok(CacheCleared { cleared: true }, req_id)
}

// vim: ts=4
