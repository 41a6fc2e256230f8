//! Session endpoints: principal view, token refresh, password check

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::prelude::*;
use taskmart_core::enforce::password::{check_password, PasswordCheck};
use taskmart_core::extract::{Auth, OptionalRequestId};
use taskmart_core::GatePipeline;
use taskmart_core::session::{create_session, Session};
use taskmart_types::rbac::AccountMode;
use taskmart_types::types::ApiResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalView {
	pub user_id: UserId,
	pub roles: BTreeSet<Box<str>>,
	pub permissions: BTreeSet<Box<str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mode: Option<AccountMode>,
	pub two_factor_verified: bool,
}

/// GET /me/permissions
pub async fn get_me_permissions(
	Auth(auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<PrincipalView>>)> {
	let view = PrincipalView {
		user_id: auth.user_id,
		roles: auth.roles,
		permissions: auth.permissions,
		mode: auth.mode,
		two_factor_verified: auth.two_factor_verified,
	};
	Ok((StatusCode::OK, Json(ApiResponse::new(view).with_req_id(req_id.unwrap_or_default()))))
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
	/// Switch the active account mode; omitted keeps the current one
	#[serde(default)]
	pub mode: Option<AccountMode>,
}

/// POST /auth/refresh
///
/// Re-materializes the caller's permissions into a fresh token, picking up
/// matrix edits made since the old token was issued. Switching to a mode
/// passes that mode's account requirements first.
pub async fn post_auth_refresh(
	State(app): State<App>,
	Auth(auth): Auth,
	OptionalRequestId(req_id): OptionalRequestId,
	body: Option<Json<RefreshRequest>>,
) -> ClResult<(StatusCode, Json<ApiResponse<Session>>)> {
	let Json(body) = body.unwrap_or_default();
	if let Some(mode) = body.mode {
		GatePipeline::new().mode(mode).check(&app, Some(&auth)).await?;
	}
	let mode = body.mode.or(auth.mode);
	let session = create_session(&app, auth.user_id, mode, auth.two_factor_verified).await?;
	info!(subject = %auth.user_id, "Session refreshed");
	Ok((StatusCode::OK, Json(ApiResponse::new(session).with_req_id(req_id.unwrap_or_default()))))
}

#[derive(Debug, Deserialize)]
pub struct PasswordCheckRequest {
	pub password: String,
}

/// POST /auth/password/check
pub async fn post_password_check(
	State(app): State<App>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(body): Json<PasswordCheckRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<PasswordCheck>>)> {
	let check = check_password(&app, &body.password).await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(check).with_req_id(req_id.unwrap_or_default()))))
}

// vim: ts=4
