//! Settings endpoints

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use serde_json::Value;

use crate::prelude::*;
use taskmart_core::extract::{Auth, OptionalRequestId};
use taskmart_types::types::ApiResponse;

type ApiResult<T> = ClResult<(StatusCode, Json<ApiResponse<T>>)>;

/// GET /settings - the effective tree
pub async fn get_settings(
	State(app): State<App>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ApiResult<Value> {
	let tree = app.settings.list().await?;
	let response = ApiResponse::new(tree.to_value()).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

pub async fn get_settings_category(
	State(app): State<App>,
	Path(category): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ApiResult<Value> {
	let value = app.settings.get_category(&category).await?;
	let response = ApiResponse::new(value).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// PUT /settings/{category} - deep-merge the body into the category
pub async fn put_settings_category(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(category): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(patch): Json<Value>,
) -> ApiResult<Value> {
	let value = app.settings.update_category(&auth, &category, &patch).await?;
	let response = ApiResponse::new(value).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

/// DELETE /settings/{category} - back to registered defaults
pub async fn delete_settings_category(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(category): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ApiResult<Value> {
	let value = app.settings.reset_category(&auth, &category).await?;
	let response = ApiResponse::new(value).with_req_id(req_id.unwrap_or_default());
	Ok((StatusCode::OK, Json(response)))
}

// vim: ts=4
