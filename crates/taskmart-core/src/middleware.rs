//! Authentication and request-id middlewares

use axum::{
	extract::{Request, State},
	http::{header, HeaderMap, HeaderValue},
	middleware::Next,
	response::Response,
};

use crate::extract::{Auth, RequestId};
use crate::prelude::*;
use crate::session;

const REQUEST_ID_HEADER: &str = "x-request-id";

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	headers
		.get(header::AUTHORIZATION)
		.and_then(|h| h.to_str().ok())
		.and_then(|h| h.strip_prefix("Bearer "))
		.map(str::trim)
		.filter(|token| !token.is_empty())
}

/// Reject requests without a valid session token
pub async fn require_auth(
	State(app): State<App>,
	mut req: Request,
	next: Next,
) -> ClResult<Response> {
	let token = bearer_token(req.headers()).ok_or(Error::Unauthorized)?;
	let principal = session::validate_token(&app.token_keys, token)?;

	req.extensions_mut().insert(Auth(principal));
	Ok(next.run(req).await)
}

/// Attach the principal when a token is present; an invalid token is still rejected
pub async fn optional_auth(
	State(app): State<App>,
	mut req: Request,
	next: Next,
) -> ClResult<Response> {
	if let Some(token) = bearer_token(req.headers()) {
		let principal = session::validate_token(&app.token_keys, token)?;
		req.extensions_mut().insert(Auth(principal));
	}

	Ok(next.run(req).await)
}

/// Reuse the caller's `X-Request-Id` or assign a fresh one, and echo it back
pub async fn request_id(mut req: Request, next: Next) -> Response {
	let req_id = req
		.headers()
		.get(REQUEST_ID_HEADER)
		.and_then(|h| h.to_str().ok())
		.filter(|id| !id.is_empty() && id.len() <= 64)
		.map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

	req.extensions_mut().insert(RequestId(req_id.clone()));
	let mut res = next.run(req).await;
	if let Ok(value) = HeaderValue::from_str(&req_id) {
		res.headers_mut().insert(REQUEST_ID_HEADER, value);
	}
	res
}


// vim: ts=4
