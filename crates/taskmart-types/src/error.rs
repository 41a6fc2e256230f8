//! Error type and the JSON error contract
//!
//! Every failure leaves the server as
//! `{ "success": false, "code": "...", "message": "...", ...context }`.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde_json::{Map, Value};

use crate::denial::Denial;

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	Unauthorized,
	DbError,
	ValidationError(String),
	ConfigError(String),
	/// A backing store (policy store, settings tree) could not be reached
	Upstream(String),
	Internal(String),
	/// A gate rejected the request
	Denied(Denial),

	// externals
	Io(std::io::Error),
	Json(serde_json::Error),
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::PermissionDenied => StatusCode::FORBIDDEN,
			Error::Unauthorized => StatusCode::UNAUTHORIZED,
			Error::ValidationError(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
			Error::DbError | Error::Upstream(_) => StatusCode::BAD_GATEWAY,
			Error::Denied(denial) => denial.status(),
			Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	pub fn code(&self) -> &'static str {
		match self {
			Error::NotFound => "NOT_FOUND",
			Error::PermissionDenied => "PERMISSION_DENIED",
			Error::Unauthorized => "UNAUTHORIZED",
			Error::ValidationError(_) | Error::Json(_) => "VALIDATION_ERROR",
			Error::DbError | Error::Upstream(_) => "UPSTREAM_ERROR",
			Error::Denied(denial) => denial.code.as_str(),
			Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => "INTERNAL_ERROR",
		}
	}

	/// Render the error body
	pub fn to_body(&self) -> Value {
		let mut body = Map::new();
		body.insert("success".into(), Value::Bool(false));
		body.insert("code".into(), Value::from(self.code()));
		let message = match self {
			Error::NotFound => "Not found".to_string(),
			Error::PermissionDenied => "Permission denied".to_string(),
			Error::Unauthorized => "Authentication required".to_string(),
			Error::ValidationError(msg) => msg.clone(),
			Error::Json(err) => format!("Invalid JSON: {}", err),
			Error::DbError => "Storage unavailable".to_string(),
			Error::Upstream(msg) => msg.clone(),
			Error::Denied(denial) => denial.message.clone(),
			// Internal details stay in the logs
			Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				"Internal server error".to_string()
			}
		};
		body.insert("message".into(), Value::from(message));
		if let Error::Denied(denial) = self {
			for (key, value) in &denial.context {
				body.insert(key.clone(), value.clone());
			}
		}
		Value::Object(body)
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Json(err)
	}
}

impl From<Denial> for Error {
	fn from(denial: Denial) -> Self {
		Self::Denied(denial)
	}
}

#[cfg(feature = "server")]
impl From<jsonwebtoken::errors::Error> for Error {
	fn from(err: jsonwebtoken::errors::Error) -> Self {
		tracing::debug!("JWT error: {}", err);
		Self::Unauthorized
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::Denied(denial) => write!(f, "{}", denial),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "config error: {}", msg),
			Error::Upstream(msg) => write!(f, "upstream error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
			Error::Json(err) => write!(f, "json error: {}", err),
			_ => write!(f, "{:?}", self),
		}
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			tracing::warn!(code = self.code(), "Request failed: {}", self);
		}
		(status, Json(self.to_body())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_denial_body_flattens_context() {
		let err = Error::Denied(Denial::feature_disabled("features.tasks.moduleEnabled", None));
		let body = err.to_body();
		assert_eq!(body["success"], false);
		assert_eq!(body["code"], "FEATURE_DISABLED");
		assert_eq!(body["feature"], "features.tasks.moduleEnabled");
		assert_eq!(err.status(), StatusCode::FORBIDDEN);
	}

	#[test]
	fn test_internal_details_are_hidden() {
		let body = Error::Internal("secret path /var/db".into()).to_body();
		assert_eq!(body["code"], "INTERNAL_ERROR");
		assert_eq!(body["message"], "Internal server error");
	}

	#[test]
	fn test_store_outage_is_upstream() {
		assert_eq!(Error::DbError.status(), StatusCode::BAD_GATEWAY);
		assert_eq!(Error::Upstream("down".into()).code(), "UPSTREAM_ERROR");
	}
}

// vim: ts=4
