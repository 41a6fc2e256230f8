//! Enforcement denials
//!
//! A [`Denial`] is the terminal outcome of a failing gate. It carries a
//! machine-readable code, a human message and extra context fields that are
//! flattened into the JSON error body.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

/// Machine-readable denial codes consumed by the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialCode {
	FeatureDisabled,
	LimitExceeded,
	PasswordPolicyViolation,
	VerificationRequired,
	InsufficientBalance,
	EmailVerificationRequired,
	TwoFactorRequired,
	PermissionDenied,
	Unauthorized,
}

impl DenialCode {
	pub fn as_str(self) -> &'static str {
		match self {
			DenialCode::FeatureDisabled => "FEATURE_DISABLED",
			DenialCode::LimitExceeded => "LIMIT_EXCEEDED",
			DenialCode::PasswordPolicyViolation => "PASSWORD_POLICY_VIOLATION",
			DenialCode::VerificationRequired => "VERIFICATION_REQUIRED",
			DenialCode::InsufficientBalance => "INSUFFICIENT_BALANCE",
			DenialCode::EmailVerificationRequired => "EMAIL_VERIFICATION_REQUIRED",
			DenialCode::TwoFactorRequired => "TWO_FACTOR_REQUIRED",
			DenialCode::PermissionDenied => "PERMISSION_DENIED",
			DenialCode::Unauthorized => "UNAUTHORIZED",
		}
	}

	pub fn status(self) -> StatusCode {
		match self {
			DenialCode::LimitExceeded => StatusCode::TOO_MANY_REQUESTS,
			DenialCode::PasswordPolicyViolation => StatusCode::BAD_REQUEST,
			DenialCode::Unauthorized => StatusCode::UNAUTHORIZED,
			DenialCode::FeatureDisabled
			| DenialCode::VerificationRequired
			| DenialCode::InsufficientBalance
			| DenialCode::EmailVerificationRequired
			| DenialCode::TwoFactorRequired
			| DenialCode::PermissionDenied => StatusCode::FORBIDDEN,
		}
	}
}

impl std::fmt::Display for DenialCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A failed gate decision
#[derive(Debug, Clone, PartialEq)]
pub struct Denial {
	pub code: DenialCode,
	pub message: String,
	pub context: Map<String, Value>,
}

impl Denial {
	pub fn new(code: DenialCode, message: impl Into<String>) -> Self {
		Self { code, message: message.into(), context: Map::new() }
	}

	/// Attach a context field (rendered next to `code` and `message`)
	pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.context.insert(key.to_string(), value.into());
		self
	}

	pub fn status(&self) -> StatusCode {
		self.code.status()
	}

	pub fn feature_disabled(feature: &str, message: Option<&str>) -> Self {
		Self::new(DenialCode::FeatureDisabled, message.unwrap_or("This feature is currently disabled"))
			.with("feature", feature)
	}

	pub fn limit_exceeded(limit: i64, current: i64, message: Option<&str>) -> Self {
		Self::new(DenialCode::LimitExceeded, message.unwrap_or("Limit exceeded"))
			.with("limit", limit)
			.with("current", current)
	}

	pub fn password_policy(errors: Vec<String>) -> Self {
		Self::new(DenialCode::PasswordPolicyViolation, "Password does not meet the policy")
			.with("errors", errors)
	}

	pub fn verification_required() -> Self {
		Self::new(DenialCode::VerificationRequired, "Account verification is required")
	}

	pub fn insufficient_balance(required: f64, balance: f64) -> Self {
		Self::new(DenialCode::InsufficientBalance, "Insufficient balance")
			.with("required", required)
			.with("balance", balance)
	}

	pub fn email_verification_required() -> Self {
		Self::new(DenialCode::EmailVerificationRequired, "Email verification is required")
	}

	pub fn two_factor_required() -> Self {
		Self::new(DenialCode::TwoFactorRequired, "Two-factor authentication is required")
	}

	pub fn permission_denied<S: AsRef<str>>(keys: &[S]) -> Self {
		let keys: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
		Self::new(DenialCode::PermissionDenied, "Permission denied").with("required", keys)
	}

	pub fn unauthorized() -> Self {
		Self::new(DenialCode::Unauthorized, "Authentication required")
	}
}

impl std::fmt::Display for Denial {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.code, self.message)
	}
}


// vim: ts=4
