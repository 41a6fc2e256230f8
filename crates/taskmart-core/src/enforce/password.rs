//! Password policy checks
//!
//! The policy lives at `security.passwordPolicy`. Every violated rule is
//! reported, not just the first one.

use serde::{Deserialize, Serialize};

use crate::prelude::*;
use taskmart_types::denial::Denial;

pub const PASSWORD_POLICY_PATH: &str = "security.passwordPolicy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordPolicy {
	pub min_length: u32,
	pub require_uppercase: bool,
	pub require_lowercase: bool,
	pub require_number: bool,
	pub require_special: bool,
}

impl Default for PasswordPolicy {
	fn default() -> Self {
		Self {
			min_length: 8,
			require_uppercase: true,
			require_lowercase: true,
			require_number: true,
			require_special: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCheck {
	pub valid: bool,
	pub errors: Vec<String>,
}

impl PasswordCheck {
	/// `Err(PASSWORD_POLICY_VIOLATION)` when any rule failed
	pub fn into_result(self) -> ClResult<()> {
		if self.valid {
			Ok(())
		} else {
			Err(Denial::password_policy(self.errors).into())
		}
	}
}

pub fn enforce_password_policy(password: &str, policy: &PasswordPolicy) -> PasswordCheck {
	let mut errors = Vec::new();

	if password.chars().count() < policy.min_length as usize {
		errors.push(format!("Password must be at least {} characters long", policy.min_length));
	}
	if policy.require_uppercase && !password.chars().any(char::is_uppercase) {
		errors.push("Password must contain an uppercase letter".to_string());
	}
	if policy.require_lowercase && !password.chars().any(char::is_lowercase) {
		errors.push("Password must contain a lowercase letter".to_string());
	}
	if policy.require_number && !password.chars().any(|c| c.is_ascii_digit()) {
		errors.push("Password must contain a number".to_string());
	}
	if policy.require_special && !password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace())
	{
		errors.push("Password must contain a special character".to_string());
	}

	PasswordCheck { valid: errors.is_empty(), errors }
}

/// Check a password against the currently configured policy
pub async fn check_password(app: &App, password: &str) -> ClResult<PasswordCheck> {
	let policy = app.settings_cache.get_policy(PASSWORD_POLICY_PATH, PasswordPolicy::default()).await?;
	Ok(enforce_password_policy(password, &policy))
}


// vim: ts=4
