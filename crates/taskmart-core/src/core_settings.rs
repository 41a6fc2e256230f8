//! Built-in settings categories
//!
//! Registers `features`, `limits`, `security` and `modes` with the defaults
//! the enforcement gates read.

use serde_json::{json, Value};

use crate::enforce::password::PasswordPolicy;
use crate::prelude::*;
use crate::settings::{CategoryDefinition, SettingsRegistry};

pub fn register_settings(registry: &mut SettingsRegistry) -> ClResult<()> {
	// Feature flags start empty: an unset flag follows the missing-flag policy
	registry.register(
		CategoryDefinition::builder("features")
			.description("Feature flags and module switches")
			.validator(validate_features)
			.build()?,
	)?;

	registry.register(
		CategoryDefinition::builder("limits")
			.description("Per-user quotas")
			.defaults(json!({
				"maxTasksPerUser": 10,
				"maxBidsPerTask": 50,
				"maxOpenDisputes": 3
			}))
			.validator(validate_limits)
			.build()?,
	)?;

	registry.register(
		CategoryDefinition::builder("security")
			.description("Password policy and account security requirements")
			.defaults(json!({
				"passwordPolicy": PasswordPolicy::default(),
				"requireEmailVerification": false,
				"require2FA": false
			}))
			.validator(validate_security)
			.build()?,
	)?;

	registry.register(
		CategoryDefinition::builder("modes")
			.description("Requirements for operating as task giver or task doer")
			.defaults(json!({
				"taskGiver": { "requireVerification": true, "minBalance": 0 },
				"taskDoer": { "requireEmailVerification": true }
			}))
			.build()?,
	)?;

	Ok(())
}

fn validate_features(value: &Value) -> ClResult<()> {
	let Some(modules) = value.as_object() else {
		return Err(Error::ValidationError("features must be an object".into()));
	};
	for (module, flags) in modules {
		if !flags.is_object() {
			return Err(Error::ValidationError(format!("features.{} must be an object", module)));
		}
	}
	Ok(())
}

fn validate_limits(value: &Value) -> ClResult<()> {
	let Some(limits) = value.as_object() else {
		return Err(Error::ValidationError("limits must be an object".into()));
	};
	for (name, limit) in limits {
		// Quotas are counts; a fractional value would be truncated on read
		if limit.as_u64().is_none() {
			return Err(Error::ValidationError(format!(
				"limits.{} must be a non-negative integer",
				name
			)));
		}
	}
	Ok(())
}

fn validate_security(value: &Value) -> ClResult<()> {
	if let Some(policy) = value.get("passwordPolicy") {
		serde_json::from_value::<PasswordPolicy>(policy.clone()).map_err(|err| {
			Error::ValidationError(format!("Invalid security.passwordPolicy: {}", err))
		})?;
	}
	for flag in ["requireEmailVerification", "require2FA"] {
		if value.get(flag).is_some_and(|v| !v.is_boolean()) {
			return Err(Error::ValidationError(format!("security.{} must be a boolean", flag)));
		}
	}
	Ok(())
}


// vim: ts=4
