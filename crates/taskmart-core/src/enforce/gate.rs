//! Gate definitions and their pure decision functions
//!
//! Each `check_*` function decides one gate from already loaded inputs and
//! returns the `Denial` the client sees when it fails.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::prelude::*;
use crate::settings::cache::{resolve_flag, MissingFlag};
use taskmart_types::account_adapter::AccountStatus;
use taskmart_types::denial::Denial;
use taskmart_types::rbac::{
	has_all_permissions, has_any_permission, has_permission, AccountMode, Principal,
};
use taskmart_types::settings_tree::SettingsTree;

pub const TASK_GIVER_REQUIRE_VERIFICATION: &str = "modes.taskGiver.requireVerification";
pub const TASK_GIVER_MIN_BALANCE: &str = "modes.taskGiver.minBalance";
pub const TASK_DOER_REQUIRE_EMAIL: &str = "modes.taskDoer.requireEmailVerification";
pub const REQUIRE_EMAIL_VERIFICATION: &str = "security.requireEmailVerification";
pub const REQUIRE_2FA: &str = "security.require2FA";

/// Type-erased accessor returning the current usage counted against a limit
pub type UsageFn = Arc<
	dyn for<'a> Fn(&'a App, &'a Principal) -> Pin<Box<dyn Future<Output = ClResult<i64>> + Send + 'a>>
		+ Send
		+ Sync,
>;

#[derive(Clone)]
pub enum Gate {
	Permission(Box<str>),
	AnyPermission(Box<[Box<str>]>),
	AllPermissions(Box<[Box<str>]>),
	Feature { path: Box<str>, message: Option<Box<str>> },
	/// Switch of a whole route group (`features.<name>`)
	Module(Box<str>),
	Limit { path: Box<str>, usage: UsageFn, message: Option<Box<str>> },
	Mode(AccountMode),
	EmailVerified,
	TwoFactor,
}

impl Gate {
	pub fn needs_settings(&self) -> bool {
		!matches!(self, Gate::Permission(_) | Gate::AnyPermission(_) | Gate::AllPermissions(_))
	}

	pub fn needs_account(&self) -> bool {
		matches!(self, Gate::Mode(_) | Gate::EmailVerified)
	}
}

impl std::fmt::Debug for Gate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Gate::Permission(key) => f.debug_tuple("Permission").field(key).finish(),
			Gate::AnyPermission(keys) => f.debug_tuple("AnyPermission").field(keys).finish(),
			Gate::AllPermissions(keys) => f.debug_tuple("AllPermissions").field(keys).finish(),
			Gate::Feature { path, .. } => f.debug_tuple("Feature").field(path).finish(),
			Gate::Module(name) => f.debug_tuple("Module").field(name).finish(),
			Gate::Limit { path, .. } => f.debug_tuple("Limit").field(path).finish(),
			Gate::Mode(mode) => f.debug_tuple("Mode").field(mode).finish(),
			Gate::EmailVerified => f.write_str("EmailVerified"),
			Gate::TwoFactor => f.write_str("TwoFactor"),
		}
	}
}

/// Wrap an async closure into a `UsageFn`
pub fn usage_fn<F>(f: F) -> UsageFn
where
	F: for<'a> Fn(&'a App, &'a Principal) -> Pin<Box<dyn Future<Output = ClResult<i64>> + Send + 'a>>
		+ Send
		+ Sync
		+ 'static,
{
	Arc::new(f)
}

// Decisions //
//***********//

pub fn check_permission(principal: Option<&Principal>, key: &str) -> Result<(), Denial> {
	match principal {
		None => Err(Denial::unauthorized()),
		Some(_) if has_permission(principal, key) => Ok(()),
		Some(_) => Err(Denial::permission_denied(&[key])),
	}
}

pub fn check_any_permission(principal: Option<&Principal>, keys: &[Box<str>]) -> Result<(), Denial> {
	match principal {
		None => Err(Denial::unauthorized()),
		Some(_) if has_any_permission(principal, keys) => Ok(()),
		Some(_) => Err(Denial::permission_denied(keys)),
	}
}

pub fn check_all_permissions(
	principal: Option<&Principal>,
	keys: &[Box<str>],
) -> Result<(), Denial> {
	match principal {
		None => Err(Denial::unauthorized()),
		Some(_) if has_all_permissions(principal, keys) => Ok(()),
		Some(_) => Err(Denial::permission_denied(keys)),
	}
}

pub fn check_feature(
	tree: &SettingsTree,
	missing: MissingFlag,
	path: &str,
	message: Option<&str>,
) -> Result<(), Denial> {
	if resolve_flag(tree, path, missing) {
		Ok(())
	} else {
		Err(Denial::feature_disabled(path, message))
	}
}

/// A module is off when either `moduleEnabled` or the category-wide `enabled`
/// switch resolves false; the denial always names `moduleEnabled`.
pub fn check_module(tree: &SettingsTree, missing: MissingFlag, module: &str) -> Result<(), Denial> {
	let module_path = format!("features.{}.moduleEnabled", module);
	let enabled_path = format!("features.{}.enabled", module);
	if resolve_flag(tree, &module_path, missing) && resolve_flag(tree, &enabled_path, missing) {
		Ok(())
	} else {
		Err(Denial::feature_disabled(&module_path, None))
	}
}

pub fn check_limit(
	tree: &SettingsTree,
	path: &str,
	current: i64,
	message: Option<&str>,
) -> Result<(), Denial> {
	let limit = tree.int(path).unwrap_or(i64::MAX);
	if current >= limit {
		Err(Denial::limit_exceeded(limit, current, message))
	} else {
		Ok(())
	}
}

pub fn check_mode(
	tree: &SettingsTree,
	missing: MissingFlag,
	mode: AccountMode,
	account: &AccountStatus,
) -> Result<(), Denial> {
	match mode {
		AccountMode::TaskGiver => {
			if resolve_flag(tree, TASK_GIVER_REQUIRE_VERIFICATION, missing) && !account.verified {
				return Err(Denial::verification_required());
			}
			let min_balance = tree.number(TASK_GIVER_MIN_BALANCE).unwrap_or(0.0);
			if account.balance < min_balance {
				return Err(Denial::insufficient_balance(min_balance, account.balance));
			}
			Ok(())
		}
		AccountMode::TaskDoer => {
			if resolve_flag(tree, TASK_DOER_REQUIRE_EMAIL, missing) && !account.email_verified {
				return Err(Denial::email_verification_required());
			}
			Ok(())
		}
	}
}

pub fn check_email_verified(
	tree: &SettingsTree,
	missing: MissingFlag,
	account: &AccountStatus,
) -> Result<(), Denial> {
	if resolve_flag(tree, REQUIRE_EMAIL_VERIFICATION, missing) && !account.email_verified {
		Err(Denial::email_verification_required())
	} else {
		Ok(())
	}
}

pub fn check_two_factor(
	tree: &SettingsTree,
	missing: MissingFlag,
	principal: &Principal,
) -> Result<(), Denial> {
	if resolve_flag(tree, REQUIRE_2FA, missing) && !principal.two_factor_verified {
		Err(Denial::two_factor_required())
	} else {
		Ok(())
	}
}


// vim: ts=4
