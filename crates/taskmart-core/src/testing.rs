//! Test helpers: an app wired to the in-memory store

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use crate::app::{Adapters, AppBuilderOpts, AppState};
use crate::prelude::*;
use crate::settings::SettingsRegistry;
use taskmart_types::rbac::Principal;
use taskmart_types::testing::MemoryStore;

pub const TEST_SECRET: &str = "test-secret-0123456789abcdef";

pub async fn test_app() -> (App, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::new());
	let mut registry = SettingsRegistry::new();
	crate::register_settings(&mut registry).unwrap();

	let opts = AppBuilderOpts { jwt_secret: TEST_SECRET.into(), auto_refresh: false, ..Default::default() };
	let adapters =
		Adapters { policy: store.clone(), settings: store.clone(), account: store.clone() };
	let app = AppState::new(opts, adapters, registry.freeze()).unwrap();
	(app, store)
}

pub fn principal(roles: &[&str], permissions: &[&str]) -> Principal {
	Principal {
		user_id: UserId(7),
		roles: roles.iter().map(|r| (*r).into()).collect(),
		permissions: permissions.iter().map(|p| (*p).into()).collect(),
		mode: None,
		two_factor_verified: false,
	}
}

// vim: ts=4
