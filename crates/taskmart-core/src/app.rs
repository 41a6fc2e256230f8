//! App state type

use std::sync::Arc;

use crate::prelude::*;
use crate::rbac::PermissionCache;
use crate::session::{TokenKeys, TOKEN_EXPIRY};
use crate::settings::{FrozenSettingsRegistry, MissingFlag, SettingsCache, SettingsService};

use taskmart_types::account_adapter::AccountAdapter;
use taskmart_types::policy_adapter::PolicyAdapter;
use taskmart_types::settings_adapter::SettingsAdapter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub opts: AppBuilderOpts,

	pub policy_adapter: Arc<dyn PolicyAdapter>,
	pub settings_adapter: Arc<dyn SettingsAdapter>,
	pub account_adapter: Arc<dyn AccountAdapter>,

	pub token_keys: TokenKeys,
	pub permission_cache: PermissionCache,

	// Settings subsystem
	pub settings: SettingsService,
	pub settings_cache: Arc<SettingsCache>,
	pub settings_registry: Arc<FrozenSettingsRegistry>,
}

pub type App = Arc<AppState>;

impl AppState {
	pub fn new(
		opts: AppBuilderOpts,
		adapters: Adapters,
		registry: FrozenSettingsRegistry,
	) -> ClResult<App> {
		let token_keys = TokenKeys::from_secret(opts.jwt_secret.as_bytes())?;
		let registry = Arc::new(registry);
		let settings_cache = Arc::new(SettingsCache::new(
			adapters.settings.clone(),
			registry.clone(),
			opts.missing_flag,
		));
		let settings =
			SettingsService::new(registry.clone(), settings_cache.clone(), adapters.settings.clone());
		let permission_cache =
			PermissionCache::new(adapters.policy.clone(), opts.permission_cache_size);

		Ok(Arc::new(AppState {
			opts,
			policy_adapter: adapters.policy,
			settings_adapter: adapters.settings,
			account_adapter: adapters.account,
			token_keys,
			permission_cache,
			settings,
			settings_cache,
			settings_registry: registry,
		}))
	}

	/// Stop background tasks owned by the state
	pub fn shutdown(&self) {
		self.settings_cache.stop_auto_refresh();
	}
}

impl std::fmt::Debug for AppState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AppState")
			.field("opts", &self.opts)
			.field("permission_cache", &self.permission_cache)
			.field("settings_cache", &self.settings_cache)
			.finish_non_exhaustive()
	}
}

pub struct Adapters {
	pub policy: Arc<dyn PolicyAdapter>,
	pub settings: Arc<dyn SettingsAdapter>,
	pub account: Arc<dyn AccountAdapter>,
}

pub struct AppBuilderOpts {
	pub listen: Box<str>,
	pub jwt_secret: Box<str>,
	/// How unset feature flags are read
	pub missing_flag: MissingFlag,
	/// Session token lifetime in seconds
	pub token_expiry: i64,
	pub permission_cache_size: usize,
	/// Keep the settings snapshot warm in the background
	pub auto_refresh: bool,
	/// User granted `super_admin` at startup
	pub bootstrap_admin: Option<UserId>,
}

impl Default for AppBuilderOpts {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:8080".into(),
			jwt_secret: Box::default(),
			missing_flag: MissingFlag::default(),
			token_expiry: TOKEN_EXPIRY,
			permission_cache_size: 256,
			auto_refresh: true,
			bootstrap_admin: None,
		}
	}
}

impl std::fmt::Debug for AppBuilderOpts {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AppBuilderOpts")
			.field("listen", &self.listen)
			.field("missing_flag", &self.missing_flag)
			.field("token_expiry", &self.token_expiry)
			.field("permission_cache_size", &self.permission_cache_size)
			.field("auto_refresh", &self.auto_refresh)
			.field("bootstrap_admin", &self.bootstrap_admin)
			.finish_non_exhaustive()
	}
}

// vim: ts=4
