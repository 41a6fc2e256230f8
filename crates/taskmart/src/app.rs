//! App builder - constructs and runs the Taskmart application

use axum::Router;
use std::{future::Future, pin::Pin, sync::Arc};

use crate::prelude::*;
use crate::{bootstrap, routes, webserver};
pub use taskmart_core::app::{Adapters, App, AppBuilderOpts, AppState, VERSION};
use taskmart_core::settings::{MissingFlag, SettingsRegistry};
use taskmart_types::account_adapter::AccountAdapter;
use taskmart_types::policy_adapter::PolicyAdapter;
use taskmart_types::settings_adapter::SettingsAdapter;

/// Type alias for async initialization callbacks
type InitCallback =
	Box<dyn FnOnce(App) -> Pin<Box<dyn Future<Output = ClResult<()>> + Send>> + Send>;

pub struct AppBuilder {
	opts: AppBuilderOpts,
	policy_adapter: Option<Arc<dyn PolicyAdapter>>,
	settings_adapter: Option<Arc<dyn SettingsAdapter>>,
	account_adapter: Option<Arc<dyn AccountAdapter>>,
	modules: Vec<(Box<str>, Router<App>)>,
	on_init: Vec<InitCallback>,
}

impl AppBuilder {
	pub fn new() -> Self {
		// A second builder in the same process keeps the first subscriber
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.try_init();
		AppBuilder {
			opts: AppBuilderOpts::default(),
			policy_adapter: None,
			settings_adapter: None,
			account_adapter: None,
			modules: Vec::new(),
			on_init: Vec::new(),
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn jwt_secret(&mut self, secret: impl Into<Box<str>>) -> &mut Self {
		self.opts.jwt_secret = secret.into();
		self
	}
	pub fn missing_flag(&mut self, missing_flag: MissingFlag) -> &mut Self {
		self.opts.missing_flag = missing_flag;
		self
	}
	pub fn token_expiry(&mut self, seconds: i64) -> &mut Self {
		self.opts.token_expiry = seconds;
		self
	}
	pub fn permission_cache_size(&mut self, size: usize) -> &mut Self {
		self.opts.permission_cache_size = size;
		self
	}
	pub fn auto_refresh(&mut self, enabled: bool) -> &mut Self {
		self.opts.auto_refresh = enabled;
		self
	}
	pub fn bootstrap_admin(&mut self, user_id: UserId) -> &mut Self {
		self.opts.bootstrap_admin = Some(user_id);
		self
	}

	// Adapters
	pub fn policy_adapter(&mut self, adapter: Arc<dyn PolicyAdapter>) -> &mut Self {
		self.policy_adapter = Some(adapter);
		self
	}
	pub fn settings_adapter(&mut self, adapter: Arc<dyn SettingsAdapter>) -> &mut Self {
		self.settings_adapter = Some(adapter);
		self
	}
	pub fn account_adapter(&mut self, adapter: Arc<dyn AccountAdapter>) -> &mut Self {
		self.account_adapter = Some(adapter);
		self
	}
	/// Use one store for policy, settings and account access
	pub fn adapter<A>(&mut self, adapter: Arc<A>) -> &mut Self
	where
		A: PolicyAdapter + SettingsAdapter + AccountAdapter + 'static,
	{
		self.policy_adapter = Some(adapter.clone());
		self.settings_adapter = Some(adapter.clone());
		self.account_adapter = Some(adapter);
		self
	}

	/// Mount a domain route group under `/api`, switched by `features.<name>`
	pub fn module(&mut self, name: impl Into<Box<str>>, router: Router<App>) -> &mut Self {
		self.modules.push((name.into(), router));
		self
	}

	/// Register an async callback that runs after the App is created and bootstrapped
	pub fn on_init<F, Fut>(&mut self, f: F) -> &mut Self
	where
		F: FnOnce(App) -> Fut + Send + 'static,
		Fut: Future<Output = ClResult<()>> + Send + 'static,
	{
		self.on_init.push(Box::new(move |app| Box::pin(f(app))));
		self
	}

	/// Create the state, bootstrap the catalog and assemble the router
	pub async fn build(self) -> ClResult<(App, Router)> {
		let Some(policy) = self.policy_adapter else {
			error!("FATAL: No policy adapter configured");
			return Err(Error::ConfigError("No policy adapter configured".to_string()));
		};
		let Some(settings) = self.settings_adapter else {
			error!("FATAL: No settings adapter configured");
			return Err(Error::ConfigError("No settings adapter configured".to_string()));
		};
		let Some(account) = self.account_adapter else {
			error!("FATAL: No account adapter configured");
			return Err(Error::ConfigError("No account adapter configured".to_string()));
		};

		let mut settings_registry = SettingsRegistry::new();
		taskmart_core::register_settings(&mut settings_registry)?;
		info!("Registered {} settings categories", settings_registry.len());

		let auto_refresh = self.opts.auto_refresh;
		let app = AppState::new(
			self.opts,
			Adapters { policy, settings, account },
			settings_registry.freeze(),
		)?;

		bootstrap::bootstrap(&app).await.inspect_err(|err| {
			error!("FATAL: Bootstrap failed: {}", err);
		})?;

		// Fail early when the settings store is unreachable
		app.settings_cache.snapshot().await?;
		if auto_refresh {
			app.settings_cache.start_auto_refresh();
		}

		for callback in self.on_init {
			callback(app.clone()).await?;
		}

		let router = routes::init(app.clone(), self.modules);
		Ok((app, router))
	}

	pub async fn run(self) -> ClResult<()> {
		info!(" _____         _                          _");
		info!("|_   _|_ _ ___| | ___ __ ___   __ _ _ __| |_");
		info!("  | |/ _` / __| |/ / '_ ` _ \\ / _` | '__| __|");
		info!("  | | (_| \\__ \\   <| | | | | | (_| | |  | |_");
		info!("  |_|\\__,_|___/_|\\_\\_| |_| |_|\\__,_|_|   \\__|");
		info!("V{}", VERSION);

		let (app, router) = self.build().await?;
		let res = webserver::serve(&app.opts.listen, router).await;
		app.shutdown();
		res
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
