//! Taskmart server configured from the environment
//!
//! `LISTEN`, `DB_DIR`, `JWT_SECRET`, `MISSING_FLAG` (`permit`/`deny`) and
//! `BOOTSTRAP_ADMIN` (user id granted `super_admin`).
//!
//! `basic-server token <user_id> [taskGiver|taskDoer]` prints a session
//! token for a user instead of starting the server.

use std::{env, path, sync::Arc};

use taskmart::prelude::*;
use taskmart::session::create_session;
use taskmart::settings::MissingFlag;
use taskmart::AppBuilder;
use taskmart_policy_adapter_sqlite::PolicyAdapterSqlite;

pub struct Config {
	pub listen: String,
	pub db_dir: path::PathBuf,
	pub jwt_secret: String,
	pub missing_flag: MissingFlag,
	pub bootstrap_admin: Option<UserId>,
}

impl Config {
	fn from_env() -> ClResult<Self> {
		let missing_flag = match env::var("MISSING_FLAG") {
			Ok(value) => value.parse()?,
			Err(_) => MissingFlag::default(),
		};
		let bootstrap_admin = match env::var("BOOTSTRAP_ADMIN") {
			Ok(value) => Some(UserId(value.parse().map_err(|_| {
				Error::ConfigError(format!("BOOTSTRAP_ADMIN is not a user id: {}", value))
			})?)),
			Err(_) => None,
		};
		let jwt_secret = env::var("JWT_SECRET")
			.map_err(|_| Error::ConfigError("JWT_SECRET must be set".to_string()))?;

		Ok(Config {
			listen: env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
			db_dir: path::PathBuf::from(env::var("DB_DIR").unwrap_or_else(|_| "./data".to_string())),
			jwt_secret,
			missing_flag,
			bootstrap_admin,
		})
	}
}

async fn builder(config: &Config) -> ClResult<AppBuilder> {
	let store = Arc::new(PolicyAdapterSqlite::new(&config.db_dir).await?);

	let mut builder = AppBuilder::new();
	builder
		.listen(config.listen.as_str())
		.jwt_secret(config.jwt_secret.as_str())
		.missing_flag(config.missing_flag)
		.adapter(store);
	if let Some(user_id) = config.bootstrap_admin {
		builder.bootstrap_admin(user_id);
	}
	Ok(builder)
}

async fn print_token(config: &Config, args: &[String]) -> ClResult<()> {
	let Some(user_id) = args.first().and_then(|id| id.parse().ok()).map(UserId) else {
		return Err(Error::ConfigError("usage: token <user_id> [taskGiver|taskDoer]".to_string()));
	};
	let mode = match args.get(1) {
		Some(mode) => Some(serde_json::from_value(serde_json::Value::from(mode.as_str()))?),
		None => None,
	};

	let mut builder = builder(config).await?;
	builder.auto_refresh(false);
	let (app, _router) = builder.build().await?;
	let session = create_session(&app, user_id, mode, false).await?;
	println!("{}", session.token);
	Ok(())
}

#[tokio::main]
async fn main() -> ClResult<()> {
	let config = Config::from_env()?;
	let args: Vec<String> = env::args().skip(1).collect();

	match args.first().map(String::as_str) {
		Some("token") => print_token(&config, &args[1..]).await,
		Some(cmd) => Err(Error::ConfigError(format!("unknown command: {}", cmd))),
		None => builder(&config).await?.run().await,
	}
}

// vim: ts=4
