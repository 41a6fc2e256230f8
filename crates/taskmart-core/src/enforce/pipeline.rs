//! Ordered gate composition
//!
//! A pipeline takes at most one settings snapshot and one account read per
//! request, evaluates its gates in order and stops at the first denial.

use std::sync::Arc;

use super::gate::{self, Gate, UsageFn};
use crate::prelude::*;
use taskmart_types::account_adapter::AccountStatus;
use taskmart_types::denial::Denial;
use taskmart_types::rbac::{AccountMode, Principal};
use taskmart_types::settings_tree::SettingsTree;

#[derive(Clone, Debug, Default)]
pub struct GatePipeline {
	gates: Vec<Gate>,
}

impl GatePipeline {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn gate(mut self, gate: Gate) -> Self {
		self.gates.push(gate);
		self
	}

	pub fn permission(self, key: &str) -> Self {
		self.gate(Gate::Permission(key.into()))
	}

	pub fn any_permission(self, keys: &[&str]) -> Self {
		self.gate(Gate::AnyPermission(keys.iter().map(|k| (*k).into()).collect()))
	}

	pub fn all_permissions(self, keys: &[&str]) -> Self {
		self.gate(Gate::AllPermissions(keys.iter().map(|k| (*k).into()).collect()))
	}

	pub fn feature(self, path: &str, message: Option<&str>) -> Self {
		self.gate(Gate::Feature { path: path.into(), message: message.map(Into::into) })
	}

	pub fn module(self, name: &str) -> Self {
		self.gate(Gate::Module(name.into()))
	}

	pub fn limit(self, path: &str, usage: UsageFn, message: Option<&str>) -> Self {
		self.gate(Gate::Limit { path: path.into(), usage, message: message.map(Into::into) })
	}

	pub fn mode(self, mode: AccountMode) -> Self {
		self.gate(Gate::Mode(mode))
	}

	pub fn email_verified(self) -> Self {
		self.gate(Gate::EmailVerified)
	}

	pub fn two_factor(self) -> Self {
		self.gate(Gate::TwoFactor)
	}

	pub fn gates(&self) -> &[Gate] {
		&self.gates
	}

	pub fn is_empty(&self) -> bool {
		self.gates.is_empty()
	}

	/// Evaluate every gate; store failures are returned, never treated as a pass
	pub async fn check(&self, app: &App, principal: Option<&Principal>) -> ClResult<()> {
		let tree = if self.gates.iter().any(Gate::needs_settings) {
			Some(app.settings_cache.snapshot().await?)
		} else {
			None
		};
		let missing = app.settings_cache.missing_flag();
		let mut account: Option<AccountStatus> = None;

		for gate in &self.gates {
			let decision = match gate {
				Gate::Permission(key) => gate::check_permission(principal, key),
				Gate::AnyPermission(keys) => gate::check_any_permission(principal, keys),
				Gate::AllPermissions(keys) => gate::check_all_permissions(principal, keys),
				Gate::Feature { path, message } => {
					gate::check_feature(settings(tree.as_ref())?, missing, path, message.as_deref())
				}
				Gate::Module(name) => gate::check_module(settings(tree.as_ref())?, missing, name),
				Gate::Limit { path, usage, message } => match principal {
					Some(p) => {
						let current = (**usage)(app, p).await?;
						gate::check_limit(settings(tree.as_ref())?, path, current, message.as_deref())
					}
					None => Err(Denial::unauthorized()),
				},
				Gate::Mode(mode) => match principal {
					Some(p) => {
						let status = load_account(app, p, &mut account).await?;
						gate::check_mode(settings(tree.as_ref())?, missing, *mode, &status)
					}
					None => Err(Denial::unauthorized()),
				},
				Gate::EmailVerified => match principal {
					Some(p) => {
						let status = load_account(app, p, &mut account).await?;
						gate::check_email_verified(settings(tree.as_ref())?, missing, &status)
					}
					None => Err(Denial::unauthorized()),
				},
				Gate::TwoFactor => match principal {
					Some(p) => gate::check_two_factor(settings(tree.as_ref())?, missing, p),
					None => Err(Denial::unauthorized()),
				},
			};

			if let Err(denial) = decision {
				warn!(
					subject = ?principal.map(|p| p.user_id.0),
					gate = ?gate,
					code = %denial.code,
					"Request denied"
				);
				return Err(Error::Denied(denial));
			}
		}

		Ok(())
	}
}

fn settings(tree: Option<&Arc<SettingsTree>>) -> ClResult<&SettingsTree> {
	tree.map(|tree| &**tree)
		.ok_or_else(|| Error::Internal("settings snapshot not loaded".into()))
}

async fn load_account(
	app: &App,
	principal: &Principal,
	slot: &mut Option<AccountStatus>,
) -> ClResult<AccountStatus> {
	if let Some(status) = slot {
		return Ok(status.clone());
	}
	let status = app.account_adapter.read_account_status(principal.user_id).await?;
	*slot = Some(status.clone());
	Ok(status)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::enforce::gate::usage_fn;
	use crate::testing::{principal, test_app};
	use serde_json::json;
	use taskmart_types::denial::DenialCode;
	use taskmart_types::settings_adapter::SettingsAdapter;

	#[tokio::test]
	async fn test_first_failure_wins() {
		let (app, store) = test_app().await;
		store
			.write_category("features", &json!({ "tasks": { "enabled": false } }))
			.await
			.unwrap();
		let user = principal(&["moderator"], &[]);

		let pipeline = GatePipeline::new().module("tasks").permission("tasks.create");
		let Err(Error::Denied(denial)) = pipeline.check(&app, Some(&user)).await else {
			panic!("expected denial");
		};
		assert_eq!(denial.code, DenialCode::FeatureDisabled);

		let pipeline = GatePipeline::new().permission("tasks.create").module("tasks");
		let Err(Error::Denied(denial)) = pipeline.check(&app, Some(&user)).await else {
			panic!("expected denial");
		};
		assert_eq!(denial.code, DenialCode::PermissionDenied);
	}

	#[tokio::test]
	async fn test_one_snapshot_per_check() {
		let (app, store) = test_app().await;
		app.settings_cache.invalidate();
		let before = store.settings_reads();

		let pipeline = GatePipeline::new()
			.feature("features.orders.enabled", None)
			.module("orders")
			.two_factor();
		pipeline.check(&app, Some(&principal(&[], &[]))).await.unwrap();
		assert_eq!(store.settings_reads(), before + 1);
	}

	#[tokio::test]
	async fn test_permission_only_pipeline_skips_settings() {
		let (app, store) = test_app().await;
		store.set_offline(true);

		let pipeline = GatePipeline::new().permission("orders.view");
		pipeline.check(&app, Some(&principal(&[], &["orders.view"]))).await.unwrap();
	}

	#[tokio::test]
	async fn test_store_failure_fails_closed() {
		let (app, store) = test_app().await;
		app.settings_cache.invalidate();
		store.set_offline(true);

		let res = GatePipeline::new().feature("features.x.y", None).check(&app, None).await;
		assert!(matches!(res, Err(Error::DbError)));
	}

	#[tokio::test]
	async fn test_limit_uses_accessor() {
		let (app, store) = test_app().await;
		store.write_category("limits", &json!({ "maxTasksPerUser": 2 })).await.unwrap();
		app.settings_cache.refresh().await.unwrap();
		let usage = usage_fn(|_app, principal| {
			let current = principal.user_id.0;
			Box::pin(async move { Ok(current) })
		});
		let pipeline = GatePipeline::new().limit("limits.maxTasksPerUser", usage, None);

		let mut user = principal(&[], &[]);
		user.user_id = UserId(1);
		pipeline.check(&app, Some(&user)).await.unwrap();

		user.user_id = UserId(2);
		let Err(err) = pipeline.check(&app, Some(&user)).await else {
			panic!("expected denial");
		};
		assert_eq!(err.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);
	}

	#[tokio::test]
	async fn test_mode_gates_use_account_status() {
		let (app, store) = test_app().await;
		store.put_account(AccountStatus {
			user_id: UserId(7),
			verified: true,
			email_verified: false,
			balance: 0.0,
		});
		let user = principal(&[], &[]);

		let pipeline = GatePipeline::new().mode(AccountMode::TaskGiver).email_verified();
		pipeline.check(&app, Some(&user)).await.unwrap();

		let pipeline = GatePipeline::new().mode(AccountMode::TaskDoer);
		let Err(Error::Denied(denial)) = pipeline.check(&app, Some(&user)).await else {
			panic!("expected denial");
		};
		assert_eq!(denial.code, DenialCode::EmailVerificationRequired);
	}

	#[tokio::test]
	async fn test_unauthenticated_requirement_gates() {
		let (app, _store) = test_app().await;
		for pipeline in [
			GatePipeline::new().mode(AccountMode::TaskDoer),
			GatePipeline::new().email_verified(),
			GatePipeline::new().two_factor(),
			GatePipeline::new().permission("orders.view"),
		] {
			let Err(err) = pipeline.check(&app, None).await else {
				panic!("expected denial");
			};
			assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
		}
	}
}

// vim: ts=4
