//! Axum middleware wrapping a `GatePipeline`

use axum::{
	extract::{Request, State},
	middleware::Next,
	response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::pipeline::GatePipeline;
use crate::extract::OptionalAuth;
use crate::prelude::*;

pub type GateCheckOutput = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send>>;

/// Middleware factory evaluating `pipeline` before the inner handler
///
/// Mount with `axum::middleware::from_fn_with_state(app, check_gates(..))`
/// inside the auth middleware so the principal is already resolved.
pub fn check_gates(
	pipeline: GatePipeline,
) -> impl Fn(State<App>, OptionalAuth, Request, Next) -> GateCheckOutput + Clone + use<> {
	let pipeline = Arc::new(pipeline);
	move |State(app): State<App>, OptionalAuth(principal): OptionalAuth, req: Request, next: Next| {
		let pipeline = pipeline.clone();
		Box::pin(async move {
			pipeline.check(&app, principal.as_ref()).await?;
			Ok(next.run(req).await)
		})
	}
}

pub fn require_feature(
	path: &str,
	message: Option<&str>,
) -> impl Fn(State<App>, OptionalAuth, Request, Next) -> GateCheckOutput + Clone + use<> {
	check_gates(GatePipeline::new().feature(path, message))
}

pub fn require_module(
	name: &str,
) -> impl Fn(State<App>, OptionalAuth, Request, Next) -> GateCheckOutput + Clone + use<> {
	check_gates(GatePipeline::new().module(name))
}

pub fn require_permission(
	key: &str,
) -> impl Fn(State<App>, OptionalAuth, Request, Next) -> GateCheckOutput + Clone + use<> {
	check_gates(GatePipeline::new().permission(key))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::extract::Auth;
	use crate::testing::{principal, test_app};
	use axum::{body::Body, http::StatusCode, routing::get, Router};
	use http_body_util::BodyExt;
	use serde_json::{json, Value};
	use taskmart_types::rbac::Principal;
	use taskmart_types::settings_adapter::SettingsAdapter;
	use tower::ServiceExt;

	fn router(app: &App, pipeline: GatePipeline, principal: Option<Principal>) -> Router {
		Router::new()
			.route("/tasks", get(|| async { "ok" }))
			.layer(axum::middleware::from_fn_with_state(app.clone(), check_gates(pipeline)))
			.layer(axum::middleware::from_fn(move |mut req: Request, next: Next| {
				let principal = principal.clone();
				async move {
					if let Some(p) = principal {
						req.extensions_mut().insert(Auth(p));
					}
					next.run(req).await
				}
			}))
			.with_state(app.clone())
	}

	async fn call(router: Router) -> (StatusCode, Value) {
		let res = router
			.oneshot(Request::builder().uri("/tasks").body(Body::empty()).unwrap())
			.await
			.unwrap();
		let status = res.status();
		let bytes = res.into_body().collect().await.unwrap().to_bytes();
		(status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
	}

	#[tokio::test]
	async fn test_disabled_module_renders_feature_disabled() {
		let (app, store) = test_app().await;
		store
			.write_category("features", &json!({ "tasks": { "enabled": false } }))
			.await
			.unwrap();
		app.settings_cache.refresh().await.unwrap();

		let user = principal(&["moderator"], &["tasks.create"]);
		let (status, body) = call(router(&app, GatePipeline::new().module("tasks"), Some(user))).await;

		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["success"], false);
		assert_eq!(body["code"], "FEATURE_DISABLED");
		assert_eq!(body["feature"], "features.tasks.moduleEnabled");
	}

	#[tokio::test]
	async fn test_passing_gates_reach_handler() {
		let (app, _store) = test_app().await;
		let user = principal(&["moderator"], &["tasks.create"]);
		let pipeline = GatePipeline::new().module("tasks").permission("tasks.create");

		let (status, _) = call(router(&app, pipeline, Some(user))).await;
		assert_eq!(status, StatusCode::OK);
	}

	#[tokio::test]
	async fn test_permission_denied_and_unauthenticated() {
		let (app, _store) = test_app().await;
		let pipeline = GatePipeline::new().permission("orders.refund");

		let user = principal(&["moderator"], &["orders.view"]);
		let (status, body) = call(router(&app, pipeline.clone(), Some(user))).await;
		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["code"], "PERMISSION_DENIED");
		assert_eq!(body["required"], json!(["orders.refund"]));

		let (status, body) = call(router(&app, pipeline, None)).await;
		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert_eq!(body["code"], "UNAUTHORIZED");
	}

	#[tokio::test]
	async fn test_store_outage_is_upstream_error() {
		let (app, store) = test_app().await;
		app.settings_cache.invalidate();
		store.set_offline(true);

		let (status, body) =
			call(router(&app, GatePipeline::new().feature("features.orders.enabled", None), None))
				.await;
		assert_eq!(status, StatusCode::BAD_GATEWAY);
		assert_eq!(body["code"], "UPSTREAM_ERROR");
	}
}

// vim: ts=4
