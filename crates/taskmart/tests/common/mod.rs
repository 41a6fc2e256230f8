#![allow(dead_code)]

use axum::{
	body::Body,
	http::{header, Method, Request, StatusCode},
	routing::get,
	Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use taskmart::{App, AppBuilder};
use taskmart_core::session::create_session;
use taskmart_core::testing::TEST_SECRET;
use taskmart_types::policy_adapter::{PolicyAdapter, RoleRef};
use taskmart_types::testing::MemoryStore;
use taskmart_types::types::UserId;

pub const ADMIN_USER: UserId = UserId(1);
pub const MODERATOR_USER: UserId = UserId(2);
pub const PLAIN_USER: UserId = UserId(3);

/// A stand-in domain module mounted as `tasks`
pub fn tasks_module() -> Router<App> {
	Router::new().route("/tasks", get(|| async { "tasks" }))
}

pub fn builder(store: &Arc<MemoryStore>) -> AppBuilder {
	let mut builder = AppBuilder::new();
	builder
		.jwt_secret(TEST_SECRET)
		.auto_refresh(false)
		.adapter(store.clone())
		.module("tasks", tasks_module());
	builder
}

pub async fn setup() -> (App, Router, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::new());
	let (app, router) = builder(&store).build().await.unwrap();

	for (user, role) in [(ADMIN_USER, "admin"), (MODERATOR_USER, "moderator")] {
		let role = store.read_role(RoleRef::Key(role)).await.unwrap();
		store.assign_user_role(user, role.id).await.unwrap();
	}
	(app, router, store)
}

pub async fn token(app: &App, user: UserId) -> String {
	create_session(app, user, None, false).await.unwrap().token.to_string()
}

pub async fn call(
	router: &Router,
	method: Method,
	uri: &str,
	token: Option<&str>,
	body: Option<Value>,
) -> (StatusCode, Value) {
	let mut req = Request::builder().method(method).uri(uri);
	if let Some(token) = token {
		req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
	}
	let req = match body {
		Some(body) => req
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap(),
		None => req.body(Body::empty()).unwrap(),
	};

	let res = router.clone().oneshot(req).await.unwrap();
	let status = res.status();
	let bytes = res.into_body().collect().await.unwrap().to_bytes();
	let value = serde_json::from_slice(&bytes)
		.unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
	(status, value)
}

// vim: ts=4
