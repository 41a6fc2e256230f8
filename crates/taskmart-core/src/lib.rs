//! Core infrastructure for the Taskmart authorization layer.
//!
//! Holds the application state, session tokens, the permission and settings
//! caches, and the enforcement middleware that every route group is wrapped
//! with. Feature crates (admin, server) build on top of it.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod cache;
pub mod core_settings;
pub mod enforce;
pub mod extract;
pub mod middleware;
pub mod prelude;
pub mod rbac;
pub mod session;
pub mod settings;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use app::{Adapters, App, AppBuilderOpts, AppState};
pub use enforce::{Gate, GatePipeline};
pub use extract::{Auth, OptionalAuth, OptionalRequestId, RequestId};

pub fn register_settings(
	registry: &mut settings::SettingsRegistry,
) -> taskmart_types::error::ClResult<()> {
	core_settings::register_settings(registry)
}

// vim: ts=4
