//! Taskmart policy engine server.
//!
//! Wires the adapters, caches and enforcement middleware into one axum
//! application:
//!
//! - role/permission matrix with per-mode overrides
//! - runtime feature flags, limits and account requirements
//! - admin control plane for the matrix and the settings tree
//! - session tokens carrying materialized permissions

// Re-export shared types and adapter traits
pub use taskmart_types::account_adapter;
pub use taskmart_types::error;
pub use taskmart_types::policy_adapter;
pub use taskmart_types::settings_adapter;
pub use taskmart_types::types;

pub use taskmart_admin as admin;
pub use taskmart_core::enforce;
pub use taskmart_core::session;
pub use taskmart_core::settings;

// Local modules
pub mod app;
pub mod bootstrap;
pub mod handler;
pub mod prelude;
pub mod routes;
pub mod webserver;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
