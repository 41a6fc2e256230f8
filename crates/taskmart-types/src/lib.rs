//! Shared types, adapter traits, and the pure policy evaluator for Taskmart.
//!
//! This crate contains the foundational types that are shared between the
//! server crates, the persistence adapters and the client-side helpers.
//! Keeping them here lets adapter crates compile without pulling in the
//! web stack.

pub mod account_adapter;
pub mod admin_types;
pub mod denial;
pub mod error;
pub mod policy_adapter;
pub mod prelude;
pub mod rbac;
pub mod settings_adapter;
pub mod settings_tree;
pub mod types;

#[cfg(feature = "testing")]
pub mod testing;

// vim: ts=4
