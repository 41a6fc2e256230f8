//! Client-side counterparts of the Taskmart policy engine.
//!
//! `hint` mirrors the session token's permissions for UI decisions only;
//! the server re-checks every request. `settings` mirrors the settings tree
//! for the same purpose. `matrix` computes the minimal change
//! set the admin matrix editor submits.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod hint;
pub mod matrix;
pub mod settings;

mod prelude;

pub use hint::{ClientPermissionCache, MemorySessionStore, PermissionHint, SessionStore};
pub use matrix::{diff, settings_diff, MatrixEditor, PermissionMatrix, Submission};
pub use settings::ClientSettingsCache;
pub use taskmart_types::settings_tree::MissingFlag;

// vim: ts=4
