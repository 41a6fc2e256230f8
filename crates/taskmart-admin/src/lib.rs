//! Admin control plane: role/permission matrix and settings management

pub mod control;
pub mod handler;
pub mod settings;

mod prelude;

// vim: ts=4
