//! Role/permission matrix access: the read-through permission cache and
//! the built-in catalog seeded at bootstrap.

pub mod cache;
pub mod catalog;

pub use cache::PermissionCache;

// vim: ts=4
