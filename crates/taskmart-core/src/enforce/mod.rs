//! Request enforcement: feature flags, limits, account requirements and
//! permission gates.

pub mod gate;
pub mod middleware;
pub mod password;
pub mod pipeline;

pub use gate::{usage_fn, Gate, UsageFn};
pub use middleware::{check_gates, require_feature, require_module, require_permission};
pub use password::{check_password, enforce_password_policy, PasswordCheck, PasswordPolicy};
pub use pipeline::GatePipeline;

// vim: ts=4
