//! Adapter that owns the durable settings tree.
//!
//! Settings are stored per top-level category (`features`, `limits`, ...)
//! as JSON subtrees.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::prelude::*;

#[async_trait]
pub trait SettingsAdapter: Debug + Send + Sync {
	/// Read every stored category
	async fn read_settings(&self) -> ClResult<Map<String, Value>>;

	async fn read_category(&self, category: &str) -> ClResult<Option<Value>>;

	/// Replace a category subtree
	async fn write_category(&self, category: &str, value: &Value) -> ClResult<()>;
}

// vim: ts=4
