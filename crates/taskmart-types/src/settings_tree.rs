//! Nested settings tree addressed by dot-path
//!
//! `features.transactions.approveEnabled` walks the object keys `features`,
//! `transactions`, `approveEnabled`. A path that leaves the tree is reported
//! as `None`, which callers must keep distinct from a stored `false`.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsTree {
	root: Map<String, Value>,
}

impl SettingsTree {
	pub fn new(root: Map<String, Value>) -> Self {
		Self { root }
	}

	/// Build from a JSON value; anything but an object yields an empty tree
	pub fn from_value(value: Value) -> Self {
		match value {
			Value::Object(root) => Self { root },
			_ => Self::default(),
		}
	}

	/// Resolve a dot-path. Empty segments never match.
	pub fn lookup(&self, path: &str) -> Option<&Value> {
		let mut segments = path.split('.');
		let first = segments.next().filter(|s| !s.is_empty())?;
		let mut node = self.root.get(first)?;
		for segment in segments {
			if segment.is_empty() {
				return None;
			}
			node = node.as_object()?.get(segment)?;
		}
		Some(node)
	}

	/// `Some` only for boolean leaves
	pub fn flag(&self, path: &str) -> Option<bool> {
		self.lookup(path).and_then(Value::as_bool)
	}

	/// Integer leaves; floats are truncated toward zero
	pub fn int(&self, path: &str) -> Option<i64> {
		let value = self.lookup(path)?;
		#[allow(clippy::cast_possible_truncation)]
		value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
	}

	pub fn number(&self, path: &str) -> Option<f64> {
		self.lookup(path).and_then(Value::as_f64)
	}

	pub fn category(&self, name: &str) -> Option<&Value> {
		self.root.get(name)
	}

	pub fn categories(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.root.iter()
	}

	pub fn to_value(&self) -> Value {
		Value::Object(self.root.clone())
	}

	/// Deep-merge `patch` into the category `name`
	pub fn merge_category(&mut self, name: &str, patch: &Value) {
		let entry = self.root.entry(name.to_string()).or_insert(Value::Null);
		merge(entry, patch);
	}
}

/// How a flag whose path is absent from the tree is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFlag {
	#[default]
	Permit,
	Deny,
}

impl MissingFlag {
	pub fn resolve(self, value: Option<bool>) -> bool {
		value.unwrap_or(self == MissingFlag::Permit)
	}
}

impl FromStr for MissingFlag {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"permit" => Ok(MissingFlag::Permit),
			"deny" => Ok(MissingFlag::Deny),
			_ => Err(Error::ConfigError(format!("Invalid missing flag policy: {}", s))),
		}
	}
}

/// Flag value at `path`; a non-boolean leaf counts as missing
pub fn flag_value(tree: &SettingsTree, path: &str) -> Option<bool> {
	match tree.lookup(path)? {
		Value::Bool(flag) => Some(*flag),
		other => {
			warn!(path = path, value = %other, "Settings flag is not a boolean");
			None
		}
	}
}

/// Deep-merge `patch` into `base`.
///
/// Objects merge key by key; any other patch value replaces the base value.
pub fn merge(base: &mut Value, patch: &Value) {
	if let (Value::Object(base_map), Value::Object(patch_map)) = (&mut *base, patch) {
		for (key, value) in patch_map {
			merge(base_map.entry(key.clone()).or_insert(Value::Null), value);
		}
		return;
	}
	*base = patch.clone();
}


// vim: ts=4
