//! Settings subsystem: category registry, snapshot cache and write service

pub mod cache;
pub mod service;
pub mod types;

pub use cache::{MissingFlag, SettingsCache};
pub use service::SettingsService;
pub use types::{
	CategoryDefinition, CategoryDefinitionBuilder, FrozenSettingsRegistry, SettingsRegistry,
};

// vim: ts=4
