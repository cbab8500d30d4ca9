pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::{ArchestraClient, SharedClient};
pub use config::settings::{ProviderSettings, SettingsFile};
pub use crate::core::ArchestraProvider;
pub use domain::model::{AttributeMap, ConfigValue, Diagnostics, ProviderConfig};
pub use utils::error::{ProviderError, Result};
