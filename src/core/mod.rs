pub mod docs;
pub mod lifecycle;
pub mod provider;

pub use crate::domain::ports::{ConfigProvider, DataSource, Resource};
pub use crate::utils::error::Result;
pub use provider::ArchestraProvider;
