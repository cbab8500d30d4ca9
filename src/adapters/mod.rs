pub mod http;

#[cfg(feature = "plugin")]
pub mod plugin;
