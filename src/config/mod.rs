pub mod settings;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

#[cfg(feature = "cli")]
mod cli {
    use crate::domain::ports::ConfigProvider;
    use clap::{Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "terraform-provider-archestra")]
    #[command(about = "Terraform provider for Archestra", version)]
    pub struct CliConfig {
        #[command(subcommand)]
        pub command: Command,

        #[arg(long, global = true, help = "Path to a provider.toml settings file")]
        pub config: Option<PathBuf>,

        #[arg(long, global = true, help = "Archestra API base URL")]
        pub base_url: Option<String>,

        #[arg(long, global = true, help = "Archestra API key")]
        pub api_key: Option<String>,

        #[arg(long, global = true, help = "Enable verbose output")]
        pub verbose: bool,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Serve the Terraform plugin protocol (requires the `plugin` feature).
        Serve,
        /// Print the provider, resource and data source schemas as JSON.
        Schema,
        /// Generate Markdown reference documentation.
        Docs {
            #[arg(long, default_value = "./docs")]
            out: PathBuf,
        },
        /// Import a resource by id and print its state.
        Read {
            /// Full resource type name, e.g. archestra_token_price.
            type_name: String,
            id: String,
        },
        /// Verify the configuration and that the API is reachable.
        Check,
    }

    impl ConfigProvider for CliConfig {
        fn base_url(&self) -> Option<&str> {
            self.base_url.as_deref()
        }

        fn api_key(&self) -> Option<&str> {
            self.api_key.as_deref()
        }
    }

}
