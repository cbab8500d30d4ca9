use clap::Parser;
use reqwest::StatusCode;
use terraform_provider_archestra::config::Command;
use terraform_provider_archestra::core::{docs, ConfigProvider};
use terraform_provider_archestra::utils::error::ErrorSeverity;
use terraform_provider_archestra::utils::logger;
use terraform_provider_archestra::{
    ArchestraProvider, CliConfig, Diagnostics, ProviderError, ProviderSettings, SettingsFile,
};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if matches!(config.command, Command::Serve) {
        logger::init_plugin_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config.command);

    let provider = ArchestraProvider::new(env!("CARGO_PKG_VERSION"));
    if let Err(err) = run(&config, provider).await {
        let exit_code = match err.downcast_ref::<ProviderError>() {
            Some(e) => {
                tracing::error!(
                    "❌ {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());

                match e.severity() {
                    ErrorSeverity::Low => 0,
                    ErrorSeverity::Medium => 2,
                    ErrorSeverity::High => 1,
                    ErrorSeverity::Critical => 3,
                }
            }
            None => {
                tracing::error!("❌ {:#}", err);
                eprintln!("❌ {:#}", err);
                1
            }
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(config: &CliConfig, provider: ArchestraProvider) -> anyhow::Result<()> {
    match &config.command {
        Command::Serve => serve(provider).await,
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&provider.schema_document())?);
            Ok(())
        }
        Command::Docs { out } => {
            let written = docs::generate(&provider, out)?;
            println!("📁 Wrote {} pages to {}", written.len(), out.display());
            Ok(())
        }
        Command::Read { type_name, id } => {
            configure(config, &provider)?;
            let resource = provider.resource(type_name).ok_or_else(|| {
                ProviderError::validation("type_name", format!("unknown resource type {:?}", type_name))
            })?;

            let mut diags = Diagnostics::new();
            let state = resource.import(&mut diags, id).await;
            if diags.has_errors() {
                anyhow::bail!("Reading {} {} failed:\n{}", type_name, id, diags);
            }
            println!("{}", serde_json::to_string_pretty(&state)?);
            Ok(())
        }
        Command::Check => {
            configure(config, &provider)?;
            let client = provider.client().get()?;
            client
                .get_organization()
                .await?
                .into_payload(&[StatusCode::OK], "read organization")?;
            println!("✅ Connected to Archestra at {}", client.base_url());
            Ok(())
        }
    }
}

fn configure(config: &CliConfig, provider: &ArchestraProvider) -> anyhow::Result<()> {
    let file = config
        .config
        .as_ref()
        .map(SettingsFile::from_file)
        .transpose()?;

    let mut layers: Vec<&dyn ConfigProvider> = vec![config];
    if let Some(file) = &file {
        layers.push(file);
    }
    let settings = ProviderSettings::from_env(&layers)?;

    let mut diags = Diagnostics::new();
    if !provider.configure_from_settings(&settings, &mut diags) {
        anyhow::bail!("Provider configuration failed:\n{}", diags);
    }
    Ok(())
}

#[cfg(feature = "plugin")]
async fn serve(provider: ArchestraProvider) -> anyhow::Result<()> {
    tracing::info!("Starting Archestra provider {}", provider.version());
    terraform_provider_archestra::adapters::plugin::serve(provider).await?;
    Ok(())
}

#[cfg(not(feature = "plugin"))]
async fn serve(_provider: ArchestraProvider) -> anyhow::Result<()> {
    Err(ProviderError::PluginError {
        message: "this binary was built without the `plugin` feature".to_string(),
    }
    .into())
}
