use crate::adapters::http::{ArchestraClient, SharedClient};
use crate::app::data_sources::sso_provider::SsoProviderDataSource;
use crate::app::resources::{
    chat_llm_provider_api_key::ChatLlmProviderApiKeyResource,
    mcp_server_registry::McpServerRegistryResource,
    organization_settings::OrganizationSettingsResource, sso_provider::SsoProviderResource,
    token_price::TokenPriceResource,
};
use crate::config::settings::{
    resolve_value, ProviderSettings, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL,
};
use crate::core::lifecycle::{DataSourceDriver, DynDataSource, DynResource, ResourceDriver};
use crate::domain::model::{ConfigValue, Diagnostics, ProviderConfig};
use crate::domain::schema::{Attribute, Schema};
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const PROVIDER_TYPE_NAME: &str = "archestra";

/// Provider registry plus the client slot its resources share.
pub struct ArchestraProvider {
    version: String,
    client: SharedClient,
    resources: Vec<Arc<dyn DynResource>>,
    data_sources: Vec<Arc<dyn DynDataSource>>,
}

impl ArchestraProvider {
    pub fn new(version: impl Into<String>) -> Self {
        Self::with_client(version, SharedClient::new())
    }

    /// Builds the registry around an existing client slot, which may already be filled.
    pub fn with_client(version: impl Into<String>, client: SharedClient) -> Self {
        let resources: Vec<Arc<dyn DynResource>> = vec![
            Arc::new(ResourceDriver::new(OrganizationSettingsResource::new(client.clone()))),
            Arc::new(ResourceDriver::new(ChatLlmProviderApiKeyResource::new(client.clone()))),
            Arc::new(ResourceDriver::new(TokenPriceResource::new(client.clone()))),
            Arc::new(ResourceDriver::new(McpServerRegistryResource::new(client.clone()))),
            Arc::new(ResourceDriver::new(SsoProviderResource::new(client.clone()))),
        ];
        let data_sources: Vec<Arc<dyn DynDataSource>> = vec![Arc::new(DataSourceDriver::new(
            SsoProviderDataSource::new(client.clone()),
        ))];

        Self {
            version: version.into(),
            client,
            resources,
            data_sources,
        }
    }

    pub fn type_name(&self) -> &'static str {
        PROVIDER_TYPE_NAME
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn client(&self) -> &SharedClient {
        &self.client
    }

    pub fn schema(&self) -> Schema {
        Schema::new("Interact with the Archestra platform API.")
            .attribute(
                "base_url",
                Attribute::optional_string().with_description(format!(
                    "Base URL of the Archestra API. May also be provided via the {} environment variable. Defaults to {}.",
                    BASE_URL_ENV, DEFAULT_BASE_URL
                )),
            )
            .attribute(
                "api_key",
                Attribute::optional_string()
                    .with_description(format!(
                        "API key for the Archestra API. May also be provided via the {} environment variable.",
                        API_KEY_ENV
                    ))
                    .sensitive(),
            )
    }

    pub fn configure(&self, config: &ProviderConfig, diags: &mut Diagnostics) -> bool {
        self.configure_with(config, &|name| std::env::var(name).ok(), diags)
    }

    /// Resolves the provider block against `env`, builds the API client and
    /// installs it for every resource and data source.
    pub fn configure_with(
        &self,
        config: &ProviderConfig,
        env: &dyn Fn(&str) -> Option<String>,
        diags: &mut Diagnostics,
    ) -> bool {
        if config.base_url.is_unknown() {
            diags.add_attribute_error(
                "base_url",
                "Unknown Archestra API Base URL",
                format!(
                    "The provider cannot create the Archestra API client as there is an unknown configuration value for the Archestra API base URL. Either target apply the source of the value first, set the value statically in the configuration, or use the {} environment variable.",
                    BASE_URL_ENV
                ),
            );
        }
        if config.api_key.is_unknown() {
            diags.add_attribute_error(
                "api_key",
                "Unknown Archestra API Key",
                format!(
                    "The provider cannot create the Archestra API client as there is an unknown configuration value for the Archestra API key. Either target apply the source of the value first, set the value statically in the configuration, or use the {} environment variable.",
                    API_KEY_ENV
                ),
            );
        }
        if diags.has_errors() {
            return false;
        }

        let base_url = resolve_value(config.base_url.value(), BASE_URL_ENV, env)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let Some(api_key) = resolve_value(config.api_key.value(), API_KEY_ENV, env) else {
            diags.add_attribute_error(
                "api_key",
                "Missing Archestra API Key",
                format!(
                    "The provider cannot create the Archestra API client as there is a missing or empty value for the Archestra API key. Set the api_key value in the configuration or use the {} environment variable. If either is already set, ensure the value is not empty.",
                    API_KEY_ENV
                ),
            );
            return false;
        };

        let client = match ArchestraClient::new(&base_url, &api_key) {
            Ok(client) => client,
            Err(e) => {
                diags.add_error(
                    "Unable to Create Archestra API Client",
                    format!(
                        "An unexpected error occurred when creating the Archestra API client. If the error is not clear, please contact the provider developers.\n\nArchestra Client Error: {}",
                        e
                    ),
                );
                return false;
            }
        };

        tracing::debug!("Configuring Archestra client for {}", client.base_url());
        if !self.client.install(Arc::new(client)) {
            tracing::warn!("Archestra client already configured; keeping the existing client");
        }
        true
    }

    /// Configures from settings resolved outside Terraform (CLI flags, settings file).
    pub fn configure_from_settings(
        &self,
        settings: &ProviderSettings,
        diags: &mut Diagnostics,
    ) -> bool {
        let config = ProviderConfig {
            base_url: ConfigValue::Known(settings.base_url.clone()),
            api_key: ConfigValue::Known(settings.api_key.clone()),
        };
        self.configure_with(&config, &|_| None, diags)
    }

    /// Provider, resource and data source schemas as one JSON document.
    pub fn schema_document(&self) -> Value {
        let resources: Map<String, Value> = self
            .resources
            .iter()
            .map(|r| (r.type_name(), json!(r.schema())))
            .collect();
        let data_sources: Map<String, Value> = self
            .data_sources
            .iter()
            .map(|d| (d.type_name(), json!(d.schema())))
            .collect();

        json!({
            "provider": {
                "name": self.type_name(),
                "version": self.version,
                "schema": self.schema(),
            },
            "resource_schemas": resources,
            "data_source_schemas": data_sources,
        })
    }

    pub fn resources(&self) -> &[Arc<dyn DynResource>] {
        &self.resources
    }

    pub fn data_sources(&self) -> &[Arc<dyn DynDataSource>] {
        &self.data_sources
    }

    pub fn resource(&self, type_name: &str) -> Option<Arc<dyn DynResource>> {
        self.resources
            .iter()
            .find(|r| r.type_name() == type_name)
            .cloned()
    }

    pub fn data_source(&self, type_name: &str) -> Option<Arc<dyn DynDataSource>> {
        self.data_sources
            .iter()
            .find(|d| d.type_name() == type_name)
            .cloned()
    }
}
