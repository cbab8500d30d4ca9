use crate::adapters::http::SharedClient;
use crate::domain::ports::DataSource;
use crate::domain::schema::{Attribute, AttributeMode, Schema};
use crate::utils::error::{ProviderError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsoProviderLookup {
    pub id: String,
    pub issuer: Option<String>,
    pub provider_id: Option<String>,
    pub domain: Option<String>,
    pub organization_id: Option<String>,
    pub user_id: Option<String>,
    pub domain_verified: Option<bool>,
}

/// Looks up an existing SSO provider by id.
pub struct SsoProviderDataSource {
    client: SharedClient,
}

impl SsoProviderDataSource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SsoProviderDataSource {
    type Model = SsoProviderLookup;

    fn type_suffix(&self) -> &'static str {
        "sso_provider"
    }

    fn schema(&self) -> Schema {
        Schema::new("Fetches an existing SSO provider by ID.")
            .attribute(
                "id",
                Attribute::required_string().with_description("SSO provider identifier"),
            )
            .attribute(
                "issuer",
                Attribute::computed_string().with_description("The issuer identifier"),
            )
            .attribute(
                "provider_id",
                Attribute::computed_string().with_description("The provider ID"),
            )
            .attribute(
                "domain",
                Attribute::computed_string().with_description("Domain associated with this SSO provider"),
            )
            .attribute(
                "organization_id",
                Attribute::computed_string().with_description("Organization ID this SSO provider belongs to"),
            )
            .attribute(
                "user_id",
                Attribute::computed_string().with_description("User ID who created this SSO provider"),
            )
            .attribute(
                "domain_verified",
                Attribute::bool(AttributeMode::Computed)
                    .with_description("Whether the domain has been verified"),
            )
    }

    async fn read(&self, config: &Self::Model) -> Result<Self::Model> {
        let response = self.client.get()?.get_sso_provider(&config.id).await?;
        if response.is_not_found() {
            return Err(ProviderError::NotFoundError {
                resource: "SSO provider".to_string(),
                id: config.id.clone(),
            });
        }
        let provider = response.into_payload(&[StatusCode::OK], "read SSO provider")?;

        Ok(SsoProviderLookup {
            id: provider.id,
            issuer: Some(provider.issuer),
            provider_id: Some(provider.provider_id.unwrap_or_default()),
            domain: Some(provider.domain),
            organization_id: Some(provider.organization_id.unwrap_or_default()),
            user_id: Some(provider.user_id.unwrap_or_default()),
            domain_verified: Some(provider.domain_verified.unwrap_or(false)),
        })
    }
}
