use crate::adapters::http::types::{
    ColorTheme, CompressionScope, Font, LimitCleanupInterval, Organization,
    UpdateOrganizationRequest,
};
use crate::adapters::http::SharedClient;
use crate::domain::model::Tracked;
use crate::domain::ports::Resource;
use crate::domain::schema::{Attribute, AttributeMode, Schema};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationSettingsModel {
    pub id: Option<String>,
    pub font: Option<String>,
    pub color_theme: Option<String>,
    pub logo: Option<String>,
    pub limit_cleanup_interval: Option<String>,
    pub compression_scope: Option<String>,
    pub onboarding_complete: Option<bool>,
    pub convert_tool_results_to_toon: Option<bool>,
}

impl OrganizationSettingsModel {
    fn to_request(&self) -> Result<UpdateOrganizationRequest> {
        Ok(UpdateOrganizationRequest {
            custom_font: self
                .font
                .as_deref()
                .map(|v| Font::parse("font", v))
                .transpose()?,
            theme: self
                .color_theme
                .as_deref()
                .map(|v| ColorTheme::parse("color_theme", v))
                .transpose()?,
            logo: self.logo.clone(),
            limit_cleanup_interval: self
                .limit_cleanup_interval
                .as_deref()
                .map(|v| LimitCleanupInterval::parse("limit_cleanup_interval", v))
                .transpose()?,
            compression_scope: self
                .compression_scope
                .as_deref()
                .map(|v| CompressionScope::parse("compression_scope", v))
                .transpose()?,
            onboarding_complete: self.onboarding_complete,
            convert_tool_results_to_toon: self.convert_tool_results_to_toon,
        })
    }
}

impl From<Organization> for OrganizationSettingsModel {
    fn from(org: Organization) -> Self {
        Self {
            id: Some(org.id),
            font: Some(org.custom_font),
            color_theme: Some(org.theme),
            logo: org.logo,
            limit_cleanup_interval: org.limit_cleanup_interval,
            compression_scope: Some(org.compression_scope),
            onboarding_complete: Some(org.onboarding_complete),
            convert_tool_results_to_toon: Some(org.convert_tool_results_to_toon),
        }
    }
}

/// Singleton: there is one settings record per organization, so create and
/// update both patch it and delete only forgets it.
pub struct OrganizationSettingsResource {
    client: SharedClient,
}

impl OrganizationSettingsResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    async fn apply(&self, plan: &OrganizationSettingsModel) -> Result<OrganizationSettingsModel> {
        let body = plan.to_request()?;
        let org = self
            .client
            .get()?
            .update_organization(&body)
            .await?
            .into_payload(&[StatusCode::OK], "update organization settings")?;
        Ok(org.into())
    }
}

#[async_trait]
impl Resource for OrganizationSettingsResource {
    type Model = OrganizationSettingsModel;

    fn type_suffix(&self) -> &'static str {
        "organization_settings"
    }

    fn schema(&self) -> Schema {
        Schema::new("Manages organization settings in Archestra.")
            .attribute(
                "id",
                Attribute::computed_string()
                    .with_description("Organization identifier")
                    .use_state_for_unknown(),
            )
            .attribute(
                "font",
                Attribute::string(AttributeMode::OptionalComputed)
                    .with_description("Custom font for the organization")
                    .with_default(Font::Inter.as_str())
                    .one_of(Font::VALUES),
            )
            .attribute(
                "color_theme",
                Attribute::string(AttributeMode::OptionalComputed)
                    .with_description("Color theme for the organization")
                    .with_default(ColorTheme::ModernMinimal.as_str())
                    .one_of(ColorTheme::VALUES),
            )
            .attribute(
                "logo",
                Attribute::optional_string().with_description("Base64 encoded logo image"),
            )
            .attribute(
                "limit_cleanup_interval",
                Attribute::optional_string()
                    .with_description("Interval after which usage limits are cleaned up")
                    .one_of(LimitCleanupInterval::VALUES),
            )
            .attribute(
                "compression_scope",
                Attribute::string(AttributeMode::OptionalComputed)
                    .with_description("Scope at which tool result compression is configured")
                    .with_default(CompressionScope::Organization.as_str())
                    .one_of(CompressionScope::VALUES),
            )
            .attribute(
                "onboarding_complete",
                Attribute::bool(AttributeMode::OptionalComputed)
                    .with_description("Whether organization onboarding is complete")
                    .with_default(false),
            )
            .attribute(
                "convert_tool_results_to_toon",
                Attribute::bool(AttributeMode::OptionalComputed)
                    .with_description("Convert tool results to TOON format to reduce token usage")
                    .with_default(false),
            )
    }

    async fn create(&self, plan: &Self::Model) -> Result<Self::Model> {
        self.apply(plan).await
    }

    async fn read(&self, _state: &Self::Model) -> Result<Tracked<Self::Model>> {
        let org = self
            .client
            .get()?
            .get_organization()
            .await?
            .into_payload(&[StatusCode::OK], "read organization settings")?;
        Ok(Tracked::Present(org.into()))
    }

    async fn update(&self, plan: &Self::Model, _prior: &Self::Model) -> Result<Self::Model> {
        self.apply(plan).await
    }

    async fn delete(&self, _state: &Self::Model) -> Result<()> {
        tracing::info!("Organization settings left in place; removing from state only");
        Ok(())
    }
}
