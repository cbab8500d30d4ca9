use crate::adapters::http::types::{
    IdpMetadata, OidcConfig, OidcMapping, RoleMapping, RoleMappingRule, SamlConfig, SamlMapping,
    SingleSignOnService, SpMetadata, SsoProvider, SsoProviderRequest, TeamSyncConfig,
    TokenEndpointAuthentication,
};
use crate::adapters::http::SharedClient;
use crate::domain::model::Tracked;
use crate::domain::ports::Resource;
use crate::domain::schema::{nested, Attribute, AttributeMode, Schema};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OidcMappingModel {
    pub email: Option<String>,
    pub email_verified: Option<String>,
    pub extra_fields: Option<BTreeMap<String, String>>,
    pub id: Option<String>,
    pub image: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OidcConfigModel {
    pub authorization_endpoint: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub discovery_endpoint: String,
    pub issuer: String,
    pub jwks_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub token_endpoint_authentication: Option<String>,
    pub user_info_endpoint: Option<String>,
    pub pkce: Option<bool>,
    pub override_user_info: Option<bool>,
    pub scopes: Option<Vec<String>>,
    pub mapping: Option<OidcMappingModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlMappingModel {
    pub email: Option<String>,
    pub email_verified: Option<String>,
    pub extra_fields: Option<BTreeMap<String, String>>,
    pub first_name: Option<String>,
    pub id: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleSignOnServiceModel {
    pub binding: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpMetadataModel {
    pub cert: Option<String>,
    pub enc_private_key: Option<String>,
    pub enc_private_key_pass: Option<String>,
    pub entity_id: Option<String>,
    pub entity_url: Option<String>,
    pub is_assertion_encrypted: Option<bool>,
    pub metadata: Option<String>,
    pub private_key: Option<String>,
    pub private_key_pass: Option<String>,
    pub redirect_url: Option<String>,
    pub single_sign_on_service: Option<Vec<SingleSignOnServiceModel>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpMetadataModel {
    pub binding: Option<String>,
    pub enc_private_key: Option<String>,
    pub enc_private_key_pass: Option<String>,
    pub entity_id: Option<String>,
    pub is_assertion_encrypted: Option<bool>,
    pub metadata: Option<String>,
    pub private_key: Option<String>,
    pub private_key_pass: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamlConfigModel {
    pub audience: Option<String>,
    pub callback_url: String,
    pub cert: String,
    pub decryption_pvk: Option<String>,
    pub digest_algorithm: Option<String>,
    pub entry_point: String,
    pub identifier_format: Option<String>,
    pub issuer: String,
    pub private_key: Option<String>,
    pub signature_algorithm: Option<String>,
    pub want_assertions_signed: Option<bool>,
    pub additional_params: Option<BTreeMap<String, String>>,
    pub mapping: Option<SamlMappingModel>,
    pub idp_metadata: Option<IdpMetadataModel>,
    pub sp_metadata: SpMetadataModel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMappingRuleModel {
    pub expression: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMappingModel {
    pub default_role: Option<String>,
    pub rules: Option<Vec<RoleMappingRuleModel>>,
    pub skip_role_sync: Option<bool>,
    pub strict_mode: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamSyncConfigModel {
    pub enabled: Option<bool>,
    pub groups_expression: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsoProviderModel {
    pub id: Option<String>,
    pub issuer: String,
    pub provider_id: String,
    pub domain: String,
    pub organization_id: Option<String>,
    pub user_id: Option<String>,
    pub domain_verified: Option<bool>,
    pub oidc_config: Option<OidcConfigModel>,
    pub saml_config: Option<SamlConfigModel>,
    pub role_mapping: Option<RoleMappingModel>,
    pub team_sync_config: Option<TeamSyncConfigModel>,
}

impl OidcConfigModel {
    fn to_wire(&self) -> Result<OidcConfig> {
        Ok(OidcConfig {
            authorization_endpoint: self.authorization_endpoint.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            discovery_endpoint: self.discovery_endpoint.clone(),
            issuer: self.issuer.clone(),
            jwks_endpoint: self.jwks_endpoint.clone(),
            mapping: self.mapping.as_ref().map(|m| OidcMapping {
                email: m.email.clone(),
                email_verified: m.email_verified.clone(),
                extra_fields: m.extra_fields.clone(),
                id: m.id.clone(),
                image: m.image.clone(),
                name: m.name.clone(),
            }),
            override_user_info: self.override_user_info,
            pkce: self.pkce.unwrap_or(false),
            scopes: self.scopes.clone(),
            token_endpoint: self.token_endpoint.clone(),
            token_endpoint_authentication: self
                .token_endpoint_authentication
                .as_deref()
                .map(|v| {
                    TokenEndpointAuthentication::parse(
                        "oidc_config.token_endpoint_authentication",
                        v,
                    )
                })
                .transpose()?,
            user_info_endpoint: self.user_info_endpoint.clone(),
        })
    }
}

impl SamlConfigModel {
    fn to_wire(&self) -> SamlConfig {
        SamlConfig {
            additional_params: self.additional_params.as_ref().map(|params| {
                params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect()
            }),
            audience: self.audience.clone(),
            callback_url: self.callback_url.clone(),
            cert: self.cert.clone(),
            decryption_pvk: self.decryption_pvk.clone(),
            digest_algorithm: self.digest_algorithm.clone(),
            entry_point: self.entry_point.clone(),
            identifier_format: self.identifier_format.clone(),
            idp_metadata: self.idp_metadata.as_ref().map(|idp| IdpMetadata {
                cert: idp.cert.clone(),
                enc_private_key: idp.enc_private_key.clone(),
                enc_private_key_pass: idp.enc_private_key_pass.clone(),
                entity_id: idp.entity_id.clone(),
                entity_url: idp.entity_url.clone(),
                is_assertion_encrypted: idp.is_assertion_encrypted,
                metadata: idp.metadata.clone(),
                private_key: idp.private_key.clone(),
                private_key_pass: idp.private_key_pass.clone(),
                redirect_url: idp.redirect_url.clone(),
                single_sign_on_service: idp.single_sign_on_service.as_ref().map(|services| {
                    services
                        .iter()
                        .map(|s| SingleSignOnService {
                            binding: s.binding.clone(),
                            location: s.location.clone(),
                        })
                        .collect()
                }),
            }),
            issuer: self.issuer.clone(),
            mapping: self.mapping.as_ref().map(|m| SamlMapping {
                email: m.email.clone(),
                email_verified: m.email_verified.clone(),
                extra_fields: m.extra_fields.clone(),
                first_name: m.first_name.clone(),
                id: m.id.clone(),
                last_name: m.last_name.clone(),
                name: m.name.clone(),
            }),
            private_key: self.private_key.clone(),
            signature_algorithm: self.signature_algorithm.clone(),
            sp_metadata: SpMetadata {
                binding: self.sp_metadata.binding.clone(),
                enc_private_key: self.sp_metadata.enc_private_key.clone(),
                enc_private_key_pass: self.sp_metadata.enc_private_key_pass.clone(),
                entity_id: self.sp_metadata.entity_id.clone(),
                is_assertion_encrypted: self.sp_metadata.is_assertion_encrypted,
                metadata: self.sp_metadata.metadata.clone(),
                private_key: self.sp_metadata.private_key.clone(),
                private_key_pass: self.sp_metadata.private_key_pass.clone(),
            },
            want_assertions_signed: self.want_assertions_signed,
        }
    }
}

impl From<&RoleMappingModel> for RoleMapping {
    fn from(model: &RoleMappingModel) -> Self {
        Self {
            default_role: model.default_role.clone(),
            rules: model.rules.as_ref().map(|rules| {
                rules
                    .iter()
                    .map(|r| RoleMappingRule {
                        expression: r.expression.clone(),
                        role: r.role.clone(),
                    })
                    .collect()
            }),
            skip_role_sync: model.skip_role_sync,
            strict_mode: model.strict_mode,
        }
    }
}

impl From<&TeamSyncConfigModel> for TeamSyncConfig {
    fn from(model: &TeamSyncConfigModel) -> Self {
        Self {
            enabled: model.enabled,
            groups_expression: model.groups_expression.clone(),
        }
    }
}

impl SsoProviderModel {
    fn to_request(&self) -> Result<SsoProviderRequest> {
        Ok(SsoProviderRequest {
            issuer: self.issuer.clone(),
            domain: self.domain.clone(),
            provider_id: self.provider_id.clone(),
            oidc_config: self
                .oidc_config
                .as_ref()
                .map(OidcConfigModel::to_wire)
                .transpose()?,
            saml_config: self.saml_config.as_ref().map(SamlConfigModel::to_wire),
            role_mapping: self.role_mapping.as_ref().map(RoleMapping::from),
            team_sync_config: self.team_sync_config.as_ref().map(TeamSyncConfig::from),
        })
    }

    /// Server-side fields over `self`. The API does not echo the provider id
    /// or the nested configuration, so those stay as tracked.
    fn refreshed(&self, provider: SsoProvider) -> Self {
        Self {
            id: Some(provider.id),
            issuer: provider.issuer,
            provider_id: provider
                .provider_id
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| self.provider_id.clone()),
            domain: provider.domain,
            organization_id: Some(provider.organization_id.unwrap_or_default()),
            user_id: Some(provider.user_id.unwrap_or_default()),
            domain_verified: Some(provider.domain_verified.unwrap_or(false)),
            ..self.clone()
        }
    }

    fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

fn mapping_attributes(extra: &[(&str, &str)]) -> BTreeMap<String, Attribute> {
    let mut attrs = nested([
        (
            "email",
            Attribute::optional_string().with_description("Email attribute mapping"),
        ),
        (
            "email_verified",
            Attribute::optional_string().with_description("Email verified attribute mapping"),
        ),
        (
            "extra_fields",
            Attribute::string_map(AttributeMode::Optional)
                .with_description("Extra field mappings"),
        ),
        (
            "id",
            Attribute::optional_string().with_description("ID attribute mapping"),
        ),
        (
            "name",
            Attribute::optional_string().with_description("Name attribute mapping"),
        ),
    ]);
    for (name, description) in extra {
        attrs.insert(
            name.to_string(),
            Attribute::optional_string().with_description(*description),
        );
    }
    attrs
}

fn oidc_config_attributes() -> BTreeMap<String, Attribute> {
    nested([
        (
            "authorization_endpoint",
            Attribute::optional_string().with_description("OIDC authorization endpoint"),
        ),
        (
            "client_id",
            Attribute::required_string().with_description("OIDC client ID"),
        ),
        (
            "client_secret",
            Attribute::required_string()
                .with_description("OIDC client secret")
                .sensitive(),
        ),
        (
            "discovery_endpoint",
            Attribute::required_string().with_description("OIDC discovery endpoint"),
        ),
        (
            "issuer",
            Attribute::required_string().with_description("OIDC issuer"),
        ),
        (
            "jwks_endpoint",
            Attribute::optional_string().with_description("OIDC JWKS endpoint"),
        ),
        (
            "token_endpoint",
            Attribute::optional_string().with_description("OIDC token endpoint"),
        ),
        (
            "token_endpoint_authentication",
            Attribute::optional_string()
                .with_description("Token endpoint authentication method")
                .one_of(TokenEndpointAuthentication::VALUES),
        ),
        (
            "user_info_endpoint",
            Attribute::optional_string().with_description("OIDC user info endpoint"),
        ),
        (
            "pkce",
            Attribute::bool(AttributeMode::Optional).with_description("Enable PKCE flow"),
        ),
        (
            "override_user_info",
            Attribute::bool(AttributeMode::Optional)
                .with_description("Override user info from provider"),
        ),
        (
            "scopes",
            Attribute::string_list(AttributeMode::Optional)
                .with_description("OIDC scopes to request"),
        ),
        (
            "mapping",
            Attribute::single_nested(AttributeMode::Optional, mapping_attributes(&[("image", "Image attribute mapping")]))
                .with_description("OIDC attribute mapping"),
        ),
    ])
}

fn saml_config_attributes() -> BTreeMap<String, Attribute> {
    let idp_metadata = nested([
        ("cert", Attribute::optional_string().with_description("IdP certificate")),
        (
            "enc_private_key",
            Attribute::optional_string()
                .with_description("IdP encryption private key")
                .sensitive(),
        ),
        (
            "enc_private_key_pass",
            Attribute::optional_string()
                .with_description("IdP encryption private key password")
                .sensitive(),
        ),
        ("entity_id", Attribute::optional_string().with_description("IdP entity ID")),
        ("entity_url", Attribute::optional_string().with_description("IdP entity URL")),
        (
            "is_assertion_encrypted",
            Attribute::bool(AttributeMode::Optional)
                .with_description("Whether assertions are encrypted"),
        ),
        ("metadata", Attribute::optional_string().with_description("IdP metadata XML")),
        (
            "private_key",
            Attribute::optional_string()
                .with_description("IdP private key")
                .sensitive(),
        ),
        (
            "private_key_pass",
            Attribute::optional_string()
                .with_description("IdP private key password")
                .sensitive(),
        ),
        ("redirect_url", Attribute::optional_string().with_description("IdP redirect URL")),
        (
            "single_sign_on_service",
            Attribute::list_nested(
                AttributeMode::Optional,
                nested([
                    (
                        "binding",
                        Attribute::required_string().with_description("SAML binding URN"),
                    ),
                    (
                        "location",
                        Attribute::required_string().with_description("Service endpoint URL"),
                    ),
                ]),
            )
            .with_description("IdP SSO service endpoints"),
        ),
    ]);

    let sp_metadata = nested([
        ("binding", Attribute::optional_string().with_description("SP binding")),
        (
            "enc_private_key",
            Attribute::optional_string()
                .with_description("SP encryption private key")
                .sensitive(),
        ),
        (
            "enc_private_key_pass",
            Attribute::optional_string()
                .with_description("SP encryption private key password")
                .sensitive(),
        ),
        ("entity_id", Attribute::optional_string().with_description("SP entity ID")),
        (
            "is_assertion_encrypted",
            Attribute::bool(AttributeMode::Optional)
                .with_description("Whether assertions are encrypted"),
        ),
        ("metadata", Attribute::optional_string().with_description("SP metadata XML")),
        (
            "private_key",
            Attribute::optional_string()
                .with_description("SP private key")
                .sensitive(),
        ),
        (
            "private_key_pass",
            Attribute::optional_string()
                .with_description("SP private key password")
                .sensitive(),
        ),
    ]);

    nested([
        ("audience", Attribute::optional_string().with_description("SAML audience")),
        ("callback_url", Attribute::required_string().with_description("SAML callback URL")),
        ("cert", Attribute::required_string().with_description("SAML certificate")),
        (
            "decryption_pvk",
            Attribute::optional_string()
                .with_description("SAML decryption private key")
                .sensitive(),
        ),
        (
            "digest_algorithm",
            Attribute::optional_string().with_description("SAML digest algorithm"),
        ),
        ("entry_point", Attribute::required_string().with_description("SAML entry point")),
        (
            "identifier_format",
            Attribute::optional_string().with_description("SAML identifier format"),
        ),
        ("issuer", Attribute::required_string().with_description("SAML issuer")),
        (
            "private_key",
            Attribute::optional_string()
                .with_description("SAML private key")
                .sensitive(),
        ),
        (
            "signature_algorithm",
            Attribute::optional_string().with_description("SAML signature algorithm"),
        ),
        (
            "want_assertions_signed",
            Attribute::bool(AttributeMode::Optional).with_description("Require signed assertions"),
        ),
        (
            "additional_params",
            Attribute::string_map(AttributeMode::Optional)
                .with_description("Additional SAML parameters"),
        ),
        (
            "mapping",
            Attribute::single_nested(
                AttributeMode::Optional,
                mapping_attributes(&[
                    ("first_name", "First name attribute mapping"),
                    ("last_name", "Last name attribute mapping"),
                ]),
            )
            .with_description("SAML attribute mapping"),
        ),
        (
            "idp_metadata",
            Attribute::single_nested(AttributeMode::Optional, idp_metadata)
                .with_description("SAML IdP metadata"),
        ),
        (
            "sp_metadata",
            Attribute::single_nested(AttributeMode::Required, sp_metadata)
                .with_description("SAML SP metadata"),
        ),
    ])
}

pub struct SsoProviderResource {
    client: SharedClient,
}

impl SsoProviderResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for SsoProviderResource {
    type Model = SsoProviderModel;

    fn type_suffix(&self) -> &'static str {
        "sso_provider"
    }

    fn schema(&self) -> Schema {
        let role_mapping = nested([
            (
                "default_role",
                Attribute::optional_string().with_description("Default role for users"),
            ),
            (
                "rules",
                Attribute::list_nested(
                    AttributeMode::Optional,
                    nested([
                        (
                            "expression",
                            Attribute::required_string().with_description("Expression to match"),
                        ),
                        (
                            "role",
                            Attribute::required_string().with_description("Role to assign"),
                        ),
                    ]),
                )
                .with_description("Role mapping rules"),
            ),
            (
                "skip_role_sync",
                Attribute::bool(AttributeMode::Optional)
                    .with_description("Skip role synchronization"),
            ),
            (
                "strict_mode",
                Attribute::bool(AttributeMode::Optional)
                    .with_description("Enable strict mode for role mapping"),
            ),
        ]);

        let team_sync = nested([
            (
                "enabled",
                Attribute::bool(AttributeMode::Optional)
                    .with_description("Enable team synchronization"),
            ),
            (
                "groups_expression",
                Attribute::optional_string().with_description("Expression for group mapping"),
            ),
        ]);

        Schema::new("Manages an SSO provider (OIDC or SAML) in Archestra.")
            .attribute(
                "id",
                Attribute::computed_string()
                    .with_description("SSO provider identifier")
                    .use_state_for_unknown(),
            )
            .attribute(
                "issuer",
                Attribute::required_string().with_description("The issuer identifier for SSO provider"),
            )
            .attribute(
                "provider_id",
                Attribute::required_string()
                    .with_description("The provider ID (e.g. 'google', 'okta', 'saml')"),
            )
            .attribute(
                "domain",
                Attribute::required_string()
                    .with_description("Domain associated with this SSO provider"),
            )
            .attribute(
                "organization_id",
                Attribute::computed_string()
                    .with_description("Organization ID this SSO provider belongs to")
                    .use_state_for_unknown(),
            )
            .attribute(
                "user_id",
                Attribute::computed_string()
                    .with_description("User ID who created this SSO provider")
                    .use_state_for_unknown(),
            )
            .attribute(
                "domain_verified",
                Attribute::bool(AttributeMode::Computed)
                    .with_description("Whether the domain has been verified"),
            )
            .attribute(
                "oidc_config",
                Attribute::single_nested(AttributeMode::Optional, oidc_config_attributes())
                    .with_description("OIDC configuration for the SSO provider"),
            )
            .attribute(
                "saml_config",
                Attribute::single_nested(AttributeMode::Optional, saml_config_attributes())
                    .with_description("SAML configuration for the SSO provider"),
            )
            .attribute(
                "role_mapping",
                Attribute::single_nested(AttributeMode::Optional, role_mapping)
                    .with_description("Role mapping configuration"),
            )
            .attribute(
                "team_sync_config",
                Attribute::single_nested(AttributeMode::Optional, team_sync)
                    .with_description("Team synchronization configuration"),
            )
    }

    async fn create(&self, plan: &Self::Model) -> Result<Self::Model> {
        let provider = self
            .client
            .get()?
            .create_sso_provider(&plan.to_request()?)
            .await?
            .into_payload(&[StatusCode::CREATED, StatusCode::OK], "create SSO provider")?;
        Ok(plan.refreshed(provider))
    }

    async fn read(&self, state: &Self::Model) -> Result<Tracked<Self::Model>> {
        let response = self.client.get()?.get_sso_provider(state.id()).await?;
        if response.is_not_found() {
            return Ok(Tracked::Removed);
        }
        let provider = response.into_payload(&[StatusCode::OK], "read SSO provider")?;
        Ok(Tracked::Present(state.refreshed(provider)))
    }

    async fn update(&self, plan: &Self::Model, prior: &Self::Model) -> Result<Self::Model> {
        let provider = self
            .client
            .get()?
            .update_sso_provider(prior.id(), &plan.to_request()?)
            .await?
            .into_payload(&[StatusCode::OK], "update SSO provider")?;
        Ok(plan.refreshed(provider))
    }

    async fn delete(&self, state: &Self::Model) -> Result<()> {
        self.client
            .get()?
            .delete_sso_provider(state.id())
            .await?
            .ensure_status(
                &[StatusCode::OK, StatusCode::NO_CONTENT, StatusCode::NOT_FOUND],
                "delete SSO provider",
            )
    }
}
