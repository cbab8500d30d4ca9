//! Request and response bodies of the Archestra REST API.
//!
//! Request types use typed enums so a bad value can never be sent; response
//! types keep plain strings and let the server stay authoritative.

use crate::utils::error::Result;
use crate::utils::validation::one_of_error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $value)] $variant),+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($value),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            /// Parses `value`, reporting failures against `attribute`.
            pub fn parse(attribute: &str, value: &str) -> Result<Self> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(one_of_error(attribute, other, Self::VALUES)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    Font {
        Inter => "inter",
        Lato => "lato",
        OpenSans => "open-sans",
        Roboto => "roboto",
        SourceSansPro => "source-sans-pro",
    }
);

string_enum!(
    ColorTheme {
        AmberMinimal => "amber-minimal",
        BoldTech => "bold-tech",
        Bubblegum => "bubblegum",
        Caffeine => "caffeine",
        Candyland => "candyland",
        Catppuccin => "catppuccin",
        Claude => "claude",
        Claymorphism => "claymorphism",
        CleanSlate => "clean-slate",
        CosmicNight => "cosmic-night",
        Cyberpunk => "cyberpunk",
        Doom64 => "doom-64",
        ElegantLuxury => "elegant-luxury",
        Graphite => "graphite",
        KodamaGrove => "kodama-grove",
        MidnightBloom => "midnight-bloom",
        MochaMousse => "mocha-mousse",
        ModernMinimal => "modern-minimal",
        Mono => "mono",
        Nature => "nature",
        NeoBrutalism => "neo-brutalism",
        NorthernLights => "northern-lights",
        OceanBreeze => "ocean-breeze",
        PastelDreams => "pastel-dreams",
        Perpetuity => "perpetuity",
        QuantumRose => "quantum-rose",
        RetroArcade => "retro-arcade",
        SolarDusk => "solar-dusk",
        StarryNight => "starry-night",
        SunsetHorizon => "sunset-horizon",
        Supabase => "supabase",
        T3Chat => "t3-chat",
        Tangerine => "tangerine",
        Twitter => "twitter",
        Vercel => "vercel",
        VintagePaper => "vintage-paper",
    }
);

string_enum!(
    LimitCleanupInterval {
        OneHour => "1h",
        TwelveHours => "12h",
        OneDay => "24h",
        OneWeek => "1w",
        OneMonth => "1m",
    }
);

string_enum!(
    CompressionScope {
        Organization => "organization",
        Team => "team",
    }
);

string_enum!(
    LlmProvider {
        Anthropic => "anthropic",
        Gemini => "gemini",
        Openai => "openai",
    }
);

string_enum!(
    TransportType {
        Stdio => "stdio",
        StreamableHttp => "streamable-http",
    }
);

string_enum!(
    TokenEndpointAuthentication {
        ClientSecretBasic => "client_secret_basic",
        ClientSecretPost => "client_secret_post",
    }
);

// Organization

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub custom_font: String,
    #[serde(default)]
    pub theme: String,
    pub logo: Option<String>,
    pub limit_cleanup_interval: Option<String>,
    #[serde(default)]
    pub compression_scope: String,
    #[serde(default)]
    pub onboarding_complete: bool,
    #[serde(default)]
    pub convert_tool_results_to_toon: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_font: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ColorTheme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_cleanup_interval: Option<LimitCleanupInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_scope: Option<CompressionScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert_tool_results_to_toon: Option<bool>,
}

// Chat API keys

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatApiKey {
    pub id: Uuid,
    pub name: String,
    pub provider: String,
    #[serde(default)]
    pub is_organization_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatApiKeyRequest {
    pub name: String,
    pub api_key: String,
    pub provider: LlmProvider,
    pub is_organization_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatApiKeyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

// Token prices

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPrice {
    pub id: Uuid,
    pub provider: String,
    pub model: String,
    pub price_per_million_input: String,
    pub price_per_million_output: String,
}

/// Shared by create (`POST`) and full replacement (`PUT`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPriceRequest {
    pub provider: LlmProvider,
    pub model: String,
    pub price_per_million_input: String,
    pub price_per_million_output: String,
}

// Internal MCP catalog

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentVariable {
    pub key: String,
    #[serde(rename = "type", default = "EnvironmentVariable::string_type")]
    pub var_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub prompt_on_installation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EnvironmentVariable {
    fn string_type() -> String {
        "string".to_string()
    }

    /// A plain string variable with a fixed value.
    pub fn plain(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            var_type: Self::string_type(),
            value: Some(value.into()),
            prompt_on_installation: false,
            required: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Vec<EnvironmentVariable>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_port: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McpCatalogItemRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_config: Option<LocalConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_fields: Option<Vec<AuthField>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpCatalogItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub docs_url: Option<String>,
    pub installation_command: Option<String>,
    pub auth_description: Option<String>,
    pub local_config: Option<LocalConfig>,
    pub auth_fields: Option<Vec<AuthField>>,
}

// SSO providers

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_fields: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub discovery_endpoint: String,
    pub issuer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<OidcMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_user_info: Option<bool>,
    pub pkce: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_authentication: Option<TokenEndpointAuthentication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamlMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_fields: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleSignOnService {
    #[serde(rename = "Binding")]
    pub binding: String,
    #[serde(rename = "Location")]
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdpMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enc_private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enc_private_key_pass: Option<String>,
    #[serde(rename = "entityID", skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(rename = "entityURL", skip_serializing_if = "Option::is_none")]
    pub entity_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_assertion_encrypted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_pass: Option<String>,
    #[serde(rename = "redirectURL", skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_sign_on_service: Option<Vec<SingleSignOnService>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enc_private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enc_private_key_pass: Option<String>,
    #[serde(rename = "entityID", skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_assertion_encrypted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_pass: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamlConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_params: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    pub callback_url: String,
    pub cert: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decryption_pvk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<String>,
    pub entry_point: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idp_metadata: Option<IdpMetadata>,
    pub issuer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<SamlMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    pub sp_metadata: SpMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub want_assertions_signed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleMappingRule {
    pub expression: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RoleMappingRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_role_sync: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_mode: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSyncConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups_expression: Option<String>,
}

/// Body of both `POST /api/sso-providers` and `PUT /api/sso-providers/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoProviderRequest {
    pub issuer: String,
    pub domain: String,
    pub provider_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oidc_config: Option<OidcConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saml_config: Option<SamlConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_mapping: Option<RoleMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_sync_config: Option<TeamSyncConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoProvider {
    pub id: String,
    pub issuer: String,
    pub domain: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub domain_verified: Option<bool>,
}
