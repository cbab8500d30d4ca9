use crate::adapters::http::types::{
    ChatApiKey, CreateChatApiKeyRequest, LlmProvider, UpdateChatApiKeyRequest,
};
use crate::adapters::http::SharedClient;
use crate::domain::model::Tracked;
use crate::domain::ports::Resource;
use crate::domain::schema::{Attribute, AttributeMode, Schema};
use crate::utils::error::{ProviderError, Result};
use crate::utils::validation::validate_uuid;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const RESOURCE_NAME: &str = "chat LLM provider API key";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatLlmProviderApiKeyModel {
    pub id: Option<String>,
    pub name: String,
    /// Write-only on the server; null after import until configured.
    pub api_key: Option<String>,
    pub llm_provider: String,
    pub is_organization_default: Option<bool>,
}

impl ChatLlmProviderApiKeyModel {
    fn parsed_id(&self) -> Result<Uuid> {
        validate_uuid(RESOURCE_NAME, self.id.as_deref().unwrap_or_default())
    }

    /// Server fields over `self`; the secret is never returned by the API.
    fn refreshed(&self, key: ChatApiKey) -> Self {
        Self {
            id: Some(key.id.to_string()),
            name: key.name,
            api_key: self.api_key.clone(),
            llm_provider: key.provider,
            is_organization_default: Some(key.is_organization_default),
        }
    }
}

pub struct ChatLlmProviderApiKeyResource {
    client: SharedClient,
}

impl ChatLlmProviderApiKeyResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for ChatLlmProviderApiKeyResource {
    type Model = ChatLlmProviderApiKeyModel;

    fn type_suffix(&self) -> &'static str {
        "chat_llm_provider_api_key"
    }

    fn schema(&self) -> Schema {
        Schema::new("Manages LLM provider API keys used by the Archestra chat.")
            .attribute(
                "id",
                Attribute::computed_string()
                    .with_description("Chat LLM provider API key identifier")
                    .use_state_for_unknown(),
            )
            .attribute(
                "name",
                Attribute::required_string().with_description("Display name for the API key"),
            )
            .attribute(
                "api_key",
                Attribute::required_string()
                    .with_description("The LLM provider API key")
                    .sensitive(),
            )
            .attribute(
                "llm_provider",
                Attribute::required_string()
                    .with_description("The LLM provider this key belongs to")
                    .one_of(LlmProvider::VALUES)
                    .requires_replace(),
            )
            .attribute(
                "is_organization_default",
                Attribute::bool(AttributeMode::OptionalComputed)
                    .with_description("Whether this key is the organization's default for its provider")
                    .with_default(false),
            )
    }

    async fn create(&self, plan: &Self::Model) -> Result<Self::Model> {
        let body = CreateChatApiKeyRequest {
            name: plan.name.clone(),
            api_key: plan
                .api_key
                .clone()
                .ok_or_else(|| ProviderError::validation("api_key", "must be set to create a key"))?,
            provider: LlmProvider::parse("llm_provider", &plan.llm_provider)?,
            is_organization_default: plan.is_organization_default.unwrap_or(false),
        };

        let key = self
            .client
            .get()?
            .create_chat_api_key(&body)
            .await?
            .into_payload(&[StatusCode::OK], "create chat LLM provider API key")?;
        Ok(plan.refreshed(key))
    }

    async fn read(&self, state: &Self::Model) -> Result<Tracked<Self::Model>> {
        let id = state.parsed_id()?;
        let response = self.client.get()?.get_chat_api_key(id).await?;
        if response.is_not_found() {
            return Ok(Tracked::Removed);
        }
        let key = response.into_payload(&[StatusCode::OK], "read chat LLM provider API key")?;
        Ok(Tracked::Present(state.refreshed(key)))
    }

    async fn update(&self, plan: &Self::Model, prior: &Self::Model) -> Result<Self::Model> {
        let id = prior.parsed_id()?;
        let client = self.client.get()?;

        let body = UpdateChatApiKeyRequest {
            name: Some(plan.name.clone()),
            api_key: plan.api_key.clone(),
        };
        client
            .update_chat_api_key(id, &body)
            .await?
            .into_payload(&[StatusCode::OK], "update chat LLM provider API key")?;

        let wanted = plan.is_organization_default.unwrap_or(false);
        if prior.is_organization_default.unwrap_or(false) != wanted {
            if wanted {
                client
                    .set_chat_api_key_default(id)
                    .await?
                    .ensure_status(&[StatusCode::OK], "set chat LLM provider API key as default")?;
            } else {
                client
                    .unset_chat_api_key_default(id)
                    .await?
                    .ensure_status(&[StatusCode::OK], "unset chat LLM provider API key as default")?;
            }
        }

        let key = client
            .get_chat_api_key(id)
            .await?
            .into_payload(&[StatusCode::OK], "read chat LLM provider API key after update")?;
        Ok(plan.refreshed(key))
    }

    async fn delete(&self, state: &Self::Model) -> Result<()> {
        let id = state.parsed_id()?;
        self.client
            .get()?
            .delete_chat_api_key(id)
            .await?
            .ensure_status(
                &[StatusCode::OK, StatusCode::NOT_FOUND],
                "delete chat LLM provider API key",
            )
    }
}
