use crate::adapters::http::types::{LlmProvider, TokenPrice, TokenPriceRequest};
use crate::adapters::http::SharedClient;
use crate::domain::model::Tracked;
use crate::domain::ports::Resource;
use crate::domain::schema::{Attribute, Schema};
use crate::utils::error::Result;
use crate::utils::validation::validate_uuid;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenPriceModel {
    pub id: Option<String>,
    pub llm_provider: String,
    pub model: String,
    pub price_per_million_input: String,
    pub price_per_million_output: String,
}

impl TokenPriceModel {
    fn parsed_id(&self) -> Result<Uuid> {
        validate_uuid("token price", self.id.as_deref().unwrap_or_default())
    }

    fn to_request(&self) -> Result<TokenPriceRequest> {
        Ok(TokenPriceRequest {
            provider: LlmProvider::parse("llm_provider", &self.llm_provider)?,
            model: self.model.clone(),
            price_per_million_input: self.price_per_million_input.clone(),
            price_per_million_output: self.price_per_million_output.clone(),
        })
    }
}

impl From<TokenPrice> for TokenPriceModel {
    fn from(price: TokenPrice) -> Self {
        Self {
            id: Some(price.id.to_string()),
            llm_provider: price.provider,
            model: price.model,
            price_per_million_input: price.price_per_million_input,
            price_per_million_output: price.price_per_million_output,
        }
    }
}

pub struct TokenPriceResource {
    client: SharedClient,
}

impl TokenPriceResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for TokenPriceResource {
    type Model = TokenPriceModel;

    fn type_suffix(&self) -> &'static str {
        "token_price"
    }

    fn schema(&self) -> Schema {
        Schema::new("Manages per-model token pricing used for cost tracking.")
            .attribute(
                "id",
                Attribute::computed_string()
                    .with_description("Token price identifier")
                    .use_state_for_unknown(),
            )
            .attribute(
                "llm_provider",
                Attribute::required_string()
                    .with_description("The LLM provider")
                    .one_of(&["openai", "anthropic", "gemini"]),
            )
            .attribute(
                "model",
                Attribute::required_string().with_description("The model name"),
            )
            .attribute(
                "price_per_million_input",
                Attribute::required_string()
                    .with_description("Price per million input tokens, as a decimal string"),
            )
            .attribute(
                "price_per_million_output",
                Attribute::required_string()
                    .with_description("Price per million output tokens, as a decimal string"),
            )
    }

    async fn create(&self, plan: &Self::Model) -> Result<Self::Model> {
        let price = self
            .client
            .get()?
            .create_token_price(&plan.to_request()?)
            .await?
            .into_payload(&[StatusCode::OK], "create token price")?;
        Ok(price.into())
    }

    async fn read(&self, state: &Self::Model) -> Result<Tracked<Self::Model>> {
        let id = state.parsed_id()?;
        let response = self.client.get()?.get_token_price(id).await?;
        if response.is_not_found() {
            return Ok(Tracked::Removed);
        }
        let price = response.into_payload(&[StatusCode::OK], "read token price")?;
        Ok(Tracked::Present(price.into()))
    }

    async fn update(&self, plan: &Self::Model, prior: &Self::Model) -> Result<Self::Model> {
        let id = prior.parsed_id()?;
        let price = self
            .client
            .get()?
            .update_token_price(id, &plan.to_request()?)
            .await?
            .into_payload(&[StatusCode::OK], "update token price")?;
        Ok(price.into())
    }

    async fn delete(&self, state: &Self::Model) -> Result<()> {
        let id = state.parsed_id()?;
        self.client
            .get()?
            .delete_token_price(id)
            .await?
            .ensure_status(&[StatusCode::OK, StatusCode::NOT_FOUND], "delete token price")
    }
}
