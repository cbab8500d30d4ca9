//! Typed client for the Archestra REST API.

pub mod types;

use crate::utils::error::{ProviderError, Result};
use crate::utils::validation::validate_url;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};
use types::*;
use url::Url;
use uuid::Uuid;

/// Status and raw body of one call; the body decodes as `T` on demand.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub body: String,
    payload: PhantomData<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            payload: PhantomData,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// Fails unless the status is one of `expected`.
    pub fn ensure_status(&self, expected: &[StatusCode], action: &str) -> Result<()> {
        if expected.contains(&self.status) {
            return Ok(());
        }
        Err(ProviderError::UnexpectedStatusError {
            action: action.to_string(),
            expected: expected
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" or "),
            status: self.status.as_u16(),
            body: self.body.clone(),
        })
    }

}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// The decoded payload, provided the status is one of `expected`.
    pub fn into_payload(self, expected: &[StatusCode], action: &str) -> Result<T> {
        self.ensure_status(expected, action)?;
        if self.body.trim().is_empty() {
            return Err(ProviderError::EmptyResponseError {
                action: action.to_string(),
            });
        }
        serde_json::from_str(&self.body).map_err(|e| ProviderError::ResponseDecodeError {
            action: action.to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ArchestraClient {
    http: Client,
    base_url: String,
    base: Url,
    api_key: String,
}

impl ArchestraClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        validate_url("base_url", base_url)?;
        let base = Url::parse(base_url)?;

        let http = Client::builder()
            .user_agent(concat!("terraform-provider-archestra/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::config(format!("Archestra Client Error: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            base,
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::config(format!("{} cannot be used as a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<ApiResponse<T>> {
        let response = request
            .header(AUTHORIZATION, &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::request(action, e))?;

        let status = response.status();
        tracing::debug!("API response status for {}: {}", action, status);

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::request(action, e))?;

        Ok(ApiResponse::new(status, body))
    }

    async fn get<T>(&self, path: &[&str], action: &str) -> Result<ApiResponse<T>> {
        let url = self.endpoint(path)?;
        tracing::debug!("Making API request to: GET {}", url);
        self.send(self.http.get(url), action).await
    }

    async fn post<B: Serialize + ?Sized, T>(
        &self,
        path: &[&str],
        body: Option<&B>,
        action: &str,
    ) -> Result<ApiResponse<T>> {
        let url = self.endpoint(path)?;
        tracing::debug!("Making API request to: POST {}", url);
        let mut request = self.http.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request, action).await
    }

    async fn put<B: Serialize + ?Sized, T>(
        &self,
        path: &[&str],
        body: &B,
        action: &str,
    ) -> Result<ApiResponse<T>> {
        let url = self.endpoint(path)?;
        tracing::debug!("Making API request to: PUT {}", url);
        self.send(self.http.put(url).json(body), action).await
    }

    async fn patch<B: Serialize + ?Sized, T>(
        &self,
        path: &[&str],
        body: &B,
        action: &str,
    ) -> Result<ApiResponse<T>> {
        let url = self.endpoint(path)?;
        tracing::debug!("Making API request to: PATCH {}", url);
        self.send(self.http.patch(url).json(body), action).await
    }

    async fn delete(&self, path: &[&str], action: &str) -> Result<ApiResponse<Value>> {
        let url = self.endpoint(path)?;
        tracing::debug!("Making API request to: DELETE {}", url);
        self.send(self.http.delete(url), action).await
    }

    // Organization

    pub async fn get_organization(&self) -> Result<ApiResponse<Organization>> {
        self.get(&["api", "organization"], "read organization settings")
            .await
    }

    pub async fn update_organization(
        &self,
        body: &UpdateOrganizationRequest,
    ) -> Result<ApiResponse<Organization>> {
        self.patch(&["api", "organization"], body, "update organization settings")
            .await
    }

    // Chat API keys

    pub async fn create_chat_api_key(
        &self,
        body: &CreateChatApiKeyRequest,
    ) -> Result<ApiResponse<ChatApiKey>> {
        self.post(
            &["api", "chat-api-keys"],
            Some(body),
            "create chat LLM provider API key",
        )
        .await
    }

    pub async fn get_chat_api_key(&self, id: Uuid) -> Result<ApiResponse<ChatApiKey>> {
        self.get(
            &["api", "chat-api-keys", &id.to_string()],
            "read chat LLM provider API key",
        )
        .await
    }

    pub async fn update_chat_api_key(
        &self,
        id: Uuid,
        body: &UpdateChatApiKeyRequest,
    ) -> Result<ApiResponse<ChatApiKey>> {
        self.patch(
            &["api", "chat-api-keys", &id.to_string()],
            body,
            "update chat LLM provider API key",
        )
        .await
    }

    pub async fn set_chat_api_key_default(&self, id: Uuid) -> Result<ApiResponse<Value>> {
        self.post::<Value, _>(
            &["api", "chat-api-keys", &id.to_string(), "set-default"],
            None,
            "set chat LLM provider API key as default",
        )
        .await
    }

    pub async fn unset_chat_api_key_default(&self, id: Uuid) -> Result<ApiResponse<Value>> {
        self.post::<Value, _>(
            &["api", "chat-api-keys", &id.to_string(), "unset-default"],
            None,
            "unset chat LLM provider API key as default",
        )
        .await
    }

    pub async fn delete_chat_api_key(&self, id: Uuid) -> Result<ApiResponse<Value>> {
        self.delete(
            &["api", "chat-api-keys", &id.to_string()],
            "delete chat LLM provider API key",
        )
        .await
    }

    // Token prices

    pub async fn create_token_price(
        &self,
        body: &TokenPriceRequest,
    ) -> Result<ApiResponse<TokenPrice>> {
        self.post(&["api", "token-prices"], Some(body), "create token price")
            .await
    }

    pub async fn get_token_price(&self, id: Uuid) -> Result<ApiResponse<TokenPrice>> {
        self.get(&["api", "token-prices", &id.to_string()], "read token price")
            .await
    }

    pub async fn update_token_price(
        &self,
        id: Uuid,
        body: &TokenPriceRequest,
    ) -> Result<ApiResponse<TokenPrice>> {
        self.put(
            &["api", "token-prices", &id.to_string()],
            body,
            "update token price",
        )
        .await
    }

    pub async fn delete_token_price(&self, id: Uuid) -> Result<ApiResponse<Value>> {
        self.delete(&["api", "token-prices", &id.to_string()], "delete token price")
            .await
    }

    // Internal MCP catalog

    pub async fn create_mcp_catalog_item(
        &self,
        body: &McpCatalogItemRequest,
    ) -> Result<ApiResponse<McpCatalogItem>> {
        self.post(&["api", "internal_mcp_catalog"], Some(body), "create MCP server")
            .await
    }

    pub async fn get_mcp_catalog_item(&self, id: Uuid) -> Result<ApiResponse<McpCatalogItem>> {
        self.get(
            &["api", "internal_mcp_catalog", &id.to_string()],
            "read MCP server",
        )
        .await
    }

    pub async fn update_mcp_catalog_item(
        &self,
        id: Uuid,
        body: &McpCatalogItemRequest,
    ) -> Result<ApiResponse<McpCatalogItem>> {
        self.put(
            &["api", "internal_mcp_catalog", &id.to_string()],
            body,
            "update MCP server",
        )
        .await
    }

    pub async fn delete_mcp_catalog_item(&self, id: Uuid) -> Result<ApiResponse<Value>> {
        self.delete(
            &["api", "internal_mcp_catalog", &id.to_string()],
            "delete MCP server",
        )
        .await
    }

    // SSO providers

    pub async fn create_sso_provider(
        &self,
        body: &SsoProviderRequest,
    ) -> Result<ApiResponse<SsoProvider>> {
        self.post(&["api", "sso-providers"], Some(body), "create SSO provider")
            .await
    }

    pub async fn get_sso_provider(&self, id: &str) -> Result<ApiResponse<SsoProvider>> {
        self.get(&["api", "sso-providers", id], "read SSO provider")
            .await
    }

    pub async fn update_sso_provider(
        &self,
        id: &str,
        body: &SsoProviderRequest,
    ) -> Result<ApiResponse<SsoProvider>> {
        self.put(
            &["api", "sso-providers", id],
            body,
            "update SSO provider",
        )
        .await
    }

    pub async fn delete_sso_provider(&self, id: &str) -> Result<ApiResponse<Value>> {
        self.delete(&["api", "sso-providers", id], "delete SSO provider")
            .await
    }
}

/// Client slot filled once by provider configuration and read by every
/// resource and data source.
#[derive(Debug, Clone, Default)]
pub struct SharedClient(Arc<OnceLock<Arc<ArchestraClient>>>);

impl SharedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_client(client: ArchestraClient) -> Self {
        let shared = Self::default();
        let _ = shared.0.set(Arc::new(client));
        shared
    }

    /// Returns false when a client was already installed.
    pub fn install(&self, client: Arc<ArchestraClient>) -> bool {
        self.0.set(client).is_ok()
    }

    pub fn get(&self) -> Result<Arc<ArchestraClient>> {
        self.0
            .get()
            .cloned()
            .ok_or_else(|| ProviderError::UnconfiguredError {
                message: "Expected a configured Archestra API client. Please report this issue to the provider developers.".to_string(),
            })
    }
}
