pub mod chat_llm_provider_api_key;
pub mod mcp_server_registry;
pub mod organization_settings;
pub mod sso_provider;
pub mod token_price;
