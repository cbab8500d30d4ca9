use crate::adapters::http::types::{
    AuthField, EnvironmentVariable, LocalConfig, McpCatalogItem, McpCatalogItemRequest,
    TransportType,
};
use crate::adapters::http::SharedClient;
use crate::domain::model::Tracked;
use crate::domain::ports::Resource;
use crate::domain::schema::{nested, Attribute, AttributeMode, Schema};
use crate::utils::error::{ProviderError, Result};
use crate::utils::validation::validate_uuid;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

const SERVER_TYPE_LOCAL: &str = "local";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfigModel {
    pub command: String,
    pub arguments: Option<Vec<String>>,
    pub environment: Option<BTreeMap<String, String>>,
    pub docker_image: Option<String>,
    pub transport_type: Option<String>,
    pub http_port: Option<i64>,
    pub http_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthFieldModel {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpServerModel {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub docs_url: Option<String>,
    pub installation_command: Option<String>,
    pub auth_description: Option<String>,
    pub local_config: Option<LocalConfigModel>,
    pub auth_fields: Option<Vec<AuthFieldModel>>,
}

impl LocalConfigModel {
    fn to_wire(&self) -> Result<LocalConfig> {
        let transport_type = self
            .transport_type
            .as_deref()
            .map(|v| TransportType::parse("local_config.transport_type", v))
            .transpose()?;

        Ok(LocalConfig {
            command: Some(self.command.clone()),
            arguments: self.arguments.clone(),
            // BTreeMap iteration keeps the entries sorted by key.
            environment: self.environment.as_ref().map(|env| {
                env.iter()
                    .map(|(key, value)| EnvironmentVariable::plain(key, value))
                    .collect()
            }),
            docker_image: self.docker_image.clone(),
            transport_type: transport_type.map(|t| t.as_str().to_string()),
            http_port: self.http_port.map(|p| p as f64),
            http_path: self.http_path.clone(),
        })
    }

    fn from_wire(config: LocalConfig) -> Self {
        Self {
            command: config.command.unwrap_or_default(),
            arguments: config.arguments.filter(|args| !args.is_empty()),
            environment: config.environment.filter(|env| !env.is_empty()).map(|env| {
                env.into_iter()
                    .map(|var| (var.key, var.value.unwrap_or_default()))
                    .collect()
            }),
            docker_image: config.docker_image,
            transport_type: config.transport_type,
            http_port: config.http_port.map(|p| p as i64),
            http_path: config.http_path,
        }
    }
}

impl From<AuthFieldModel> for AuthField {
    fn from(field: AuthFieldModel) -> Self {
        Self {
            name: field.name,
            label: field.label,
            field_type: field.field_type,
            required: field.required,
            description: field.description,
        }
    }
}

impl From<AuthField> for AuthFieldModel {
    fn from(field: AuthField) -> Self {
        Self {
            name: field.name,
            label: field.label,
            field_type: field.field_type,
            required: field.required,
            description: field.description,
        }
    }
}

impl McpServerModel {
    fn parsed_id(&self) -> Result<Uuid> {
        validate_uuid("MCP server", self.id.as_deref().unwrap_or_default())
    }

    fn to_request(&self, server_type: Option<&str>) -> Result<McpCatalogItemRequest> {
        Ok(McpCatalogItemRequest {
            name: self.name.clone(),
            server_type: server_type.map(str::to_string),
            description: self.description.clone(),
            docs_url: self.docs_url.clone(),
            installation_command: self.installation_command.clone(),
            auth_description: self.auth_description.clone(),
            local_config: self
                .local_config
                .as_ref()
                .map(LocalConfigModel::to_wire)
                .transpose()?,
            auth_fields: self
                .auth_fields
                .clone()
                .map(|fields| fields.into_iter().map(AuthField::from).collect()),
        })
    }
}

impl From<McpCatalogItem> for McpServerModel {
    fn from(item: McpCatalogItem) -> Self {
        Self {
            id: Some(item.id.to_string()),
            name: item.name,
            description: item.description,
            docs_url: item.docs_url,
            installation_command: item.installation_command,
            auth_description: item.auth_description,
            local_config: item.local_config.map(LocalConfigModel::from_wire),
            auth_fields: item
                .auth_fields
                .filter(|fields| !fields.is_empty())
                .map(|fields| fields.into_iter().map(AuthFieldModel::from).collect()),
        }
    }
}

/// An entry of the private MCP registry (the internal MCP catalog).
pub struct McpServerRegistryResource {
    client: SharedClient,
}

impl McpServerRegistryResource {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    async fn fetch(&self, id: Uuid) -> Result<Tracked<McpServerModel>> {
        let response = self.client.get()?.get_mcp_catalog_item(id).await?;
        if response.is_not_found() {
            return Ok(Tracked::Removed);
        }
        let item = response.into_payload(&[StatusCode::OK], "read MCP server")?;
        Ok(Tracked::Present(item.into()))
    }
}

#[async_trait]
impl Resource for McpServerRegistryResource {
    type Model = McpServerModel;

    fn type_suffix(&self) -> &'static str {
        "mcp_server"
    }

    fn schema(&self) -> Schema {
        let local_config = nested([
            (
                "command",
                Attribute::required_string()
                    .with_description("The executable command to run (e.g. 'node', 'python', 'npx')"),
            ),
            (
                "arguments",
                Attribute::string_list(AttributeMode::Optional)
                    .with_description("Arguments to pass to the command"),
            ),
            (
                "environment",
                Attribute::string_map(AttributeMode::Optional)
                    .with_description("Environment variables for the MCP server"),
            ),
            (
                "docker_image",
                Attribute::optional_string().with_description(
                    "Custom Docker image. Archestra's default base image is used when unset.",
                ),
            ),
            (
                "transport_type",
                Attribute::optional_string()
                    .with_description("Transport type, defaults to 'stdio' on the server")
                    .one_of(TransportType::VALUES),
            ),
            (
                "http_port",
                Attribute::int64(AttributeMode::Optional)
                    .with_description("HTTP port for streamable-http transport"),
            ),
            (
                "http_path",
                Attribute::optional_string()
                    .with_description("HTTP path for streamable-http transport (e.g. '/mcp')"),
            ),
        ]);

        let auth_field = nested([
            (
                "name",
                Attribute::required_string()
                    .with_description("Field name, exposed as an environment variable"),
            ),
            (
                "label",
                Attribute::required_string().with_description("Display label for the field"),
            ),
            (
                "type",
                Attribute::required_string()
                    .with_description("Field type: 'text', 'password', 'select', etc."),
            ),
            (
                "required",
                Attribute::bool(AttributeMode::Required)
                    .with_description("Whether this field is required"),
            ),
            (
                "description",
                Attribute::optional_string().with_description("Description of the field"),
            ),
        ]);

        Schema::new(
            "Manages an MCP server in the private MCP registry. Registered local servers can then be installed by agents.",
        )
        .attribute(
            "id",
            Attribute::computed_string()
                .with_description("MCP server catalog identifier")
                .use_state_for_unknown(),
        )
        .attribute(
            "name",
            Attribute::required_string().with_description("The name of the MCP server"),
        )
        .attribute(
            "description",
            Attribute::optional_string().with_description("Description of the MCP server"),
        )
        .attribute(
            "docs_url",
            Attribute::optional_string().with_description("URL of the MCP server documentation"),
        )
        .attribute(
            "installation_command",
            Attribute::optional_string().with_description("Installation command for the MCP server"),
        )
        .attribute(
            "auth_description",
            Attribute::optional_string()
                .with_description("Description of the authentication requirements"),
        )
        .attribute(
            "local_config",
            Attribute::single_nested(AttributeMode::Optional, local_config)
                .with_description("How the Archestra MCP runtime launches the server"),
        )
        .attribute(
            "auth_fields",
            Attribute::list_nested(AttributeMode::Optional, auth_field)
                .with_description("Custom authentication fields required by the MCP server"),
        )
    }

    async fn create(&self, plan: &Self::Model) -> Result<Self::Model> {
        let item = self
            .client
            .get()?
            .create_mcp_catalog_item(&plan.to_request(Some(SERVER_TYPE_LOCAL))?)
            .await?
            .into_payload(&[StatusCode::OK], "create MCP server")?;

        Ok(McpServerModel {
            id: Some(item.id.to_string()),
            name: item.name,
            ..plan.clone()
        })
    }

    async fn read(&self, state: &Self::Model) -> Result<Tracked<Self::Model>> {
        self.fetch(state.parsed_id()?).await
    }

    async fn update(&self, plan: &Self::Model, prior: &Self::Model) -> Result<Self::Model> {
        let id = prior.parsed_id()?;
        self.client
            .get()?
            .update_mcp_catalog_item(id, &plan.to_request(None)?)
            .await?
            .ensure_status(&[StatusCode::OK], "update MCP server")?;

        match self.fetch(id).await? {
            Tracked::Present(model) => Ok(model),
            Tracked::Removed => Err(ProviderError::NotFoundError {
                resource: "MCP server".to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn delete(&self, state: &Self::Model) -> Result<()> {
        let id = state.parsed_id()?;
        self.client
            .get()?
            .delete_mcp_catalog_item(id)
            .await?
            .ensure_status(&[StatusCode::OK, StatusCode::NOT_FOUND], "delete MCP server")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_environment_sent_as_sorted_entries() {
        let config = LocalConfigModel {
            command: "npx".to_string(),
            environment: Some(BTreeMap::from([
                ("ZETA".to_string(), "z".to_string()),
                ("ALPHA".to_string(), "a".to_string()),
            ])),
            http_port: Some(8080),
            ..Default::default()
        };

        let wire = serde_json::to_value(config.to_wire().unwrap()).unwrap();
        assert_eq!(
            wire,
            json!({
                "command": "npx",
                "environment": [
                    {"key": "ALPHA", "type": "string", "value": "a", "promptOnInstallation": false},
                    {"key": "ZETA", "type": "string", "value": "z", "promptOnInstallation": false}
                ],
                "httpPort": 8080.0
            })
        );
    }

    #[test]
    fn test_empty_lists_read_back_as_unset() {
        let item: McpCatalogItem = serde_json::from_value(json!({
            "id": "6f1f5a9e-3c1e-4c55-8a6b-0d6a3f0e9b21",
            "name": "filesystem",
            "localConfig": {
                "command": "npx",
                "arguments": [],
                "environment": [{"key": "ROOT", "type": "string", "promptOnInstallation": false}],
                "httpPort": 3000
            },
            "authFields": []
        }))
        .unwrap();

        let model = McpServerModel::from(item);
        let local = model.local_config.unwrap();
        assert_eq!(local.arguments, None);
        assert_eq!(
            local.environment,
            Some(BTreeMap::from([("ROOT".to_string(), String::new())]))
        );
        assert_eq!(local.http_port, Some(3000));
        assert_eq!(model.auth_fields, None);
    }
}
