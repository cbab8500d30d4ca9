#![allow(dead_code)]

use httpmock::MockServer;
use serde_json::Value;
use std::sync::Arc;
use terraform_provider_archestra::core::lifecycle::{DynDataSource, DynResource};
use terraform_provider_archestra::{ArchestraClient, ArchestraProvider, AttributeMap, SharedClient};

pub const API_KEY: &str = "test-api-key";

/// Provider whose client already points at `server`.
pub fn provider_for(server: &MockServer) -> ArchestraProvider {
    let client = ArchestraClient::new(&server.base_url(), API_KEY).expect("client");
    ArchestraProvider::with_client("test", SharedClient::from_client(client))
}

pub fn resource(provider: &ArchestraProvider, type_name: &str) -> Arc<dyn DynResource> {
    provider.resource(type_name).expect("registered resource")
}

pub fn data_source(provider: &ArchestraProvider, type_name: &str) -> Arc<dyn DynDataSource> {
    provider.data_source(type_name).expect("registered data source")
}

pub fn attrs(value: Value) -> AttributeMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}
