mod common;

use anyhow::Result;
use common::{attrs, data_source, provider_for, resource};
use httpmock::prelude::*;
use serde_json::json;
use terraform_provider_archestra::Diagnostics;

fn sso_response() -> serde_json::Value {
    json!({
        "id": "sso_abc123",
        "issuer": "https://accounts.google.com",
        "domain": "example.com",
        "organizationId": "org-1",
        "userId": "user-1",
        "domainVerified": true
    })
}

fn oidc_config() -> serde_json::Value {
    json!({
        "issuer": "https://accounts.google.com",
        "provider_id": "google",
        "domain": "example.com",
        "oidc_config": {
            "client_id": "client-id",
            "client_secret": "client-secret",
            "discovery_endpoint": "https://accounts.google.com/.well-known/openid-configuration",
            "issuer": "https://accounts.google.com",
            "pkce": true,
            "scopes": ["openid", "email"],
            "mapping": {"email": "email", "name": "name"}
        },
        "role_mapping": {
            "default_role": "member",
            "rules": [{"expression": "'admins' in groups", "role": "admin"}]
        }
    })
}

#[tokio::test]
async fn test_create_and_read_preserve_configuration() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let sso = resource(&provider, "archestra_sso_provider");

    let create_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/sso-providers").json_body(json!({
                "issuer": "https://accounts.google.com",
                "domain": "example.com",
                "providerId": "google",
                "oidcConfig": {
                    "clientId": "client-id",
                    "clientSecret": "client-secret",
                    "discoveryEndpoint": "https://accounts.google.com/.well-known/openid-configuration",
                    "issuer": "https://accounts.google.com",
                    "pkce": true,
                    "scopes": ["openid", "email"],
                    "mapping": {"email": "email", "name": "name"}
                },
                "roleMapping": {
                    "defaultRole": "member",
                    "rules": [{"expression": "'admins' in groups", "role": "admin"}]
                }
            }));
            then.status(201).json_body(sso_response());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/sso-providers/sso_abc123");
            then.status(200).json_body(sso_response());
        })
        .await;

    let mut diags = Diagnostics::new();
    let state = sso
        .create(&mut diags, &attrs(oidc_config()))
        .await
        .expect("created");
    assert!(!diags.has_errors(), "{}", diags);
    create_mock.assert_async().await;

    assert_eq!(state["id"], "sso_abc123");
    assert_eq!(state["provider_id"], "google");
    assert_eq!(state["organization_id"], "org-1");
    assert_eq!(state["domain_verified"], true);
    assert_eq!(state["oidc_config"]["client_secret"], "client-secret");

    let refreshed = sso.read(&mut diags, &state).await.expect("present");
    assert!(!diags.has_errors(), "{}", diags);
    assert_eq!(refreshed, state);
    Ok(())
}

#[tokio::test]
async fn test_saml_sign_on_services_are_sent() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let sso = resource(&provider, "archestra_sso_provider");

    let create_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/sso-providers").json_body_partial(
                r#"{
                    "providerId": "okta",
                    "samlConfig": {
                        "idpMetadata": {
                            "singleSignOnService": [
                                {"Binding": "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect", "Location": "https://okta.example.com/sso"}
                            ]
                        },
                        "spMetadata": {"entityID": "archestra"}
                    }
                }"#,
            );
            then.status(201).json_body(sso_response());
        })
        .await;

    let config = attrs(json!({
        "issuer": "https://okta.example.com",
        "provider_id": "okta",
        "domain": "example.com",
        "saml_config": {
            "callback_url": "https://archestra.example.com/api/auth/sso/saml2/callback/okta",
            "cert": "MIIC",
            "entry_point": "https://okta.example.com/sso",
            "issuer": "archestra",
            "idp_metadata": {
                "single_sign_on_service": [{
                    "binding": "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect",
                    "location": "https://okta.example.com/sso"
                }]
            },
            "sp_metadata": {"entity_id": "archestra"}
        }
    }));

    let mut diags = Diagnostics::new();
    let state = sso.create(&mut diags, &config).await.expect("created");
    assert!(!diags.has_errors(), "{}", diags);
    create_mock.assert_async().await;
    assert_eq!(
        state["saml_config"]["idp_metadata"]["single_sign_on_service"][0]["location"],
        "https://okta.example.com/sso"
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_nested_required_attribute() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let sso = resource(&provider, "archestra_sso_provider");

    let mut config = attrs(oidc_config());
    config["oidc_config"]
        .as_object_mut()
        .expect("object")
        .remove("client_id");

    let mut diags = Diagnostics::new();
    assert!(sso.plan(&mut diags, &config, None).is_none());
    let error = diags.errors().next().expect("error");
    assert_eq!(error.summary, "Missing required argument");
    assert_eq!(error.attribute.as_deref(), Some("oidc_config.client_id"));
    Ok(())
}

#[tokio::test]
async fn test_update_and_delete() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let sso = resource(&provider, "archestra_sso_provider");

    let update_mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/api/sso-providers/sso_abc123")
                .json_body_partial(r#"{"domain": "example.org"}"#);
            then.status(200).json_body(json!({
                "id": "sso_abc123",
                "issuer": "https://accounts.google.com",
                "domain": "example.org",
                "providerId": "google"
            }));
        })
        .await;
    let delete_mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/sso-providers/sso_abc123");
            then.status(204);
        })
        .await;

    let mut prior = attrs(oidc_config());
    prior.insert("id".to_string(), json!("sso_abc123"));
    let mut desired = attrs(oidc_config());
    desired.insert("domain".to_string(), json!("example.org"));

    let mut diags = Diagnostics::new();
    let state = sso
        .update(&mut diags, &desired, &prior)
        .await
        .expect("updated");
    update_mock.assert_async().await;
    assert_eq!(state["domain"], "example.org");
    assert_eq!(state["user_id"], "");

    sso.delete(&mut diags, &state).await;
    assert!(!diags.has_errors(), "{}", diags);
    delete_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_data_source_reads_provider() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let lookup = data_source(&provider, "archestra_sso_provider");

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/sso-providers/sso_abc123");
            then.status(200).json_body(sso_response());
        })
        .await;

    let mut diags = Diagnostics::new();
    let state = lookup
        .read(&mut diags, &attrs(json!({"id": "sso_abc123"})))
        .await
        .expect("found");
    assert!(!diags.has_errors(), "{}", diags);

    assert_eq!(state["issuer"], "https://accounts.google.com");
    assert_eq!(state["provider_id"], "");
    assert_eq!(state["user_id"], "user-1");
    assert_eq!(state["domain_verified"], true);
    Ok(())
}

#[tokio::test]
async fn test_data_source_not_found() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let lookup = data_source(&provider, "archestra_sso_provider");

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/sso-providers/missing");
            then.status(404);
        })
        .await;

    let mut diags = Diagnostics::new();
    assert!(lookup
        .read(&mut diags, &attrs(json!({"id": "missing"})))
        .await
        .is_none());

    let error = diags.errors().next().expect("error");
    assert_eq!(error.summary, "SSO provider not found");
    assert_eq!(error.detail, "SSO provider with ID missing not found");
    Ok(())
}

#[tokio::test]
async fn test_data_source_rejects_computed_inputs() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let lookup = data_source(&provider, "archestra_sso_provider");

    let mut diags = Diagnostics::new();
    let config = attrs(json!({"id": "sso_abc123", "domain": "example.com"}));
    assert!(lookup.read(&mut diags, &config).await.is_none());
    assert_eq!(
        diags.errors().next().map(|d| d.summary.as_str()),
        Some("Invalid Configuration for Read-Only Attribute")
    );
    Ok(())
}
