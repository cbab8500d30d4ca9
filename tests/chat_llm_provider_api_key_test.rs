mod common;

use anyhow::Result;
use common::{attrs, provider_for, resource, API_KEY};
use httpmock::prelude::*;
use serde_json::json;
use terraform_provider_archestra::adapters::http::types::LlmProvider;
use terraform_provider_archestra::Diagnostics;

const KEY_ID: &str = "3b0f6c2e-8a4d-4f1e-9c57-2d8e6a1b4c90";

fn api_key(is_default: bool) -> serde_json::Value {
    json!({
        "id": KEY_ID,
        "name": "OpenAI production",
        "provider": "openai",
        "isOrganizationDefault": is_default,
        "createdAt": "2025-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn test_create_keeps_secret_and_defaults_flag() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let keys = resource(&provider, "archestra_chat_llm_provider_api_key");

    let create_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat-api-keys")
                .header("authorization", API_KEY)
                .json_body(json!({
                    "name": "OpenAI production",
                    "apiKey": "sk-secret",
                    "provider": "openai",
                    "isOrganizationDefault": false
                }));
            then.status(200).json_body(api_key(false));
        })
        .await;

    let mut diags = Diagnostics::new();
    let config = attrs(json!({
        "name": "OpenAI production",
        "api_key": "sk-secret",
        "llm_provider": "openai"
    }));
    let state = keys.create(&mut diags, &config).await.expect("created");
    assert!(!diags.has_errors(), "{}", diags);
    create_mock.assert_async().await;

    assert_eq!(state["id"], KEY_ID);
    assert_eq!(state["api_key"], "sk-secret");
    assert_eq!(state["is_organization_default"], false);
    Ok(())
}

#[tokio::test]
async fn test_toggling_default_issues_secondary_call() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let keys = resource(&provider, "archestra_chat_llm_provider_api_key");
    let key_path = format!("/api/chat-api-keys/{}", KEY_ID);

    let patch_mock = server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path(key_path.as_str())
                .json_body(json!({"name": "OpenAI production", "apiKey": "sk-secret"}));
            then.status(200).json_body(api_key(false));
        })
        .await;
    let set_default = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{}/set-default", key_path));
            then.status(200).json_body(api_key(true));
        })
        .await;
    let unset_default = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{}/unset-default", key_path));
            then.status(200).json_body(api_key(false));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(key_path.as_str());
            then.status(200).json_body(api_key(true));
        })
        .await;

    let prior = attrs(json!({
        "id": KEY_ID,
        "name": "OpenAI production",
        "api_key": "sk-secret",
        "llm_provider": "openai",
        "is_organization_default": false
    }));
    let config = attrs(json!({
        "name": "OpenAI production",
        "api_key": "sk-secret",
        "llm_provider": "openai",
        "is_organization_default": true
    }));

    let mut diags = Diagnostics::new();
    let planned = keys.plan(&mut diags, &config, Some(&prior)).expect("plan");
    assert!(planned.requires_replace.is_empty());

    let state = keys
        .update(&mut diags, &planned.planned_state, &prior)
        .await
        .expect("updated");
    assert!(!diags.has_errors(), "{}", diags);

    patch_mock.assert_async().await;
    set_default.assert_hits_async(1).await;
    unset_default.assert_hits_async(0).await;
    assert_eq!(state["is_organization_default"], true);
    assert_eq!(state["api_key"], "sk-secret");

    let refreshed = keys.read(&mut diags, &state).await.expect("present");
    assert_eq!(refreshed["is_organization_default"], true);
    Ok(())
}

#[tokio::test]
async fn test_changing_provider_requires_replacement() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let keys = resource(&provider, "archestra_chat_llm_provider_api_key");

    let prior = attrs(json!({
        "id": KEY_ID,
        "name": "key",
        "api_key": "sk",
        "llm_provider": "openai",
        "is_organization_default": false
    }));
    let config = attrs(json!({"name": "key", "api_key": "sk", "llm_provider": "anthropic"}));

    let mut diags = Diagnostics::new();
    let planned = keys.plan(&mut diags, &config, Some(&prior)).expect("plan");
    assert_eq!(planned.requires_replace, vec!["llm_provider".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_missing_remote_key_is_removed_and_delete_tolerates_404() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let keys = resource(&provider, "archestra_chat_llm_provider_api_key");
    let key_path = format!("/api/chat-api-keys/{}", KEY_ID);

    server
        .mock_async(|when, then| {
            when.method(GET).path(key_path.as_str());
            then.status(404).json_body(json!({"error": "not found"}));
        })
        .await;
    let delete_mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path(key_path.as_str());
            then.status(404);
        })
        .await;

    let state = attrs(json!({
        "id": KEY_ID,
        "name": "key",
        "api_key": "sk",
        "llm_provider": "openai",
        "is_organization_default": false
    }));

    let mut diags = Diagnostics::new();
    assert!(keys.read(&mut diags, &state).await.is_none());
    keys.delete(&mut diags, &state).await;
    assert!(!diags.has_errors(), "{}", diags);
    delete_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_delete_failure_reports_status_and_body() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let keys = resource(&provider, "archestra_chat_llm_provider_api_key");

    server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("/api/chat-api-keys/{}", KEY_ID));
            then.status(500).body("boom");
        })
        .await;

    let mut diags = Diagnostics::new();
    keys.delete(&mut diags, &attrs(json!({"id": KEY_ID, "name": "k", "api_key": "sk", "llm_provider": "openai"})))
        .await;

    let error = diags.errors().next().expect("error");
    assert_eq!(error.summary, "Unexpected API Response");
    assert_eq!(error.detail, "Expected 200 OK or 404 Not Found, got status 500: boom");
    Ok(())
}

#[tokio::test]
async fn test_invalid_stored_id() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let keys = resource(&provider, "archestra_chat_llm_provider_api_key");

    let mut diags = Diagnostics::new();
    let state = attrs(json!({"id": "not-a-uuid", "name": "k", "api_key": "sk", "llm_provider": "openai"}));
    assert!(keys.read(&mut diags, &state).await.is_none());

    let error = diags.errors().next().expect("error");
    assert_eq!(error.summary, "Invalid ID");
    assert!(error
        .detail
        .starts_with("Unable to parse chat LLM provider API key ID"));
    Ok(())
}

#[tokio::test]
async fn test_planned_id_is_unknown_until_created() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let keys = resource(&provider, "archestra_chat_llm_provider_api_key");

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat-api-keys");
            then.status(200).json_body(api_key(false));
        })
        .await;

    let mut diags = Diagnostics::new();
    let config = attrs(json!({
        "name": "OpenAI production",
        "api_key": "sk-secret",
        "llm_provider": "openai"
    }));
    let planned = keys.plan(&mut diags, &config, None).expect("plan");
    assert_eq!(planned.unknown, vec!["id".to_string()]);
    assert!(planned.planned_state["id"].is_null());

    let state = keys
        .create(&mut diags, &planned.planned_state)
        .await
        .expect("created");
    assert!(!diags.has_errors(), "{}", diags);
    assert_eq!(state["id"], KEY_ID);
    Ok(())
}

#[tokio::test]
async fn test_clearing_default_calls_unset_default() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let keys = resource(&provider, "archestra_chat_llm_provider_api_key");
    let key_path = format!("/api/chat-api-keys/{}", KEY_ID);

    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PATCH).path(key_path.as_str());
            then.status(200).json_body(api_key(true));
        })
        .await;
    let set_default = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{}/set-default", key_path));
            then.status(200).json_body(api_key(true));
        })
        .await;
    let unset_default = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("{}/unset-default", key_path));
            then.status(200).json_body(api_key(false));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(key_path.as_str());
            then.status(200).json_body(api_key(false));
        })
        .await;

    let prior = attrs(json!({
        "id": KEY_ID,
        "name": "OpenAI production",
        "api_key": "sk-secret",
        "llm_provider": "openai",
        "is_organization_default": true
    }));
    let config = attrs(json!({
        "name": "OpenAI production",
        "api_key": "sk-secret",
        "llm_provider": "openai",
        "is_organization_default": false
    }));

    let mut diags = Diagnostics::new();
    let planned = keys.plan(&mut diags, &config, Some(&prior)).expect("plan");
    let state = keys
        .update(&mut diags, &planned.planned_state, &prior)
        .await
        .expect("updated");
    assert!(!diags.has_errors(), "{}", diags);

    unset_default.assert_hits_async(1).await;
    set_default.assert_hits_async(0).await;
    assert_eq!(state["is_organization_default"], false);
    Ok(())
}

#[tokio::test]
async fn test_import_then_read_is_stable_and_leaves_secret_unset() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let keys = resource(&provider, "archestra_chat_llm_provider_api_key");

    let read_mock = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/api/chat-api-keys/{}", KEY_ID));
            then.status(200).json_body(api_key(true));
        })
        .await;

    let mut diags = Diagnostics::new();
    let imported = keys.import(&mut diags, KEY_ID).await.expect("imported");
    assert!(!diags.has_errors(), "{}", diags);
    assert_eq!(imported["id"], KEY_ID);
    assert_eq!(imported["llm_provider"], "openai");
    assert_eq!(imported["is_organization_default"], true);
    assert!(imported.get("api_key").map_or(true, |v| v.is_null()));

    let reread = keys.read(&mut diags, &imported).await.expect("present");
    assert!(!diags.has_errors(), "{}", diags);
    assert_eq!(reread, imported);
    read_mock.assert_hits_async(2).await;
    Ok(())
}

#[tokio::test]
async fn test_every_llm_provider_round_trips() -> Result<()> {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server);
    let keys = resource(&provider, "archestra_chat_llm_provider_api_key");
    let key_path = format!("/api/chat-api-keys/{}", KEY_ID);

    for llm_provider in LlmProvider::VALUES {
        let body = json!({
            "id": KEY_ID,
            "name": "key",
            "provider": llm_provider,
            "isOrganizationDefault": false
        });
        let mut create_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/chat-api-keys")
                    .json_body_partial(json!({ "provider": llm_provider }).to_string());
                then.status(200).json_body(body.clone());
            })
            .await;
        let mut read_mock = server
            .mock_async(|when, then| {
                when.method(GET).path(key_path.as_str());
                then.status(200).json_body(body.clone());
            })
            .await;

        let mut diags = Diagnostics::new();
        let config = attrs(json!({"name": "key", "api_key": "sk", "llm_provider": llm_provider}));
        let state = keys.create(&mut diags, &config).await.expect("created");
        let refreshed = keys.read(&mut diags, &state).await.expect("present");
        assert!(!diags.has_errors(), "{}: {}", llm_provider, diags);
        assert_eq!(state["llm_provider"], *llm_provider);
        assert_eq!(refreshed, state);

        create_mock.assert_async().await;
        create_mock.delete_async().await;
        read_mock.delete_async().await;
    }
    Ok(())
}
