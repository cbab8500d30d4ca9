//! Terraform plugin protocol bridge over `tf-provider`.

use crate::core::lifecycle::{DynDataSource, DynResource, PlannedChange, TYPE_PREFIX};
use crate::core::provider::ArchestraProvider;
use crate::domain::model::{AttributeMap, ConfigValue, Diagnostics, ProviderConfig, Severity};
use crate::domain::schema::{Attribute, AttributeMode, AttributeType, Schema};
use crate::utils::error::{ProviderError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tf_provider::schema::{
    Attribute as TfAttribute, AttributeConstraint, AttributeType as TfAttributeType, Block,
    Description, Schema as TfSchema,
};
use tf_provider::value::{ValueAny, ValueEmpty};
use tf_provider::{AttributePath, DynamicDataSource, DynamicResource};

/// Serves the provider over the plugin protocol until Terraform disconnects.
pub async fn serve(provider: ArchestraProvider) -> Result<()> {
    tf_provider::serve(provider.type_name(), PluginProvider::new(provider))
        .await
        .map_err(|e| ProviderError::PluginError {
            message: e.to_string(),
        })
}

fn to_tf_attributes(attributes: &BTreeMap<String, Attribute>) -> HashMap<String, TfAttribute> {
    attributes
        .iter()
        .map(|(name, attr)| (name.clone(), to_tf_attribute(attr)))
        .collect()
}

fn to_tf_attribute(attribute: &Attribute) -> TfAttribute {
    TfAttribute {
        attr_type: to_tf_type(&attribute.attr_type),
        description: Description::plain(&attribute.description),
        constraint: match attribute.mode {
            AttributeMode::Required => AttributeConstraint::Required,
            AttributeMode::Optional => AttributeConstraint::Optional,
            AttributeMode::Computed => AttributeConstraint::Computed,
            AttributeMode::OptionalComputed => AttributeConstraint::OptionalComputed,
        },
        sensitive: attribute.sensitive,
        deprecated: false,
    }
}

fn to_tf_type(attr_type: &AttributeType) -> TfAttributeType {
    match attr_type {
        AttributeType::String => TfAttributeType::String,
        AttributeType::Bool => TfAttributeType::Bool,
        AttributeType::Int64 => TfAttributeType::Number,
        AttributeType::List(elem) => TfAttributeType::List(Box::new(to_tf_type(elem))),
        AttributeType::Map(elem) => TfAttributeType::Map(Box::new(to_tf_type(elem))),
        AttributeType::SingleNested(attrs) => {
            TfAttributeType::AttributeSingle(to_tf_attributes(attrs))
        }
        AttributeType::ListNested(attrs) => TfAttributeType::AttributeList(to_tf_attributes(attrs)),
    }
}

fn to_tf_schema(schema: &Schema) -> TfSchema {
    TfSchema {
        version: 1,
        block: Block {
            version: 1,
            attributes: to_tf_attributes(&schema.attributes),
            description: Description::plain(&schema.description),
            ..Default::default()
        },
    }
}

/// Parses `a.b[0].c` into protocol path steps.
fn attribute_path(path: &str) -> AttributePath {
    let mut steps = AttributePath::root();
    for segment in path.split('.') {
        let mut parts = segment.split('[');
        if let Some(name) = parts.next().filter(|n| !n.is_empty()) {
            steps.add_attribute(name.to_string());
        }
        for index in parts {
            if let Ok(i) = index.trim_end_matches(']').parse::<i64>() {
                steps.add_index(i);
            }
        }
    }
    steps
}

fn forward(diags: &mut tf_provider::Diagnostics, ours: Diagnostics) {
    for d in ours.iter() {
        let summary = d.summary.clone();
        let detail = d.detail.clone();
        match (d.severity, d.attribute.as_deref()) {
            (Severity::Error, Some(path)) => diags.error(summary, detail, attribute_path(path)),
            (Severity::Error, None) => diags.root_error(summary, detail),
            (Severity::Warning, Some(path)) => diags.warning(summary, detail, attribute_path(path)),
            (Severity::Warning, None) => diags.root_warning(summary, detail),
        }
    }
}

/// Unknown values become null; callers track them separately.
fn to_json(value: ValueAny) -> Value {
    match value {
        ValueAny::String(s) => Value::String(s),
        ValueAny::Number(n) => Value::from(n),
        ValueAny::Bool(b) => Value::Bool(b),
        ValueAny::List(items) => Value::Array(items.into_iter().map(to_json).collect()),
        ValueAny::Map(entries) => {
            Value::Object(entries.into_iter().map(|(k, v)| (k, to_json(v))).collect())
        }
        ValueAny::Null | ValueAny::Unknown => Value::Null,
    }
}

fn from_json(value: Value) -> ValueAny {
    match value {
        Value::String(s) => ValueAny::String(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map_or(ValueAny::Null, ValueAny::Number),
        Value::Bool(b) => ValueAny::Bool(b),
        Value::Array(items) => ValueAny::List(items.into_iter().map(from_json).collect()),
        Value::Object(entries) => {
            ValueAny::Map(entries.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
        Value::Null => ValueAny::Null,
    }
}

fn as_map(value: ValueAny) -> AttributeMap {
    match to_json(value) {
        Value::Object(map) => map,
        _ => AttributeMap::new(),
    }
}

fn unknown_paths(value: &ValueAny, prefix: &str, out: &mut Vec<String>) {
    match value {
        ValueAny::Unknown => out.push(prefix.to_string()),
        ValueAny::Map(entries) => {
            for (name, entry) in entries {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", prefix, name)
                };
                unknown_paths(entry, &path, out);
            }
        }
        ValueAny::List(items) => {
            for (i, item) in items.iter().enumerate() {
                unknown_paths(item, &format!("{}[{}]", prefix, i), out);
            }
        }
        _ => {}
    }
}

/// Attribute map plus the paths Terraform sent as unknown.
fn split_config(config: ValueAny) -> (AttributeMap, Vec<String>) {
    let mut unknown = Vec::new();
    unknown_paths(&config, "", &mut unknown);
    (as_map(config), unknown)
}

/// Puts unknown markers from `config` back into `planned`.
fn overlay_unknown(planned: &mut ValueAny, config: &ValueAny) {
    if matches!(config, ValueAny::Unknown) {
        *planned = ValueAny::Unknown;
        return;
    }
    match (planned, config) {
        (ValueAny::Map(planned), ValueAny::Map(config)) => {
            for (name, value) in config {
                match planned.get_mut(name) {
                    Some(slot) => overlay_unknown(slot, value),
                    None if matches!(value, ValueAny::Unknown) => {
                        planned.insert(name.clone(), ValueAny::Unknown);
                    }
                    None => {}
                }
            }
        }
        (ValueAny::List(planned), ValueAny::List(config)) => {
            for (slot, value) in planned.iter_mut().zip(config) {
                overlay_unknown(slot, value);
            }
        }
        _ => {}
    }
}

/// Adds null entries for nested attributes missing from `value`.
fn fill_nulls(attributes: &BTreeMap<String, Attribute>, value: &mut ValueAny) {
    let ValueAny::Map(entries) = value else {
        return;
    };
    for (name, attr) in attributes {
        let slot = entries.entry(name.clone()).or_insert(ValueAny::Null);
        match &attr.attr_type {
            AttributeType::SingleNested(nested) => fill_nulls(nested, slot),
            AttributeType::ListNested(nested) => {
                if let ValueAny::List(items) = slot {
                    for item in items {
                        fill_nulls(nested, item);
                    }
                }
            }
            _ => {}
        }
    }
}

fn to_state(schema: &Schema, map: AttributeMap) -> ValueAny {
    let mut state = from_json(Value::Object(map));
    fill_nulls(&schema.attributes, &mut state);
    state
}

fn to_planned_state(schema: &Schema, change: PlannedChange, config: &ValueAny) -> ValueAny {
    let mut state = to_state(schema, change.planned_state);
    if let ValueAny::Map(entries) = &mut state {
        for name in change.unknown {
            entries.insert(name, ValueAny::Unknown);
        }
    }
    overlay_unknown(&mut state, config);
    state
}

fn config_value(config: &ValueAny, name: &str) -> ConfigValue {
    match config {
        ValueAny::Map(entries) => match entries.get(name) {
            Some(ValueAny::String(s)) => ConfigValue::Known(s.clone()),
            Some(ValueAny::Unknown) => ConfigValue::Unknown,
            _ => ConfigValue::Null,
        },
        ValueAny::Unknown => ConfigValue::Unknown,
        _ => ConfigValue::Null,
    }
}

fn short_name(type_name: &str) -> String {
    type_name
        .strip_prefix(TYPE_PREFIX)
        .unwrap_or(type_name)
        .to_string()
}

pub struct PluginProvider {
    inner: Arc<ArchestraProvider>,
}

impl PluginProvider {
    pub fn new(provider: ArchestraProvider) -> Self {
        Self {
            inner: Arc::new(provider),
        }
    }
}

#[async_trait]
impl tf_provider::Provider for PluginProvider {
    type Config<'a> = ValueAny;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut tf_provider::Diagnostics) -> Option<TfSchema> {
        Some(to_tf_schema(&self.inner.schema()))
    }

    async fn configure<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        tracing::info!(
            "Configuring Archestra provider {} for Terraform {}",
            self.inner.version(),
            terraform_version
        );
        let config = ProviderConfig {
            base_url: config_value(&config, "base_url"),
            api_key: config_value(&config, "api_key"),
        };
        let mut ours = Diagnostics::new();
        let ok = self.inner.configure(&config, &mut ours);
        forward(diags, ours);
        ok.then_some(())
    }

    fn get_resources(
        &self,
        _diags: &mut tf_provider::Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        Some(
            self.inner
                .resources()
                .iter()
                .map(|r| {
                    let bridged: Box<dyn DynamicResource> =
                        Box::new(PluginResource { inner: r.clone() });
                    (short_name(&r.type_name()), bridged)
                })
                .collect(),
        )
    }

    fn get_data_sources(
        &self,
        _diags: &mut tf_provider::Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(
            self.inner
                .data_sources()
                .iter()
                .map(|d| {
                    let bridged: Box<dyn DynamicDataSource> =
                        Box::new(PluginDataSource { inner: d.clone() });
                    (short_name(&d.type_name()), bridged)
                })
                .collect(),
        )
    }
}

struct PluginResource {
    inner: Arc<dyn DynResource>,
}

impl PluginResource {
    fn plan(
        &self,
        diags: &mut tf_provider::Diagnostics,
        config: ValueAny,
        prior: Option<&AttributeMap>,
    ) -> Option<(ValueAny, Vec<String>)> {
        let schema = self.inner.schema();
        let (values, unknown) = split_config(config.clone());
        let mut ours = Diagnostics::new();
        let change = self.inner.plan_partial(&mut ours, &values, &unknown, prior);
        forward(diags, ours);
        let change = change?;
        let replace = change.requires_replace.clone();
        Some((to_planned_state(&schema, change, &config), replace))
    }
}

#[async_trait]
impl tf_provider::Resource for PluginResource {
    type State<'a> = ValueAny;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut tf_provider::Diagnostics) -> Option<TfSchema> {
        Some(to_tf_schema(&self.inner.schema()))
    }

    async fn validate<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        config: Self::State<'a>,
    ) -> Option<()> {
        let (values, unknown) = split_config(config);
        let mut ours = Diagnostics::new();
        self.inner.validate(&mut ours, &values, &unknown);
        let ok = !ours.has_errors();
        forward(diags, ours);
        ok.then_some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut ours = Diagnostics::new();
        let refreshed = self.inner.read(&mut ours, &as_map(state)).await;
        let failed = ours.has_errors();
        forward(diags, ours);
        if failed {
            return None;
        }
        // Null state drops the resource from tracking.
        let state = match refreshed {
            Some(map) => to_state(&self.inner.schema(), map),
            None => ValueAny::Null,
        };
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        _proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let (planned, _) = self.plan(diags, config_state, None)?;
        Some((planned, ValueEmpty::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        prior_state: Self::State<'a>,
        _proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let prior = as_map(prior_state);
        let (planned, replace) = self.plan(diags, config_state, Some(&prior))?;
        let replace = replace.iter().map(|name| attribute_path(name)).collect();
        Some((planned, prior_private_state, replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut tf_provider::Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut ours = Diagnostics::new();
        let created = self.inner.create(&mut ours, &as_map(planned_state)).await;
        forward(diags, ours);
        Some((
            to_state(&self.inner.schema(), created?),
            planned_private_state,
        ))
    }

    async fn update<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut ours = Diagnostics::new();
        let updated = self
            .inner
            .update(&mut ours, &as_map(planned_state), &as_map(prior_state))
            .await;
        forward(diags, ours);
        Some((
            to_state(&self.inner.schema(), updated?),
            planned_private_state,
        ))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        prior_state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let mut ours = Diagnostics::new();
        self.inner.delete(&mut ours, &as_map(prior_state)).await;
        let ok = !ours.has_errors();
        forward(diags, ours);
        ok.then_some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut ours = Diagnostics::new();
        let imported = self.inner.import(&mut ours, &id).await;
        forward(diags, ours);
        Some((
            to_state(&self.inner.schema(), imported?),
            ValueEmpty::default(),
        ))
    }
}

struct PluginDataSource {
    inner: Arc<dyn DynDataSource>,
}

#[async_trait]
impl tf_provider::DataSource for PluginDataSource {
    type State<'a> = ValueAny;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut tf_provider::Diagnostics) -> Option<TfSchema> {
        Some(to_tf_schema(&self.inner.schema()))
    }

    async fn validate<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        config: Self::State<'a>,
    ) -> Option<()> {
        let (values, unknown) = split_config(config);
        let mut ours = Diagnostics::new();
        self.inner.validate(&mut ours, &values, &unknown);
        let ok = !ours.has_errors();
        forward(diags, ours);
        ok.then_some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let mut ours = Diagnostics::new();
        let state = self.inner.read(&mut ours, &as_map(config)).await;
        forward(diags, ours);
        Some(to_state(&self.inner.schema(), state?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(entries: Vec<(&str, ValueAny)>) -> ValueAny {
        ValueAny::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_unknown_provider_config_stays_unknown() {
        let config = config(vec![
            ("base_url", ValueAny::String("http://localhost:9000".to_string())),
            ("api_key", ValueAny::Unknown),
        ]);

        assert_eq!(
            config_value(&config, "base_url"),
            ConfigValue::Known("http://localhost:9000".to_string())
        );
        assert_eq!(config_value(&config, "api_key"), ConfigValue::Unknown);
        assert_eq!(config_value(&config, "missing"), ConfigValue::Null);
    }

    #[test]
    fn test_unknown_provider_config_reports_diagnostic() {
        let provider = ArchestraProvider::new("test");
        let config = config(vec![("api_key", ValueAny::Unknown)]);
        let config = ProviderConfig {
            base_url: config_value(&config, "base_url"),
            api_key: config_value(&config, "api_key"),
        };

        let mut diags = Diagnostics::new();
        assert!(!provider.configure_with(&config, &|_: &str| None, &mut diags));
        assert_eq!(
            diags.errors().next().map(|d| d.summary.as_str()),
            Some("Unknown Archestra API Key")
        );
    }

    #[test]
    fn test_planned_create_marks_computed_attributes_unknown() {
        let provider = ArchestraProvider::new("test");
        let keys = provider
            .resource("archestra_chat_llm_provider_api_key")
            .expect("registered");
        let config = from_json(json!({
            "name": "OpenAI production",
            "api_key": "sk-secret",
            "llm_provider": "openai"
        }));

        let bridged = PluginResource { inner: keys };
        let mut diags = tf_provider::Diagnostics::default();
        let (planned, replace) = bridged.plan(&mut diags, config, None).expect("plan");

        let ValueAny::Map(entries) = planned else {
            panic!("expected an object");
        };
        assert!(replace.is_empty());
        assert!(matches!(entries.get("id"), Some(ValueAny::Unknown)));
        assert_eq!(
            entries.get("is_organization_default"),
            Some(&ValueAny::Bool(false))
        );
    }

    #[test]
    fn test_unknown_config_value_is_planned_unknown() {
        let provider = ArchestraProvider::new("test");
        let prices = provider.resource("archestra_token_price").expect("registered");
        let config = config(vec![
            ("llm_provider", ValueAny::String("openai".to_string())),
            ("model", ValueAny::Unknown),
            ("price_per_million_input", ValueAny::String("2.50".to_string())),
            ("price_per_million_output", ValueAny::String("10.00".to_string())),
        ]);

        let bridged = PluginResource { inner: prices };
        let mut diags = tf_provider::Diagnostics::default();
        let (planned, _) = bridged.plan(&mut diags, config, None).expect("plan");

        let ValueAny::Map(entries) = planned else {
            panic!("expected an object");
        };
        assert!(matches!(entries.get("model"), Some(ValueAny::Unknown)));
        assert!(matches!(entries.get("id"), Some(ValueAny::Unknown)));
    }

    #[test]
    fn test_nested_schema_converts_to_attribute_maps() {
        let provider = ArchestraProvider::new("test");
        let mcp = provider.resource("archestra_mcp_server").expect("registered");
        let schema = to_tf_schema(&mcp.schema());

        let local = &schema.block.attributes["local_config"];
        let TfAttributeType::AttributeSingle(nested) = &local.attr_type else {
            panic!("expected nested attributes");
        };
        assert_eq!(nested["http_port"].attr_type, TfAttributeType::Number);
        assert_eq!(local.constraint, AttributeConstraint::Optional);
    }

    #[test]
    fn test_attribute_path_parses_nested_steps() {
        let mut expected = AttributePath::new("saml_config");
        expected
            .add_attribute("idp_metadata")
            .add_index(0)
            .add_attribute("location");

        assert_eq!(
            attribute_path("saml_config.idp_metadata[0].location"),
            expected
        );
    }
}
