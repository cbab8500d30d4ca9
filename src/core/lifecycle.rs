//! Type-erased driver between JSON attribute maps and typed resources.

use crate::domain::model::{AttributeMap, Diagnostics, Tracked};
use crate::domain::ports::{DataSource, Resource};
use crate::domain::schema::{Attribute, AttributeMode, AttributeType, Schema};
use crate::utils::error::{ProviderError, Result};
use crate::utils::validation::one_of_error;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const TYPE_PREFIX: &str = "archestra_";

/// Result of planning a change against prior state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub planned_state: AttributeMap,
    pub requires_replace: Vec<String>,
    /// Computed attributes only known after apply; null in `planned_state`.
    pub unknown: Vec<String>,
}

#[async_trait]
pub trait DynResource: Send + Sync {
    fn type_name(&self) -> String;

    fn schema(&self) -> Schema;

    /// `unknown` lists attribute paths whose configured value is not known
    /// yet; they appear as null in `config`.
    fn validate(&self, diags: &mut Diagnostics, config: &AttributeMap, unknown: &[String]);

    fn plan(
        &self,
        diags: &mut Diagnostics,
        config: &AttributeMap,
        prior: Option<&AttributeMap>,
    ) -> Option<PlannedChange> {
        self.plan_partial(diags, config, &[], prior)
    }

    fn plan_partial(
        &self,
        diags: &mut Diagnostics,
        config: &AttributeMap,
        unknown: &[String],
        prior: Option<&AttributeMap>,
    ) -> Option<PlannedChange>;

    async fn create(&self, diags: &mut Diagnostics, plan: &AttributeMap) -> Option<AttributeMap>;

    /// `None` without errors means the object is gone and leaves state.
    async fn read(&self, diags: &mut Diagnostics, state: &AttributeMap) -> Option<AttributeMap>;

    async fn update(
        &self,
        diags: &mut Diagnostics,
        plan: &AttributeMap,
        prior: &AttributeMap,
    ) -> Option<AttributeMap>;

    async fn delete(&self, diags: &mut Diagnostics, state: &AttributeMap);

    async fn import(&self, diags: &mut Diagnostics, id: &str) -> Option<AttributeMap>;
}

#[async_trait]
pub trait DynDataSource: Send + Sync {
    fn type_name(&self) -> String;

    fn schema(&self) -> Schema;

    fn validate(&self, diags: &mut Diagnostics, config: &AttributeMap, unknown: &[String]);

    async fn read(&self, diags: &mut Diagnostics, config: &AttributeMap) -> Option<AttributeMap>;
}

pub struct ResourceDriver<R: Resource> {
    inner: R,
}

impl<R: Resource> ResourceDriver<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn decode(&self, diags: &mut Diagnostics, map: &AttributeMap) -> Option<R::Model> {
        report(diags, decode_model(map))
    }

    fn encode(&self, diags: &mut Diagnostics, model: &R::Model) -> Option<AttributeMap> {
        report(diags, encode_model(&self.inner.schema(), model))
    }

    /// Allow-list, type and required checks on values about to be sent.
    fn check_values(&self, diags: &mut Diagnostics, values: &AttributeMap) -> bool {
        let mut local = Diagnostics::new();
        validate_attributes(&mut local, &self.inner.schema().attributes, values, "", false, &[]);
        let ok = !local.has_errors();
        diags.extend(local);
        ok
    }
}

#[async_trait]
impl<R: Resource> DynResource for ResourceDriver<R> {
    fn type_name(&self) -> String {
        format!("{}{}", TYPE_PREFIX, self.inner.type_suffix())
    }

    fn schema(&self) -> Schema {
        self.inner.schema()
    }

    fn validate(&self, diags: &mut Diagnostics, config: &AttributeMap, unknown: &[String]) {
        validate_attributes(diags, &self.inner.schema().attributes, config, "", true, unknown);
    }

    fn plan_partial(
        &self,
        diags: &mut Diagnostics,
        config: &AttributeMap,
        unknown: &[String],
        prior: Option<&AttributeMap>,
    ) -> Option<PlannedChange> {
        self.validate(diags, config, unknown);
        if diags.has_errors() {
            return None;
        }
        Some(plan_change(&self.inner.schema(), config, prior))
    }

    async fn create(&self, diags: &mut Diagnostics, plan: &AttributeMap) -> Option<AttributeMap> {
        let schema = self.inner.schema();
        let mut plan = plan.clone();
        apply_defaults(&schema, &mut plan);
        if !self.check_values(diags, &plan) {
            return None;
        }

        let model = self.decode(diags, &plan)?;
        tracing::info!("Creating {}", self.type_name());
        let created = report(diags, self.inner.create(&model).await)?;
        self.encode(diags, &created)
    }

    async fn read(&self, diags: &mut Diagnostics, state: &AttributeMap) -> Option<AttributeMap> {
        let model = self.decode(diags, state)?;
        match report(diags, self.inner.read(&model).await)? {
            Tracked::Present(model) => self.encode(diags, &model),
            Tracked::Removed => {
                let id = state
                    .get("id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("<unknown>");
                tracing::warn!(
                    "{} {} no longer exists, removing it from state",
                    self.type_name(),
                    id
                );
                None
            }
        }
    }

    async fn update(
        &self,
        diags: &mut Diagnostics,
        plan: &AttributeMap,
        prior: &AttributeMap,
    ) -> Option<AttributeMap> {
        let schema = self.inner.schema();
        let mut plan = plan.clone();
        apply_defaults(&schema, &mut plan);
        carry_identity(&schema, &mut plan, prior);
        if !self.check_values(diags, &plan) {
            return None;
        }

        let planned = self.decode(diags, &plan)?;
        let previous = self.decode(diags, prior)?;
        tracing::info!("Updating {}", self.type_name());
        let updated = report(diags, self.inner.update(&planned, &previous).await)?;
        self.encode(diags, &updated)
    }

    async fn delete(&self, diags: &mut Diagnostics, state: &AttributeMap) {
        if let Some(model) = self.decode(diags, state) {
            tracing::info!("Deleting {}", self.type_name());
            report(diags, self.inner.delete(&model).await);
        }
    }

    async fn import(&self, diags: &mut Diagnostics, id: &str) -> Option<AttributeMap> {
        let mut seed = AttributeMap::new();
        seed.insert("id".to_string(), Value::String(id.to_string()));
        let model = self.decode(diags, &seed)?;
        let seeded = self.encode(diags, &model)?;

        let state = self.read(diags, &seeded).await;
        if state.is_none() && !diags.has_errors() {
            diags.add_error(
                "Cannot import non-existent remote object",
                format!(
                    "While attempting to import an existing object to {}, the provider detected that no object exists with the given id {:?}.",
                    self.type_name(),
                    id
                ),
            );
        }
        state
    }
}

pub struct DataSourceDriver<D: DataSource> {
    inner: D,
}

impl<D: DataSource> DataSourceDriver<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<D: DataSource> DynDataSource for DataSourceDriver<D> {
    fn type_name(&self) -> String {
        format!("{}{}", TYPE_PREFIX, self.inner.type_suffix())
    }

    fn schema(&self) -> Schema {
        self.inner.schema()
    }

    fn validate(&self, diags: &mut Diagnostics, config: &AttributeMap, unknown: &[String]) {
        validate_attributes(diags, &self.inner.schema().attributes, config, "", true, unknown);
    }

    async fn read(&self, diags: &mut Diagnostics, config: &AttributeMap) -> Option<AttributeMap> {
        self.validate(diags, config, &[]);
        if diags.has_errors() {
            return None;
        }
        let model: D::Model = report(diags, decode_model(config))?;
        let refreshed = report(diags, self.inner.read(&model).await)?;
        report(diags, encode_model(&self.inner.schema(), &refreshed))
    }
}

fn report<T>(diags: &mut Diagnostics, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Operation failed: {}", e);
            diags.add_provider_error(&e);
            None
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Checks `values` against `attributes`. With `from_config` set, values for
/// computed-only attributes are rejected as well. Paths listed in `unknown`
/// count as set.
pub fn validate_attributes(
    diags: &mut Diagnostics,
    attributes: &BTreeMap<String, Attribute>,
    values: &AttributeMap,
    prefix: &str,
    from_config: bool,
    unknown: &[String],
) {
    for key in values.keys() {
        if !attributes.contains_key(key) {
            diags.add_attribute_error(
                join_path(prefix, key),
                "Unsupported argument",
                format!("An argument named {:?} is not expected here.", key),
            );
        }
    }

    for (name, attr) in attributes {
        let path = join_path(prefix, name);
        let value = values.get(name).unwrap_or(&Value::Null);

        if value.is_null() {
            if attr.mode == AttributeMode::Required && !unknown.contains(&path) {
                diags.add_attribute_error(
                    &path,
                    "Missing required argument",
                    format!(
                        "The argument {:?} is required, but no definition was found.",
                        name
                    ),
                );
            }
            continue;
        }

        if from_config && !attr.mode.is_configurable() {
            diags.add_attribute_error(
                &path,
                "Invalid Configuration for Read-Only Attribute",
                format!(
                    "Cannot set value for this attribute as the provider has marked it as read-only. Remove the configuration line setting the value. Attribute: {}",
                    path
                ),
            );
            continue;
        }

        if !attr.attr_type.accepts(value) {
            diags.add_attribute_error(
                &path,
                "Incorrect attribute value type",
                format!(
                    "Inappropriate value for attribute {:?}: {} required.",
                    name,
                    attr.attr_type.type_label().to_lowercase()
                ),
            );
            continue;
        }

        if let (Some(allowed), Some(s)) = (&attr.allowed_values, value.as_str()) {
            let allowed: Vec<&str> = allowed.iter().map(String::as_str).collect();
            if !allowed.contains(&s) {
                diags.add_attribute_error(
                    &path,
                    "Invalid Attribute Value Match",
                    one_of_error(&path, s, &allowed).to_string(),
                );
            }
        }

        match (&attr.attr_type, value) {
            (AttributeType::SingleNested(nested), Value::Object(obj)) => {
                validate_attributes(diags, nested, obj, &path, from_config, unknown);
            }
            (AttributeType::ListNested(nested), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if let Value::Object(obj) = item {
                        let item_path = format!("{}[{}]", path, i);
                        validate_attributes(diags, nested, obj, &item_path, from_config, unknown);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Fills unset attributes that carry a schema default.
pub fn apply_defaults(schema: &Schema, values: &mut AttributeMap) {
    for (name, attr) in &schema.attributes {
        if let Some(default) = &attr.default {
            let unset = values.get(name).map_or(true, Value::is_null);
            if unset {
                values.insert(name.clone(), default.clone());
            }
        }
    }
}

/// Copies computed attributes marked `use_state_for_unknown` from prior state
/// when the plan leaves them unset.
fn carry_identity(schema: &Schema, values: &mut AttributeMap, prior: &AttributeMap) {
    for (name, attr) in &schema.attributes {
        if !attr.use_state_for_unknown {
            continue;
        }
        let unset = values.get(name).map_or(true, Value::is_null);
        if let (true, Some(previous)) = (unset, prior.get(name)) {
            if !previous.is_null() {
                values.insert(name.clone(), previous.clone());
            }
        }
    }
}

pub fn plan_change(
    schema: &Schema,
    config: &AttributeMap,
    prior: Option<&AttributeMap>,
) -> PlannedChange {
    let mut planned = normalize(schema, config.clone());
    apply_defaults(schema, &mut planned);

    let mut requires_replace = Vec::new();
    if let Some(prior) = prior {
        carry_identity(schema, &mut planned, prior);
        for (name, attr) in &schema.attributes {
            if !attr.requires_replace {
                continue;
            }
            let before = prior.get(name).unwrap_or(&Value::Null);
            let after = planned.get(name).unwrap_or(&Value::Null);
            if before != after {
                requires_replace.push(name.clone());
            }
        }
    }

    let unknown = schema
        .attributes
        .iter()
        .filter(|(name, attr)| {
            attr.mode.is_computed() && planned.get(*name).map_or(true, Value::is_null)
        })
        .map(|(name, _)| name.clone())
        .collect();

    PlannedChange {
        planned_state: planned,
        requires_replace,
        unknown,
    }
}

/// Ensures every schema attribute is present, unset ones as null.
pub fn normalize(schema: &Schema, mut values: AttributeMap) -> AttributeMap {
    for name in schema.attributes.keys() {
        values.entry(name.clone()).or_insert(Value::Null);
    }
    values
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

pub fn decode_model<M: DeserializeOwned>(values: &AttributeMap) -> Result<M> {
    let value = strip_nulls(Value::Object(values.clone()));
    serde_json::from_value(value).map_err(ProviderError::from)
}

pub fn encode_model<M: Serialize>(schema: &Schema, model: &M) -> Result<AttributeMap> {
    match serde_json::to_value(model)? {
        Value::Object(map) => Ok(normalize(schema, map)),
        other => Err(ProviderError::StateError {
            resource_type: schema.description.clone(),
            message: format!("expected an object, got {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::nested;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new("test")
            .attribute("id", Attribute::computed_string().use_state_for_unknown())
            .attribute("name", Attribute::required_string())
            .attribute(
                "font",
                Attribute::string(AttributeMode::OptionalComputed)
                    .with_default("inter")
                    .one_of(&["inter", "lato"]),
            )
            .attribute(
                "provider",
                Attribute::required_string()
                    .one_of(&["openai", "gemini"])
                    .requires_replace(),
            )
            .attribute(
                "local_config",
                Attribute::single_nested(
                    AttributeMode::Optional,
                    nested([
                        ("command", Attribute::required_string()),
                        (
                            "transport_type",
                            Attribute::optional_string().one_of(&["stdio", "streamable-http"]),
                        ),
                    ]),
                ),
            )
    }

    fn map(value: Value) -> AttributeMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_validate_reports_allow_list_violation() {
        let mut diags = Diagnostics::new();
        let config = map(json!({"name": "n", "provider": "openai", "font": "comic-sans"}));

        validate_attributes(&mut diags, &schema().attributes, &config, "", true, &[]);

        let errors: Vec<_> = diags.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].summary, "Invalid Attribute Value Match");
        assert_eq!(
            errors[0].detail,
            r#"Attribute font value must be one of: ["inter" "lato"], got: "comic-sans""#
        );
    }

    #[test]
    fn test_validate_checks_nested_attributes() {
        let mut diags = Diagnostics::new();
        let config = map(json!({
            "name": "n",
            "provider": "openai",
            "local_config": {"transport_type": "sse"}
        }));

        validate_attributes(&mut diags, &schema().attributes, &config, "", true, &[]);

        let paths: Vec<_> = diags
            .errors()
            .filter_map(|d| d.attribute.clone())
            .collect();
        assert!(paths.contains(&"local_config.command".to_string()));
        assert!(paths.contains(&"local_config.transport_type".to_string()));
    }

    #[test]
    fn test_validate_rejects_read_only_and_missing_required() {
        let mut diags = Diagnostics::new();
        let config = map(json!({"id": "abc", "provider": "openai"}));

        validate_attributes(&mut diags, &schema().attributes, &config, "", true, &[]);

        let summaries: Vec<_> = diags.errors().map(|d| d.summary.as_str()).collect();
        assert!(summaries.contains(&"Invalid Configuration for Read-Only Attribute"));
        assert!(summaries.contains(&"Missing required argument"));
    }

    #[test]
    fn test_plan_applies_defaults_and_flags_replacement() {
        let prior = map(json!({"id": "1", "name": "n", "font": "lato", "provider": "openai"}));
        let config = map(json!({"name": "n", "provider": "gemini"}));

        let change = plan_change(&schema(), &config, Some(&prior));

        assert_eq!(change.planned_state["font"], json!("inter"));
        assert_eq!(change.planned_state["id"], json!("1"));
        assert_eq!(change.planned_state["local_config"], Value::Null);
        assert_eq!(change.requires_replace, vec!["provider".to_string()]);
    }

    #[test]
    fn test_plan_leaves_server_assigned_attributes_unknown() {
        let schema = schema().attribute("verified", Attribute::bool(AttributeMode::Computed));
        let config = map(json!({"name": "n", "provider": "openai"}));

        let created = plan_change(&schema, &config, None);
        assert_eq!(created.unknown, vec!["id".to_string(), "verified".to_string()]);
        assert_eq!(created.planned_state["id"], Value::Null);
        assert_eq!(created.planned_state["font"], json!("inter"));

        let prior = map(json!({"id": "1", "name": "n", "provider": "openai", "verified": true}));
        let updated = plan_change(&schema, &config, Some(&prior));
        assert_eq!(updated.planned_state["id"], json!("1"));
        assert_eq!(updated.unknown, vec!["verified".to_string()]);
    }

    #[test]
    fn test_unknown_required_value_passes_validation() {
        let mut diags = Diagnostics::new();
        let config = map(json!({"provider": "openai", "local_config": {}}));
        let unknown = vec!["name".to_string(), "local_config.command".to_string()];

        validate_attributes(&mut diags, &schema().attributes, &config, "", true, &unknown);
        assert!(diags.is_empty(), "{}", diags);

        validate_attributes(&mut diags, &schema().attributes, &config, "", true, &[]);
        assert_eq!(diags.errors().count(), 2);
    }

    #[test]
    fn test_decode_treats_null_as_unset() {
        #[derive(serde::Deserialize, Default)]
        #[serde(default)]
        struct Model {
            name: String,
            font: Option<String>,
        }

        let model: Model = decode_model(&map(json!({"name": null, "font": "lato"}))).unwrap();
        assert_eq!(model.name, "");
        assert_eq!(model.font.as_deref(), Some("lato"));
    }
}
