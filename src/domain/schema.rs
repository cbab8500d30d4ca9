use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Int64,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
    SingleNested(BTreeMap<String, Attribute>),
    ListNested(BTreeMap<String, Attribute>),
}

impl AttributeType {
    pub fn nested_attributes(&self) -> Option<&BTreeMap<String, Attribute>> {
        match self {
            AttributeType::SingleNested(attrs) | AttributeType::ListNested(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn type_label(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Bool => "Boolean".to_string(),
            AttributeType::Int64 => "Number".to_string(),
            AttributeType::List(elem) => format!("List of {}", elem.type_label()),
            AttributeType::Map(elem) => format!("Map of {}", elem.type_label()),
            AttributeType::SingleNested(_) => "Attributes".to_string(),
            AttributeType::ListNested(_) => "Attributes List".to_string(),
        }
    }

    /// Whether `value` has this type's JSON shape. Null always matches.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Bool, Value::Bool(_)) => true,
            (AttributeType::Int64, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (AttributeType::List(elem), Value::Array(items)) => {
                items.iter().all(|v| elem.accepts(v))
            }
            (AttributeType::Map(elem), Value::Object(entries)) => {
                entries.values().all(|v| elem.accepts(v))
            }
            (AttributeType::SingleNested(_), Value::Object(_)) => true,
            (AttributeType::ListNested(_), Value::Array(items)) => items.iter().all(Value::is_object),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMode {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

impl AttributeMode {
    pub fn is_configurable(self) -> bool {
        !matches!(self, AttributeMode::Computed)
    }

    pub fn is_computed(self) -> bool {
        matches!(self, AttributeMode::Computed | AttributeMode::OptionalComputed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub mode: AttributeMode,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub use_state_for_unknown: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_replace: bool,
}

impl Attribute {
    pub fn new(attr_type: AttributeType, mode: AttributeMode) -> Self {
        Self {
            attr_type,
            mode,
            description: String::new(),
            sensitive: false,
            default: None,
            allowed_values: None,
            use_state_for_unknown: false,
            requires_replace: false,
        }
    }

    pub fn string(mode: AttributeMode) -> Self {
        Self::new(AttributeType::String, mode)
    }

    pub fn required_string() -> Self {
        Self::string(AttributeMode::Required)
    }

    pub fn optional_string() -> Self {
        Self::string(AttributeMode::Optional)
    }

    pub fn computed_string() -> Self {
        Self::string(AttributeMode::Computed)
    }

    pub fn bool(mode: AttributeMode) -> Self {
        Self::new(AttributeType::Bool, mode)
    }

    pub fn int64(mode: AttributeMode) -> Self {
        Self::new(AttributeType::Int64, mode)
    }

    pub fn string_list(mode: AttributeMode) -> Self {
        Self::new(AttributeType::List(Box::new(AttributeType::String)), mode)
    }

    pub fn string_map(mode: AttributeMode) -> Self {
        Self::new(AttributeType::Map(Box::new(AttributeType::String)), mode)
    }

    pub fn single_nested(mode: AttributeMode, attributes: BTreeMap<String, Attribute>) -> Self {
        Self::new(AttributeType::SingleNested(attributes), mode)
    }

    pub fn list_nested(mode: AttributeMode, attributes: BTreeMap<String, Attribute>) -> Self {
        Self::new(AttributeType::ListNested(attributes), mode)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn use_state_for_unknown(mut self) -> Self {
        self.use_state_for_unknown = true;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }
}

/// Collects `(name, attribute)` pairs into the map nested attribute types take.
pub fn nested<const N: usize>(pairs: [(&str, Attribute); N]) -> BTreeMap<String, Attribute> {
    pairs
        .into_iter()
        .map(|(name, attr)| (name.to_string(), attr))
        .collect()
}
