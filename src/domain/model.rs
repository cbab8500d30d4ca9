use crate::utils::error::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute values of one resource instance, keyed by attribute name.
pub type AttributeMap = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        });
    }

    pub fn add_attribute_error(
        &mut self,
        attribute: impl Into<String>,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: Some(attribute.into()),
        });
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        });
    }

    pub fn add_provider_error(&mut self, err: &ProviderError) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            summary: err.summary(),
            detail: err.to_string(),
            attribute: err.attribute().map(str::to_string),
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, d) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match &d.attribute {
                Some(attr) => write!(f, "{:?} [{}] {}: {}", d.severity, attr, d.summary, d.detail)?,
                None => write!(f, "{:?} {}: {}", d.severity, d.summary, d.detail)?,
            }
        }
        Ok(())
    }
}

/// Outcome of a read: the refreshed record, or a signal that it is gone
/// remotely and must be dropped from tracked state.
#[derive(Debug, Clone, PartialEq)]
pub enum Tracked<T> {
    Present(T),
    Removed,
}

/// A provider configuration value as seen by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigValue {
    #[default]
    Null,
    Unknown,
    Known(String),
}

impl ConfigValue {
    pub fn is_unknown(&self) -> bool {
        matches!(self, ConfigValue::Unknown)
    }

    /// Known non-empty value; empty strings fall back like unset ones.
    pub fn value(&self) -> Option<&str> {
        match self {
            ConfigValue::Known(v) if !v.is_empty() => Some(v),
            _ => None,
        }
    }
}

/// The `provider "archestra" {}` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    pub base_url: ConfigValue,
    pub api_key: ConfigValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_track_errors() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Resource Removed", "gone");
        assert!(!diags.has_errors());

        diags.add_attribute_error("api_key", "Missing Archestra API Key", "set it");
        assert!(diags.has_errors());
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(
            diags.errors().next().and_then(|d| d.attribute.as_deref()),
            Some("api_key")
        );
    }

    #[test]
    fn test_config_value_treats_empty_as_unset() {
        assert_eq!(ConfigValue::Known(String::new()).value(), None);
        assert_eq!(ConfigValue::Known("k".into()).value(), Some("k"));
        assert!(ConfigValue::Unknown.is_unknown());
        assert_eq!(ConfigValue::default().value(), None);
    }
}
