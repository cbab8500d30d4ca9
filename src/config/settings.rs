use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ProviderError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://localhost:9000";
pub const BASE_URL_ENV: &str = "ARCHESTRA_BASE_URL";
pub const API_KEY_ENV: &str = "ARCHESTRA_API_KEY";

/// First non-empty value: the configured one, then the environment variable.
pub fn resolve_value(
    configured: Option<&str>,
    env_var: &str,
    env: &dyn Fn(&str) -> Option<String>,
) -> Option<String> {
    configured
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| env(env_var).filter(|v| !v.is_empty()))
}

/// The `[provider]` table of a `provider.toml` settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSection {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub provider: ProviderSection,
}

impl SettingsFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        toml::from_str(&processed).map_err(|e| ProviderError::InvalidConfigValueError {
            field: "settings_file".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ProviderError::config(format!("Invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ConfigProvider for SettingsFile {
    fn base_url(&self) -> Option<&str> {
        self.provider.base_url.as_deref()
    }

    fn api_key(&self) -> Option<&str> {
        self.provider.api_key.as_deref()
    }
}

/// Fully resolved connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
}

impl ProviderSettings {
    /// Resolves each value from the first layer that sets it, then the
    /// environment, then the default base URL.
    pub fn resolve(
        layers: &[&dyn ConfigProvider],
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let configured_url = layers
            .iter()
            .find_map(|layer| layer.base_url().filter(|v| !v.is_empty()));
        let configured_key = layers
            .iter()
            .find_map(|layer| layer.api_key().filter(|v| !v.is_empty()));

        let base_url = resolve_value(configured_url, BASE_URL_ENV, env)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = resolve_value(configured_key, API_KEY_ENV, env).ok_or_else(|| {
            ProviderError::MissingConfigError {
                field: "api_key".to_string(),
            }
        })?;

        let settings = Self { base_url, api_key };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_env(layers: &[&dyn ConfigProvider]) -> Result<Self> {
        Self::resolve(layers, &|name| std::env::var(name).ok())
    }
}

impl Validate for ProviderSettings {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_non_empty_string("api_key", &self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_wins_over_environment() {
        let file = SettingsFile::from_toml_str(
            r#"
[provider]
base_url = "https://archestra.example.com"
api_key = "from-file"
"#,
        )
        .unwrap();
        let env = env_of(&[(BASE_URL_ENV, "http://env:9000"), (API_KEY_ENV, "from-env")]);

        let settings = ProviderSettings::resolve(&[&file], &env).unwrap();
        assert_eq!(settings.base_url, "https://archestra.example.com");
        assert_eq!(settings.api_key, "from-file");
    }

    #[test]
    fn test_empty_values_fall_back_to_environment_then_default() {
        let file = SettingsFile::from_toml_str("[provider]\nbase_url = \"\"\n").unwrap();
        let env = env_of(&[(API_KEY_ENV, "from-env")]);

        let settings = ProviderSettings::resolve(&[&file], &env).unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.api_key, "from-env");
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let err = ProviderSettings::resolve(&[], &env_of(&[])).unwrap_err();
        assert!(matches!(err, ProviderError::MissingConfigError { ref field } if field == "api_key"));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ARCHESTRA_SETTINGS_TEST_KEY", "substituted");

        let file = SettingsFile::from_toml_str(
            "[provider]\napi_key = \"${ARCHESTRA_SETTINGS_TEST_KEY}\"\n",
        )
        .unwrap();
        assert_eq!(file.provider.api_key.as_deref(), Some("substituted"));

        std::env::remove_var("ARCHESTRA_SETTINGS_TEST_KEY");
    }

    #[test]
    fn test_invalid_base_url_fails_validation() {
        let file = SettingsFile {
            provider: ProviderSection {
                base_url: Some("localhost:9000".to_string()),
                api_key: Some("key".to_string()),
            },
        };
        assert!(ProviderSettings::resolve(&[&file], &env_of(&[])).is_err());
    }
}
