use crate::utils::error::{ProviderError, Result};
use url::Url;
use uuid::Uuid;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ProviderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ProviderError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ProviderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ProviderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Renders an allow-list the way Terraform's string validators do: `["a" "b"]`.
pub fn format_allowed(allowed: &[&str]) -> String {
    let quoted: Vec<String> = allowed.iter().map(|v| format!("{:?}", v)).collect();
    format!("[{}]", quoted.join(" "))
}

pub fn one_of_error(attribute: &str, value: &str, allowed: &[&str]) -> ProviderError {
    ProviderError::validation(
        attribute,
        format!(
            "value must be one of: {}, got: {:?}",
            format_allowed(allowed),
            value
        ),
    )
}

pub fn validate_uuid(resource: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| ProviderError::InvalidIdError {
        resource: resource.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
