use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unable to {action}, got error: {source}")]
    RequestError {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Expected {expected}, got status {status}: {body}")]
    UnexpectedStatusError {
        action: String,
        expected: String,
        status: u16,
        body: String,
    },

    #[error("Empty response body from API while trying to {action}")]
    EmptyResponseError { action: String },

    #[error("Unable to decode API response while trying to {action}: {reason}")]
    ResponseDecodeError { action: String, reason: String },

    #[error("{resource} with ID {id} not found")]
    NotFoundError { resource: String, id: String },

    #[error("Unable to parse {resource} ID '{value}': {reason}")]
    InvalidIdError {
        resource: String,
        value: String,
        reason: String,
    },

    #[error("Attribute {attribute} {message}")]
    ValidationError { attribute: String, message: String },

    #[error("Invalid state for {resource_type}: {message}")]
    StateError {
        resource_type: String,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for '{field}' ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Provider has not been configured: {message}")]
    UnconfiguredError { message: String },

    #[error("Plugin server error: {message}")]
    PluginError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Api,
    Validation,
    Configuration,
    State,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProviderError {
    pub fn request(action: impl Into<String>, source: reqwest::Error) -> Self {
        Self::RequestError {
            action: action.into(),
            source,
        }
    }

    pub fn validation(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RequestError { .. } => ErrorCategory::Network,
            Self::UnexpectedStatusError { .. }
            | Self::EmptyResponseError { .. }
            | Self::ResponseDecodeError { .. }
            | Self::NotFoundError { .. } => ErrorCategory::Api,
            Self::ValidationError { .. } | Self::InvalidIdError { .. } => {
                ErrorCategory::Validation
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::UrlError(_)
            | Self::UnconfiguredError { .. } => ErrorCategory::Configuration,
            Self::StateError { .. } | Self::SerializationError(_) => ErrorCategory::State,
            Self::IoError(_) | Self::PluginError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Network | ErrorCategory::Api => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::State => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Short title used as the diagnostic summary shown to operators.
    pub fn summary(&self) -> String {
        let summary = match self {
            Self::RequestError { .. } => "API Error",
            Self::UnexpectedStatusError { .. }
            | Self::EmptyResponseError { .. }
            | Self::ResponseDecodeError { .. } => "Unexpected API Response",
            Self::NotFoundError { resource, .. } => return format!("{} not found", resource),
            Self::InvalidIdError { .. } => "Invalid ID",
            Self::ValidationError { .. } => "Invalid Attribute Value",
            Self::StateError { .. } | Self::SerializationError(_) => "Invalid State",
            Self::MissingConfigError { .. } => "Missing Provider Configuration",
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::UrlError(_) => "Invalid Provider Configuration",
            Self::UnconfiguredError { .. } => "Unconfigured Archestra API Client",
            Self::IoError(_) | Self::PluginError { .. } => "Internal Error",
        };
        summary.to_string()
    }

    /// Attribute the error points at, when it concerns a single attribute.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::ValidationError { attribute, .. } => Some(attribute),
            Self::InvalidIdError { .. } => Some("id"),
            Self::MissingConfigError { field } | Self::InvalidConfigValueError { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        format!("{}: {}", self.summary(), self)
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the Archestra API is reachable at the configured base URL"
            }
            ErrorCategory::Api => "Inspect the status code and body returned by the Archestra API",
            ErrorCategory::Validation => "Fix the attribute value in the configuration",
            ErrorCategory::Configuration => {
                "Set base_url/api_key in the provider block or ARCHESTRA_BASE_URL/ARCHESTRA_API_KEY"
            }
            ErrorCategory::State => {
                "The tracked state is corrupt; remove the resource from state and import it again"
            }
            ErrorCategory::System => "Please report this issue to the provider developers",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
