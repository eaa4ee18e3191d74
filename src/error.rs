//! Error types for the Productive MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.
//! [`ApiError`] is the taxonomy surfaced to tool callers; the filter engine
//! itself never produces errors.

use thiserror::Error;

/// Main error type for the Productive MCP Server
#[derive(Error, Debug)]
pub enum ProductiveMcpError {
    /// Productive API errors
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Upstream and lookup failures
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authorization failure: the API token was rejected (HTTP {status})")]
    AuthorizationFailure { status: u16 },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Rate limited: {}", retry_hint(*retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Upstream failure: {message}")]
    UpstreamFailure { message: String },

    #[error("Upstream timeout: no response within {secs} seconds")]
    Timeout { secs: u64 },

    #[error(
        "Ambiguous lookup: task #{task_number} matched {matches} tasks in project {project_id}"
    )]
    AmbiguousLookup {
        task_number: String,
        project_id: u64,
        matches: usize,
    },
}

fn retry_hint(retry_after_secs: Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!("retry after {} seconds", secs),
        None => "too many requests, retry later".to_string(),
    }
}

impl ApiError {
    /// Short name of the condition, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::AuthorizationFailure { .. } => "authorization_failure",
            ApiError::NotFound { .. } => "not_found",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::UpstreamFailure { .. } => "upstream_failure",
            ApiError::Timeout { .. } => "upstream_timeout",
            ApiError::AmbiguousLookup { .. } => "ambiguous_lookup",
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Configuration validation failed: {}", .errors.join("; "))]
    Invalid { errors: Vec<String> },
}

/// Validation errors (invalid tool input)
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {name} - {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Invalid input: {message}")]
    InvalidArguments { message: String },
}

impl ValidationError {
    pub(crate) fn parameter(name: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidParameter {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParams { message: String },
}

/// Result type alias for Productive MCP operations
pub type Result<T> = std::result::Result<T, ProductiveMcpError>;

/// Transport failures never carry the request URL; it would leak the
/// upstream base URL and query into tool output.
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        ApiError::UpstreamFailure {
            message: format!("request failed: {}", err),
        }
    }
}

impl From<reqwest::Error> for ProductiveMcpError {
    fn from(err: reqwest::Error) -> Self {
        ProductiveMcpError::Api(ApiError::from(err))
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
                format!("{} ({})", field, codes.join(", "))
            })
            .collect();
        fields.sort();
        ValidationError::InvalidArguments {
            message: format!("out of range: {}", fields.join(", ")),
        }
    }
}
