//! Configuration management for the Productive MCP Server
//!
//! Reads the environment once at startup. The resulting [`Config`] is
//! immutable and shared read-only by every tool invocation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;

use crate::error::{ConfigError, Result};
use crate::output::OutputFormat;

/// Configuration for the Productive MCP Server
#[derive(Clone)]
pub struct Config {
    /// Static API token sent as `X-Auth-Token`
    pub api_key: String,

    /// Organization id sent as `X-Organization-Id` and used in web links
    pub organization_id: u64,

    /// Base URL of the Productive REST API
    pub base_url: String,

    /// Base URL of the Productive web app
    pub webapp_base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Default page size for collection tools
    pub items_per_page: u32,

    /// Serialization of tool results
    pub output_format: OutputFormat,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Every problem is collected so a misconfigured deployment is reported
    /// in one go rather than one variable at a time.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();
        let read = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = read(env::API_KEY).unwrap_or_default();
        if api_key.is_empty() {
            errors.push(format!("{} is required", env::API_KEY));
        }

        let organization_id = match read(env::ORGANIZATION) {
            None => {
                errors.push(format!("{} is required", env::ORGANIZATION));
                0
            }
            Some(raw) => match raw.parse::<u64>() {
                Ok(id) if id > 0 => id,
                _ => {
                    errors.push(format!("{} must be a positive integer", env::ORGANIZATION));
                    0
                }
            },
        };

        let base_url = read(env::BASE_URL)
            .unwrap_or_else(|| productive::API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let webapp_base_url = read(env::WEBAPP_URL)
            .unwrap_or_else(|| productive::WEBAPP_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs: u64 = parse_or(&read, env::TIMEOUT, DEFAULT_TIMEOUT_SECS, &mut errors);
        if timeout_secs == 0 {
            errors.push(format!("{} must be a positive integer", env::TIMEOUT));
        }

        let items_per_page: u32 =
            parse_or(&read, env::ITEMS_PER_PAGE, DEFAULT_ITEMS_PER_PAGE, &mut errors);
        if items_per_page == 0 || items_per_page > productive::MAX_PAGE_SIZE {
            errors.push(format!(
                "{} must be between 1 and {}",
                env::ITEMS_PER_PAGE,
                productive::MAX_PAGE_SIZE
            ));
        }

        let output_format = match read(env::OUTPUT_FORMAT) {
            None => OutputFormat::default(),
            Some(raw) => <OutputFormat as ValueEnum>::from_str(&raw, true).unwrap_or_else(|_| {
                errors.push(format!("{} must be either 'json' or 'yaml'", env::OUTPUT_FORMAT));
                OutputFormat::default()
            }),
        };

        if !errors.is_empty() {
            return Err(ConfigError::Invalid { errors }.into());
        }

        Ok(Self {
            api_key,
            organization_id,
            base_url,
            webapp_base_url,
            timeout: Duration::from_secs(timeout_secs),
            items_per_page,
            output_format,
        })
    }
}

fn parse_or<T, R>(read: &R, var: &str, default: T, errors: &mut Vec<String>) -> T
where
    T: FromStr,
    R: Fn(&str) -> Option<String>,
{
    match read(var) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            errors.push(format!("{} must be a positive integer", var));
            default
        }),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("organization_id", &self.organization_id)
            .field("base_url", &self.base_url)
            .field("webapp_base_url", &self.webapp_base_url)
            .field("timeout", &self.timeout)
            .field("items_per_page", &self.items_per_page)
            .field("output_format", &self.output_format)
            .finish()
    }
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ITEMS_PER_PAGE: u32 = 30;

/// Environment variable names
pub mod env {
    pub const API_KEY: &str = "PRODUCTIVE_API_KEY";
    pub const ORGANIZATION: &str = "PRODUCTIVE_ORGANIZATION";
    pub const BASE_URL: &str = "PRODUCTIVE_BASE_URL";
    pub const WEBAPP_URL: &str = "PRODUCTIVE_WEBAPP_URL";
    pub const TIMEOUT: &str = "PRODUCTIVE_TIMEOUT";
    pub const ITEMS_PER_PAGE: &str = "PRODUCTIVE_ITEMS_PER_PAGE";
    pub const OUTPUT_FORMAT: &str = "OUTPUT_FORMAT";
}

/// Productive API constants
pub mod productive {
    /// Base URL for the Productive API
    pub const API_BASE_URL: &str = "https://api.productive.io/api/v2";

    /// Base URL for the Productive web app
    pub const WEBAPP_BASE_URL: &str = "https://app.productive.io";

    /// Largest `page[size]` the API accepts
    pub const MAX_PAGE_SIZE: u32 = 200;

    /// JSON:API media type
    pub const CONTENT_TYPE: &str = "application/vnd.api+json";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("PRODUCTIVE_API_KEY", "secret"),
            ("PRODUCTIVE_ORGANIZATION", "1234"),
        ]))
        .unwrap();

        assert_eq!(config.organization_id, 1234);
        assert_eq!(config.base_url, "https://api.productive.io/api/v2");
        assert_eq!(config.webapp_base_url, "https://app.productive.io");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.items_per_page, 30);
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_missing_token_and_organization_are_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err().to_string();
        assert!(err.contains("PRODUCTIVE_API_KEY is required"));
        assert!(err.contains("PRODUCTIVE_ORGANIZATION is required"));
    }

    #[test]
    fn test_invalid_values_are_collected() {
        let err = Config::from_lookup(lookup(&[
            ("PRODUCTIVE_API_KEY", "secret"),
            ("PRODUCTIVE_ORGANIZATION", "-5"),
            ("PRODUCTIVE_TIMEOUT", "0"),
            ("PRODUCTIVE_ITEMS_PER_PAGE", "500"),
            ("OUTPUT_FORMAT", "toml"),
        ]))
        .unwrap_err()
        .to_string();

        assert!(err.contains("PRODUCTIVE_ORGANIZATION must be a positive integer"));
        assert!(err.contains("PRODUCTIVE_TIMEOUT must be a positive integer"));
        assert!(err.contains("PRODUCTIVE_ITEMS_PER_PAGE must be between 1 and 200"));
        assert!(err.contains("OUTPUT_FORMAT"));
    }

    #[test]
    fn test_trailing_slashes_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("PRODUCTIVE_API_KEY", "secret"),
            ("PRODUCTIVE_ORGANIZATION", "1"),
            ("PRODUCTIVE_BASE_URL", "http://localhost:8080/api/"),
            ("OUTPUT_FORMAT", "YML"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.output_format, OutputFormat::Yaml);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::from_lookup(lookup(&[
            ("PRODUCTIVE_API_KEY", "super-secret-token"),
            ("PRODUCTIVE_ORGANIZATION", "1"),
        ]))
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}
