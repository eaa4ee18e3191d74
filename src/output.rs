//! Serialization of filtered documents
//!
//! Filtering decides *what* is returned; this module only decides how the
//! result is encoded in the tool response text.

use std::fmt;

use serde_json::Value;

use crate::error::Result;

/// Encoding used for tool results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    #[default]
    Json,
    /// Block-style YAML
    #[value(alias = "yml")]
    Yaml,
}

impl OutputFormat {
    /// Render a document in this format
    pub fn render(&self, document: &Value) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(document)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(document)?),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
