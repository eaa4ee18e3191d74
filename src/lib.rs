//! Productive MCP Server Library
//!
//! A Model Context Protocol (MCP) server for Productive.io.
//! Provides read-only tools over projects, tasks, comments, todos, docs,
//! attachments and the activity feed, with responses reduced for LLM use.

pub mod config;
pub mod error;
pub mod mcp;
pub mod output;
pub mod productive;

pub use config::Config;
pub use error::{ProductiveMcpError, Result};
