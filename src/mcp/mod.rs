//! MCP (Model Context Protocol) module
//!
//! Stdio JSON-RPC server, protocol types and the Productive tool set.

pub mod server;
pub mod tools;
pub mod types;
