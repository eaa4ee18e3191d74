//! Productive API module
//!
//! Contains the HTTP client, request construction and the response filter
//! engine that shapes Productive's JSON:API documents for tool output.

pub mod activity;
pub mod client;
pub mod filter;
pub mod html;
pub mod query;
pub mod rules;
