//! Productive MCP Server
//!
//! A Model Context Protocol (MCP) server exposing read-only Productive.io
//! data (projects, tasks, comments, docs, todos, activity) over stdio.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use productive_mcp_server::config::Config;
use productive_mcp_server::mcp::server::McpServer;
use productive_mcp_server::mcp::tools::ToolHandler;
use productive_mcp_server::output::OutputFormat;
use productive_mcp_server::productive::client::ProductiveClient;

/// Productive MCP Server
#[derive(Parser)]
#[command(name = "productive-mcp-server")]
#[command(author, version, about = "Productive MCP Server - A Model Context Protocol server for Productive.io")]
struct Cli {
    /// Encoding of tool results (overrides OUTPUT_FORMAT)
    #[arg(long, value_enum)]
    output_format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the environment configuration and print it (token redacted)
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is the protocol channel
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(format) = cli.output_format {
        config.output_format = format;
    }

    match cli.command {
        Some(Commands::CheckConfig) => {
            println!("Configuration OK: {:#?}", config);
            Ok(())
        }
        None => run_server(config).await,
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        organization_id = config.organization_id,
        base_url = %config.base_url,
        output_format = %config.output_format,
        "starting Productive MCP server"
    );

    let client = ProductiveClient::new(&config).context("failed to build the Productive API client")?;
    let tool_handler = ToolHandler::new(Arc::new(client), &config);

    let mut server = McpServer::new(tool_handler);
    server.run_stdio().await.context("MCP server terminated")?;

    Ok(())
}
