mod cli;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kbase::{config, db, knowledge, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kbase", version, about = "Knowledge base MCP server for AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport to use (overrides `server.transport` in config)
        #[arg(long, value_enum)]
        transport: Option<Transport>,
    },
    /// Run only the HTTP front door (/health, /stats, /search)
    Http,
    /// Show store statistics
    Stats,
    /// Search entries
    Search {
        /// Text to match in title or content
        query: Option<String>,
        /// Only entries in this category
        #[arg(long)]
        category: Option<String>,
        /// Only entries carrying any of these tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Maximum number of results (1-100)
        #[arg(long, default_value_t = knowledge::search::DEFAULT_LIMIT)]
        limit: i64,
    },
    /// Show one entry in full
    Inspect { id: i64 },
    /// Dump all entries and contexts as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

fn configured_transport(config: &config::KbaseConfig) -> Result<Transport> {
    match config.server.transport.as_str() {
        "stdio" => Ok(Transport::Stdio),
        "http" => Ok(Transport::Http),
        other => bail!("unknown transport in config: {other}. Supported: stdio, http"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::KbaseConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = match transport {
                Some(t) => t,
                None => configured_transport(&config)?,
            };
            match transport {
                Transport::Stdio => server::serve_stdio(config).await?,
                Transport::Http => server::serve_streamable_http(config).await?,
            }
        }
        Command::Http => server::serve_front_door(config).await?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Search {
            query,
            category,
            tags,
            limit,
        } => cli::search::search(&config, query, category, tags, limit)?,
        Command::Inspect { id } => cli::inspect::inspect(&config, id)?,
        Command::Export { output } => cli::export::export(&config, output.as_deref())?,
    }

    Ok(())
}
