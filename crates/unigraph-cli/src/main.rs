//! CLI entry point for the unigraph academic catalog.
//!
//! Designed for subprocess invocation: `unigraph run` reads one JSON
//! operation from stdin (or `--op`), writes `{"data": ...}` or
//! `{"error": "..."}` to stdout. Logs go to stderr.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{fmt, EnvFilter};

use unigraph_graph::error::Result;
use unigraph_graph::{dispatch, Catalog, GraphClient, GraphConfig, Operation};

#[derive(Parser)]
#[command(name = "unigraph")]
#[command(about = "Query and mutate the academic catalog graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: unigraph).
    #[arg(short, long, default_value = "unigraph", global = true)]
    config: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Execute one API operation (reads JSON from stdin unless --op is given).
    Run {
        /// Operation document, e.g. '{"operation": "degrees"}'.
        #[arg(long)]
        op: Option<String>,
    },
    /// Install uniqueness constraints on every identity attribute.
    InitSchema,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let settings = unigraph_core::config::load(&cli.config)?;
    let graph_config = GraphConfig::from(settings.neo4j);

    match cli.command {
        Command::Run { op } => {
            let input = match op {
                Some(op) => op,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            match run(&graph_config, &input).await {
                Ok(data) => {
                    println!("{}", json!({ "data": data }));
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("{}", json!({ "error": e.to_string() }));
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::InitSchema => {
            let graph = GraphClient::connect(&graph_config).await?;
            Catalog::new(graph).ensure_schema().await?;
            tracing::info!("Schema constraints installed");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Malformed input is rejected before a connection is opened.
async fn run(graph_config: &GraphConfig, input: &str) -> Result<Value> {
    let op = Operation::from_json(input)?;
    tracing::debug!(mutation = op.is_mutation(), "Operation parsed");

    let graph = GraphClient::connect(graph_config).await?;
    dispatch(&Catalog::new(graph), op).await
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }
}
