//! dfindex CLI: run the DeFiChain indexer and inspect its progress.
//!
//! Usage:
//! ```bash
//! dfindex run    --config dfindex.json
//! dfindex status --rpc-url http://127.0.0.1:8554 --database dfindex.db
//! dfindex info
//! ```

mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Args, Parser, Subcommand};
use dfindex_core::client::ChainClient;
use dfindex_core::indexer::IndexerConfig;
use dfindex_defichain::{Database, HttpChainClient, IndexerBuilder, RootIndexer};
use tracing::{info, warn};

use config::{CliConfig, Overrides};

#[derive(Parser)]
#[command(
    name = "dfindex",
    about = "Reorg-safe DeFiChain projection indexer",
    long_about = "
dfindex follows a DeFiChain node block by block and maintains queryable
projections (blocks, transactions, script balances, tokens, swaps, auction
bids), undoing them when blocks leave the best chain.

ENVIRONMENT VARIABLES:
  DFINDEX_CONFIG         Path to a JSON config file
  DFINDEX_RPC_URL        Node JSON-RPC endpoint
  DFINDEX_RPC_USER       Node RPC user
  DFINDEX_RPC_PASSWORD   Node RPC password
  DFINDEX_DATABASE       SQLite database path (memory when unset)
  DFINDEX_LOG            Log level or filter directives
",
    version
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// JSON config file
    #[arg(long, global = true, env = "DFINDEX_CONFIG")]
    config: Option<PathBuf>,
    /// Node JSON-RPC endpoint
    #[arg(long, global = true, env = "DFINDEX_RPC_URL")]
    rpc_url: Option<String>,
    #[arg(long, global = true, env = "DFINDEX_RPC_USER")]
    rpc_user: Option<String>,
    #[arg(long, global = true, env = "DFINDEX_RPC_PASSWORD", hide_env_values = true)]
    rpc_password: Option<String>,
    /// SQLite database path
    #[arg(long, global = true, env = "DFINDEX_DATABASE")]
    database: Option<String>,
    #[arg(long, global = true, env = "DFINDEX_LOG")]
    log_level: Option<String>,
    /// Emit JSON logs
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the node until interrupted
    Run {
        /// Tick interval in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,
    },

    /// Compare the indexed height with the node's tip
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show effective configuration and the indexer pipeline
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let poll_interval_ms = match &cli.command {
        Commands::Run { poll_interval_ms } => *poll_interval_ms,
        _ => None,
    };
    let global = cli.global;
    let config = CliConfig::load(global.config.as_deref())?.apply(Overrides {
        rpc_url: global.rpc_url,
        rpc_user: global.rpc_user,
        rpc_password: global.rpc_password,
        database: global.database,
        poll_interval_ms,
        log_level: global.log_level,
        json_logs: global.json_logs,
    });
    logging::init_tracing(&config.log)?;

    match cli.command {
        Commands::Run { .. } => cmd_run(config.indexer).await,
        Commands::Status { json } => cmd_status(config.indexer, json).await,
        Commands::Info => cmd_info(&config.indexer),
    }
}

async fn open_database(config: &IndexerConfig) -> Result<Database> {
    IndexerBuilder::from_config(config.clone())
        .open_database()
        .await
        .with_context(|| format!("opening {}", config.database.as_deref().unwrap_or("memory")))
}

async fn cmd_run(config: IndexerConfig) -> Result<()> {
    let provider = Arc::new(
        IndexerBuilder::from_config(config.clone())
            .build()
            .await
            .context("building indexer")?,
    );
    info!(
        rpc_url = %config.rpc_url,
        database = config.database.as_deref().unwrap_or("memory"),
        "starting dfindex"
    );

    provider.start();
    let runner = tokio::spawn({
        let provider = provider.clone();
        let interval = Duration::from_millis(config.poll_interval_ms);
        async move { provider.run(interval).await }
    });

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    info!("shutdown requested");

    if provider
        .stop(Duration::from_millis(config.stop_timeout_ms))
        .await
    {
        runner.await.context("sync loop panicked")?;
    } else {
        warn!("sync loop still busy, aborting");
        runner.abort();
    }
    Ok(())
}

async fn cmd_status(config: IndexerConfig, json: bool) -> Result<()> {
    let client = HttpChainClient::from_config(&config)?;
    let db = open_database(&config).await?;

    let (node_height, highest) = futures::try_join!(
        async { client.get_block_count().await.context("querying node") },
        async { db.highest_block().await.context("reading projections") },
    )?;

    let indexed_height = highest.as_ref().map(|b| b.height);
    let lag = indexed_height.map(|h| node_height.saturating_sub(h));
    let block_time = highest
        .as_ref()
        .and_then(|b| DateTime::from_timestamp(b.time, 0))
        .map(|t| t.to_rfc3339());

    if json {
        let status = serde_json::json!({
            "node_height": node_height,
            "indexed_height": indexed_height,
            "indexed_hash": highest.as_ref().map(|b| b.hash.clone()),
            "indexed_block_time": block_time,
            "lag": lag,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Node height:    {node_height}");
    match &highest {
        Some(block) => {
            println!("Indexed height: {}", block.height);
            println!("Indexed hash:   {}", block.hash);
            println!("Block time:     {}", block_time.unwrap_or_default());
            println!("Lag:            {} blocks", lag.unwrap_or_default());
        }
        None => println!("Indexed height: none"),
    }
    Ok(())
}

fn cmd_info(config: &IndexerConfig) -> Result<()> {
    println!("dfindex v{}", env!("CARGO_PKG_VERSION"));
    println!("  Node RPC:        {}", config.rpc_url);
    println!(
        "  Storage:         {}",
        config.database.as_deref().unwrap_or("memory")
    );
    println!("  Poll interval:   {} ms", config.poll_interval_ms);
    println!("  RPC retries:     {}", config.rpc_max_retries);
    println!(
        "  SQLite support:  {}",
        if cfg!(feature = "sqlite") { "yes" } else { "no" }
    );

    let db = Database::in_memory();
    let pipeline = RootIndexer::new(&db);
    println!("  Indexers:        {}", pipeline.names().join(" → "));
    Ok(())
}
