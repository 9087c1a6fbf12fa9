//! CLI for running the pipeline by hand
//!
//! Uses the in-memory store and prints JSON to stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use locbook::{
    Config, GeoPoint, Identity, IngestError, IngestOutcome, LocBook, MemoryStore, Reply,
    SearchOutcome,
};

#[derive(Parser)]
#[command(name = "locbook")]
#[command(about = "Save places from map links and screenshots")]
struct Cli {
    /// Identity to act as
    #[arg(long, default_value_t = 0)]
    identity: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, enrich and save a map link
    Ingest { url: String },

    /// Analyse and save a screenshot
    Photo { path: PathBuf },

    /// Free-text search over saved places
    Query {
        text: String,
        /// Latitude to answer a "near me" search with
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let identity = Identity(cli.identity);
    let kernel = LocBook::from_config(config, Arc::new(MemoryStore::new()))
        .context("Failed to build kernel")?;

    let result = match cli.command {
        Commands::Ingest { url } => kernel
            .handle_link(identity, &url)
            .await
            .map(|outcome| ingest_json(&outcome)),
        Commands::Photo { path } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            kernel
                .handle_photo(identity, bytes, chrono::Utc::now())
                .await
                .map(|reply| reply_json(&reply))
        }
        Commands::Query { text, lat, lng } => {
            query(&kernel, identity, &text, lat.zip(lng).map(|(la, ln)| GeoPoint::new(la, ln)))
                .await
        }
    };

    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            println!("{}", serde_json::to_string_pretty(&error_json(&e))?);
            std::process::exit(1);
        }
    }
}

async fn query(
    kernel: &LocBook,
    identity: Identity,
    text: &str,
    near: Option<GeoPoint>,
) -> Result<Value, IngestError> {
    let outcome = match (kernel.handle_search(identity, text).await?, near) {
        (SearchOutcome::AwaitingLocation(_), Some(point)) => {
            kernel.handle_location(identity, point).await?
        }
        (outcome, _) => outcome,
    };

    Ok(match outcome {
        SearchOutcome::Results(records) => json!({ "success": true, "results": records }),
        SearchOutcome::AwaitingLocation(intent) => json!({
            "success": true,
            "awaiting_location": true,
            "intent": intent,
            "hint": "re-run with --lat and --lng"
        }),
        SearchOutcome::NoPendingSearch => json!({ "success": true, "results": [] }),
    })
}

fn ingest_json(outcome: &IngestOutcome) -> Value {
    match outcome {
        IngestOutcome::Created { record, commentary } => json!({
            "success": true,
            "duplicate": false,
            "record": record,
            "commentary": commentary,
        }),
        IngestOutcome::Duplicate(record) => json!({
            "success": true,
            "duplicate": true,
            "record": record,
        }),
    }
}

fn reply_json(reply: &Reply) -> Value {
    match reply {
        Reply::Saved(outcome) => ingest_json(outcome),
        Reply::Disabled => json!({ "success": false, "message": "screenshot analysis is disabled" }),
        Reply::RateLimited => json!({ "success": false, "message": "rate limited" }),
        Reply::Ignored => json!({ "success": false, "message": "message ignored" }),
        Reply::Search(_) => json!({ "success": false, "message": "unexpected search reply" }),
    }
}

fn error_json(error: &IngestError) -> Value {
    json!({
        "success": false,
        "category": error.category(),
        "retryable": error.is_retryable(),
        "message": error.user_message(),
    })
}
