//! Command-line front end: fetch one or more feeds and print every emitted
//! record as a JSON line, followed by the job report.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use feedwire::records::{AnchorValue, FetchOptions, Job, SinkRecord, Target};
use feedwire::{Config, FeedPlatform, Session};

#[derive(Parser, Debug)]
#[command(
    name = "feedwire",
    about = "Fetch RSS/Atom feeds and print normalized article records"
)]
struct Args {
    /// Feed URLs to fetch
    #[arg(required = true)]
    urls: Vec<String>,

    /// Maximum number of articles to emit per feed
    #[arg(long)]
    limit: Option<u32>,

    /// Selection property: date (default) or url
    #[arg(long)]
    property: Option<String>,

    /// Emit articles after this anchor (epoch ms or date string)
    #[arg(long)]
    after: Option<String>,

    /// Emit articles before this anchor (epoch ms or date string)
    #[arg(long)]
    before: Option<String>,

    /// Selection direction: after (default) or before
    #[arg(long)]
    from: Option<String>,

    /// Link anchor for --property url
    #[arg(long, value_name = "URL")]
    url_anchor: Option<String>,

    /// Path to a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Session that prints records to stdout as JSON lines and routes protocol
/// log calls through `tracing`.
struct StdoutSession;

#[async_trait::async_trait]
impl Session for StdoutSession {
    async fn send(&self, record: SinkRecord) {
        match serde_json::to_string(&record) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!(error = %e, "Failed to serialize record"),
        }
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn log(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn session_id(&self) -> String {
        "stdout".to_string()
    }
}

/// Numeric anchors become epochs, anything else stays a date string.
fn anchor_arg(value: Option<String>) -> Option<AnchorValue> {
    value.map(|v| match v.parse::<i64>() {
        Ok(ms) => AnchorValue::Epoch(ms),
        Err(_) => AnchorValue::Text(v),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path).context("Failed to load config file")?,
        None => Config::default(),
    };

    let job = Job {
        actor: Target::new("feedwire"),
        rid: String::new(),
        verb: "fetch".to_string(),
        target: Some(args.urls.iter().map(|u| Target::new(u.as_str())).collect()),
        object: FetchOptions {
            limit: args.limit,
            property: args.property,
            after: anchor_arg(args.after),
            before: anchor_arg(args.before),
            from: args.from,
            url: args.url_anchor,
        },
    };

    let platform = FeedPlatform::with_config(Arc::new(StdoutSession), &config);
    let report = platform.fetch(&job).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
