use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use engine::EngineConfig;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use server::build_app;
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Corpus JSONL path
    #[arg(long, default_value = "./data/corpus.jsonl")]
    corpus: String,
    /// Optional engine configuration (JSON)
    #[arg(long)]
    config: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config: EngineConfig = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?).with_context(|| format!("parsing config {path}"))?,
        None => EngineConfig::default(),
    };
    // Indexes are built before the listener opens and never change afterwards.
    let app: Router = build_app(&args.corpus, config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
