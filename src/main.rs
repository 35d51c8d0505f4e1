use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docrag_core::{Config, RagPipeline};
use docrag_gateway::GatewayServer;
use docrag_llm::AnyProvider;
use docrag_llm::ollama::OllamaProvider;
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(name = "docrag", version, about = "Ask questions about a directory of documents")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Run the HTTP gateway (default).
    Serve,
    /// Index every document in DIR and replace the persisted index.
    Build { dir: PathBuf },
    /// Answer QUERY from the persisted index.
    Ask { query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), "config loaded");

    let provider = create_provider(&config);
    health_check(&provider).await;
    let pipeline = Arc::new(RagPipeline::new(&config, Arc::new(provider)));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, pipeline).await,
        Command::Build { dir } => {
            let report = pipeline
                .build_index(&dir)
                .await
                .with_context(|| format!("failed to build index from {}", dir.display()))?;
            for skipped in &report.skipped {
                println!("skipped {}: {}", skipped.path.display(), skipped.reason);
            }
            println!(
                "Index built successfully: {} documents, {} chunks -> {}",
                report.documents,
                report.chunks,
                pipeline.store().path().display()
            );
            Ok(())
        }
        Command::Ask { query } => {
            let answer = pipeline.answer(&query).await.context("failed to answer query")?;
            println!("{answer}");
            Ok(())
        }
    }
}

async fn serve(config: &Config, pipeline: Arc<RagPipeline<AnyProvider>>) -> anyhow::Result<()> {
    if let Some(dir) = &config.index.build_on_startup {
        let report = pipeline
            .build_index(dir)
            .await
            .with_context(|| format!("startup index build from {} failed", dir.display()))?;
        tracing::info!(
            documents = report.documents,
            chunks = report.chunks,
            "startup index build finished"
        );
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &config.gateway.bind,
        config.gateway.port,
        pipeline,
        shutdown_rx,
    )
    .with_max_body_size(config.gateway.max_body_size)
    .serve()
    .await?;
    Ok(())
}

fn create_provider(config: &Config) -> AnyProvider {
    AnyProvider::Ollama(OllamaProvider::new(
        &config.llm.base_url,
        config.llm.model.clone(),
        config.llm.embedding_model.clone(),
    ))
}

async fn health_check(provider: &AnyProvider) {
    if let Some(ollama) = provider.as_ollama() {
        match ollama.health_check().await {
            Ok(()) => tracing::info!(model = ollama.model(), "ollama health check passed"),
            Err(e) => tracing::warn!("ollama health check failed: {e:#}"),
        }
    }
}

fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("DOCRAG_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
