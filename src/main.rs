mod config;
mod dashboard;
mod docs;
mod error;
mod llm;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use crate::config::Config;
use crate::llm::LlmEngine;

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything reads env vars
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    if args.iter().any(|a| a == "--default-config") {
        print!("{}", Config::default_config_contents());
        return;
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load config
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from);

    let config = match Config::load(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    // A missing API key is fatal here, before any request is accepted.
    let engine = match LlmEngine::new(&config) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            error!("failed to initialize LLM backend: {e}");
            std::process::exit(1);
        }
    };

    info!(
        bind = %config.bind,
        backend = engine.active_backend(),
        backends = ?engine.available_backends(),
        "doc-synth starting"
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let server_handle = {
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = dashboard::serve(config, engine, shutdown_rx).await {
                error!("server error: {e}");
                std::process::exit(1);
            }
        })
    };

    info!("doc-synth is running, press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl+c: {e}");
    }

    info!("shutdown signal received, stopping...");
    let _ = shutdown_tx.send(());

    let _ = server_handle.await;
    info!("doc-synth stopped");
}

fn print_usage() {
    println!(
        "doc-synth: API documentation drafted from an OpenAPI spec, meeting notes and a clarifying chat

USAGE:
    doc-synth [OPTIONS]

OPTIONS:
    --config <PATH>     Path to config file (default: ~/.config/doc-synth/config.toml)
    --default-config    Print default config to stdout and exit
    -h, --help          Print this help message

LLM BACKEND:
    LLM_BACKEND            \"huggingface\" (default) or \"openrouter\"
    LLM_MODEL              Model identifier (default: mistralai/Mixtral-8x7B-Instruct-v0.1)
    HUGGING_FACE_API_KEY   Inference API key (required for huggingface)
    HUGGING_FACE_BASE_URL  Inference API base URL (optional)
    OPENROUTER_API_KEY     OpenRouter API key (required for openrouter)
    OPENROUTER_BASE_URL    OpenRouter base URL (optional)

LOGGING:
    RUST_LOG               Log filter (default: info)

A .env file in the working directory is loaded before the environment is read."
    );
}
