use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use mail_lens::config::AssistConfig;
use mail_lens::llm::OllamaProvider;
use mail_lens::mail::{
    BatchOptions, DirectorySource, RawMessage, fetch_batch, normalize, normalize_files,
};
use mail_lens::pipeline::{Orchestrator, ProcessingMode, ProcessingReport};
use mail_lens::server::api_routes;

#[derive(Parser)]
#[command(name = "mail-lens")]
#[command(about = "Normalize emails and translate or analyze them with a local LLM", long_about = None)]
struct Cli {
    /// Ollama base URL (overrides OLLAMA_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model to use (overrides OLLAMA_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize raw message JSON files and print the result
    Normalize {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Normalize one raw message file and run it through the model
    Process {
        file: PathBuf,

        /// translate | summarize | both
        #[arg(long, default_value = "both")]
        mode: String,
    },

    /// Fetch a batch from a directory of raw messages and process each one
    Batch {
        dir: PathBuf,

        /// Case-insensitive substring filter on the raw files
        #[arg(long, default_value = "")]
        query: String,

        #[arg(long, default_value_t = 10)]
        max: usize,

        #[arg(long, default_value = "both")]
        mode: String,

        /// Keep messages with no subject or sender
        #[arg(long)]
        allow_missing_headers: bool,
    },

    /// List models installed on the Ollama server
    Models,

    /// Check that the Ollama server is reachable
    Check,

    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Serialize)]
struct BatchEntry {
    id: String,
    #[serde(flatten)]
    report: ProcessingReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AssistConfig::from_env().context("Configuration error")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }

    match cli.cmd {
        Command::Normalize { files } => {
            let outcome = normalize_files(&files).await;
            print_json(&outcome)
        }

        Command::Process { file, mode } => {
            let email = normalize(&read_raw(&file)?);
            let (orchestrator, _) = build_orchestrator(&config)?;
            let result = orchestrator.process_named(&email, &mode).await;
            let success = result.is_ok();
            print_json(&ProcessingReport::from(result))?;
            if !success {
                std::process::exit(1);
            }
            Ok(())
        }

        Command::Batch {
            dir,
            query,
            max,
            mode,
            allow_missing_headers,
        } => {
            let mode = mode.parse::<ProcessingMode>().context("Invalid --mode")?;
            let source = DirectorySource::new(dir);
            let options = BatchOptions {
                concurrency: config.batch_concurrency,
                require_subject_and_from: !allow_missing_headers,
            };
            let outcome = fetch_batch(&source, &query, max, &options).await?;

            let (orchestrator, _) = build_orchestrator(&config)?;
            let results = orchestrator.process_batch(&outcome.emails, mode).await;
            let entries: Vec<BatchEntry> = results
                .into_iter()
                .map(|(id, result)| BatchEntry {
                    id,
                    report: ProcessingReport::from(result),
                })
                .collect();

            print_json(&serde_json::json!({
                "results": entries,
                "skipped": outcome.skipped,
            }))
        }

        Command::Models => {
            let ollama = OllamaProvider::from_config(&config)?;
            let models = ollama.list_models().await?;
            print_json(&models)
        }

        Command::Check => {
            let ollama = OllamaProvider::from_config(&config)?;
            match ollama.check_connection().await {
                Ok(count) => {
                    println!("Connected to {} ({} models)", ollama.base_url(), count);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Error: cannot reach {}: {}", ollama.base_url(), e);
                    std::process::exit(1);
                }
            }
        }

        Command::Serve { port } => {
            let (orchestrator, ollama) = build_orchestrator(&config)?;
            let app = api_routes(Arc::new(orchestrator), Some(ollama));

            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
                .await
                .with_context(|| format!("Failed to bind port {port}"))?;
            tracing::info!(port, model = %config.model, "HTTP API started");
            axum::serve(listener, app).await?;
            Ok(())
        }
    }
}

fn build_orchestrator(config: &AssistConfig) -> Result<(Orchestrator, Arc<OllamaProvider>)> {
    let ollama = Arc::new(OllamaProvider::from_config(config)?);
    let orchestrator = Orchestrator::from_config(ollama.clone(), config);
    Ok((orchestrator, ollama))
}

fn read_raw(path: &Path) -> Result<RawMessage> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid message JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
