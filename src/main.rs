use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::signal;

use spectre_analyzer::config::Config;
use spectre_analyzer::graph::{GraphData, export_graph};
use spectre_analyzer::llm::SynthesisClient;
use spectre_analyzer::routes::{AppState, router};
use spectre_analyzer::synthesis::{CaseInput, outcome_json};
use spectre_analyzer::telemetry::init_telemetry;

#[derive(Debug, Parser)]
#[command(name = "spectre-analyzer", version, about = "SPECTRE case analyzer")]
struct Cli {
    #[arg(long, value_enum)]
    task: Task,

    /// JSON payload for `synthesize` and `visualize`.
    #[arg(long)]
    input: Option<String>,

    /// Listen port for `serve`; overrides APP_PORT.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Task {
    Synthesize,
    Visualize,
    Serve,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", json!({ "error": format!("{err:#}") }));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let telemetry_guard = init_telemetry(&config)?;

    let result = match cli.task {
        Task::Synthesize => synthesize(&config, require_input(&cli)?).await,
        Task::Visualize => visualize(&config, require_input(&cli)?).await,
        Task::Serve => serve(config).await,
    };

    telemetry_guard.shutdown();
    result
}

fn require_input(cli: &Cli) -> anyhow::Result<&str> {
    cli.input
        .as_deref()
        .with_context(|| format!("--input is required for the {:?} task", cli.task))
}

/// Synthesis failures are a normal outcome and go to stdout as `{"error": ...}`.
async fn synthesize(config: &Config, raw: &str) -> anyhow::Result<()> {
    let input: CaseInput = serde_json::from_str(raw).context("invalid case input JSON")?;

    let result = match SynthesisClient::new(config.policy.clone()) {
        Ok(client) => client.synthesize(&input).await,
        Err(err) => Err(err),
    };

    println!("{}", outcome_json(result));
    Ok(())
}

async fn visualize(config: &Config, raw: &str) -> anyhow::Result<()> {
    let mut input: Value = serde_json::from_str(raw).context("invalid visualize input JSON")?;
    let data = match input.get_mut("data").map(Value::take) {
        None | Some(Value::Null) => json!({}),
        Some(data) => data,
    };
    let data: GraphData = serde_json::from_value(data).context("invalid graph data")?;

    let export = export_graph(&data, &config.evidence_dir).await?;
    println!("{}", serde_json::to_string(&export)?);
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        port = config.port,
        environment = %config.environment,
        endpoint = %config.policy.default_endpoint,
        max_attempts = config.policy.max_attempts,
        "Starting spectre-analyzer"
    );

    let client = SynthesisClient::new(config.policy.clone())?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState {
        config,
        client: Arc::new(client),
    });

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
