//! Mouthpiece server binary.
//!
//! Starts an axum HTTP server with structured logging and graceful shutdown
//! on SIGTERM/SIGINT.

use mouthpiece_server::{app, config, AppState};
use mouthpiece_voice::{FfmpegTranscoder, ToolInvoker};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("MOUTHPIECE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the server cannot start without valid config");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        dotenv = dotenv_loaded,
        "resolved startup configuration path"
    );

    if !config.openai.is_configured() {
        tracing::warn!("OPENAI_API_KEY is not set; chat replies will be the reminder clips");
    }
    if !config.elevenlabs.is_configured() {
        tracing::warn!(
            "ELEVEN_LABS_API_KEY or ELEVEN_LABS_VOICE_ID is not set; chat replies will be the reminder clips"
        );
    }

    let state = AppState::from_config(&config);
    state
        .sequencer
        .pipeline()
        .store()
        .prepare()
        .await
        .expect("failed to create artifacts directory; check media.artifacts_dir in config");

    // Not fatal: the transcoding stage re-checks and fails the request instead.
    let transcoder = FfmpegTranscoder::new(
        &config.media.ffmpeg_binary,
        ToolInvoker::new(Duration::from_secs(config.media.tool_timeout_secs)),
    );
    if let Err(e) = transcoder.ensure_available().await {
        tracing::warn!("{}", e);
    }
    let rhubarb = &config.media.rhubarb_binary;
    if rhubarb.components().count() > 1 && !rhubarb.exists() {
        tracing::warn!(
            path = %rhubarb.display(),
            "rhubarb binary not found; lip sync will fail"
        );
    }

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting mouthpiece server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("mouthpiece server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
