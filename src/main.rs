use std::process::ExitCode;

use stock_shorts::config::Config;
use stock_shorts::generator::{RunOutcome, run_generation};
use stock_shorts::init;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting shorts generator");

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::error!("[ERROR] {}", err);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("API keys loaded. Pexels: {}", cfg.key_preview());

    if let Err(err) = init::ensure_directories().await {
        tracing::error!("[ERROR] Failed to create directories: {:#}", err);
        return ExitCode::FAILURE;
    }
    if !init::check_ffmpeg().await {
        tracing::warn!("[WARN] FFmpeg not found in PATH. Please install FFmpeg.");
    }

    let outcome = match run_generation(&cfg).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!("[ERROR] {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    match outcome {
        RunOutcome::Produced { path, .. } => {
            println!("Created: {}", path.display());
            if let Ok(meta) = tokio::fs::metadata(&path).await {
                println!("Size: {:.1} MB", meta.len() as f64 / (1024.0 * 1024.0));
            }
            ExitCode::SUCCESS
        }
        RunOutcome::InsufficientClips { .. } | RunOutcome::AssemblyFailed => {
            eprintln!("Failed to create a video");
            ExitCode::FAILURE
        }
    }
}
