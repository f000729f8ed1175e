mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use st_host::OcrService;
use st_ocr::{OcrConfig, PaddleLoader, ReplayLoader};
use st_settings::{ConfigManager, Settings};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use cli::Cli;
use commands::Capture;

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings_path = cli
        .config
        .clone()
        .unwrap_or_else(Settings::primary_settings_path);
    let config = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let settings = config.get();
    debug!("Settings loaded from {}", settings_path.display());
    let capture = Capture::for_command(&cli.command, cli.capture_url.as_deref());

    let response = match cli.replay {
        Some(path) => {
            info!("Replaying recorded OCR result from {}", path.display());
            let service = OcrService::new(settings, capture, ReplayLoader::new(path));
            commands::run(service, cli.command).await?
        }
        None => {
            info!(
                "Using ocr-rs engine (models: {}, languages: {})",
                settings.models_dir.display(),
                settings.ocr_language
            );
            let loader = PaddleLoader::new(OcrConfig::new(
                settings.models_dir.clone(),
                settings.ocr_language.clone(),
            ));
            let service = OcrService::new(settings, capture, loader);
            commands::run(service, cli.command).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    if !response.ok {
        std::process::exit(1);
    }
    Ok(())
}
