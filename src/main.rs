//! SMS Gateway - rate-limited SMS delivery in front of a single provider

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info};

use sms_gateway::{
    cli::{Cli, Command},
    config::Config,
    gateway::Gateway,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional; real environment variables take precedence
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Held until exit so the file writer flushes
    let _log_guard = match setup_tracing(
        &cli.log_level,
        cli.log_format.as_deref(),
        cli.log_dir.as_deref(),
    ) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to setup tracing: {e}");
            return ExitCode::FAILURE;
        }
    };

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded env file"),
        Err(e) => debug!(error = %e, "No env file loaded"),
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::CheckConfig) => check_config(&config),
        Some(Command::Serve) | None => run_server(config).await,
    }
}

/// Load configuration and apply CLI overrides
fn load_config(cli: &Cli) -> sms_gateway::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref host) = cli.host {
        config.server.host = host.clone();
    }
    Ok(config)
}

/// Validate configuration and print it with the password redacted
fn check_config(config: &Config) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("❌ {e}");
        return ExitCode::FAILURE;
    }

    let mut redacted = config.clone();
    redacted.provider.password = "<redacted>".to_string();
    match serde_json::to_string_pretty(&redacted) {
        Ok(json) => {
            println!("{json}");
            println!("✅ Configuration is valid");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Failed to serialize configuration: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the gateway server
async fn run_server(config: Config) -> ExitCode {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        rate_limit = config.rate_limit.limit,
        "Starting SMS Gateway"
    );

    let gateway = match Gateway::new(config) {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to create gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = gateway.run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}
