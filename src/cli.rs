//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Rate-limited SMS delivery gateway
#[derive(Parser, Debug)]
#[command(name = "sms-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "SMS_GATEWAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "SMS_GATEWAY_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "SMS_GATEWAY_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "SMS_GATEWAY_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "SMS_GATEWAY_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Directory for daily log files (`sms_log.YYYY-MM-DD.txt`)
    #[arg(long, env = "SMS_GATEWAY_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gateway server (default)
    Serve,

    /// Load and validate configuration, then print it with secrets redacted
    CheckConfig,
}
