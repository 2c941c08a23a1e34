//! SMS Gateway Library
//!
//! Accepts delivery requests, validates and throttles them, and forwards them
//! to a single HelloSMS-compatible provider over HTTP.
//!
//! # Components
//!
//! - **Validator**: recipient format and message length rules
//! - **Rate limiting**: one sliding window shared by every caller
//! - **Delivery**: authenticated provider calls with timeout and retries
//! - **Gateway**: admission, normalization, delivery, correlation IDs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod correlation;
pub mod delivery;
pub mod error;
pub mod failsafe;
pub mod gateway;
pub mod stats;
pub mod validator;

pub use error::{Error, Result};

use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

/// Prefix of the daily log files, e.g. `sms_log.2026-10-19.txt`
pub const LOG_FILE_PREFIX: &str = "sms_log";

/// Plain-text fmt layer behind a non-blocking file writer
pub type FileLayer<S> =
    fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, NonBlocking>;

/// Plain-text layer writing to a daily file in `dir`
///
/// The returned guard flushes pending records when dropped, so it must live
/// as long as the subscriber.
pub fn daily_file_layer<S>(dir: &Path) -> Result<(FileLayer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("txt")
        .build(dir)
        .map_err(|e| Error::Config(format!("Cannot open log dir {}: {e}", dir.display())))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((fmt::layer().with_ansi(false).with_writer(writer), guard))
}

/// Setup tracing/logging
///
/// With `log_dir` set, records are also written to a daily file there and
/// the returned guard must be held until shutdown.
pub fn setup_tracing(
    level: &str,
    format: Option<&str>,
    log_dir: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (layer, guard) = daily_file_layer(dir)?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(file_layer);

    let installed = match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    };
    installed.map_err(|e| Error::Internal(e.to_string()))?;

    Ok(guard)
}
