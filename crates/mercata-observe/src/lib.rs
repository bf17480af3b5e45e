//! # Mercata Observe - Observability Layer
//!
//! Centralized structured logging for the data-access core and the services
//! built on it, plus span helpers ([`span_utils`]) for consistent operation
//! attributes across the crates.
//!
//! Initialization is idempotent: a second call is a no-op rather than an
//! error, so test binaries and embedded uses can all call [`init_logging`]
//! without coordination.

#![deny(unsafe_code)]

pub mod span_utils;

use std::str::FromStr;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-oriented multi-line output for local development.
    Pretty,
    /// Single-line output for terminals and CI.
    #[default]
    Compact,
    /// Machine-readable JSON lines for log aggregation.
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(anyhow::anyhow!("unknown log format: {other}")),
        }
    }
}

/// Configuration for logging initialization.
#[derive(Debug, Clone, bon::Builder)]
#[builder(on(String, into))]
pub struct LogConfig {
    /// Output format.
    #[builder(default)]
    pub format: LogFormat,
    /// Default filter directive, overridden by `RUST_LOG` when set.
    #[builder(default = "info,mercata=debug".to_string())]
    pub default_filter: String,
    /// Whether to include the emitting module target in each line.
    #[builder(default = false)]
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Initialize structured logging with the given configuration.
///
/// The filter honors `RUST_LOG` when present, falling back to the configured
/// default directive.
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    let initialized = match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_target(config.with_target))
            .try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(config.with_target))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(config.with_target))
            .try_init(),
    };

    if initialized.is_err() {
        tracing::debug!("logging already initialized, skipping");
        return Ok(());
    }

    tracing::info!(format = ?config.format, "logging initialized");
    Ok(())
}

/// Initialize structured logging with the default configuration.
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LogConfig::default())
}
