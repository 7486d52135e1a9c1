//! # todo-telemetry
//!
//! Installs the process-wide `tracing` subscriber: an [`EnvFilter`] built
//! from settings (overridden by `RUST_LOG`) feeding a fmt layer on stderr,
//! either human-readable or one JSON object per line.

#![deny(unsafe_code)]

use thiserror::Error;
use todo_settings::{LogFormat, LoggingSettings};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A level or filter directive did not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by `RUST_LOG`.
    pub log_level: LevelFilter,
    /// Per-module level overrides (e.g. `"todo_store" => DEBUG`).
    pub module_levels: Vec<(String, LevelFilter)>,
    /// Output format.
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::WARN,
            module_levels: Vec::new(),
            format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    /// Build a config from the `logging` settings section.
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self, TelemetryError> {
        let log_level = settings
            .level
            .trim()
            .parse::<LevelFilter>()
            .map_err(|e| TelemetryError::Filter(format!("{}: {e}", settings.level)))?;
        Ok(Self {
            log_level,
            module_levels: Vec::new(),
            format: settings.format,
        })
    }

    /// Replace the default level.
    #[must_use]
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// Add or replace a per-module override.
    #[must_use]
    pub fn with_module_level(mut self, module: impl Into<String>, level: LevelFilter) -> Self {
        let module = module.into();
        if let Some(entry) = self.module_levels.iter_mut().find(|(m, _)| *m == module) {
            entry.1 = level;
        } else {
            self.module_levels.push((module, level));
        }
        self
    }

    /// The `EnvFilter` directive string, e.g. `warn,todo_store=debug`.
    pub fn filter_directive(&self) -> String {
        let mut directive = self.log_level.to_string().to_lowercase();
        for (module, level) in &self.module_levels {
            directive.push(',');
            directive.push_str(module);
            directive.push('=');
            directive.push_str(&level.to_string().to_lowercase());
        }
        directive
    }
}

/// Install the global subscriber. Call once at startup.
///
/// A non-empty, valid `RUST_LOG` replaces the configured directive.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter_directive())
            .map_err(|e| TelemetryError::Filter(e.to_string()))?,
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))
}
