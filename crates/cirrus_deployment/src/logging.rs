//! Logging setup for cirrus programs.
//!
//! Registration progress is reported through `tracing` events. Nothing is
//! printed unless a subscriber is installed; [`LoggingConfig::init`] installs
//! one.
//!
//! # Example
//!
//! ```
//! use cirrus_deployment::logging::{LogFormat, LoggingConfig};
//! use tracing::Level;
//!
//! LoggingConfig::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(LogFormat::Compact)
//!     .with_env_filter("cirrus_deployment=debug,reqwest=warn")
//!     .init();
//! ```

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

/// Configuration of the global `tracing` subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for targets no directive mentions.
    pub level: Level,
    /// Output format.
    pub format: LogFormat,
    /// Target directives (e.g. `"cirrus_deployment=debug,reqwest=warn"`).
    /// `RUST_LOG` is read instead when unset.
    pub env_filter: Option<String>,
    /// Whether to include span enter/exit events.
    pub span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl LoggingConfig {
    /// Creates a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a target filter, `target=level,target=level,...`.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Builds the filter. Malformed directives are skipped, not fatal.
    fn filter(&self) -> EnvFilter {
        let builder = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into());
        match &self.env_filter {
            Some(directives) => builder.parse_lossy(directives),
            None => builder.from_env_lossy(),
        }
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let spans = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        match self.format {
            LogFormat::Pretty => fmt::layer().pretty().with_span_events(spans).boxed(),
            LogFormat::Compact => fmt::layer().compact().with_span_events(spans).boxed(),
            LogFormat::Json => fmt::layer().json().with_span_events(spans).boxed(),
        }
    }

    /// Installs the global subscriber.
    ///
    /// Returns `false` if a subscriber was already installed, in which case
    /// the existing one is kept.
    pub fn init(&self) -> bool {
        let installed = tracing_subscriber::registry()
            .with(self.layer())
            .with(self.filter())
            .try_init()
            .is_ok();

        if installed {
            tracing::debug!(level = %self.level, format = ?self.format, "logging initialized");
        }
        installed
    }
}
