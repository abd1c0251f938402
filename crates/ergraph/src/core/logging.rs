//! Logging setup
//!
//! Everything in the crate logs through `tracing`. Native builds install a
//! `tracing-subscriber` registry writing to stderr; wasm builds forward to
//! the browser console through `tracing-wasm`.
//!
//! Level and format come from the caller first, then from
//! `ERGRAPH_LOG_LEVEL` / `RUST_LOG` and `ERGRAPH_LOG_FORMAT`, then default
//! to `info` and `compact`. The level accepts full filter directives:
//!
//! ```bash
//! RUST_LOG="info,ergraph::session=debug" ergraph export -i draw.json
//! ```

use std::str::FromStr;

#[cfg(not(target_arch = "wasm32"))]
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

#[cfg(target_arch = "wasm32")]
use tracing_wasm::WASMLayerConfig;

const DEFAULT_FILTER: &str = "info";

/// Output format of the native subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event, no targets
    #[default]
    Compact,
    /// Multi-line, with source locations and span close timings
    Pretty,
    /// One JSON object per event, with the current span
    Json,
}

impl LogFormat {
    pub fn name(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Filter directive and format after applying the fallbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

impl LogSettings {
    /// Resolve against the process environment
    pub fn resolve(level: Option<&str>, format: Option<&str>) -> Result<Self, String> {
        Self::resolve_with(level, format, |key| std::env::var(key).ok())
    }

    /// Resolve with `env` looking up environment variables
    pub fn resolve_with(
        level: Option<&str>,
        format: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let filter = level
            .map(str::to_string)
            .or_else(|| env("ERGRAPH_LOG_LEVEL"))
            .or_else(|| env("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let format = match format.map(str::to_string).or_else(|| env("ERGRAPH_LOG_FORMAT")) {
            Some(name) => name.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self { filter, format })
    }
}

/// Install the global subscriber
///
/// Fails on an unknown format, or when a global subscriber is already set.
/// An unparsable filter falls back to `info`.
pub fn init_logging(
    level: Option<&str>,
    format: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(target_arch = "wasm32")]
    {
        // the browser console does its own filtering
        let _ = (level, format);
        tracing_wasm::set_as_global_default_with_config(WASMLayerConfig::default());
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let settings = LogSettings::resolve(level, format)?;
        let filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let layer = fmt::layer().with_writer(std::io::stderr);
        let registry = Registry::default().with(filter);

        let installed = match settings.format {
            LogFormat::Compact => registry.with(layer.compact().with_target(false)).try_init(),
            LogFormat::Pretty => registry
                .with(layer.pretty().with_span_events(FmtSpan::CLOSE))
                .try_init(),
            LogFormat::Json => registry.with(layer.json().with_current_span(true)).try_init(),
        };
        installed?;
        Ok(())
    }
}
