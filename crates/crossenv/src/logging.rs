//! Tracing subscriber setup for the CLI.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Logging verbosity, settable via `--level` or `RUST_LOG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// High-level progress.
    Info,
    /// Per-operation detail.
    Debug,
    /// Everything, including store probes.
    Trace,
}

impl LogLevel {
    /// The level as an env-filter directive.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `--level` so ad-hoc filtering keeps
/// working. Logs go to stderr; stdout is reserved for command output that
/// shells eval.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directives() {
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(LogLevel::Trace.as_str(), "trace");
        assert_eq!(LogLevel::default(), LogLevel::Warn);
    }
}
