//! CLI surface: argument parsing, error taxonomy, and exit codes.

use crate::logging::LogLevel;
use clap::{Parser, Subcommand};
use miette::{Diagnostic, Report};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Success exit code.
pub const EXIT_OK: i32 = 0;
/// Unexpected error exit code.
pub const EXIT_OTHER: i32 = 1;
/// Configuration error exit code (bad profile, bad platform).
pub const EXIT_CONFIG: i32 = 2;
/// Fetch error exit code (network failure or timeout; retryable).
pub const EXIT_FETCH: i32 = 3;
/// Integrity error exit code (digest mismatch; fix the pin).
pub const EXIT_INTEGRITY: i32 = 4;

/// CLI-facing error with exit-code mapping and help text.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Bad caller input: unknown profile, malformed platform string.
    #[error("configuration error: {message}")]
    #[diagnostic(code(crossenv::cli::config))]
    Config {
        /// The error message.
        message: String,
        /// Optional help text.
        #[help]
        help: Option<String>,
    },
    /// Transport failure while downloading an artifact.
    #[error("fetch error: {message}")]
    #[diagnostic(code(crossenv::cli::fetch))]
    Fetch {
        /// The error message.
        message: String,
        /// Optional help text.
        #[help]
        help: Option<String>,
    },
    /// Digest mismatch between download and pin.
    #[error("integrity error: {message}")]
    #[diagnostic(code(crossenv::cli::integrity))]
    Integrity {
        /// The error message.
        message: String,
        /// Optional help text.
        #[help]
        help: Option<String>,
    },
    /// Anything else (I/O, serialization).
    #[error("unexpected error: {message}")]
    #[diagnostic(code(crossenv::cli::other))]
    Other {
        /// The error message.
        message: String,
        /// Optional help text.
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create an unexpected error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }
}

impl From<crossenv_core::Error> for CliError {
    fn from(err: crossenv_core::Error) -> Self {
        match &err {
            crossenv_core::Error::Config(message) => Self::Config {
                message: message.clone(),
                help: None,
            },
            crossenv_core::Error::Fetch { .. } | crossenv_core::Error::Timeout { .. } => {
                Self::Fetch {
                    message: err.to_string(),
                    help: Some("transient network failure; re-running the same command is safe".into()),
                }
            }
            crossenv_core::Error::Integrity { .. } => Self::Integrity {
                message: err.to_string(),
                help: Some(
                    "the downloaded archive no longer matches the pinned digest; \
                     update the pin or stop trusting the mirror"
                        .into(),
                ),
            },
            crossenv_core::Error::Io { .. } => Self::Other {
                message: err.to_string(),
                help: Some("check permissions and free space in the store directory".into()),
            },
        }
    }
}

/// Map a CLI error to its process exit code.
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CONFIG,
        CliError::Fetch { .. } => EXIT_FETCH,
        CliError::Integrity { .. } => EXIT_INTEGRITY,
        CliError::Other { .. } => EXIT_OTHER,
    }
}

/// Render an error for humans (miette) or machines (JSON envelope).
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let envelope = ErrorEnvelope::new(serde_json::json!({
            "code": match err {
                CliError::Config { .. } => "config",
                CliError::Fetch { .. } => "fetch",
                CliError::Integrity { .. } => "integrity",
                CliError::Other { .. } => "other",
            },
            "message": err.to_string(),
        }));
        match serde_json::to_string(&envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct OkEnvelope<T> {
    /// Always `ok`.
    pub status: &'static str,
    /// The payload.
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Wrap a payload.
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope<E> {
    /// Always `error`.
    pub status: &'static str,
    /// The error details.
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Wrap an error payload.
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Provision reproducible cross-compilation toolchain environments.
#[derive(Parser, Debug)]
#[command(name = "crossenv")]
#[command(about = "Provision reproducible cross-compilation toolchain environments")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        default_value = "warn",
        value_enum,
        help = "Set logging level"
    )]
    pub level: LogLevel,

    /// Emit JSON envelopes instead of human-oriented output.
    #[arg(long, global = true, help = "Emit JSON envelopes on stdout")]
    pub json: bool,

    /// Artifact store location (defaults to ~/.cache/crossenv/store).
    #[arg(
        long,
        global = true,
        env = "CROSSENV_STORE_DIR",
        value_name = "DIR",
        help = "Artifact store location"
    )]
    pub store_dir: Option<PathBuf>,

    /// Host platform override, e.g. linux-x86_64 (defaults to the running host).
    #[arg(
        long,
        global = true,
        value_name = "OS-ARCH",
        help = "Host platform override (e.g. linux-x86_64)"
    )]
    pub platform: Option<String>,

    /// Per-download timeout in seconds.
    #[arg(
        long,
        global = true,
        default_value_t = 600,
        value_name = "SECONDS",
        help = "Per-download timeout in seconds"
    )]
    pub timeout_secs: u64,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the artifacts selected for a profile on this host.
    #[command(about = "List the artifacts selected for a profile on this host")]
    List {
        /// Profile to list.
        #[arg(long, short = 'p', default_value = "default", help = "Profile to list")]
        profile: String,
    },
    /// Download and verify every artifact for a profile.
    #[command(about = "Download and verify every artifact for a profile")]
    Fetch {
        /// Profile to materialize.
        #[arg(long, short = 'p', default_value = "default", help = "Profile to materialize")]
        profile: String,
    },
    /// Compose the environment and print shell source for eval.
    #[command(about = "Compose the environment and print shell source for eval")]
    Export {
        /// Profile to compose.
        #[arg(long, short = 'p', default_value = "default", help = "Profile to compose")]
        profile: String,
        /// Target shell dialect (detected from $SHELL when omitted).
        #[arg(long, value_name = "SHELL", help = "Target shell: bash, zsh, or fish")]
        shell: Option<String>,
    },
}

/// Parse CLI arguments from the process environment.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code_for(&CliError::config("x")), EXIT_CONFIG);
        assert_eq!(exit_code_for(&CliError::other("x")), EXIT_OTHER);

        let fetch: CliError = crossenv_core::Error::fetch("a", "down").into();
        assert_eq!(exit_code_for(&fetch), EXIT_FETCH);

        let timeout: CliError = crossenv_core::Error::timeout("a", 5).into();
        assert_eq!(exit_code_for(&timeout), EXIT_FETCH);

        let expected = crossenv_core::artifact::Sha256Digest::of_bytes(b"a");
        let computed = crossenv_core::artifact::Sha256Digest::of_bytes(b"b");
        let integrity: CliError =
            crossenv_core::Error::integrity("a", expected, computed).into();
        assert_eq!(exit_code_for(&integrity), EXIT_INTEGRITY);
    }

    #[test]
    fn test_config_errors_keep_their_message() {
        let err: CliError =
            crossenv_core::Error::config("unknown profile 'nope'").into();
        match err {
            CliError::Config { message, .. } => assert_eq!(message, "unknown profile 'nope'"),
            other => panic!("expected config error, got {other}"),
        }
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["crossenv", "list", "--profile", "minimal"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List { ref profile } if profile == "minimal"
        ));

        let cli = Cli::try_parse_from([
            "crossenv",
            "export",
            "--shell",
            "fish",
            "--platform",
            "darwin-arm64",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.platform.as_deref(), Some("darwin-arm64"));
        assert!(matches!(
            cli.command,
            Commands::Export { ref shell, .. } if shell.as_deref() == Some("fish")
        ));
    }

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_string(&OkEnvelope::new(vec![1, 2])).unwrap();
        assert_eq!(ok, "{\"status\":\"ok\",\"data\":[1,2]}");

        let err = serde_json::to_string(&ErrorEnvelope::new("boom")).unwrap();
        assert_eq!(err, "{\"status\":\"error\",\"error\":\"boom\"}");
    }
}
