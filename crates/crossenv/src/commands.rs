//! Command implementations.

use crate::cli::{Cli, CliError, Commands, OkEnvelope};
use crate::composer;
use crossenv_cas::{ArtifactStore, Fetcher};
use crossenv_core::environment::Shell;
use crossenv_core::platform::Platform;
use crossenv_core::registry::Registry;
use std::time::Duration;

/// Execute the parsed CLI invocation.
///
/// # Errors
///
/// Returns a `CliError` carrying the exit-code class of whatever failed.
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let host = resolve_host(cli.platform.as_deref())?;
    let registry = Registry::builtin();
    let store = cli
        .store_dir
        .clone()
        .map_or_else(ArtifactStore::default, ArtifactStore::new);

    match cli.command {
        Commands::List { profile } => list(&registry, &profile, host, cli.json),
        Commands::Fetch { profile } => {
            let fetcher = Fetcher::new(store, Duration::from_secs(cli.timeout_secs))?;
            fetch(&registry, &fetcher, &profile, host, cli.json).await
        }
        Commands::Export { profile, shell } => {
            let fetcher = Fetcher::new(store, Duration::from_secs(cli.timeout_secs))?;
            export(&registry, &fetcher, &profile, host, shell.as_deref(), cli.json).await
        }
    }
}

fn resolve_host(platform: Option<&str>) -> Result<Platform, CliError> {
    match platform {
        None => Ok(Platform::current()),
        Some(s) => Platform::parse(s).ok_or_else(|| {
            CliError::config(format!(
                "unrecognized platform '{s}' (expected <os>-<arch>, e.g. linux-x86_64)"
            ))
        }),
    }
}

fn list(registry: &Registry, profile: &str, host: Platform, json: bool) -> Result<(), CliError> {
    let descriptors = registry.list_for(profile, host)?;
    if json {
        let envelope = OkEnvelope::new(&descriptors);
        println!("{}", serde_json::to_string(&envelope).map_err(to_other)?);
    } else {
        for d in descriptors {
            println!("{:<24} {:<12} {}", d.name, d.version, d.url);
        }
    }
    Ok(())
}

async fn fetch(
    registry: &Registry,
    fetcher: &Fetcher,
    profile: &str,
    host: Platform,
    json: bool,
) -> Result<(), CliError> {
    let pairs = composer::fetch_all(registry, fetcher, profile, host).await?;
    if json {
        let artifacts: Vec<_> = pairs.iter().map(|(_, a)| a).collect();
        let envelope = OkEnvelope::new(&artifacts);
        println!("{}", serde_json::to_string(&envelope).map_err(to_other)?);
    } else {
        for (_, artifact) in &pairs {
            println!("{:<24} {}", artifact.name, artifact.root.display());
        }
    }
    Ok(())
}

async fn export(
    registry: &Registry,
    fetcher: &Fetcher,
    profile: &str,
    host: Platform,
    shell: Option<&str>,
    json: bool,
) -> Result<(), CliError> {
    let env = composer::compose(registry, fetcher, profile, host).await?;
    if json {
        let envelope = OkEnvelope::new(&env);
        println!("{}", serde_json::to_string(&envelope).map_err(to_other)?);
    } else {
        // Already newline-terminated shell source, written raw for eval.
        print!("{}", env.render(Shell::detect(shell)));
    }
    Ok(())
}

fn to_other(e: serde_json::Error) -> CliError {
    CliError::other(format!("failed to serialize output: {e}"))
}
