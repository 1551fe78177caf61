//! The environment composer: profile + host platform -> environment.
//!
//! Composition is all-or-nothing. Every selected artifact must fetch and
//! verify before any environment is assembled; the first failure aborts
//! the whole composition and surfaces its error.

use crossenv_cas::Fetcher;
use crossenv_core::Result;
use crossenv_core::artifact::{ArtifactDescriptor, FetchedArtifact};
use crossenv_core::environment::ComposedEnvironment;
use crossenv_core::platform::Platform;
use crossenv_core::registry::Registry;
use futures::future;
use tracing::{debug, info};

/// Fetch every artifact selected for a profile on a host, concurrently.
///
/// Returns descriptor/artifact pairs in registry order.
///
/// # Errors
///
/// Fails fast with the first fetch error; `Error::Config` for an unknown
/// profile.
pub async fn fetch_all<'r>(
    registry: &'r Registry,
    fetcher: &Fetcher,
    profile: &str,
    host: Platform,
) -> Result<Vec<(&'r ArtifactDescriptor, FetchedArtifact)>> {
    let descriptors = registry.list_for(profile, host)?;
    debug!(profile, %host, count = descriptors.len(), "materializing artifact set");
    let fetched = future::try_join_all(descriptors.iter().map(|d| fetcher.fetch(d))).await?;
    Ok(descriptors.into_iter().zip(fetched).collect())
}

/// Compose the environment for a profile on a host.
///
/// Search paths come from each artifact's `bin_dirs` in registry order
/// (first entry wins `PATH` lookup). Environment rules apply in the same
/// order, artifact rules first and profile finalizers last, with the last
/// write winning any conflict.
///
/// # Errors
///
/// Propagates registry and fetch errors; never returns a partial
/// environment.
pub async fn compose(
    registry: &Registry,
    fetcher: &Fetcher,
    profile: &str,
    host: Platform,
) -> Result<ComposedEnvironment> {
    let pairs = fetch_all(registry, fetcher, profile, host).await?;

    let mut env = ComposedEnvironment::new();
    for (descriptor, artifact) in &pairs {
        for dir in &descriptor.bin_dirs {
            env.push_search_path(artifact.root.join(dir));
        }
        for rule in &descriptor.env_rules {
            env.apply(rule, Some(&artifact.root))?;
        }
    }
    for rule in registry.finalizers() {
        env.apply(rule, None)?;
    }

    info!(
        profile,
        %host,
        paths = env.search_paths.len(),
        vars = env.variables.len(),
        "composed environment"
    );
    Ok(env)
}
