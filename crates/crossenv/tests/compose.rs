//! Composer integration tests.
//!
//! These run fully offline: descriptors are seeded straight into the store
//! so every fetch is a cache hit, which is itself one of the properties
//! under test.

use crossenv::composer::{compose, fetch_all};
use crossenv_cas::{ArtifactStore, Fetcher};
use crossenv_core::Error;
use crossenv_core::artifact::{ArchiveKind, ArtifactDescriptor, EnvRule, Sha256Digest};
use crossenv_core::platform::{Arch, Os, Platform, PlatformMatcher};
use crossenv_core::registry::{Profile, Registry};
use std::path::PathBuf;
use std::time::Duration;

const LINUX: Platform = Platform {
    os: Os::Linux,
    arch: Arch::X86_64,
};
const MAC: Platform = Platform {
    os: Os::Darwin,
    arch: Arch::Arm64,
};

fn descriptor(name: &str, profiles: Vec<Profile>) -> ArtifactDescriptor {
    ArtifactDescriptor {
        name: name.into(),
        version: "1.0.0".into(),
        url: format!("https://example.invalid/{name}.tar.gz"),
        digest: Sha256Digest::of_bytes(name.as_bytes()),
        matcher: PlatformMatcher::Any,
        archive: ArchiveKind::TarGz,
        profiles,
        bin_dirs: vec!["bin".into()],
        env_rules: vec![],
    }
}

/// Materialize a fake store entry so fetches of `d` are cache hits.
fn seed(store: &ArtifactStore, d: &ArtifactDescriptor) -> PathBuf {
    let entry = store.entry_path(d);
    std::fs::create_dir_all(entry.join("bin")).unwrap();
    std::fs::create_dir_all(entry.join("lib")).unwrap();
    entry
}

fn registry() -> Registry {
    let everywhere = vec![Profile::Default, Profile::Minimal];
    let mut r = Registry::new();

    let mut alpha = descriptor("alpha", everywhere.clone());
    alpha.env_rules = vec![
        EnvRule::set("CROSS_PREFIX", "alpha-"),
        EnvRule::set("OBJCOPY", "alpha-objcopy"),
    ];
    r.register(alpha);

    let mut beta = descriptor("beta", everywhere.clone());
    beta.env_rules = vec![
        EnvRule::set("CROSS_PREFIX", "beta-"),
        EnvRule::set_store_path("BETA_LIB", "lib"),
    ];
    r.register(beta);

    let mut linux_only = descriptor("linux-only", everywhere);
    linux_only.matcher = PlatformMatcher::Os { os: Os::Linux };
    r.register(linux_only);

    r.register(descriptor("ide-tool", vec![Profile::Default]));

    r.register_finalizer(EnvRule::unset("OBJCOPY"));
    r
}

fn seeded_fetcher(registry_store: &ArtifactStore) -> Fetcher {
    Fetcher::new(registry_store.clone(), Duration::from_secs(5)).unwrap()
}

fn seed_all(store: &ArtifactStore, r: &Registry, host: Platform) {
    for d in r.list_for("default", host).unwrap() {
        seed(store, d);
    }
}

#[tokio::test]
async fn compose_is_offline_on_cache_hits() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path());
    let r = registry();
    seed_all(&store, &r, LINUX);

    // URLs point at example.invalid; composing can only succeed via the
    // store.
    let env = compose(&r, &seeded_fetcher(&store), "default", LINUX)
        .await
        .unwrap();
    assert_eq!(env.search_paths.len(), 4);
}

#[tokio::test]
async fn search_paths_follow_registry_order() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path());
    let r = registry();
    seed_all(&store, &r, LINUX);

    let env = compose(&r, &seeded_fetcher(&store), "default", LINUX)
        .await
        .unwrap();
    let names: Vec<String> = env
        .search_paths
        .iter()
        .map(|p| {
            p.parent()
                .and_then(|e| e.file_name())
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert!(names[0].starts_with("alpha-"));
    assert!(names[1].starts_with("beta-"));
    assert!(names[2].starts_with("linux-only-"));
    assert!(names[3].starts_with("ide-tool-"));
}

#[tokio::test]
async fn minimal_profile_drops_exactly_the_ide_artifact() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path());
    let r = registry();
    seed_all(&store, &r, LINUX);
    let fetcher = seeded_fetcher(&store);

    let default = compose(&r, &fetcher, "default", LINUX).await.unwrap();
    let minimal = compose(&r, &fetcher, "minimal", LINUX).await.unwrap();

    assert_eq!(default.search_paths.len(), minimal.search_paths.len() + 1);
    assert!(
        !minimal
            .search_paths
            .iter()
            .any(|p| p.to_string_lossy().contains("ide-tool"))
    );
}

#[tokio::test]
async fn platform_predicate_filters_artifacts() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path());
    let r = registry();
    seed_all(&store, &r, LINUX);
    seed_all(&store, &r, MAC);

    let env = compose(&r, &seeded_fetcher(&store), "default", MAC)
        .await
        .unwrap();
    assert!(
        !env.search_paths
            .iter()
            .any(|p| p.to_string_lossy().contains("linux-only"))
    );
}

#[tokio::test]
async fn conflicting_variables_resolve_last_write_wins() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path());
    let r = registry();
    seed_all(&store, &r, LINUX);

    let env = compose(&r, &seeded_fetcher(&store), "default", LINUX)
        .await
        .unwrap();
    // alpha set it first, beta is later in registry order.
    assert_eq!(env.variables["CROSS_PREFIX"], "beta-");
}

#[tokio::test]
async fn finalizers_unset_after_artifact_rules() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path());
    let r = registry();
    seed_all(&store, &r, LINUX);

    let env = compose(&r, &seeded_fetcher(&store), "default", LINUX)
        .await
        .unwrap();
    // alpha exported OBJCOPY, the profile finalizer removes it again.
    assert!(!env.variables.contains_key("OBJCOPY"));
    assert_eq!(env.removals, ["OBJCOPY"]);
}

#[tokio::test]
async fn store_path_rules_resolve_against_the_entry() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path());
    let r = registry();
    seed_all(&store, &r, LINUX);

    let env = compose(&r, &seeded_fetcher(&store), "default", LINUX)
        .await
        .unwrap();
    let beta_lib = PathBuf::from(&env.variables["BETA_LIB"]);
    assert!(beta_lib.starts_with(store.root()));
    assert!(beta_lib.ends_with("lib"));
    assert!(beta_lib.is_dir());
}

#[tokio::test]
async fn unknown_profile_is_a_config_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path());
    let r = registry();

    let err = compose(&r, &seeded_fetcher(&store), "nonexistent", LINUX)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {err}");
}

#[tokio::test]
async fn composition_is_all_or_nothing() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path());
    let r = registry();

    // Seed everything except beta; beta's URL points at a closed port so
    // its fetch fails.
    let closed_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let mut r2 = Registry::new();
    for d in r.list_for("default", LINUX).unwrap() {
        let mut d = d.clone();
        if d.name == "beta" {
            d.url = format!("http://{closed_port}/beta.tar.gz");
        } else {
            seed(&store, &d);
        }
        r2.register(d);
    }

    let err = compose(&r2, &seeded_fetcher(&store), "default", LINUX)
        .await
        .unwrap_err();
    assert!(err.is_retryable(), "got {err}");
}

#[tokio::test]
async fn fetch_all_preserves_registry_order() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path());
    let r = registry();
    seed_all(&store, &r, LINUX);

    let pairs = fetch_all(&r, &seeded_fetcher(&store), "minimal", LINUX)
        .await
        .unwrap();
    let names: Vec<&str> = pairs.iter().map(|(d, _)| d.name.as_str()).collect();
    assert_eq!(names, ["alpha", "beta", "linux-only"]);
    assert!(pairs.iter().all(|(_, a)| a.verified));
}
