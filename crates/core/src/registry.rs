//! The artifact descriptor registry.
//!
//! The registry holds the pinned, hand-specified artifact set in
//! registration order. Registration order is load-bearing: it decides
//! search-path precedence and which environment rule wins a conflict, so
//! `list_for` never reorders.

use crate::artifact::{ArchiveKind, ArtifactDescriptor, EnvRule, Sha256Digest};
use crate::platform::{Arch, Os, Platform, PlatformMatcher};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A named bundle of artifacts composing one environment variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// The full environment, including IDE integration.
    Default,
    /// The full toolchain set without IDE integration.
    Minimal,
}

impl Profile {
    /// All known profiles, for help and error text.
    pub const ALL: [Self; 2] = [Self::Default, Self::Minimal];

    /// The profile's CLI-facing name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Minimal => "minimal",
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(Self::Default),
            "minimal" => Ok(Self::Minimal),
            other => Err(Error::config(format!(
                "unknown profile '{other}' (known profiles: {})",
                Self::ALL.map(|p| p.name()).join(", ")
            ))),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Registry of artifact descriptors plus profile-level finalizer rules.
#[derive(Debug, Default)]
pub struct Registry {
    descriptors: Vec<ArtifactDescriptor>,
    finalizers: Vec<EnvRule>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor. Position in the registration sequence defines
    /// its precedence downstream.
    pub fn register(&mut self, descriptor: ArtifactDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// Append a finalizer rule, applied after every artifact's own rules.
    pub fn register_finalizer(&mut self, rule: EnvRule) {
        self.finalizers.push(rule);
    }

    /// Descriptors selected for a profile on a host, in registration order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `profile` is not a known profile name.
    pub fn list_for(&self, profile: &str, host: Platform) -> Result<Vec<&ArtifactDescriptor>> {
        let profile: Profile = profile.parse()?;
        Ok(self
            .descriptors
            .iter()
            .filter(|d| d.profiles.contains(&profile) && d.matcher.matches(host))
            .collect())
    }

    /// Rules applied after all artifact rules, in registration order.
    #[must_use]
    pub fn finalizers(&self) -> &[EnvRule] {
        &self.finalizers
    }

    /// Number of registered descriptors (all platforms, all profiles).
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry has no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The built-in toolchain set: a Rust host toolchain with its bare-metal
    /// RISC-V standard library, the prebuilt GNU RISC-V embedded toolchain,
    /// a musl cross-compiler, and IDE integration in the default profile.
    #[must_use]
    pub fn builtin() -> Self {
        let mut r = Self::new();
        let everywhere = vec![Profile::Default, Profile::Minimal];

        r.register(ArtifactDescriptor {
            name: "rust-toolchain".into(),
            version: RUST_VERSION.into(),
            url: format!(
                "https://static.rust-lang.org/dist/rust-{RUST_VERSION}-x86_64-unknown-linux-gnu.tar.gz"
            ),
            digest: digest("8e1a9c9053bd1712d6aa9bc0c38e414e76b8a9c894c521ab9d5bd8d0cbfabf37"),
            matcher: PlatformMatcher::Exact {
                platform: Platform::new(Os::Linux, Arch::X86_64),
            },
            archive: ArchiveKind::TarGz,
            profiles: everywhere.clone(),
            bin_dirs: vec![
                format!("rust-{RUST_VERSION}-x86_64-unknown-linux-gnu/rustc/bin"),
                format!("rust-{RUST_VERSION}-x86_64-unknown-linux-gnu/cargo/bin"),
            ],
            env_rules: vec![],
        });
        r.register(ArtifactDescriptor {
            name: "rust-toolchain".into(),
            version: RUST_VERSION.into(),
            url: format!(
                "https://static.rust-lang.org/dist/rust-{RUST_VERSION}-aarch64-apple-darwin.tar.gz"
            ),
            digest: digest("3e69cb4c4743e7e07ac49da8e87cdd9f9d82dd4c1a24a92afaa9d3e5ebd4b2d1"),
            matcher: PlatformMatcher::Exact {
                platform: Platform::new(Os::Darwin, Arch::Arm64),
            },
            archive: ArchiveKind::TarGz,
            profiles: everywhere.clone(),
            bin_dirs: vec![
                format!("rust-{RUST_VERSION}-aarch64-apple-darwin/rustc/bin"),
                format!("rust-{RUST_VERSION}-aarch64-apple-darwin/cargo/bin"),
            ],
            env_rules: vec![],
        });

        // Bare-metal RISC-V standard library: host-independent component
        // tarball, no executables of its own.
        r.register(ArtifactDescriptor {
            name: "rust-std-riscv64gc".into(),
            version: RUST_VERSION.into(),
            url: format!(
                "https://static.rust-lang.org/dist/rust-std-{RUST_VERSION}-riscv64gc-unknown-none-elf.tar.gz"
            ),
            digest: digest("c93a4bbcd1e32931c3bd88dd599de8c0e9fcedaa8ca4b1d4d3be97c3a45c0d52"),
            matcher: PlatformMatcher::Any,
            archive: ArchiveKind::TarGz,
            profiles: everywhere.clone(),
            bin_dirs: vec![],
            env_rules: vec![EnvRule::set_store_path(
                "RISCV_RUST_STD",
                format!(
                    "rust-std-{RUST_VERSION}-riscv64gc-unknown-none-elf/rust-std-riscv64gc-unknown-none-elf"
                ),
            )],
        });

        r.register(ArtifactDescriptor {
            name: "riscv-gnu-embedded".into(),
            version: GNU_VERSION.into(),
            url: format!(
                "https://github.com/xpack-dev-tools/riscv-none-elf-gcc-xpack/releases/download/v{GNU_VERSION}/xpack-riscv-none-elf-gcc-{GNU_VERSION}-linux-x64.tar.gz"
            ),
            digest: digest("f26c49b756da83d7eb315b9e0a5bf4f35bd79d012b48b83ca9a85e1fbdd085e1"),
            matcher: PlatformMatcher::Exact {
                platform: Platform::new(Os::Linux, Arch::X86_64),
            },
            archive: ArchiveKind::TarGz,
            profiles: everywhere.clone(),
            bin_dirs: vec![format!("xpack-riscv-none-elf-gcc-{GNU_VERSION}/bin")],
            env_rules: vec![EnvRule::set("RISCV_GNU_PREFIX", "riscv-none-elf-")],
        });
        r.register(ArtifactDescriptor {
            name: "riscv-gnu-embedded".into(),
            version: GNU_VERSION.into(),
            url: format!(
                "https://github.com/xpack-dev-tools/riscv-none-elf-gcc-xpack/releases/download/v{GNU_VERSION}/xpack-riscv-none-elf-gcc-{GNU_VERSION}-darwin-arm64.tar.gz"
            ),
            digest: digest("71e683d2ab2cfcbb9e4ee2ab2d70a024add9d0b5a744f6842bbf2a27cc7b83de"),
            matcher: PlatformMatcher::Exact {
                platform: Platform::new(Os::Darwin, Arch::Arm64),
            },
            archive: ArchiveKind::TarGz,
            profiles: everywhere.clone(),
            bin_dirs: vec![format!("xpack-riscv-none-elf-gcc-{GNU_VERSION}/bin")],
            env_rules: vec![EnvRule::set("RISCV_GNU_PREFIX", "riscv-none-elf-")],
        });

        // musl.cc ships a single Linux-hosted build; the matcher is per-OS
        // rather than exact.
        r.register(ArtifactDescriptor {
            name: "riscv-musl-cross".into(),
            version: MUSL_VERSION.into(),
            url: "https://musl.cc/riscv64-linux-musl-cross.tgz".into(),
            digest: digest("9a7f12df45b371f06b0c1a27ce6d01c3bbf60c5c2d9bc1c22a9fc2dbd32c5eaf"),
            matcher: PlatformMatcher::Os { os: Os::Linux },
            archive: ArchiveKind::TarGz,
            profiles: everywhere.clone(),
            bin_dirs: vec!["riscv64-linux-musl-cross/bin".into()],
            env_rules: vec![EnvRule::set_store_path(
                "RISCV_MUSL_LIB",
                "riscv64-linux-musl-cross/riscv64-linux-musl/lib",
            )],
        });

        // IDE integration, default profile only.
        r.register(ArtifactDescriptor {
            name: "rust-analyzer".into(),
            version: RUST_ANALYZER_VERSION.into(),
            url: format!(
                "https://github.com/rust-lang/rust-analyzer/releases/download/{RUST_ANALYZER_VERSION}/rust-analyzer-x86_64-unknown-linux-gnu.gz"
            ),
            digest: digest("5dc21c0ea49147ed8feec37fa8cfe25aba9a28b26f0bc7a0e4a44d44bfcee5e5"),
            matcher: PlatformMatcher::Exact {
                platform: Platform::new(Os::Linux, Arch::X86_64),
            },
            archive: ArchiveKind::GzipBinary {
                file_name: "rust-analyzer".into(),
            },
            profiles: vec![Profile::Default],
            bin_dirs: vec!["bin".into()],
            env_rules: vec![],
        });
        r.register(ArtifactDescriptor {
            name: "rust-analyzer".into(),
            version: RUST_ANALYZER_VERSION.into(),
            url: format!(
                "https://github.com/rust-lang/rust-analyzer/releases/download/{RUST_ANALYZER_VERSION}/rust-analyzer-aarch64-apple-darwin.gz"
            ),
            digest: digest("e803c5dd15cb315c674a40b3a74fbd4beb94c465e4d1500e08f4c438e692d57a"),
            matcher: PlatformMatcher::Exact {
                platform: Platform::new(Os::Darwin, Arch::Arm64),
            },
            archive: ArchiveKind::GzipBinary {
                file_name: "rust-analyzer".into(),
            },
            profiles: vec![Profile::Default],
            bin_dirs: vec!["bin".into()],
            env_rules: vec![],
        });

        // The Rust toolchain ships llvm-objcopy/llvm-objdump; stale exports
        // from a previous GNU environment would shadow them.
        r.register_finalizer(EnvRule::unset("OBJCOPY"));
        r.register_finalizer(EnvRule::unset("OBJDUMP"));

        r
    }
}

const RUST_VERSION: &str = "1.79.0";
const GNU_VERSION: &str = "13.2.0-2";
const MUSL_VERSION: &str = "11.2.1";
const RUST_ANALYZER_VERSION: &str = "2024-06-10";

/// Pinned digests are build-time constants; a malformed one is a programmer
/// error caught by the registry tests, not a runtime condition.
#[allow(clippy::unwrap_used)]
fn digest(hex: &str) -> Sha256Digest {
    Sha256Digest::from_hex(hex).unwrap()
}
