//! Host platform model.
//!
//! Artifacts are pinned per host platform, so the platform a descriptor
//! applies to is always an explicit value threaded through the API - there
//! is no implicit "current system" state below the CLI boundary.

use serde::{Deserialize, Serialize};

/// Operating system of the machine requesting an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// macOS hosts.
    Darwin,
    /// Linux hosts.
    Linux,
}

impl Os {
    /// The OS this binary was compiled for.
    #[must_use]
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        return Self::Darwin;
        #[cfg(target_os = "linux")]
        return Self::Linux;
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        compile_error!("Unsupported host OS");
    }

    /// Parse from a string such as `linux` or `macos`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "darwin" | "macos" => Some(Self::Darwin),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Darwin => write!(f, "darwin"),
            Self::Linux => write!(f, "linux"),
        }
    }
}

/// CPU architecture of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit Arm.
    Arm64,
    /// 64-bit x86.
    X86_64,
}

impl Arch {
    /// The architecture this binary was compiled for.
    #[must_use]
    pub fn current() -> Self {
        #[cfg(target_arch = "aarch64")]
        return Self::Arm64;
        #[cfg(target_arch = "x86_64")]
        return Self::X86_64;
        #[cfg(not(any(target_arch = "aarch64", target_arch = "x86_64")))]
        compile_error!("Unsupported host architecture");
    }

    /// Parse from a string such as `x86_64` or `aarch64`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "arm64" | "aarch64" => Some(Self::Arm64),
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            _ => None,
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arm64 => write!(f, "arm64"),
            Self::X86_64 => write!(f, "x86_64"),
        }
    }
}

/// Host platform: OS plus architecture, e.g. `linux-x86_64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system component.
    pub os: Os,
    /// Architecture component.
    pub arch: Arch,
}

impl Platform {
    /// Create a platform from its components.
    #[must_use]
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The platform this binary is running on.
    #[must_use]
    pub fn current() -> Self {
        Self {
            os: Os::current(),
            arch: Arch::current(),
        }
    }

    /// Parse from a string like `linux-x86_64` or `darwin-arm64`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (os, arch) = s.split_once('-')?;
        Some(Self {
            os: Os::parse(os)?,
            arch: Arch::parse(arch)?,
        })
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Platform applicability of an artifact descriptor.
///
/// This is the descriptor's platform predicate expressed as data, so the
/// built-in registry can stay a plain static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlatformMatcher {
    /// Applies to every host.
    Any,
    /// Applies to every host running the given OS.
    Os {
        /// The required operating system.
        os: Os,
    },
    /// Applies to exactly one host platform.
    Exact {
        /// The required platform.
        platform: Platform,
    },
}

impl PlatformMatcher {
    /// Evaluate the predicate against a host platform.
    #[must_use]
    pub fn matches(&self, host: Platform) -> bool {
        match self {
            Self::Any => true,
            Self::Os { os } => host.os == *os,
            Self::Exact { platform } => host == *platform,
        }
    }
}
