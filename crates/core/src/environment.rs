//! The composed environment: what a provisioned shell looks like.
//!
//! A `ComposedEnvironment` is a pure value. Actually exporting variables and
//! mutating `PATH` is the job of the shell that evals the rendered output,
//! which keeps composition side-effect-free and testable.

use crate::artifact::EnvRule;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Shells the environment can be rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shell {
    /// Bash shell.
    #[default]
    Bash,
    /// Z shell (shares bash's export syntax).
    Zsh,
    /// Fish shell.
    Fish,
}

impl Shell {
    /// Detect the shell from an explicit argument or `$SHELL`.
    #[must_use]
    pub fn detect(target: Option<&str>) -> Self {
        if let Some(t) = target {
            return Self::parse(t);
        }
        if let Ok(shell) = std::env::var("SHELL") {
            if shell.contains("fish") {
                return Self::Fish;
            } else if shell.contains("zsh") {
                return Self::Zsh;
            }
        }
        Self::Bash
    }

    /// Parse a shell name, defaulting to bash.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "zsh" => Self::Zsh,
            "fish" => Self::Fish,
            _ => Self::Bash,
        }
    }

    /// The shell's canonical name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
        }
    }
}

impl std::fmt::Display for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An executable shell environment description.
///
/// Derived per invocation from verified artifacts; never persisted.
/// `search_paths` is ordered (first entry wins `PATH` lookup), `variables`
/// holds the exports, `removals` the names the shell must unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComposedEnvironment {
    /// Executable search-path entries, highest precedence first.
    pub search_paths: Vec<PathBuf>,
    /// Variables to export.
    pub variables: BTreeMap<String, String>,
    /// Variables to unset, in application order.
    pub removals: Vec<String>,
}

impl ComposedEnvironment {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a search-path entry, ignoring exact duplicates.
    pub fn push_search_path(&mut self, path: PathBuf) {
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }

    /// Apply one environment rule.
    ///
    /// Rules are applied in registry order and the last write wins, across
    /// `Set` and `Unset` both: a later `Set` revives a name an earlier rule
    /// removed, a later `Unset` removes an earlier `Set`.
    ///
    /// `root` is the artifact's store entry, required by path-valued rules.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a path-valued rule applied without an
    /// artifact root (only finalizer rules run rootless, and those unset).
    pub fn apply(&mut self, rule: &EnvRule, root: Option<&Path>) -> Result<()> {
        match rule {
            EnvRule::Set { name, value } => {
                let resolved = match root {
                    Some(root) => value.resolve(root),
                    None if value.needs_root() => {
                        return Err(Error::config(format!(
                            "rule for '{name}' resolves a store path but has no artifact root"
                        )));
                    }
                    None => value.resolve(Path::new("")),
                };
                self.removals.retain(|n| n != name);
                self.variables.insert(name.clone(), resolved);
            }
            EnvRule::Unset { name } => {
                self.variables.remove(name);
                if !self.removals.contains(name) {
                    self.removals.push(name.clone());
                }
            }
        }
        Ok(())
    }

    /// Render as shell source for `eval`.
    ///
    /// Unsets come first so a revived variable is not clobbered, then the
    /// exports in sorted order, then a single `PATH` prepend.
    #[must_use]
    pub fn render(&self, shell: Shell) -> String {
        let mut out = String::new();
        match shell {
            Shell::Bash | Shell::Zsh => {
                for name in &self.removals {
                    let _ = writeln!(out, "unset {name}");
                }
                for (name, value) in &self.variables {
                    let _ = writeln!(out, "export {name}={}", quote(value));
                }
                if !self.search_paths.is_empty() {
                    let joined = self
                        .search_paths
                        .iter()
                        .map(|p| quote(&p.to_string_lossy()))
                        .collect::<Vec<_>>()
                        .join(":");
                    let _ = writeln!(out, "export PATH={joined}:\"$PATH\"");
                }
            }
            Shell::Fish => {
                for name in &self.removals {
                    let _ = writeln!(out, "set -e {name}");
                }
                for (name, value) in &self.variables {
                    let _ = writeln!(out, "set -gx {name} {}", quote(value));
                }
                if !self.search_paths.is_empty() {
                    let joined = self
                        .search_paths
                        .iter()
                        .map(|p| quote(&p.to_string_lossy()))
                        .collect::<Vec<_>>()
                        .join(" ");
                    let _ = writeln!(out, "set -gx PATH {joined} $PATH");
                }
            }
        }
        out
    }
}

/// Single-quote a value for shell consumption.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
