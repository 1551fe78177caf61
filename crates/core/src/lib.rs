//! Core types for the crossenv ecosystem
//!
//! This crate holds everything the other crossenv crates agree on: the host
//! platform model, artifact descriptors and their registry, the composed
//! environment representation, and the shared error taxonomy.

/// Artifact descriptors, digests, and environment rules.
pub mod artifact;
/// Composed environment representation and shell rendering.
pub mod environment;
mod error;
/// Host platform model and platform matchers.
pub mod platform;
/// The built-in artifact registry and provisioning profiles.
pub mod registry;

pub use error::{Error, Result};
