//! Content-addressed storage and fetch-and-verify for crossenv artifacts.
//!
//! Artifacts are materialized in a local store keyed by
//! `(name, version, digest)`. Entries are extracted archives, promoted into
//! the store with a single atomic rename so a partially-extracted entry is
//! never visible, and immutable afterwards. Concurrent fetches of the same
//! artifact are safe to race: the loser observes the winner's verified
//! entry and treats it as a cache hit.

mod extract;
mod fetch;
mod store;

pub use extract::unpack;
pub use fetch::Fetcher;
pub use store::ArtifactStore;
