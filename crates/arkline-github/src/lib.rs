//! Arkline GitHub - fan-out archival of an organization's repositories
//!
//! Enumerates every repository of an organization and archives each one
//! through a bounded worker pool: clone, pack, fingerprint, upload. One
//! slow or failing repository never blocks the rest of the run.

pub mod api;
pub mod archive;
pub mod clone;
pub mod config;
pub mod runner;
pub mod worker;

// Re-exports for convenience
pub use api::{GithubApi, RepoUnit, UnitSource};
pub use config::{Config, DEFAULT_WORKERS};
pub use runner::{run, Summary};
