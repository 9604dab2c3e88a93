//! Arkline Mongo - streaming archival of a database dump
//!
//! One long-running dump process emits a continuous gzip stream that is
//! piped through a bounded conduit straight into a single streaming
//! upload. The dump is never materialized on disk or fully buffered in
//! memory; there is exactly one unit, so any failure is fatal to the run.

pub mod config;
pub mod dump;
pub mod runner;

// Re-exports for convenience
pub use config::{DumpConfig, MongoTarget};
pub use runner::{run, DumpSummary};
