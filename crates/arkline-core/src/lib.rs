//! Arkline Core - shared infrastructure for archival pipelines
//!
//! This crate provides the concurrency structure the archival modes are
//! built from: the bounded unit queue feeding worker pools, the byte
//! conduit coupling an extraction process to an upload, subprocess
//! execution, retry, logging and progress reporting.

pub mod conduit;
pub mod http;
pub mod logging;
pub mod process;
pub mod progress;
pub mod queue;
pub mod retry;
pub mod shutdown;

// Re-exports for convenience
pub use conduit::{conduit, ConduitReader, ConduitWriter, DEFAULT_CONDUIT_CAPACITY};
pub use http::{http_client, SHARED_RUNTIME};
pub use logging::{init_logging, IndicatifLogger};
pub use process::{run_captured, CommandError};
pub use progress::{fmt_bytes, upgrade_to_bar, ProgressContext, SharedProgress};
pub use queue::UnitQueue;
pub use retry::with_jitter_retry;
pub use shutdown::{is_shutdown_requested, request_shutdown, shutdown_flag};
