//! Arkline Store - content fingerprinting, key layout and object upload
//!
//! Archives become immutable objects under deterministic keys. Fan-out
//! keys embed a blake3 content hash so byte-identical archives collide on
//! the same key; streaming keys carry a random id instead, since the bytes
//! do not exist yet when the upload starts.

pub mod hash;
pub mod key;
pub mod store;

// Re-exports for convenience
pub use hash::{hash_bytes, hash_file};
pub use key::{dump_key, repo_key, RunStamp};
pub use store::{StoreError, Uploader};
