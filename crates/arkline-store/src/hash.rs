//! Blake3 fingerprinting of finished archive blobs

use std::io;
use std::path::Path;

/// Fingerprint a finished archive file.
///
/// Memory-maps the file; archives can be large and never need to be held
/// in memory to be hashed.
pub fn hash_file(path: &Path) -> io::Result<blake3::Hash> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_mmap(path)?;
    Ok(hasher.finalize())
}

/// Fingerprint raw bytes.
pub fn hash_bytes(data: &[u8]) -> blake3::Hash {
    blake3::hash(data)
}
