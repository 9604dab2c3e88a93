//! Streaming uploads to the object store
//!
//! Workers are synchronous; each store operation blocks on the shared
//! runtime. Objects at or below one part size go up in a single PUT,
//! anything larger uses a multipart upload. At most one part is buffered
//! in memory at a time, so a multi-gigabyte dump streams through a fixed
//! footprint.

use std::io::Read;
use std::path::Path as FsPath;
use std::sync::Arc;

use arkline_core::SHARED_RUNTIME;
use object_store::path::Path;
use object_store::{MultipartUpload, ObjectStore, PutPayload};

/// Part size for multipart uploads (8 MiB)
const PART_SIZE: usize = 8 * 1024 * 1024;

/// Error from an upload operation.
#[derive(Debug)]
pub enum StoreError {
    Store(object_store::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(e) => write!(f, "object store: {e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<object_store::Error> for StoreError {
    fn from(e: object_store::Error) -> Self {
        Self::Store(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Uploads blobs and live streams under deterministic keys.
///
/// Stateless apart from the client handle; safely shared across workers.
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    part_size: usize,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            part_size: PART_SIZE,
        }
    }

    /// Override the single-PUT threshold / multipart part size.
    pub fn with_part_size(mut self, part_size: usize) -> Self {
        assert!(part_size > 0, "part size must be non-zero");
        self.part_size = part_size;
        self
    }

    /// S3 bucket backend configured from the environment
    /// (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`, ...).
    pub fn s3_from_env(bucket: &str) -> Result<Self, StoreError> {
        let s3 = object_store::aws::AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()?;
        Ok(Self::new(Arc::new(s3)))
    }

    /// Upload a file from disk. Returns bytes written.
    pub fn put_file(&self, key: &str, path: &FsPath) -> Result<u64, StoreError> {
        let file = std::fs::File::open(path)?;
        self.put_stream(key, file)
    }

    /// Stream `source` into the object under `key`. Returns bytes written.
    ///
    /// On success the object is durably stored under exactly `key`. On
    /// failure the multipart upload is aborted, but the store may retain
    /// partial multipart state — a failed upload must not be read as
    /// "object absent".
    pub fn put_stream(&self, key: &str, mut source: impl Read) -> Result<u64, StoreError> {
        let location = Path::from(key);

        let mut buf = vec![0u8; self.part_size];
        let first = read_full(&mut source, &mut buf)?;

        // Fits in one part: plain PUT
        if first < self.part_size {
            let payload = PutPayload::from(buf[..first].to_vec());
            SHARED_RUNTIME
                .handle()
                .block_on(self.store.put(&location, payload))?;
            return Ok(first as u64);
        }

        let mut upload = SHARED_RUNTIME
            .handle()
            .block_on(self.store.put_multipart(&location))?;

        let mut written = 0u64;
        let mut chunk = first;
        loop {
            if chunk == 0 {
                break;
            }
            written += chunk as u64;
            let part = PutPayload::from(buf[..chunk].to_vec());
            if let Err(e) = SHARED_RUNTIME.handle().block_on(upload.put_part(part)) {
                abort(upload.as_mut(), key);
                return Err(e.into());
            }
            if chunk < self.part_size {
                // Short read means the source is exhausted
                break;
            }
            chunk = match read_full(&mut source, &mut buf) {
                Ok(n) => n,
                Err(e) => {
                    // A truncated source must never finalize as a complete object
                    abort(upload.as_mut(), key);
                    return Err(e.into());
                }
            };
        }

        SHARED_RUNTIME.handle().block_on(upload.complete())?;
        Ok(written)
    }
}

fn abort(upload: &mut dyn MultipartUpload, key: &str) {
    if let Err(e) = SHARED_RUNTIME.handle().block_on(upload.abort()) {
        log::warn!("could not abort multipart upload for {key}: {e}");
    }
}

/// Read until `buf` is full or the source is exhausted.
fn read_full(source: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
