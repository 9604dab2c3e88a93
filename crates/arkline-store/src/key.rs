//! Object key layout for archived blobs
//!
//! Keys are append-only; nothing relies on overwrite semantics. Two runs
//! that archive byte-identical content for the same repository on the same
//! run stamp land on the same key, which is the whole dedup story.

use chrono::{DateTime, Utc};

/// Timestamp shared by every unit archived in one invocation.
#[derive(Debug, Clone)]
pub struct RunStamp(DateTime<Utc>);

impl RunStamp {
    /// Stamp for a run starting now.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Stamp for a fixed instant.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Compact form used in fan-out keys and clone directory names.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d%H%M%S").to_string()
    }

    /// Date/hour form used in streaming keys.
    pub fn date_hour(&self) -> String {
        self.0.format("%Y-%m-%d/%H").to_string()
    }
}

/// Fan-out key: `{owner}/{name}/{stamp}/{name}-{hash}.tar.gz`
pub fn repo_key(owner: &str, name: &str, stamp: &RunStamp, digest: &blake3::Hash) -> String {
    format!(
        "{owner}/{name}/{}/{name}-{}.tar.gz",
        stamp.compact(),
        digest.to_hex()
    )
}

/// Streaming key: `{prefix/}{db}/{date/hour}/{random}.tar.gz`
///
/// No hash component — the object key must exist before the first byte of
/// the dump does, so the key is randomized per run instead.
pub fn dump_key(prefix: &str, database: &str, stamp: &RunStamp) -> String {
    let prefix = if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}/")
    };
    format!(
        "{prefix}{database}/{}/{}.tar.gz",
        stamp.date_hour(),
        uuid::Uuid::new_v4()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> RunStamp {
        RunStamp::from_datetime(Utc.with_ymd_and_hms(2026, 8, 6, 14, 30, 5).unwrap())
    }

    #[test]
    fn compact_form() {
        assert_eq!(stamp().compact(), "20260806143005");
    }

    #[test]
    fn date_hour_form() {
        assert_eq!(stamp().date_hour(), "2026-08-06/14");
    }

    #[test]
    fn repo_key_layout() {
        let digest = crate::hash_bytes(b"blob");
        let key = repo_key("acme", "widget", &stamp(), &digest);
        assert_eq!(
            key,
            format!("acme/widget/20260806143005/widget-{}.tar.gz", digest.to_hex())
        );
    }

    #[test]
    fn repo_key_deterministic_for_identical_content() {
        let s = stamp();
        let a = repo_key("acme", "widget", &s, &crate::hash_bytes(b"same"));
        let b = repo_key("acme", "widget", &s, &crate::hash_bytes(b"same"));
        assert_eq!(a, b);
    }

    #[test]
    fn repo_key_differs_for_different_content() {
        let s = stamp();
        let a = repo_key("acme", "widget", &s, &crate::hash_bytes(b"one"));
        let b = repo_key("acme", "widget", &s, &crate::hash_bytes(b"two"));
        assert_ne!(a, b);
    }

    #[test]
    fn dump_key_with_prefix() {
        let key = dump_key("backups", "orders", &stamp());
        assert!(key.starts_with("backups/orders/2026-08-06/14/"));
        assert!(key.ends_with(".tar.gz"));
    }

    #[test]
    fn dump_key_without_prefix() {
        let key = dump_key("", "orders", &stamp());
        assert!(key.starts_with("orders/2026-08-06/14/"));
    }

    #[test]
    fn dump_key_randomized_per_call() {
        let s = stamp();
        assert_ne!(dump_key("p", "db", &s), dump_key("p", "db", &s));
    }
}
