//! Fan-out run configuration

/// Default worker pool width
pub const DEFAULT_WORKERS: usize = 50;

/// Immutable configuration for one fan-out run, built once at startup and
/// passed by reference — no component reads ambient state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Organization whose repositories are archived
    pub org: String,
    /// Worker pool width
    pub workers: usize,
    /// Cap on enumerated repositories
    pub limit: Option<usize>,
    /// Clone tool binary
    pub git_bin: String,
    /// Packaging tool binary
    pub tar_bin: String,
    /// Listing API base URL
    pub api_url: String,
    /// Listing/clone credential, supplied out-of-band. Never logged.
    pub token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            org: String::new(),
            workers: DEFAULT_WORKERS,
            limit: None,
            git_bin: "git".to_string(),
            tar_bin: "tar".to_string(),
            api_url: "https://api.github.com".to_string(),
            token: String::new(),
        }
    }
}
