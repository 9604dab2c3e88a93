//! GitHub organization enumeration
//!
//! Pages through the org repository listing, handing each repository to
//! the dispatcher as soon as its page is parsed — enumeration and archival
//! are pipelined, not phases. Transient API failures (rate limit, server
//! errors) retry with exponential backoff; exhaustion aborts the run,
//! since nothing useful can happen without the listing.

use std::time::Duration;

use anyhow::Context;
use arkline_core::{http_client, SHARED_RUNTIME};
use serde::Deserialize;

const API_MAX_RETRIES: u32 = 5;
const API_BASE_DELAY: Duration = Duration::from_secs(2);
const PER_PAGE: u32 = 100;
const USER_AGENT: &str = concat!("arkline/", env!("CARGO_PKG_VERSION"));

/// One archivable repository, as enumerated. Immutable; consumed by
/// exactly one worker.
#[derive(Debug, Clone)]
pub struct RepoUnit {
    pub owner: String,
    pub name: String,
    pub full_name: String,
}

/// Source of units for the dispatcher.
///
/// Implementations call `sink` once per unit, in enumeration order, and
/// stop early when the sink returns `false`. The sink may block (queue
/// backpressure), which throttles pagination to archival throughput.
pub trait UnitSource: Sync {
    fn for_each(&self, sink: &mut dyn FnMut(RepoUnit) -> bool) -> anyhow::Result<()>;
}

#[derive(Deserialize)]
struct RepoRecord {
    name: String,
    full_name: String,
    owner: OwnerRecord,
}

#[derive(Deserialize)]
struct OwnerRecord {
    login: String,
}

/// Paginated listing client for one organization.
pub struct GithubApi {
    api_url: String,
    org: String,
    token: String,
}

impl GithubApi {
    pub fn new(api_url: &str, org: &str, token: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            org: org.to_string(),
            token: token.to_string(),
        }
    }

    /// GET one listing page with retry for 429 and 5xx.
    ///
    /// Returns the body and the `rel="next"` cursor, if any.
    fn get_page(&self, url: &str) -> anyhow::Result<(String, Option<String>)> {
        for attempt in 0..API_MAX_RETRIES {
            let result: Result<(String, Option<String>), reqwest::Error> =
                SHARED_RUNTIME.handle().block_on(async {
                    let resp = http_client()
                        .get(url)
                        .header(reqwest::header::USER_AGENT, USER_AGENT)
                        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                        .bearer_auth(&self.token)
                        .send()
                        .await?
                        .error_for_status()?;
                    let next = resp
                        .headers()
                        .get(reqwest::header::LINK)
                        .and_then(|v| v.to_str().ok())
                        .and_then(parse_next_link);
                    let body = resp.text().await?;
                    Ok((body, next))
                });

            match result {
                Ok(page) => return Ok(page),
                Err(e) => {
                    let status = e.status().map(|s| s.as_u16());
                    let retryable = matches!(status, None | Some(429) | Some(500..=599));
                    if retryable && attempt < API_MAX_RETRIES - 1 {
                        let delay = API_BASE_DELAY * 2u32.pow(attempt);
                        log::warn!(
                            "repository listing failed (status {}), retry {}/{} in {delay:?}",
                            status.map_or("?".to_string(), |s| s.to_string()),
                            attempt + 1,
                            API_MAX_RETRIES,
                        );
                        std::thread::sleep(delay);
                    } else {
                        anyhow::bail!("repository listing failed: {e}");
                    }
                }
            }
        }
        anyhow::bail!("repository listing failed after {API_MAX_RETRIES} attempts")
    }
}

impl UnitSource for GithubApi {
    fn for_each(&self, sink: &mut dyn FnMut(RepoUnit) -> bool) -> anyhow::Result<()> {
        let mut url = format!(
            "{}/orgs/{}/repos?per_page={PER_PAGE}",
            self.api_url, self.org
        );
        loop {
            let (body, next) = self.get_page(&url)?;
            let records: Vec<RepoRecord> =
                serde_json::from_str(&body).context("invalid repository list JSON")?;
            for record in records {
                let unit = RepoUnit {
                    owner: record.owner.login,
                    name: record.name,
                    full_name: record.full_name,
                };
                if !sink(unit) {
                    return Ok(());
                }
            }
            match next {
                Some(n) => url = n,
                None => return Ok(()),
            }
        }
    }
}

/// Extract the `rel="next"` target from a Link header.
fn parse_next_link(header: &str) -> Option<String> {
    for part in header.split(',') {
        let mut pieces = part.split(';');
        let Some(target) = pieces.next() else {
            continue;
        };
        if pieces.any(|p| p.trim() == "rel=\"next\"") {
            let target = target.trim().trim_start_matches('<').trim_end_matches('>');
            return Some(target.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_next_link_typical() {
        let header = "<https://api.github.com/orgs/acme/repos?per_page=100&page=2>; rel=\"next\", \
                      <https://api.github.com/orgs/acme/repos?per_page=100&page=9>; rel=\"last\"";
        assert_eq!(
            parse_next_link(header).as_deref(),
            Some("https://api.github.com/orgs/acme/repos?per_page=100&page=2")
        );
    }

    #[test]
    fn parse_next_link_last_page() {
        let header = "<https://api.github.com/orgs/acme/repos?page=1>; rel=\"first\", \
                      <https://api.github.com/orgs/acme/repos?page=8>; rel=\"prev\"";
        assert_eq!(parse_next_link(header), None);
    }

    #[test]
    fn parse_next_link_empty() {
        assert_eq!(parse_next_link(""), None);
    }

    #[test]
    fn repo_record_deserializes() {
        let body = r#"[{"name": "widget", "full_name": "acme/widget",
                       "owner": {"login": "acme"}, "private": true}]"#;
        let records: Vec<RepoRecord> = serde_json::from_str(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "widget");
        assert_eq!(records[0].full_name, "acme/widget");
        assert_eq!(records[0].owner.login, "acme");
    }
}
