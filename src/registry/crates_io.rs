use reqwest::Url;
use tracing::{debug, warn};

use crate::http::RateLimitedFetcher;
use crate::models::Dependency;

/// Look up the crate's repository on crates.io and record it as a git remote.
///
/// Returns `false` when nothing could be fetched. A response without a
/// `repository` field still counts as resolved, with empty coordinates.
pub async fn resolve(fetcher: &RateLimitedFetcher, dep: &mut Dependency) -> bool {
    let url = match Url::parse(&format!("https://crates.io/api/v1/crates/{}", dep.name)) {
        Ok(url) => url,
        Err(err) => {
            warn!(dependency = %dep.name, "invalid crate name: {err}");
            return false;
        }
    };

    let Some(body) = fetcher.fetch(&url).await else {
        return false;
    };

    match repository_from_response(&body) {
        Some(repository) => {
            dep.vcs.vcs = "git".to_string();
            dep.vcs.vcs_path = repository;
        }
        None => debug!(dependency = %dep.name, "crates.io lists no repository"),
    }
    true
}

/// Extract `crate.repository` from a crates.io crate response.
fn repository_from_response(body: &[u8]) -> Option<String> {
    let data: serde_json::Value = serde_json::from_slice(body).ok()?;
    data.get("crate")
        .and_then(|c| c.get("repository"))
        .and_then(|r| r.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
