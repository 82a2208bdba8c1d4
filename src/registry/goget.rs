use anyhow::{Context, Result};
use reqwest::Url;
use tracing::warn;

use crate::discovery::parse_discovery_document;
use crate::http::RateLimitedFetcher;
use crate::models::Dependency;

/// Build the discovery URL for a Go import path: `http://{name}?go-get=1`.
pub fn discovery_url(name: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("http://{name}"))
        .with_context(|| format!("invalid module path '{name}'"))?;
    url.query_pairs_mut().append_pair("go-get", "1");
    Ok(url)
}

/// Fetch and scan the module's discovery document into `dep.vcs`.
///
/// Returns `false` when nothing could be fetched; the caller must not cache
/// anything in that case.
pub async fn resolve(fetcher: &RateLimitedFetcher, dep: &mut Dependency) -> bool {
    let url = match discovery_url(&dep.name) {
        Ok(url) => url,
        Err(err) => {
            warn!(dependency = %dep.name, "{err:#}");
            return false;
        }
    };

    let Some(body) = fetcher.fetch(&url).await else {
        return false;
    };

    parse_discovery_document(&body, &mut dep.vcs);
    true
}
