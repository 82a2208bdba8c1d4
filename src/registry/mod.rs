//! Resolution of a dependency name into version-control coordinates.
//!
//! [`MetadataResolver`] is the only component that talks to the network. It
//! keeps a process-lifetime cache keyed by `name@version`; a key is written
//! only after a successful fetch, so a dependency whose lookup failed is tried
//! again the next time it is requested. Concurrent first-time lookups of the
//! same key are not merged: each fetches and the last writer wins.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::http::RateLimitedFetcher;
use crate::models::{Dependency, Ecosystem, VcsData};

pub mod crates_io;
pub mod goget;

pub struct MetadataResolver {
    fetcher: Arc<RateLimitedFetcher>,
    cache: Mutex<HashMap<String, VcsData>>,
}

impl MetadataResolver {
    pub fn new(fetcher: Arc<RateLimitedFetcher>) -> Self {
        Self {
            fetcher,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fill `dep.vcs` from the cache, or from the dependency's ecosystem
    /// registry on a miss.
    pub async fn resolve(&self, dep: &mut Dependency) {
        let key = dep.cache_key();

        let cached = self.cache.lock().get(&key).cloned();
        if let Some(vcs) = cached {
            debug!(dependency = %key, "using cached VCS data");
            dep.vcs.apply_discovered(&vcs);
            return;
        }

        let found = match dep.ecosystem {
            Ecosystem::Go => goget::resolve(&self.fetcher, dep).await,
            Ecosystem::Rust => crates_io::resolve(&self.fetcher, dep).await,
        };
        if !found {
            return;
        }

        debug!(dependency = %key, vcs = ?dep.vcs, "resolved VCS data");
        self.cache.lock().insert(key, dep.vcs.clone());
    }

    /// Number of cached keys.
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}
