//! Go projects: Go modules (`go.mod` / `go.sum`) and dep (`Gopkg.toml` / `Gopkg.lock`).

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use super::{Analyzer, Flavor};
use crate::models::Dependency;

mod dep;
mod modules;

const MODULES_MARKERS: &[&str] = &["go.mod", "go.sum"];
const DEP_MARKERS: &[&str] = &["Gopkg.toml", "Gopkg.lock"];

pub struct GoAnalyzer {
    /// Root of the module download cache, e.g. `~/go/pkg/mod`.
    mod_cache: PathBuf,
}

impl GoAnalyzer {
    pub fn new(mod_cache: PathBuf) -> Self {
        Self { mod_cache }
    }
}

impl Analyzer for GoAnalyzer {
    fn detect(&self, path: &Path) -> Option<Flavor> {
        if any_exists(path, MODULES_MARKERS) {
            info!(project = %path.display(), "project is using Go modules for dependencies management");
            return Some(Flavor::GoModules);
        }

        if any_exists(path, DEP_MARKERS) {
            info!(project = %path.display(), "project is using dep for dependencies management");
            return Some(Flavor::Dep);
        }

        None
    }

    fn extract(&self, flavor: Flavor, path: &Path) -> Result<Vec<Dependency>> {
        match flavor {
            Flavor::GoModules => modules::extract(path, &self.mod_cache),
            Flavor::Dep => dep::extract(path),
            Flavor::Cargo => Ok(Vec::new()),
        }
    }
}

fn any_exists(path: &Path, markers: &[&str]) -> bool {
    markers.iter().any(|marker| path.join(marker).exists())
}
