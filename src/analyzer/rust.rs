use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use super::{Analyzer, Flavor};
use crate::models::{Dependency, Ecosystem, DEFAULT_BRANCH};

#[derive(Debug, Deserialize)]
struct CargoLock {
    #[serde(default)]
    package: Vec<CargoLockPackage>,
}

#[derive(Debug, Deserialize)]
struct CargoLockPackage {
    name: String,
    version: String,
    /// Packages without a `source` field are local workspace members.
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CargoManifest {
    package: Option<CargoManifestPackage>,
}

#[derive(Debug, Deserialize)]
struct CargoManifestPackage {
    name: String,
}

/// Cargo projects, read from `Cargo.lock`.
pub struct RustAnalyzer {
    /// `$CARGO_HOME`; unpacked crates live under `registry/src/<index>/`.
    cargo_home: PathBuf,
}

impl RustAnalyzer {
    pub fn new(cargo_home: PathBuf) -> Self {
        Self { cargo_home }
    }

    /// Unpacked sources of `name-version` in any registry index, if present.
    fn unpacked_source(&self, name: &str, version: &str) -> Option<PathBuf> {
        let src = self.cargo_home.join("registry").join("src");
        let mut indexes: Vec<PathBuf> = std::fs::read_dir(&src)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        indexes.sort();

        let dir_name = format!("{name}-{version}");
        indexes
            .into_iter()
            .map(|index| index.join(&dir_name))
            .find(|candidate| candidate.is_dir())
    }
}

impl Analyzer for RustAnalyzer {
    fn detect(&self, path: &Path) -> Option<Flavor> {
        if path.join("Cargo.lock").exists() {
            info!(project = %path.display(), "project is using Cargo for dependencies management");
            return Some(Flavor::Cargo);
        }
        None
    }

    fn extract(&self, flavor: Flavor, path: &Path) -> Result<Vec<Dependency>> {
        if flavor != Flavor::Cargo {
            return Ok(Vec::new());
        }

        let lock_path = path.join("Cargo.lock");
        let content = std::fs::read_to_string(&lock_path)
            .with_context(|| format!("failed to read {}", lock_path.display()))?;
        let lock: CargoLock = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", lock_path.display()))?;

        let parent = package_name(path);
        let mut deps = Vec::new();

        // Skip local workspace members (they have no `source`) and git
        // checkouts, whose sources are not unpacked under the registry.
        for package in lock.package {
            let Some(source) = package.source.as_deref() else {
                continue;
            };
            if !is_registry_source(source) {
                debug!(package = %package.name, source, "not a registry package, skipping");
                continue;
            }

            let Some(local_path) = self.unpacked_source(&package.name, &package.version) else {
                debug!(
                    package = %package.name,
                    version = %package.version,
                    "crate sources are not unpacked locally, skipping"
                );
                continue;
            };

            let mut dep = Dependency::new(package.name, package.version, Ecosystem::Rust, local_path);
            dep.parent = parent.clone();
            dep.vcs.branch = DEFAULT_BRANCH.to_string();
            deps.push(dep);
        }

        Ok(deps)
    }
}

fn is_registry_source(source: &str) -> bool {
    source.starts_with("registry+") || source.starts_with("sparse+")
}

/// `[package] name` from `Cargo.toml`; empty for virtual workspaces.
fn package_name(path: &Path) -> String {
    std::fs::read_to_string(path.join("Cargo.toml"))
        .ok()
        .and_then(|content| toml::from_str::<CargoManifest>(&content).ok())
        .and_then(|manifest| manifest.package)
        .map(|package| package.name)
        .unwrap_or_default()
}
