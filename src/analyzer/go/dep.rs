use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::analyzer::parent_from_source_root;
use crate::models::{Dependency, Ecosystem, DEFAULT_BRANCH};

#[derive(Debug, Deserialize)]
struct DepLock {
    #[serde(default)]
    projects: Vec<DepProject>,
}

#[derive(Debug, Deserialize)]
struct DepProject {
    name: String,
    #[serde(default)]
    branch: String,
    #[serde(default)]
    revision: String,
    #[serde(default)]
    version: String,
}

/// Read every `[[projects]]` entry of `Gopkg.lock`. dep vendors all of its
/// dependencies, so each one lives under `{path}/vendor/{name}`.
pub(super) fn extract(path: &Path) -> Result<Vec<Dependency>> {
    let lock_path = path.join("Gopkg.lock");
    let content = std::fs::read_to_string(&lock_path)
        .with_context(|| format!("failed to read {}", lock_path.display()))?;
    let lock: DepLock = toml::from_str(&content)
        .with_context(|| format!("failed to parse dep lock file {}", lock_path.display()))?;
    debug!(?lock, "dep lock file parsed");

    let parent = parent_from_source_root(path);

    let deps = lock
        .projects
        .into_iter()
        .map(|project| {
            let branch = if project.branch.is_empty() {
                DEFAULT_BRANCH.to_string()
            } else {
                project.branch
            };
            let version = if project.version.is_empty() {
                format!("{}@{}", project.revision, branch)
            } else {
                project.version
            };

            let local_path = path.join("vendor").join(&project.name);
            let mut dep = Dependency::new(project.name, version, Ecosystem::Go, local_path);
            dep.parent = parent.clone();
            dep.vcs.branch = branch;
            dep.vcs.revision = project.revision;
            debug!(?dep, "initial dependency structure formed");
            dep
        })
        .collect();

    Ok(deps)
}
