use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::analyzer::parent_from_source_root;
use crate::models::{Dependency, Ecosystem, DEFAULT_BRANCH};

/// Read `go.sum` and keep every module that is present in the module cache.
///
/// Modules listed in `go.sum` but never downloaded are declared-but-unused and
/// are dropped without error.
pub(super) fn extract(path: &Path, mod_cache: &Path) -> Result<Vec<Dependency>> {
    let sum_path = path.join("go.sum");
    if !sum_path.exists() {
        debug!(project = %path.display(), "no go.sum, project has no dependencies");
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&sum_path)
        .with_context(|| format!("failed to read {}", sum_path.display()))?;

    let parent = module_path(&path.join("go.mod"))?
        .unwrap_or_else(|| parent_from_source_root(path));

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut deps = Vec::new();

    for (name, version) in parse_go_sum(&content) {
        if !seen.insert((name, version)) {
            continue;
        }

        let local_path = module_cache_path(mod_cache, name, version);
        if !local_path.exists() {
            debug!(
                module = name,
                version,
                "module is not in the module cache, skipping"
            );
            continue;
        }

        let mut dep = Dependency::new(name, version, Ecosystem::Go, local_path);
        dep.parent = parent.clone();
        dep.vcs.branch = DEFAULT_BRANCH.to_string();
        debug!(?dep, "initial dependency structure formed");
        deps.push(dep);
    }

    Ok(deps)
}

/// Split `go.sum` lines into `(module, version)` pairs, dropping the
/// `/go.mod` suffix from go.mod-only hash lines.
fn parse_go_sum(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let version = fields.next()?;
            let version = version.strip_suffix("/go.mod").unwrap_or(version);
            Some((name, version))
        })
        .collect()
}

/// Module path declared by the `module` directive of `go.mod`, if any.
fn module_path(go_mod: &Path) -> Result<Option<String>> {
    if !go_mod.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(go_mod)
        .with_context(|| format!("failed to read {}", go_mod.display()))?;
    let re = Regex::new(r#"(?m)^\s*module\s+"?([^"\s]+)"?"#)?;
    Ok(re.captures(&content).map(|caps| caps[1].to_string()))
}

/// Location of `name@version` in the module cache, using the cache's
/// case-encoding (`A` is stored as `!a`).
fn module_cache_path(mod_cache: &Path, name: &str, version: &str) -> PathBuf {
    mod_cache.join(format!("{}@{}", escape_path(name), escape_path(version)))
}

fn escape_path(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}
