use std::path::PathBuf;

use serde::Serialize;

/// Branch assumed when a manifest does not pin one.
pub const DEFAULT_BRANCH: &str = "master";

/// License name used whenever detection fails or yields nothing.
pub const UNKNOWN_LICENSE: &str = "Unknown";

/// A single third-party dependency discovered in a project.
///
/// `name` and `version` are fixed at extraction time. `vcs` is filled in by the
/// metadata resolver and `license` by the project processor afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub ecosystem: Ecosystem,
    /// Project that declared this dependency; empty when it cannot be inferred.
    pub parent: String,
    /// Where the dependency's sources can be inspected on disk.
    pub local_path: PathBuf,
    pub vcs: VcsData,
    pub license: License,
}

impl Dependency {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        ecosystem: Ecosystem,
        local_path: PathBuf,
    ) -> Self {
        Dependency {
            name: name.into(),
            version: version.into(),
            ecosystem,
            parent: String::new(),
            local_path,
            vcs: VcsData::default(),
            license: License::default(),
        }
    }

    /// Identity used by the metadata cache.
    pub fn cache_key(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Version-control coordinates of a dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VcsData {
    /// Version-control system, e.g. `git`.
    pub vcs: String,
    /// Repository URL.
    pub vcs_path: String,
    pub branch: String,
    pub revision: String,
    /// Directory URL template, e.g. `https://github.com/org/repo/blob/master{/dir}`.
    pub source_dir_template: String,
    /// File URL template, e.g. `https://github.com/org/repo/blob/master{/dir}/{file}#L{line}`.
    pub source_file_template: String,
}

impl VcsData {
    /// Copy the discovered coordinates from `other`, leaving the pinned
    /// branch and revision untouched.
    pub fn apply_discovered(&mut self, other: &VcsData) {
        self.vcs.clone_from(&other.vcs);
        self.vcs_path.clone_from(&other.vcs_path);
        self.source_dir_template.clone_from(&other.source_dir_template);
        self.source_file_template.clone_from(&other.source_file_template);
    }

    /// Synthesize browsable source templates for well-known hosts when the
    /// discovery document did not provide any.
    pub fn format_source_paths(&mut self) {
        if !self.source_dir_template.is_empty() || !self.source_file_template.is_empty() {
            return;
        }
        if self.vcs != "git" {
            return;
        }

        let base = self
            .vcs_path
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .trim_end_matches('/');
        let branch = if self.branch.is_empty() {
            DEFAULT_BRANCH
        } else {
            self.branch.as_str()
        };

        let host = base
            .split("://")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default();

        let (dir, file) = match host {
            "github.com" => (
                format!("{base}/blob/{branch}{{/dir}}"),
                format!("{base}/blob/{branch}{{/dir}}/{{file}}#L{{line}}"),
            ),
            "gitlab.com" => (
                format!("{base}/-/blob/{branch}{{/dir}}"),
                format!("{base}/-/blob/{branch}{{/dir}}/{{file}}#L{{line}}"),
            ),
            "bitbucket.org" => (
                format!("{base}/src/{branch}{{/dir}}"),
                format!("{base}/src/{branch}{{/dir}}/{{file}}#lines-{{line}}"),
            ),
            _ => return,
        };

        self.source_dir_template = dir;
        self.source_file_template = file;
    }
}

/// License information for a dependency.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct License {
    /// License identifier, or [`UNKNOWN_LICENSE`].
    pub name: String,
    /// Browsable URL of the license file, built from the file template.
    pub url: String,
    /// Lines of the license file that start with "Copyright".
    pub copyrights: Vec<String>,
}

impl License {
    pub fn unknown() -> Self {
        License {
            name: UNKNOWN_LICENSE.to_string(),
            ..License::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ecosystem {
    Go,
    Rust,
}
