//! Processing of a single input project.
//!
//! A project moves through `Created → Detected → Extracted → LicenseResolved`.
//! A project no parser recognizes ends as `Unsupported` with no dependencies;
//! one whose manifest cannot be read ends as `Failed`. Neither stops sibling
//! projects.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::analyzer::{AnalyzerRegistry, Flavor};
use crate::license::{resolve_license, LicenseDetector};
use crate::models::Dependency;
use crate::registry::MetadataResolver;

/// Collaborators shared by every project of a run.
pub struct Services {
    pub registry: AnalyzerRegistry,
    pub resolver: MetadataResolver,
    pub licenses: Arc<dyn LicenseDetector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectState {
    Created,
    Detected,
    Extracted,
    LicenseResolved,
    Unsupported,
    Failed(String),
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectState::Created => write!(f, "created"),
            ProjectState::Detected => write!(f, "detected"),
            ProjectState::Extracted => write!(f, "extracted"),
            ProjectState::LicenseResolved => write!(f, "done"),
            ProjectState::Unsupported => write!(f, "unsupported"),
            ProjectState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug)]
pub struct Project {
    pub path: PathBuf,
    pub parser_name: Option<&'static str>,
    pub flavor: Option<Flavor>,
    pub dependencies: Vec<Dependency>,
    pub state: ProjectState,
}

impl Project {
    /// Create a project for a user-supplied path, expanding `~` and making
    /// it absolute.
    pub fn new(raw_path: &str) -> Result<Self> {
        let path = absolute_path(raw_path)?;
        Ok(Project {
            path,
            parser_name: None,
            flavor: None,
            dependencies: Vec::new(),
            state: ProjectState::Created,
        })
    }

    /// A project whose processing stopped before it could report a state.
    pub fn aborted(path: PathBuf, reason: String) -> Self {
        Project {
            path,
            parser_name: None,
            flavor: None,
            dependencies: Vec::new(),
            state: ProjectState::Failed(reason),
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self.state, ProjectState::Failed(_))
    }

    /// Detect, extract, resolve and license this project's dependencies.
    pub async fn process(&mut self, ctx: &Services) {
        let Some((parser_name, flavor)) = ctx.registry.detect(&self.path) else {
            info!(project = %self.path.display(), "project cannot be parsed, skipping");
            self.state = ProjectState::Unsupported;
            return;
        };
        self.parser_name = Some(parser_name);
        self.flavor = Some(flavor);
        self.state = ProjectState::Detected;

        let extracted = ctx
            .registry
            .extract_dependencies(parser_name, flavor, &self.path, &ctx.resolver)
            .await;
        self.dependencies = match extracted {
            Ok(deps) => deps,
            Err(err) => {
                error!(project = %self.path.display(), "failed to get dependencies: {err:#}");
                self.state = ProjectState::Failed(format!("{err:#}"));
                return;
            }
        };
        self.state = ProjectState::Extracted;
        info!(
            project = %self.path.display(),
            parser = parser_name,
            %flavor,
            dependencies = self.dependencies.len(),
            "dependencies extracted"
        );

        let detector = Arc::clone(&ctx.licenses);
        let mut deps = std::mem::take(&mut self.dependencies);
        let licensed = tokio::task::spawn_blocking(move || {
            for dep in &mut deps {
                dep.vcs.format_source_paths();
                resolve_license(detector.as_ref(), dep);
            }
            deps
        })
        .await;

        match licensed {
            Ok(deps) => {
                self.dependencies = deps;
                self.state = ProjectState::LicenseResolved;
            }
            Err(err) => {
                warn!(project = %self.path.display(), "license resolution task failed: {err}");
                self.state = ProjectState::Failed(format!("license resolution task failed: {err}"));
            }
        }
    }
}

fn absolute_path(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    let expanded = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home = dirs::home_dir().context("failed to get user's home directory")?;
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(raw),
    };

    std::path::absolute(Path::new(&expanded))
        .with_context(|| format!("failed to get absolute path for package '{raw}'"))
}
