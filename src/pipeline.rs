//! Top-level fan-out over all requested projects.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, error, info};

use crate::models::Dependency;
use crate::project::{Project, Services};

pub struct Pipeline {
    services: Arc<Services>,
    projects: Vec<Project>,
}

impl Pipeline {
    /// Create one [`Project`] per path. Any path that cannot be made
    /// absolute aborts the run before concurrent work starts.
    pub fn new(services: Arc<Services>, paths: &[String]) -> Result<Self> {
        let projects = paths
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(Project::new)
            .collect::<Result<Vec<_>>>()?;

        debug!(?projects, "projects generated");
        Ok(Self { services, projects })
    }

    /// Process every project concurrently and wait for all of them. A task
    /// that panics yields a failed project for its path.
    pub async fn run(self) -> Vec<Project> {
        let (paths, handles): (Vec<_>, Vec<_>) = self
            .projects
            .into_iter()
            .map(|mut project| {
                let path = project.path.clone();
                let services = Arc::clone(&self.services);
                let handle = tokio::spawn(async move {
                    project.process(&services).await;
                    project
                });
                (path, handle)
            })
            .unzip();

        let mut projects = Vec::with_capacity(handles.len());
        for (path, result) in paths.into_iter().zip(join_all(handles).await) {
            match result {
                Ok(project) => projects.push(project),
                Err(err) => {
                    error!(project = %path.display(), "project task panicked: {err}");
                    projects.push(Project::aborted(path, format!("project task panicked: {err}")));
                }
            }
        }

        info!(
            projects = projects.len(),
            cached = self.services.resolver.cached(),
            "parsing done"
        );
        projects
    }
}

/// All dependencies of all projects, in project order.
pub fn collect_dependencies(projects: &[Project]) -> Vec<Dependency> {
    projects
        .iter()
        .flat_map(|p| p.dependencies.iter().cloned())
        .collect()
}
