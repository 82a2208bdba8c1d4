//! Per-ecosystem dependency extraction.
//!
//! Each [`Analyzer`] decides from marker files alone whether it can handle a
//! project and which dependency-manager [`Flavor`] is in use, then reads that
//! flavor's manifest into a flat list of [`Dependency`] values. The supported
//! ecosystems form the closed [`EcosystemParser`] set, looked up by name in an
//! [`AnalyzerRegistry`].

use std::fmt;
use std::path::Path;

use anyhow::{bail, Result};
use futures::future::join_all;
use tracing::debug;

use crate::config::PathsConfig;
use crate::models::Dependency;
use crate::registry::MetadataResolver;

pub mod go;
pub mod rust;

pub trait Analyzer {
    /// Inspect marker files in `path`; `None` when this analyzer does not apply.
    fn detect(&self, path: &Path) -> Option<Flavor>;

    /// Read the flavor's manifest into dependencies with `name` and `version` set.
    fn extract(&self, flavor: Flavor, path: &Path) -> Result<Vec<Dependency>>;
}

/// Dependency-manager convention detected within an ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    GoModules,
    Dep,
    Cargo,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::GoModules => write!(f, "go mod"),
            Flavor::Dep => write!(f, "dep"),
            Flavor::Cargo => write!(f, "cargo"),
        }
    }
}

pub enum EcosystemParser {
    Go(go::GoAnalyzer),
    Rust(rust::RustAnalyzer),
}

impl EcosystemParser {
    pub fn name(&self) -> &'static str {
        match self {
            EcosystemParser::Go(_) => "golang",
            EcosystemParser::Rust(_) => "rust",
        }
    }

    fn analyzer(&self) -> &dyn Analyzer {
        match self {
            EcosystemParser::Go(a) => a,
            EcosystemParser::Rust(a) => a,
        }
    }

    pub fn detect(&self, path: &Path) -> Option<Flavor> {
        self.analyzer().detect(path)
    }

    /// Extract dependencies, then resolve VCS coordinates for all of them
    /// concurrently before returning.
    pub async fn extract_dependencies(
        &self,
        flavor: Flavor,
        path: &Path,
        resolver: &MetadataResolver,
    ) -> Result<Vec<Dependency>> {
        let mut deps = self.analyzer().extract(flavor, path)?;
        if deps.is_empty() {
            return Ok(deps);
        }

        resolve_all(&mut deps, resolver).await;
        Ok(deps)
    }
}

/// Resolve every dependency at once and wait for all of them.
pub async fn resolve_all(deps: &mut [Dependency], resolver: &MetadataResolver) {
    join_all(deps.iter_mut().map(|dep| resolver.resolve(dep))).await;
}

/// Registered parsers, consulted in registration order.
#[derive(Default)]
pub struct AnalyzerRegistry {
    parsers: Vec<EcosystemParser>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every supported ecosystem.
    pub fn with_defaults(paths: &PathsConfig) -> Self {
        let mut registry = Self::new();
        registry.register(EcosystemParser::Go(go::GoAnalyzer::new(paths.go_mod_cache())));
        registry.register(EcosystemParser::Rust(rust::RustAnalyzer::new(paths.cargo_home())));
        registry
    }

    pub fn register(&mut self, parser: EcosystemParser) {
        self.parsers.retain(|p| p.name() != parser.name());
        self.parsers.push(parser);
    }

    pub fn get(&self, name: &str) -> Option<&EcosystemParser> {
        self.parsers.iter().find(|p| p.name() == name)
    }

    /// First parser that recognizes `path`, with the flavor it detected.
    pub fn detect(&self, path: &Path) -> Option<(&'static str, Flavor)> {
        self.parsers.iter().find_map(|parser| {
            debug!(
                parser = parser.name(),
                project = %path.display(),
                "checking if parser can handle project"
            );
            parser.detect(path).map(|flavor| (parser.name(), flavor))
        })
    }

    pub async fn extract_dependencies(
        &self,
        name: &str,
        flavor: Flavor,
        path: &Path,
        resolver: &MetadataResolver,
    ) -> Result<Vec<Dependency>> {
        let Some(parser) = self.get(name) else {
            bail!("parser '{name}' isn't registered");
        };
        parser.extract_dependencies(flavor, path, resolver).await
    }
}

/// Best-effort project identifier: everything after a `/src/` path segment,
/// as laid out under a GOPATH-style source root. Empty when there is none.
pub fn parent_from_source_root(path: &Path) -> String {
    let path = path.to_string_lossy();
    path.split_once("/src/")
        .map(|(_, rest)| rest.trim_end_matches('/').to_string())
        .unwrap_or_default()
}
