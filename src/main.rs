//! `depsleuth`: discover project dependencies, resolve their repositories and
//! report their licenses.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and load config ([`config::load_config`]).
//! 2. Detect each project's dependency manager ([`analyzer`]).
//! 3. Extract dependencies and resolve their VCS coordinates through the
//!    cached, rate-limited go-get resolver ([`registry`], [`http`]).
//! 4. Detect licenses and copyrights from the sources on disk ([`license`]).
//! 5. Write the requested report ([`report`]).
//! 6. Exit `1` when every project failed, or when any failed under `--strict`.

mod analyzer;
mod cli;
mod config;
mod discovery;
mod http;
mod license;
mod logging;
mod models;
mod pipeline;
mod project;
mod registry;
mod report;

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn};

use analyzer::AnalyzerRegistry;
use cli::{Cli, OutputFormat};
use config::load_config;
use http::{FetchPolicy, RateLimitedFetcher, ReqwestTransport};
use license::detector::FileLicenseDetector;
use pipeline::{collect_dependencies, Pipeline};
use project::Services;
use registry::MetadataResolver;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init(config.log.debug);

    if cli.outformat == OutputFormat::Csv && cli.outfile.is_none() {
        bail!("--outfile is required for csv output");
    }

    let transport = ReqwestTransport::new(config.http.timeout())?;
    let fetcher = RateLimitedFetcher::new(Arc::new(transport), FetchPolicy::from(&config.http));
    let services = Arc::new(Services {
        registry: AnalyzerRegistry::with_defaults(&config.paths),
        resolver: MetadataResolver::new(Arc::new(fetcher)),
        licenses: Arc::new(FileLicenseDetector::new()),
    });

    let projects = Pipeline::new(services, &cli.pkgs)?.run().await;
    let deps = collect_dependencies(&projects);

    let failed: Vec<_> = projects.iter().filter(|p| p.failed()).collect();
    for project in &failed {
        warn!(project = %project.path.display(), "{}", project.state);
    }
    info!(
        projects = projects.len(),
        failed = failed.len(),
        dependencies = deps.len(),
        "scan finished"
    );

    match cli.outformat {
        OutputFormat::Csv => {
            if let Some(out_file) = cli.outfile.as_deref() {
                report::csv::write(&deps, out_file)?;
            }
        }
        OutputFormat::Json => report::json::write(&deps, cli.outfile.as_deref())?,
        OutputFormat::Terminal => report::terminal::render(&deps),
    }

    let all_failed = !projects.is_empty() && failed.len() == projects.len();
    if all_failed || (cli.strict && !failed.is_empty()) {
        std::process::exit(1);
    }

    Ok(())
}
