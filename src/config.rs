use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Root configuration structure, deserialized from `.depsleuth.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub http: HttpConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Enables verbose diagnostic tracing. Never affects results.
    pub debug: bool,
}

/// Outbound request tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Maximum number of in-flight requests per destination host.
    pub per_host_limit: usize,
    /// Total request timeout, also used as the connect timeout.
    pub timeout_secs: u64,
    /// Attempts made on transport failures before giving up.
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// How often a caller waiting for a host slot re-checks.
    pub poll_interval_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            per_host_limit: 5,
            timeout_secs: 20,
            max_attempts: 3,
            retry_delay_ms: 1000,
            poll_interval_ms: 1000,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Overrides for where dependency sources live on disk.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub go_mod_cache: Option<PathBuf>,
    pub cargo_home: Option<PathBuf>,
}

impl PathsConfig {
    /// Go module cache: config, `$GOMODCACHE`, `$GOPATH/pkg/mod`, `~/go/pkg/mod`.
    pub fn go_mod_cache(&self) -> PathBuf {
        if let Some(path) = &self.go_mod_cache {
            return path.clone();
        }
        if let Some(cache) = non_empty_env("GOMODCACHE") {
            return PathBuf::from(cache);
        }
        if let Some(gopath) = non_empty_env("GOPATH") {
            // GOPATH may be a list; the first entry hosts the module cache.
            let first = std::env::split_paths(&gopath).next().unwrap_or_default();
            return first.join("pkg").join("mod");
        }
        dirs::home_dir()
            .unwrap_or_default()
            .join("go")
            .join("pkg")
            .join("mod")
    }

    /// Cargo home: config, `$CARGO_HOME`, `~/.cargo`.
    pub fn cargo_home(&self) -> PathBuf {
        if let Some(path) = &self.cargo_home {
            return path.clone();
        }
        if let Some(home) = non_empty_env("CARGO_HOME") {
            return PathBuf::from(home);
        }
        dirs::home_dir().unwrap_or_default().join(".cargo")
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `./.depsleuth.toml`
/// 3. `~/.config/depsleuth/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let local_config = Path::new(".depsleuth.toml");
    if local_config.exists() {
        return read_config(local_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("depsleuth").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("failed to parse configuration file {}", path.display()))
}
