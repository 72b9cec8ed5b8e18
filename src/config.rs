use serde::Deserialize;
use std::{fs, path::Path, time::Duration};
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub sessions: Sessions,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Logging {
    #[serde(default = "default_filter")]
    pub filter: String,              // EnvFilter directive, overridden by RUST_LOG
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Metrics {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Sessions {
    /// Open sessions older than this are abandoned by the sweeper.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep")]
    pub sweep_interval_secs: u64,
}

impl Sessions {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        // tokio's interval panics on a zero period
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for Logging {
    fn default() -> Self {
        Logging { filter: default_filter(), json: false }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics { enabled: false, bind: default_bind() }
    }
}

impl Default for Sessions {
    fn default() -> Self {
        Sessions { ttl_secs: default_ttl(), sweep_interval_secs: default_sweep() }
    }
}

fn default_filter() -> String { "info".into() }
fn default_bind() -> String { "127.0.0.1:9110".into() }
fn default_ttl() -> u64 { 15 * 60 }                // 15 minutes
fn default_sweep() -> u64 { 30 }

/// Read the TOML file at `p` and deserialize into `Config`.
/// *Adds context* so user errors print a friendlier message.
///
/// # Errors
/// * Returns an anyhow::Error if the file cannot be read or parsed.
pub fn load<P: AsRef<Path>>(p: P) -> Result<Config> {
    let text = fs::read_to_string(&p)
        .with_context(|| format!("couldn't read config file {}", p.as_ref().display()))?;
    load_from_str(&text)
}

pub fn load_from_str(text: &str) -> Result<Config> {
    toml::from_str(text)
        .with_context(|| "invalid TOML in config file".to_string())
}
