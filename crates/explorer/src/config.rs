use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File as ConfigFile};
use cosmex_chain_client::RetryPolicy;
use cosmex_pagination::PageLimits;
use cosmex_types::ChainConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Used when `--config` is not given and this file exists.
pub const DEFAULT_CONFIG_PATH: &str = "config/explorer.toml";

/// Prefix of the environment variables layered over the config file.
pub const ENV_PREFIX: &str = "COSMEX";

const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Parser)]
#[command(name = "cosmex-explorer")]
#[command(about = "Cosmos explorer query API")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Base URL of the chain's LCD (REST) endpoint
    #[arg(long)]
    pub lcd_url: Option<String>,

    /// Directory of the indexed database
    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub host: String,
    pub port: u16,
    pub lcd_url: String,
    pub db_path: PathBuf,
    pub chain_id: String,
    pub bech32_prefix: String,
    pub staking_denom: String,
    pub status_refresh_secs: u64,
    pub upstream_timeout_ms: u64,
    pub upstream_retries: u32,
    pub upstream_backoff_ms: u64,
    pub max_blocks_page: usize,
    pub max_missed_blocks_page: usize,
    pub log_level: String,
    pub log_format: String,
    /// Module account address -> module name
    pub module_accounts: HashMap<String, String>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            lcd_url: "http://localhost:1317".to_string(),
            db_path: PathBuf::from("data/explorer"),
            chain_id: "cosmoshub-4".to_string(),
            bech32_prefix: "cosmos".to_string(),
            staking_denom: "uatom".to_string(),
            status_refresh_secs: 5,
            upstream_timeout_ms: 5_000,
            upstream_retries: 2,
            upstream_backoff_ms: 200,
            max_blocks_page: 100,
            max_missed_blocks_page: 100,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            module_accounts: HashMap::new(),
        }
    }
}

impl ExplorerConfig {
    /// Load the file named by `--config` (or the default file when present),
    /// layer `COSMEX_*` variables over it, then apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    bail!("configuration file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                default_path.exists().then_some(default_path)
            }
        };

        let mut config = Self::from_sources(path.as_deref(), ENV_PREFIX)?;
        config.apply_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    /// Build from an optional file plus environment variables with `env_prefix`.
    pub fn from_sources(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(ConfigFile::from(path));
        }
        builder = builder.add_source(Environment::with_prefix(env_prefix).try_parsing(true));

        builder
            .build()
            .context("failed to read explorer configuration")?
            .try_deserialize()
            .context("invalid explorer configuration")
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(lcd_url) = &cli.lcd_url {
            self.lcd_url = lcd_url.clone();
        }
        if let Some(db_path) = &cli.db_path {
            self.db_path = db_path.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.lcd_url)
            .with_context(|| format!("lcd_url is not a valid URL: {}", self.lcd_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("lcd_url must use http or https: {}", self.lcd_url);
        }
        if self.bech32_prefix.trim().is_empty() {
            bail!("bech32_prefix must not be empty");
        }
        if self.staking_denom.trim().is_empty() {
            bail!("staking_denom must not be empty");
        }
        if self.status_refresh_secs == 0 {
            bail!("status_refresh_secs must be at least 1");
        }
        if self.max_blocks_page == 0 || self.max_missed_blocks_page == 0 {
            bail!("page maximums must be at least 1");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn chain_config(&self) -> ChainConfig {
        let mut chain = ChainConfig::new(
            self.chain_id.as_str(),
            &self.bech32_prefix,
            self.staking_denom.as_str(),
        );
        for (address, name) in &self.module_accounts {
            chain = chain.with_module_account(address.as_str(), name.as_str());
        }
        chain
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.upstream_timeout_ms),
            self.upstream_retries,
            Duration::from_millis(self.upstream_backoff_ms),
        )
    }

    pub fn status_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.status_refresh_secs)
    }

    pub fn block_limits(&self) -> PageLimits {
        PageLimits::new(DEFAULT_PAGE_SIZE, self.max_blocks_page)
    }

    pub fn missed_block_limits(&self) -> PageLimits {
        PageLimits::new(DEFAULT_PAGE_SIZE, self.max_missed_blocks_page)
    }
}
