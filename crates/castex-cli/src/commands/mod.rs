//! Subcommand implementations.

pub mod export;
pub mod fetch;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use castex_core::{ApiKey, ApiUrl, Fid};
use castex_neynar::{DEFAULT_API_BASE, NeynarConfig, NeynarFeed};

/// Feed API connection settings shared by every subcommand.
#[derive(Args, Debug)]
pub struct FeedArgs {
    /// Neynar API key
    #[arg(long, env = "NEYNAR_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Feed API base URL
    #[arg(long, env = "NEYNAR_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl FeedArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn feed(&self) -> Result<NeynarFeed> {
        let base = ApiUrl::new(&self.api_base).context("Invalid API base URL")?;
        let config = NeynarConfig::new(base, ApiKey::new(&self.api_key)).with_timeout(self.timeout());
        NeynarFeed::new(config).context("Failed to create feed client")
    }
}

pub fn parse_fid(raw: &str) -> Result<Fid> {
    raw.parse()
        .with_context(|| format!("Invalid FID '{}'", raw))
}
