//! Command-line interface parsing
//!
//! This module handles parsing of CLI arguments using clap: which pricing
//! regions to watch and how often the display polls for fresh prices.

use std::time::Duration;

use clap::Parser;

use crate::config::{validate_region, ConfigError, SUPPORTED_REGIONS};

/// Default seconds between refresh passes
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Spotpris - Danish spot electricity prices in the terminal
#[derive(Parser, Debug)]
#[command(name = "spotpris")]
#[command(about = "Danish spot electricity prices for the DK1 and DK2 regions")]
#[command(version)]
pub struct Cli {
    /// Pricing region to watch; repeat the flag to watch several
    ///
    /// Examples:
    ///   spotpris                          # watch DK1
    ///   spotpris --region DK2             # watch DK2
    ///   spotpris --region DK1 --region DK2
    ///
    /// Valid regions: DK1, DK2
    #[arg(long, value_name = "REGION")]
    pub region: Vec<String>,

    /// Seconds between refresh passes
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub interval: u64,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Regions to register, in display order
    pub regions: Vec<String>,
    /// How often the app polls `refresh()` on each cache
    pub poll_interval: Duration,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// With no `--region` flag the first supported region is watched.
    /// Region codes are validated here; duplicates are caught later when
    /// the instances register.
    ///
    /// # Errors
    /// * `ConfigError::UnknownRegion` - a region flag is not supported
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let regions = if cli.region.is_empty() {
            vec![SUPPORTED_REGIONS[0].to_string()]
        } else {
            cli.region.clone()
        };

        for region in &regions {
            validate_region(region)?;
        }

        Ok(Self {
            regions,
            poll_interval: Duration::from_secs(cli.interval),
        })
    }
}
