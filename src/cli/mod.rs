use clap::Parser;
use std::path::PathBuf;

use crate::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "market-report")]
#[command(version, about = "Daily portfolio and market universe return reports")]
#[command(
    long_about = "Fetch daily prices for a symbol universe, compute percent, dollar and cumulative returns, and deliver text reports with SVG charts."
)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long = "config-file", default_value = "config.toml")]
    pub config_file: PathBuf,

    /// Override the symbols file from the configuration
    #[arg(long = "symbols-file")]
    pub symbols_file: Option<PathBuf>,

    /// Override the price cache directory
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// First date of price history (YYYYMMDD)
    #[arg(long = "start-date")]
    pub start_date: Option<String>,

    /// Last date of price history (YYYYMMDD, default: today)
    #[arg(long = "end-date")]
    pub end_date: Option<String>,

    /// Use cached prices only, never hit the network
    #[arg(long)]
    pub offline: bool,

    /// Print reports to stdout instead of writing them to the outbox
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Cli {
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            symbols_file: self.symbols_file.clone(),
            output_dir: self.output_dir.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            offline: self.offline,
        }
    }
}
