use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use market_report::cli::Cli;
use market_report::config::AppConfig;
use market_report::mailer::{Mailer, OutboxMailer, ReportPayload, StdoutMailer};
use market_report::plotting::{DrawingSurface, SvgPlotter};
use market_report::pricing::HistoricalData;
use market_report::reports::{PortfolioReport, UniverseReport};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so --dry-run output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(&cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::load(&cli.config_file, &cli.to_overrides())
        .with_context(|| format!("Failed to load {}", cli.config_file.display()))?;

    let history = HistoricalData::new(&config.historical_data)?;
    let Some(daily) = history.get_daily().await? else {
        bail!("No price data available for the configured symbols and dates");
    };
    info!(
        "Loaded {} symbols over {} dates ({} to {})",
        daily.symbols().len(),
        daily.date_count(),
        daily.dates()[0],
        daily.latest_date()
    );

    let mut payloads: Vec<ReportPayload> = Vec::new();

    if let Some(ref report) = config.portfolio_report {
        let surface = DrawingSurface::from_config(&config.plot);
        let payload = PortfolioReport::new(report, &daily)
            .build(&SvgPlotter::new(), &surface)
            .context("Failed to build portfolio report")?;
        payloads.push(payload);
    }

    if let Some(ref report) = config.universe_report {
        let payload = UniverseReport::new(report, &daily)
            .build()
            .context("Failed to build universe report")?;
        payloads.push(payload);
    }

    if payloads.is_empty() {
        warn!("No reports configured; add [portfolio_report] or [universe_report]");
        return Ok(());
    }

    let mailer: Box<dyn Mailer> = if cli.dry_run {
        Box::new(StdoutMailer)
    } else {
        Box::new(OutboxMailer::new(&config.mailer))
    };

    for payload in &payloads {
        let destination = mailer.send(payload)?;
        eprintln!(
            "{} Sent '{}' to {}",
            "✓".green().bold(),
            payload.subject,
            destination
        );
    }

    Ok(())
}
