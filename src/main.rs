//! e-st.lv meter export
//!
//! Logs in to the mans.e-st.lv customer portal with a stealth-configured
//! Chrome, reads the consumption (and, when present, production) series of
//! one smart meter for a day, month or year, and saves them as JSON records.
//!
//! # Flow
//!
//! - **Plan**: validate the requested period and pick the portal view
//! - **Login**: one browser session per run, closed on every exit path
//! - **Extract**: wait for the chart to render and read its embedded data
//! - **Normalize**: merge both series into `{date, consumption[, production]}`
//!
//! Credentials come from `EST_*` environment variables, optionally via `.env`.

mod config;
mod error;
mod model;
mod portal;
mod sink;

#[cfg(test)]
mod test_utils;

use crate::error::{ConfigError, Result};
use crate::model::{Granularity, Period, QuerySpec};
use crate::portal::{Engine, WebDriverLauncher};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{signal, SignalKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PeriodArg {
    Day,
    Month,
    Year,
}

impl From<PeriodArg> for Period {
    fn from(value: PeriodArg) -> Self {
        match value {
            PeriodArg::Day => Period::Day,
            PeriodArg::Month => Period::Month,
            PeriodArg::Year => Period::Year,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GranularityArg {
    /// Daily values
    #[value(name = "D")]
    Daily,
    /// Hourly values
    #[value(name = "H")]
    Hourly,
}

impl From<GranularityArg> for Granularity {
    fn from(value: GranularityArg) -> Self {
        match value {
            GranularityArg::Daily => Granularity::Daily,
            GranularityArg::Hourly => Granularity::Hourly,
        }
    }
}

/// Export electricity readings from mans.e-st.lv as JSON.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Data period
    #[arg(long, value_enum, default_value = "month")]
    period: PeriodArg,

    /// Year (default: current year)
    #[arg(long)]
    year: Option<i32>,

    /// Month 1-12 (default: current month)
    #[arg(long)]
    month: Option<u32>,

    /// Day 1-31 (default: today)
    #[arg(long)]
    day: Option<u32>,

    /// Granularity: D=daily, H=hourly (default: D for month, H for day)
    #[arg(long, value_enum)]
    granularity: Option<GranularityArg>,

    /// Output JSON file (default: st_YYYY[MM[DD]].json)
    #[arg(long)]
    outfile: Option<PathBuf>,

    /// Show the browser window and log at debug level
    #[arg(long)]
    debug: bool,
}

impl Cli {
    /// Query for the parsed flags, filling missing date parts from `today`.
    fn query_spec(&self, today: NaiveDate) -> QuerySpec {
        let year = self.year.unwrap_or(today.year());
        let month = self.month.unwrap_or(today.month());
        let day = self.day.unwrap_or(today.day());
        let spec = match self.period {
            PeriodArg::Day => QuerySpec::day(year, month, day),
            PeriodArg::Month => QuerySpec::month(year, month),
            PeriodArg::Year => QuerySpec::year(year),
        };
        match self.granularity {
            Some(granularity) => spec.with_granularity(granularity.into()),
            None => spec,
        }
    }
}

/// Application entry point.
///
/// Loads `.env`, sets up logging and runs one export. Every failure is
/// reported with its stage and mapped to a distinct exit code.
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let app_config = config::load_app_config().expect("Failed to load AppConfig");
    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        app_config.log_level()
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(err) = run(cli).await {
        tracing::error!(stage = err.stage(), "{}", err);
        eprintln!("ERROR: {}", err);
        if err.is_retryable() {
            tracing::info!("The portal did not answer in time; running again may succeed");
        }
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let portal_config = config::load_portal_config().map_err(ConfigError::env_parse)?;
    let browser_config = config::load_browser_config().map_err(ConfigError::env_parse)?;

    let spec = cli.query_spec(Local::now().date_naive());
    let outfile = cli
        .outfile
        .clone()
        .unwrap_or_else(|| sink::default_filename(&spec));
    if cli.debug {
        tracing::debug!("Debug mode: the browser window will be visible");
    }
    tracing::info!(
        period = %spec.period,
        year = spec.year,
        month = ?spec.month,
        day = ?spec.day,
        "Starting export"
    );

    let launcher = WebDriverLauncher::new(browser_config.webdriver_url.clone());
    let engine = Engine::from_config(launcher, &portal_config, &browser_config, !cli.debug)?;
    let records = engine.run(&spec, shutdown_signal()).await?;

    sink::write_records(&outfile, &records).await
}

/// Resolves with the name of the first termination signal received.
async fn shutdown_signal() -> &'static str {
    let mut sig_term = signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
    tokio::select! {
        // Handle SIGTERM for graceful shutdown in containers
        _ = sig_term.recv() => "SIGTERM",
        // Handle Ctrl-C for manual termination
        _ = ctrl_c() => "SIGINT",
    }
}
