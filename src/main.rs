use adsky::broadcast::TracingDelivery;
use adsky::config::{Config, LoggingConfig};
use adsky::distribution::{AdDistributor, DistributionRequest};
use adsky::error::AdskyErrorTrait;
use adsky::expression::{DecimalEvaluator, ExpressionEvaluator};
use adsky::models::Ad;
use adsky::scheduler::HourPlanner;
use anyhow::{Context, Result};
use chrono::{Timelike, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "adsky",
    version,
    about = "Hourly ad distribution and replication engine",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json), defaults to the configured one
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the distribution formula for a single hour
    Eval {
        /// Hour to evaluate (x)
        #[arg(short = 'x', long)]
        hour: u32,

        /// Ads available today (n)
        #[arg(short = 'n', long)]
        total_ads: u32,

        /// Preferred hour (h), defaults to the configured one
        #[arg(short = 'p', long)]
        preferred_hour: Option<u32>,

        /// Formula override
        #[arg(short, long)]
        formula: Option<String>,
    },

    /// Print the ad count for every hour of the day
    Curve {
        /// Ads available today (n)
        #[arg(short = 'n', long)]
        total_ads: u32,

        /// Preferred hour (h), defaults to the configured one
        #[arg(short = 'p', long)]
        preferred_hour: Option<u32>,

        /// Formula override
        #[arg(short, long)]
        formula: Option<String>,

        /// Print as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Build the broadcast plan for one hour from a JSON ad list
    Plan {
        /// JSON file containing an array of ads
        #[arg(short, long)]
        ads: PathBuf,

        /// Hour to plan, defaults to the current UTC hour
        #[arg(short = 'x', long)]
        hour: Option<u32>,

        /// Comma separated worlds to deliver to when dispatching
        #[arg(short, long, value_delimiter = ',', default_value = "world")]
        worlds: Vec<String>,

        /// Send every occurrence through the log delivery
        #[arg(long, default_value = "false")]
        dispatch: bool,

        /// Print as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    // Initialize tracing/logging
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(&config.logging, log_format, cli.verbose)?;

    match cli.command {
        Commands::Eval {
            hour,
            total_ads,
            preferred_hour,
            formula,
        } => {
            let preferred_hour = preferred_hour.unwrap_or(config.ads.preferred_hour);
            let formula = formula.unwrap_or(config.ads.distribution_function);
            tracing::info!(
                formula = %formula,
                preferred_hour = %preferred_hour,
                hour = %hour,
                total_ads = %total_ads,
                "Starting eval command"
            );
            eval(&formula, preferred_hour, hour, total_ads)?;
        }

        Commands::Curve {
            total_ads,
            preferred_hour,
            formula,
            json,
        } => {
            let preferred_hour = preferred_hour.unwrap_or(config.ads.preferred_hour);
            let formula = formula.unwrap_or(config.ads.distribution_function);
            tracing::info!(
                formula = %formula,
                preferred_hour = %preferred_hour,
                total_ads = %total_ads,
                "Starting curve command"
            );
            curve(&formula, preferred_hour, total_ads, json)?;
        }

        Commands::Plan {
            ads,
            hour,
            worlds,
            dispatch,
            json,
        } => {
            let hour = hour.unwrap_or_else(|| Utc::now().hour());
            tracing::info!(
                ads = %ads.display(),
                hour = %hour,
                dispatch = %dispatch,
                "Starting plan command"
            );
            plan(&config, ads, hour, worlds, dispatch, json).await?;
        }
    }

    Ok(())
}

fn setup_tracing(logging: &LoggingConfig, format: &str, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(logging.filter_directive(verbose))
        .context("Invalid logging level")?;

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn eval(formula: &str, preferred_hour: u32, hour: u32, total_ads: u32) -> Result<()> {
    let request = DistributionRequest::new(preferred_hour, hour, total_ads);
    let count = AdDistributor::with_defaults()
        .compute(formula, &request)
        .map_err(|e| {
            tracing::error!(category = %e.category(), "{e}");
            e
        })?;
    let raw = DecimalEvaluator::new()
        .evaluate(formula, &request.bindings())
        .with_context(|| format!("Failed to evaluate '{formula}'"))?;

    println!("Formula: {formula}");
    println!("  h = {preferred_hour}, x = {hour}, n = {total_ads}");
    println!("  Raw value: {}", raw.normalize());
    println!("  Ads this hour: {count}");
    Ok(())
}

fn curve(formula: &str, preferred_hour: u32, total_ads: u32, json: bool) -> Result<()> {
    let day =
        AdDistributor::with_defaults().daily_distribution(formula, preferred_hour, total_ads)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&day)?);
        return Ok(());
    }

    println!("Formula: {formula} (h = {preferred_hour}, n = {total_ads})");
    let width = day.max_count().max(1) as usize;
    for (hour, count) in day.iter() {
        let bar = "#".repeat((count as usize * 40).div_ceil(width));
        println!("  {hour:02}:00 {count:>5} {bar}");
    }
    println!("  Total: {}", day.total());
    Ok(())
}

async fn plan(
    config: &Config,
    path: PathBuf,
    hour: u32,
    worlds: Vec<String>,
    dispatch: bool,
    json: bool,
) -> Result<()> {
    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read ads file: {}", path.display()))?;
    let ads: Vec<Ad> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse ads file: {}", path.display()))?;

    let planner = HourPlanner::from_config(&config.ads);
    let plan = planner.plan(&ads, Utc::now(), hour).map_err(|e| {
        tracing::error!(category = %e.category(), recoverable = e.is_recoverable(), "{e}");
        e
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("Plan for {} {:02}:00", plan.date, plan.hour);
        println!("  Live ads: {}", plan.live_ads);
        println!("  Target: {} (selected {})", plan.target_count, plan.selected_ads);
        for occurrence in &plan.occurrences {
            println!(
                "  +{:>4}s [{}] {}: {}",
                occurrence.offset_secs,
                occurrence.ad.kind,
                occurrence.ad.username,
                occurrence.ad.message
            );
        }
        for reason in &plan.skipped {
            println!("  skipped: {reason}");
        }
    }

    if dispatch {
        let delivery = TracingDelivery::new(worlds, config.ads.world_blacklist.clone());
        let failed = plan
            .dispatch(&delivery)
            .into_iter()
            .filter(|r| !matches!(r, Ok(status) if status.success))
            .count();
        if failed > 0 {
            tracing::warn!(failed, "Some occurrences were not delivered");
        }
    }

    Ok(())
}
