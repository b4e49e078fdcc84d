use chrono::NaiveDate;
use clap::Parser;
use color_eyre::eyre::{Result, bail};
use dotenv::dotenv;
use slotbook_core::config::BookingConfig;
use slotbook_core::generator::SlotGenerator;
use slotbook_db::PgStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Expands the availability rules into slots, for cron or manual runs.
#[derive(Debug, Parser)]
#[command(name = "generate-slots", version, about)]
struct Args {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Number of consecutive days to generate (defaults to BOOKING_GENERATION_DAYS)
    #[arg(short, long)]
    days: Option<u32>,

    /// First local date to generate, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    start: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let booking = BookingConfig::from_env()?;
    let days = args.days.unwrap_or(booking.generation_days);
    if days == 0 {
        bail!("--days must be at least 1");
    }

    let db_pool = slotbook_db::create_pool(&args.database_url).await?;
    let store = Arc::new(PgStore::new(db_pool));
    let clock = booking.clock();
    let generator = SlotGenerator::new(store.clone(), store, clock);

    let start = args.start.unwrap_or_else(|| clock.today());
    let summary = generator.generate_range(start, days).await;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!(
        "Generated {} new slots over {} days ({} already present)",
        summary.total_slots, days, summary.existing_slots
    );

    if !summary.failed_days.is_empty() {
        bail!("Generation failed for {} day(s)", summary.failed_days.len());
    }
    Ok(())
}
