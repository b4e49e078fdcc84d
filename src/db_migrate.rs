use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use dotenv::dotenv;
use slotbook_core::config::BookingConfig;
use slotbook_db::legacy::{LegacyExport, apply_plan};
use slotbook_db::schema::initialize_database;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Creates the SlotBook schema and optionally imports a legacy export.
#[derive(Debug, Parser)]
#[command(name = "db-migrate", version, about)]
struct Args {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// JSON export of the previous deployment to load after the schema
    #[arg(long, value_name = "PATH")]
    import_legacy: Option<PathBuf>,

    /// Convert and report without writing anything
    #[arg(long, requires = "import_legacy")]
    dry_run: bool,
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

    let plan = match &args.import_legacy {
        Some(path) => {
            let export = LegacyExport::load(path).await?;
            let plan = export.into_plan(&booking.clock());
            info!(
                "Legacy export converted: {} rules, {} slots, {} reservations, {} skipped",
                plan.rules.len(),
                plan.slots.len(),
                plan.reservations.len(),
                plan.skipped.len()
            );
            Some(plan)
        }
        None => None,
    };

    if args.dry_run {
        for reason in plan.iter().flat_map(|plan| &plan.skipped) {
            info!("Would skip {}", reason);
        }
        return Ok(());
    }

    info!("Connecting to database...");
    let db_pool = slotbook_db::create_pool(&args.database_url)
        .await
        .wrap_err("Failed to connect to the database")?;

    initialize_database(&db_pool).await?;

    if let Some(plan) = plan {
        let report = apply_plan(&db_pool, &plan).await?;
        info!(
            "Imported {} rules, {} slots, {} reservations",
            report.rules, report.slots, report.reservations
        );
    }

    Ok(())
}
