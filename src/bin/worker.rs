use std::env;
use tokio::time::interval;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;
use tracing::Level;
use csintel::ingestion::AdapterRegistry;
use csintel::jobs::{run_ingestion, seed_database};
use csintel::{connect_database, is_in_memory, AppConfig};

#[tokio::main]
async fn main() {
    // Initialise tracing (INFO level)
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let config = AppConfig::from_env();

    // Command‑line flags
    let args: Vec<String> = env::args().collect();
    let seed_once = args.iter().any(|a| a == "--seed");
    let ingest_once = args.iter().any(|a| a == "--ingest");

    if is_in_memory(&config.database_url) {
        error!(
            url = %config.database_url,
            "DATABASE_URL points at an in-memory database; nothing the worker writes would survive. Set DATABASE_URL to a persistent database"
        );
        std::process::exit(1);
    }

    let db = match connect_database(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!(?e, "failed to connect to database");
            std::process::exit(1);
        }
    };
    let registry = AdapterRegistry::with_defaults(config.ingestion_delay);

    if seed_once || ingest_once {
        if seed_once {
            if let Err(e) = seed_database(&db).await {
                error!(?e, "seed job failed");
                std::process::exit(1);
            }
        }
        if ingest_once {
            run_ingestion(&db, &registry).await;
        }
        return;
    }

    info!(
        "Worker starting; running ingestion every {} minutes",
        config.worker_interval.as_secs() / 60
    );

    let mut ticker = interval(config.worker_interval);
    loop {
        ticker.tick().await;
        info!("Running scheduled ingestion...");
        let outcomes = run_ingestion(&db, &registry).await;
        info!(sources = outcomes.len(), "Scheduled ingestion finished.");
    }
}
