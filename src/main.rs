use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gcnotify::config::Config;
use gcnotify::notify::{PushSender, PushoverClient};
use gcnotify::pipeline::run_cycle;
use gcnotify::storage::{SqliteStorage, Storage};
use gcnotify::utils::http::create_client;

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("gcnotify=info".parse()?);

    let json = std::env::var("GCNOTIFY_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    info!("Starting gcnotify");

    // Load configuration
    let config = Arc::new(Config::load()?);

    // Initialize storage
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(&config.database_path).await?);
    storage.migrate().await?;

    let client = create_client(&config)?;
    let sender: Arc<dyn PushSender> = Arc::new(PushoverClient::new(client.clone(), &config));

    let Some(every) = config.check_interval_seconds else {
        run_cycle(&config, &client, storage.as_ref(), sender.as_ref()).await;
        info!("Check completed");
        return Ok(());
    };

    let mut interval = interval(Duration::from_secs(every));

    loop {
        interval.tick().await;

        info!("--- Starting new check cycle at {} ---", Local::now().format("%Y-%m-%d %H:%M:%S"));

        run_cycle(&config, &client, storage.as_ref(), sender.as_ref()).await;

        info!("Check cycle completed, waiting {} seconds", every);
    }
}
