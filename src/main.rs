use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use clima_core::{AppError, Config, ConfigError};
use clima_services::{FileStorage, KeyValueStorage, MemoryStorage, SavedCityStore};
use clima_ui::{
    dispatch, Command, ControllerSettings, DashboardController, IntoAppError, TerminalConfirm,
    TerminalView,
};
use clima_weather::{
    FixedGeolocator, FreshnessCache, Geolocator, UnsupportedGeolocator, WeatherApiClient,
};

fn open_storage(config: &Config) -> Arc<dyn KeyValueStorage> {
    let dir = config.storage_dir();
    match FileStorage::open(&dir) {
        Ok(storage) => {
            tracing::info!("Saved cities stored in {}", dir.display());
            Arc::new(storage)
        }
        Err(e) => {
            tracing::warn!(
                "Falling back to in-memory storage: {}",
                e.into_app_error().user_message()
            );
            Arc::new(MemoryStorage::new())
        }
    }
}

fn geolocator(config: &Config) -> Arc<dyn Geolocator> {
    match &config.geolocation.fixed_position {
        Some(position) => Arc::new(FixedGeolocator::new(position.latitude, position.longitude)),
        None => Arc::new(UnsupportedGeolocator),
    }
}

/// Reads one line from stdin. `None` on end of input.
async fn read_line() -> Result<Option<String>> {
    let line = tokio::task::spawn_blocking(|| -> io::Result<Option<String>> {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        Ok((read > 0).then_some(line))
    })
    .await
    .context("stdin reader task failed")?
    .context("Failed to read from stdin")?;
    Ok(line)
}

#[tokio::main]
async fn main() -> Result<()> {
    clima_core::init()?;

    let (config, _) = match Config::load_validated() {
        Ok(loaded) => loaded,
        Err(e) => match e.downcast::<ConfigError>() {
            Ok(config_error) => {
                let err = AppError::from(config_error);
                eprintln!("{}", err.user_message());
                return Err(err.into());
            }
            Err(e) => return Err(e.context("Failed to load configuration")),
        },
    };

    let client = WeatherApiClient::with_timeout(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
    )
    .context("Failed to build HTTP client")?
    .with_cache(FreshnessCache::new(config.cache.ttl(), config.cache.capacity));

    let saved = SavedCityStore::load(open_storage(&config));

    let controller = Arc::new(DashboardController::new(
        Arc::new(client),
        geolocator(&config),
        saved,
        Arc::new(TerminalView::stdout()),
        Arc::new(TerminalConfirm),
        ControllerSettings::from_config(&config),
    ));

    let cancel = CancellationToken::new();
    let refresher = {
        let controller = controller.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { controller.run_refresh_loop(cancel).await })
    };

    println!("Clima weather dashboard. Type 'help' for commands.");
    controller.start().await;

    if let Some(query) = std::env::args().nth(1) {
        let _ = controller.search(&query).await;
    }

    while let Some(line) = read_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Ok(command) => {
                if !dispatch(&controller, command).await {
                    break;
                }
            }
            Err(e) => println!("{}", e),
        }
    }

    cancel.cancel();
    if let Err(e) = refresher.await {
        tracing::warn!("Refresh task ended abnormally: {}", e);
    }
    tracing::info!("Clima stopped");
    Ok(())
}
