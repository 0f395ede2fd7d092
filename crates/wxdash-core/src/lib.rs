pub mod app;
pub mod config;
pub mod error;
pub mod state;
pub mod store;

pub use app::App;
pub use config::{Config, GeolocationConfig, UiConfig, ValidationResult, WeatherConfig};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt, StorageError};
pub use state::{AddOutcome, AppState, Location, StateStore, GEO_LOCATION_ID, STATE_KEY};
pub use store::{FileKvStore, KvStore, MemoryKvStore};

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Logs go to stderr; stdout belongs to the rendered page
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("wxdash core initialized");
    Ok(())
}
