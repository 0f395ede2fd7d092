//! Device position source.

use async_trait::async_trait;
use std::time::Duration;
use wxdash_core::GeolocationConfig;

use crate::types::{LocationError, Position};

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Position, LocationError>;
}

/// Position taken from configuration. No position means the request is denied.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredGeolocator {
    position: Option<Position>,
}

impl ConfiguredGeolocator {
    pub fn new(position: Option<Position>) -> Self {
        Self { position }
    }

    pub fn from_config(config: &GeolocationConfig) -> Self {
        Self::new(config.position().map(|(latitude, longitude)| Position {
            latitude,
            longitude,
        }))
    }

    pub fn is_available(&self) -> bool {
        self.position.is_some()
    }
}

#[async_trait]
impl Geolocator for ConfiguredGeolocator {
    async fn current_position(&self) -> Result<Position, LocationError> {
        self.position.ok_or(LocationError::PermissionDenied)
    }
}

/// Ask `geolocator` for a position, giving up after `timeout`.
pub async fn locate(
    geolocator: &dyn Geolocator,
    timeout: Duration,
) -> Result<Position, LocationError> {
    match tokio::time::timeout(timeout, geolocator.current_position()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Geolocation timed out after {:?}", timeout);
            Err(LocationError::Timeout)
        }
    }
}
