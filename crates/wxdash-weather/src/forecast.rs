//! Open-Meteo daily forecast client.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::instrument;
use url::Url;
use wxdash_core::{ReqwestErrorExt, WeatherConfig};

use crate::types::{Forecast, ForecastResponse, WeatherError};

pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DAILY_FIELDS: &str = "weathercode,temperature_2m_max,temperature_2m_min";

/// Anything that can produce a forecast for a point.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn forecast(&self, lat: f64, lon: f64) -> Result<Forecast, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: Url,
    forecast_days: u8,
}

impl ForecastClient {
    pub fn new(base_url: &str, forecast_days: u8, timeout: Duration) -> Result<Self, WeatherError> {
        let base_url =
            Url::parse(base_url).map_err(|e| WeatherError::InvalidUrl(format!("{base_url}: {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self {
            client,
            base_url,
            forecast_days,
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::new(
            &config.forecast_url,
            config.forecast_days,
            config.request_timeout(),
        )
    }

    /// Full request URL for a point
    pub fn request_url(&self, lat: f64, lon: f64) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("latitude", &lat.to_string())
            .append_pair("longitude", &lon.to_string())
            .append_pair("daily", DAILY_FIELDS)
            .append_pair("current_weather", "true")
            .append_pair("timezone", "auto")
            .append_pair("forecast_days", &self.forecast_days.to_string());
        url
    }

    /// Fetch the forecast. Single attempt; any non-2xx status is an error.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, lat: f64, lon: f64) -> Result<Forecast, WeatherError> {
        let url = self.request_url(lat, lon);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Forecast request failed with status {}", status);
            return Err(WeatherError::Status {
                status: status.as_u16(),
                endpoint: self.base_url.to_string(),
            });
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        let forecast = Forecast::try_from(body)?;
        tracing::info!("Fetched {}-day forecast for {}, {}", forecast.days.len(), lat, lon);
        Ok(forecast)
    }
}

#[async_trait]
impl ForecastSource for ForecastClient {
    async fn forecast(&self, lat: f64, lon: f64) -> Result<Forecast, WeatherError> {
        self.fetch(lat, lon).await
    }
}
