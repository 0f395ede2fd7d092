//! Forward geocoding: free-text place name → candidate places.
//! Uses the Open-Meteo geocoding API - free, no API key required.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::instrument;
use url::Url;
use wxdash_core::{ReqwestErrorExt, WeatherConfig};

use crate::types::{GeocodingResponse, PlaceSuggestion, WeatherError};

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

/// Anything that can turn a query into place suggestions.
///
/// Lookups never fail from the caller's point of view: problems produce an
/// empty list.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn suggest(&self, query: &str) -> Vec<PlaceSuggestion>;
}

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: Url,
    count: u8,
    language: String,
}

impl GeocodingClient {
    pub fn new(
        base_url: &str,
        count: u8,
        language: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let base_url =
            Url::parse(base_url).map_err(|e| WeatherError::InvalidUrl(format!("{base_url}: {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self {
            client,
            base_url,
            count,
            language: language.to_string(),
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::new(
            &config.geocoding_url,
            config.suggestion_count,
            &config.language,
            config.request_timeout(),
        )
    }

    pub fn request_url(&self, query: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("name", query)
            .append_pair("count", &self.count.to_string())
            .append_pair("language", &self.language);
        url
    }

    /// Look up `query`, surfacing errors.
    #[instrument(skip(self), level = "debug")]
    pub async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, WeatherError> {
        let response = self
            .client
            .get(self.request_url(query))
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                endpoint: self.base_url.to_string(),
            });
        }

        let body: GeocodingResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        Ok(body
            .results
            .unwrap_or_default()
            .into_iter()
            .take(usize::from(self.count))
            .map(PlaceSuggestion::from)
            .collect())
    }
}

#[async_trait]
impl PlaceSearch for GeocodingClient {
    async fn suggest(&self, query: &str) -> Vec<PlaceSuggestion> {
        match self.search(query).await {
            Ok(places) => {
                tracing::debug!("{} suggestions for {:?}", places.len(), query);
                places
            }
            Err(e) => {
                tracing::debug!("Geocoding {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }
}
