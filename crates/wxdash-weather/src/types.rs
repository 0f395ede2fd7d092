use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use wxdash_core::NetworkError;

/// Raw Open-Meteo forecast body. Only the fields the dashboard reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub timezone: Option<String>,
    pub daily: DailyData,
    #[serde(default)]
    pub current_weather: Option<CurrentWeatherData>,
}

/// Parallel per-day arrays, aligned by index.
///
/// Open-Meteo reports missing samples as `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyData {
    pub time: Vec<String>,
    pub weathercode: Vec<Option<i32>>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeatherData {
    pub temperature: f64,
    pub weathercode: i32,
    #[serde(default)]
    pub windspeed: Option<f64>,
}

/// One day of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub weather_code: Option<i32>,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
}

/// Conditions at request time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub weather_code: i32,
    pub wind_speed: Option<f64>,
}

/// Forecast for one point, days in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub days: Vec<ForecastDay>,
    pub current: Option<CurrentConditions>,
    pub timezone: Option<String>,
}

impl TryFrom<ForecastResponse> for Forecast {
    type Error = WeatherError;

    fn try_from(raw: ForecastResponse) -> Result<Self, Self::Error> {
        let daily = raw.daily;
        let len = daily
            .time
            .len()
            .min(daily.weathercode.len())
            .min(daily.temperature_2m_max.len())
            .min(daily.temperature_2m_min.len());
        if len < daily.time.len() {
            tracing::warn!(
                "Daily arrays are misaligned ({} dates, {} usable); truncating",
                daily.time.len(),
                len
            );
        }

        let days = (0..len)
            .map(|i| {
                let date = NaiveDate::parse_from_str(&daily.time[i], "%Y-%m-%d").map_err(|e| {
                    WeatherError::Parse(format!("bad date {:?}: {}", daily.time[i], e))
                })?;
                Ok(ForecastDay {
                    date,
                    weather_code: daily.weathercode[i],
                    temp_max: daily.temperature_2m_max[i],
                    temp_min: daily.temperature_2m_min[i],
                })
            })
            .collect::<Result<Vec<_>, WeatherError>>()?;

        Ok(Forecast {
            days,
            current: raw.current_weather.map(|c| CurrentConditions {
                temperature: c.temperature,
                weather_code: c.weathercode,
                wind_speed: c.windspeed,
            }),
            timezone: raw.timezone,
        })
    }
}

/// Raw Open-Meteo geocoding body.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResponse {
    #[serde(default)]
    pub results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResult {
    pub id: serde_json::Value,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// A place offered while the user types a city name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<GeocodingResult> for PlaceSuggestion {
    fn from(raw: GeocodingResult) -> Self {
        let id = match raw.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        let name = match raw.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {}", raw.name, country),
            _ => raw.name,
        };
        Self {
            id,
            name,
            lat: raw.latitude,
            lon: raw.longitude,
        }
    }
}

/// Device position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("HTTP {status} from {endpoint}")]
    Status { status: u16, endpoint: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}
