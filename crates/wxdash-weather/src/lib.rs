//! Weather data for wxdash
//!
//! Open-Meteo forecast and geocoding clients, the weather code table and the
//! device position source.

pub mod codes;
pub mod forecast;
pub mod geocode;
pub mod location;
pub mod types;

pub use codes::{weather_info, WeatherInfo};
pub use forecast::{ForecastClient, ForecastSource};
pub use geocode::{GeocodingClient, PlaceSearch};
pub use location::{locate, ConfiguredGeolocator, Geolocator};
pub use types::*;
