use std::sync::Arc;

use anyhow::Result;
use tokio::io::BufReader;
use wxdash_core::AppError;
use wxdash_ui::{terminal, Controller, Services, Settings};
use wxdash_weather::{ConfiguredGeolocator, ForecastClient, GeocodingClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    wxdash_core::init()?;

    let mut app = match wxdash_core::App::new() {
        Ok(app) => app,
        Err(e) => {
            let err = AppError::classify(e);
            eprintln!("{}", err.user_message());
            return Err(err.into());
        }
    };
    let config = app.config_arc();

    let geolocator = ConfiguredGeolocator::from_config(&config.geolocation);
    if !geolocator.is_available() {
        tracing::info!("No configured position; geolocation requests will be denied");
    }

    let services = Services {
        forecast: Arc::new(ForecastClient::from_config(&config.weather)?),
        places: Arc::new(GeocodingClient::from_config(&config.weather)?),
        geolocator: Arc::new(geolocator),
    };

    let mut controller = Controller::new(
        app.state_store(),
        services,
        Settings::from_config(&config),
    );

    tracing::info!("wxdash started");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    terminal::run(&mut controller, stdin, &mut stdout).await?;

    // Graceful shutdown
    app.shutdown()?;

    Ok(())
}
