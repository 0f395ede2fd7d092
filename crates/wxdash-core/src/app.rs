use anyhow::Result;
use std::sync::Arc;

use crate::{Config, FileKvStore, StateStore};

/// Application lifecycle: configuration plus the on-disk state store.
pub struct App {
    config: Arc<Config>,
}

impl App {
    /// Create a new application instance from the user's configuration file
    pub fn new() -> Result<Self> {
        let (config, _warnings) = Config::load_validated()?;
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        tracing::info!("Using config directory {}", config.config_dir.display());
        Self {
            config: Arc::new(config),
        }
    }

    /// State store rooted at the configured data directory
    pub fn state_store(&self) -> StateStore<FileKvStore> {
        tracing::debug!("State store at {}", self.config.data_dir.display());
        StateStore::new(FileKvStore::new(self.config.data_dir.clone()))
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down wxdash");
        Ok(())
    }

    /// Shared handle to the configuration
    pub fn config_arc(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppState, Location};

    #[test]
    fn test_state_store_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let app = App::with_config(config);

        let store = app.state_store();
        let mut state = AppState::default();
        state.add(Location::city("1", "A", 1.0, 2.0));
        store.save(&state).unwrap();

        assert!(dir.path().join("wx-state-v1.json").exists());
        assert_eq!(app.state_store().load(), state);
    }
}
