//! Saved locations and the current selection.
//!
//! The whole `AppState` is one JSON document under [`STATE_KEY`]. Mutations
//! go through `AppState` methods so the selection invariant (a present
//! `selected_id` names a saved location) holds after every call; callers
//! persist with [`StateStore::save`] afterwards.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::store::KvStore;

/// Storage key of the persisted state document.
pub const STATE_KEY: &str = "wx-state-v1";

/// Id reserved for the location derived from the device position.
pub const GEO_LOCATION_ID: &str = "geo";

/// A saved place. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "isGeo", default)]
    pub is_geo: bool,
}

impl Location {
    /// A location picked from geocoder suggestions.
    pub fn city(id: impl Into<String>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lon,
            is_geo: false,
        }
    }

    /// The device-position location.
    pub fn geo(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: GEO_LOCATION_ID.to_string(),
            name: name.into(),
            lat,
            lon,
            is_geo: true,
        }
    }
}

/// Outcome of [`AppState::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(rename = "selectedId", default)]
    pub selected_id: Option<String>,
}

impl AppState {
    pub fn find(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn selected(&self) -> Option<&Location> {
        self.selected_id.as_deref().and_then(|id| self.find(id))
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_id.as_deref() == Some(id)
    }

    /// Append `location` and select it, unless its id is already saved.
    pub fn add(&mut self, location: Location) -> AddOutcome {
        if self.contains(&location.id) {
            return AddOutcome::Duplicate;
        }
        self.selected_id = Some(location.id.clone());
        self.locations.push(location);
        AddOutcome::Added
    }

    /// Remove a saved city. Returns false for unknown ids and for the geo entry.
    ///
    /// Removing the selected city moves the selection to the first remaining
    /// location, or clears it.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.find(id) {
            Some(loc) if !loc.is_geo => {}
            _ => return false,
        }

        self.locations.retain(|l| l.id != id);

        if self.is_selected(id) {
            self.selected_id = self.locations.first().map(|l| l.id.clone());
        }
        true
    }

    /// Select a saved location. Returns false for unknown ids.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.selected_id = Some(id.to_string());
        true
    }

    /// Put `location` (a geo entry) at the front, dropping any previous geo
    /// entry, and select it.
    pub fn upsert_geo(&mut self, location: Location) {
        self.locations.retain(|l| !l.is_geo);
        self.selected_id = Some(location.id.clone());
        self.locations.insert(0, location);
    }

    /// Clear a selection that does not name a saved location.
    fn repair(&mut self) {
        if let Some(id) = &self.selected_id {
            if !self.contains(id) {
                tracing::warn!("Saved selection {} has no matching location; clearing", id);
                self.selected_id = None;
            }
        }
    }
}

/// Reads and writes [`AppState`] through a [`KvStore`].
#[derive(Debug)]
pub struct StateStore<S> {
    store: S,
}

impl<S: KvStore> StateStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the saved state.
    ///
    /// A missing, unreadable or malformed document yields an empty state.
    pub fn load(&self) -> AppState {
        let raw = match self.store.get(STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("No saved state under {}", STATE_KEY);
                return AppState::default();
            }
            Err(e) => {
                tracing::warn!("Failed to read saved state: {}", e);
                return AppState::default();
            }
        };

        match serde_json::from_str::<Option<AppState>>(&raw) {
            Ok(Some(mut state)) => {
                state.repair();
                tracing::info!("Loaded {} saved locations", state.locations.len());
                state
            }
            Ok(None) => AppState::default(),
            Err(e) => {
                tracing::warn!("Saved state is malformed, starting empty: {}", e);
                AppState::default()
            }
        }
    }

    /// Persist the full state.
    pub fn save(&self, state: &AppState) -> Result<(), StorageError> {
        let raw = serde_json::to_string(state)?;
        self.store.set(STATE_KEY, &raw)
    }
}
