//! Dashboard controller.
//!
//! The controller owns the saved [`AppState`] and the [`ViewState`], applies
//! user [`Action`]s and background [`TaskEvent`]s to them, persists the saved
//! state after every mutation and starts the network jobs. Background jobs
//! report back through the controller's own channel, so all mutation happens
//! on the task that drives [`Controller::step`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use wxdash_core::{AddOutcome, AppState, Config, KvStore, Location, StateStore};
use wxdash_weather::{
    locate, Forecast, ForecastSource, Geolocator, LocationError, PlaceSearch, PlaceSuggestion,
    Position, WeatherError,
};

use crate::dom::{Event, Node};
use crate::strings;
use crate::tasks::{Debouncer, TaskSlot};
use crate::view::{self, display_name, PickedPlace, ViewState};

/// Something the user did
#[derive(Debug, Clone)]
pub enum Action {
    /// The city input changed
    QueryChanged(String),
    PickSuggestion(PlaceSuggestion),
    AddCity,
    RemoveCity(String),
    SelectCity(String),
    Refresh,
    /// Pointer pressed on element `target` (document-level listener)
    PointerDown { target: String },
}

/// A background job finished
#[derive(Debug)]
pub enum TaskEvent {
    DebounceElapsed { seq: u64 },
    SuggestionsLoaded { seq: u64, places: Vec<PlaceSuggestion> },
    ForecastLoaded {
        seq: u64,
        location_id: String,
        result: Result<Forecast, WeatherError>,
    },
    GeolocationResolved {
        seq: u64,
        result: Result<Position, LocationError>,
    },
}

#[derive(Debug)]
pub enum Input {
    Action(Action),
    Task(TaskEvent),
}

/// Remote services the controller talks to
#[derive(Clone)]
pub struct Services {
    pub forecast: Arc<dyn ForecastSource>,
    pub places: Arc<dyn PlaceSearch>,
    pub geolocator: Arc<dyn Geolocator>,
}

/// Timing knobs
#[derive(Debug, Clone)]
pub struct Settings {
    pub debounce: Duration,
    pub min_query_chars: usize,
    pub geolocation_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_chars: 2,
            geolocation_timeout: Duration::from_secs(8),
        }
    }
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.ui.debounce(),
            min_query_chars: config.ui.min_query_chars,
            geolocation_timeout: config.geolocation.timeout(),
        }
    }
}

pub struct Controller<S: KvStore> {
    state: AppState,
    view: ViewState,
    store: StateStore<S>,
    services: Services,
    settings: Settings,
    tx: UnboundedSender<Input>,
    rx: UnboundedReceiver<Input>,
    debouncer: Debouncer,
    lookup: TaskSlot,
    forecast: TaskSlot,
    geolocation: TaskSlot,
}

impl<S: KvStore> Controller<S> {
    /// Create a controller with the state saved in `store`.
    pub fn new(store: StateStore<S>, services: Services, settings: Settings) -> Self {
        let state = store.load();
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state,
            view: ViewState::default(),
            store,
            services,
            debouncer: Debouncer::new(settings.debounce),
            settings,
            tx,
            rx,
            lookup: TaskSlot::new(),
            forecast: TaskSlot::new(),
            geolocation: TaskSlot::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Render the current page
    pub fn page(&self) -> Node<Action> {
        view::render_page(&self.state, &self.view)
    }

    /// Show the forecast for the saved selection, or ask for the device position.
    pub fn start(&mut self) {
        match self.state.selected().cloned() {
            Some(location) => self.load_forecast(location),
            None => self.request_geolocation(),
        }
    }

    /// Deliver a DOM event to the current page and apply the resulting actions.
    pub fn dispatch(&mut self, event: &Event) {
        let actions = self.page().dispatch(event);
        for action in actions {
            self.handle(action);
        }
    }

    /// Wait for the next background completion.
    pub async fn next_input(&mut self) -> Option<Input> {
        self.rx.recv().await
    }

    /// Wait for one background completion and apply it.
    pub async fn step(&mut self) {
        if let Some(input) = self.next_input().await {
            self.handle_input(input);
        }
    }

    pub fn handle_input(&mut self, input: Input) {
        match input {
            Input::Action(action) => self.handle(action),
            Input::Task(event) => self.complete(event),
        }
    }

    pub fn handle(&mut self, action: Action) {
        tracing::debug!("Action: {:?}", action);
        match action {
            Action::QueryChanged(query) => {
                self.view.input = query;
                self.debouncer
                    .schedule(&self.tx, |seq| Input::Task(TaskEvent::DebounceElapsed { seq }));
            }
            Action::PickSuggestion(place) => self.pick_suggestion(place),
            Action::AddCity => self.add_city(),
            Action::RemoveCity(id) => self.remove_city(&id),
            Action::SelectCity(id) => self.select_city(&id),
            Action::Refresh => self.start(),
            Action::PointerDown { target } => self.pointer_down(&target),
        }
    }

    fn complete(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::DebounceElapsed { seq } => {
                if self.debouncer.fired(seq) {
                    self.lookup_suggestions();
                }
            }
            TaskEvent::SuggestionsLoaded { seq, places } => {
                if self.lookup.finish(seq) {
                    self.show_suggestions(places);
                }
            }
            TaskEvent::ForecastLoaded {
                seq,
                location_id,
                result,
            } => {
                if self.forecast.finish(seq) {
                    self.apply_forecast(&location_id, result);
                } else {
                    tracing::debug!("Dropping superseded forecast for {}", location_id);
                }
            }
            TaskEvent::GeolocationResolved { seq, result } => {
                if self.geolocation.finish(seq) {
                    self.apply_geolocation(result);
                }
            }
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.state) {
            Ok(()) => self.view.storage_status = strings::STORAGE_OK.to_string(),
            Err(e) => {
                tracing::error!("Failed to persist state: {}", e);
                self.view.storage_status = e.user_message().to_string();
            }
        }
    }

    fn lookup_suggestions(&mut self) {
        let query = self.view.input.trim().to_string();
        self.view.city_error.clear();
        self.view.picked = None;

        if query.chars().count() < self.settings.min_query_chars {
            self.lookup.cancel();
            self.view.suggestions_open = false;
            self.view.suggestions.clear();
            return;
        }

        let places = Arc::clone(&self.services.places);
        self.lookup.spawn(
            &self.tx,
            async move { places.suggest(&query).await },
            |seq, places| Input::Task(TaskEvent::SuggestionsLoaded { seq, places }),
        );
    }

    fn show_suggestions(&mut self, places: Vec<PlaceSuggestion>) {
        self.view.suggestions_open = !places.is_empty();
        self.view.suggestions = places;
    }

    fn pick_suggestion(&mut self, place: PlaceSuggestion) {
        self.view.input = place.name;
        self.view.picked = Some(PickedPlace {
            id: place.id,
            lat: place.lat,
            lon: place.lon,
        });
        self.view.suggestions_open = false;
        self.view.city_error.clear();
    }

    fn add_city(&mut self) {
        let name = self.view.input.trim().to_string();
        let picked = match &self.view.picked {
            Some(picked) if !name.is_empty() => picked.clone(),
            _ => {
                self.view.city_error = strings::PICK_FROM_LIST.to_string();
                return;
            }
        };

        let location = Location::city(picked.id, name, picked.lat, picked.lon);
        if self.state.add(location.clone()) == AddOutcome::Duplicate {
            self.view.city_error = strings::ALREADY_ADDED.to_string();
            return;
        }
        tracing::info!("Added {} ({})", location.name, location.id);
        self.persist();

        self.view.input.clear();
        self.view.picked = None;
        self.view.suggestions_open = false;
        self.view.city_error.clear();

        self.load_forecast(location);
    }

    fn remove_city(&mut self, id: &str) {
        if !self.state.remove(id) {
            return;
        }
        tracing::info!("Removed {}", id);
        self.persist();

        match self.state.selected().cloned() {
            Some(location) => self.load_forecast(location),
            None => {
                self.forecast.cancel();
                self.view.refresh_disabled = false;
                self.view.title = strings::NO_LOCATION.to_string();
                self.view.forecast = None;
                self.view.status = strings::PLACEHOLDER.to_string();
            }
        }
    }

    fn select_city(&mut self, id: &str) {
        if !self.state.select(id) {
            return;
        }
        self.persist();
        if let Some(location) = self.state.selected().cloned() {
            self.load_forecast(location);
        }
    }

    fn pointer_down(&mut self, target: &str) {
        if target == view::INPUT_ID {
            return;
        }
        let page = self.page();
        let inside_suggestions = page
            .find(view::SUGGEST_ID)
            .is_some_and(|e| e.contains(target));
        if !inside_suggestions {
            self.view.suggestions_open = false;
        }
    }

    fn load_forecast(&mut self, location: Location) {
        self.view.title = display_name(&location).to_string();
        self.view.status = strings::LOADING.to_string();
        self.view.refresh_disabled = true;

        let source = Arc::clone(&self.services.forecast);
        let (lat, lon) = (location.lat, location.lon);
        let location_id = location.id;
        self.forecast.spawn(
            &self.tx,
            async move { source.forecast(lat, lon).await },
            move |seq, result| {
                Input::Task(TaskEvent::ForecastLoaded {
                    seq,
                    location_id,
                    result,
                })
            },
        );
    }

    fn apply_forecast(&mut self, location_id: &str, result: Result<Forecast, WeatherError>) {
        self.view.refresh_disabled = false;
        match result {
            Ok(forecast) => {
                self.view.forecast = Some(forecast);
                self.view.status = strings::READY.to_string();
            }
            Err(e) => {
                tracing::warn!("Forecast for {} failed: {}", location_id, e);
                self.view.forecast = None;
                self.view.status = strings::LOAD_ERROR.to_string();
            }
        }
    }

    fn request_geolocation(&mut self) {
        self.view.status = strings::GEO_REQUEST.to_string();

        let geolocator = Arc::clone(&self.services.geolocator);
        let timeout = self.settings.geolocation_timeout;
        self.geolocation.spawn(
            &self.tx,
            async move { locate(geolocator.as_ref(), timeout).await },
            |seq, result| Input::Task(TaskEvent::GeolocationResolved { seq, result }),
        );
    }

    fn apply_geolocation(&mut self, result: Result<Position, LocationError>) {
        match result {
            Ok(position) => {
                tracing::info!(
                    "Device position {}, {}",
                    position.latitude,
                    position.longitude
                );
                let geo = Location::geo(
                    strings::CURRENT_LOCATION,
                    position.latitude,
                    position.longitude,
                );
                self.state.upsert_geo(geo.clone());
                self.persist();
                self.load_forecast(geo);
            }
            Err(e) => {
                tracing::warn!("Geolocation unavailable: {}", e);
                self.view.status = strings::GEO_DENIED.to_string();
                self.view.title = strings::NO_LOCATION.to_string();
                self.view.forecast = None;
            }
        }
    }
}
