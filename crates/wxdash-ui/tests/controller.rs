//! Controller behaviour against fake weather services.

use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::io::BufReader;
use wxdash_core::{AppState, KvStore, Location, MemoryKvStore, StateStore, StorageError};
use wxdash_ui::strings;
use wxdash_ui::terminal::{self, Command};
use wxdash_ui::view::{self, text_of};
use wxdash_ui::{Action, Controller, Event, Input, Services, Settings, TaskEvent};
use wxdash_weather::{
    Forecast, ForecastDay, ForecastSource, Geolocator, LocationError, PlaceSearch,
    PlaceSuggestion, Position, WeatherError,
};

const SLOW_LAT: f64 = 1.0;

/// Returns one thunderstorm day whose max temperature echoes the latitude.
#[derive(Default)]
struct FakeForecast {
    calls: Mutex<Vec<(f64, f64)>>,
    fail: bool,
}

#[async_trait]
impl ForecastSource for FakeForecast {
    async fn forecast(&self, lat: f64, lon: f64) -> Result<Forecast, WeatherError> {
        self.calls.lock().unwrap().push((lat, lon));
        if lat == SLOW_LAT {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        if self.fail {
            return Err(WeatherError::Parse("bad body".into()));
        }
        Ok(Forecast {
            days: vec![ForecastDay {
                date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                weather_code: Some(95),
                temp_max: Some(lat),
                temp_min: Some(-1.0),
            }],
            current: None,
            timezone: Some("Europe/Moscow".into()),
        })
    }
}

#[derive(Default)]
struct FakePlaces {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl PlaceSearch for FakePlaces {
    async fn suggest(&self, query: &str) -> Vec<PlaceSuggestion> {
        self.queries.lock().unwrap().push(query.to_string());
        if query.starts_with("Par") {
            return vec![PlaceSuggestion {
                id: "2988507".into(),
                name: "Paris, France".into(),
                lat: 48.85,
                lon: 2.35,
            }];
        }
        vec![
            PlaceSuggestion {
                id: "524901".into(),
                name: "Moscow, Russia".into(),
                lat: 55.75,
                lon: 37.62,
            },
            PlaceSuggestion {
                id: "4400".into(),
                name: "Moscow, United States".into(),
                lat: 46.73,
                lon: -117.0,
            },
        ]
    }
}

enum FakeGeo {
    At(Position),
    Denied,
    Silent,
}

#[async_trait]
impl Geolocator for FakeGeo {
    async fn current_position(&self) -> Result<Position, LocationError> {
        match self {
            FakeGeo::At(position) => Ok(*position),
            FakeGeo::Denied => Err(LocationError::PermissionDenied),
            FakeGeo::Silent => std::future::pending().await,
        }
    }
}

struct Harness {
    controller: Controller<Rc<MemoryKvStore>>,
    kv: Rc<MemoryKvStore>,
    forecast: Arc<FakeForecast>,
    places: Arc<FakePlaces>,
}

fn harness_with(saved: Option<AppState>, geo: FakeGeo, fail: bool) -> Harness {
    let kv = Rc::new(MemoryKvStore::new());
    if let Some(state) = saved {
        StateStore::new(Rc::clone(&kv)).save(&state).unwrap();
    }
    let forecast = Arc::new(FakeForecast {
        fail,
        ..FakeForecast::default()
    });
    let places = Arc::new(FakePlaces::default());
    let services = Services {
        forecast: forecast.clone(),
        places: places.clone(),
        geolocator: Arc::new(geo),
    };
    let controller = Controller::new(
        StateStore::new(Rc::clone(&kv)),
        services,
        Settings::default(),
    );
    Harness {
        controller,
        kv,
        forecast,
        places,
    }
}

fn harness() -> Harness {
    harness_with(None, FakeGeo::Denied, false)
}

fn two_cities() -> AppState {
    let mut state = AppState::default();
    state.add(Location::city("slow", "Slowtown", SLOW_LAT, 0.0));
    state.add(Location::city("fast", "Fastville", 2.0, 0.0));
    state
}

/// Every `set` fails, like a full or read-only disk.
struct ReadOnlyStore;

impl KvStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Write {
            key: key.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

/// Apply background completions until nothing arrives for a while.
async fn settle<S: KvStore>(controller: &mut Controller<S>) {
    while let Ok(Some(input)) =
        tokio::time::timeout(Duration::from_secs(30), controller.next_input()).await
    {
        controller.handle_input(input);
    }
}

/// Let freshly spawned jobs make their first poll.
async fn let_jobs_start() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

impl Harness {
    async fn settle(&mut self) {
        settle(&mut self.controller).await;
    }

    fn run_command(&mut self, command: Command) {
        let events = terminal::events_for(&command, self.controller.state()).unwrap();
        for event in &events {
            self.controller.dispatch(event);
        }
    }

    async fn type_query(&mut self, query: &str) {
        self.controller
            .dispatch(&Event::input(view::INPUT_ID, query));
        self.settle().await;
    }

    fn text(&self, id: &str) -> String {
        text_of(&self.controller.page(), id)
    }

    fn saved(&self) -> AppState {
        StateStore::new(Rc::clone(&self.kv)).load()
    }

    fn forecast_calls(&self) -> Vec<(f64, f64)> {
        self.forecast.calls.lock().unwrap().clone()
    }
}

#[tokio::test(start_paused = true)]
async fn test_search_pick_and_add_city() {
    let mut h = harness();

    h.type_query("Msk").await;
    let page = h.controller.page();
    assert!(!page.find(view::SUGGEST_ID).unwrap().is_hidden());
    assert_eq!(text_of(&page, &view::suggestion_id(0)), "Moscow, Russia");

    h.controller
        .dispatch(&Event::pointer_down(view::suggestion_id(0)));
    assert_eq!(h.controller.view().input, "Moscow, Russia");
    assert!(!h.controller.view().suggestions_open);

    h.controller.dispatch(&Event::click(view::ADD_ID));
    let_jobs_start().await;
    let state = h.controller.state();
    assert_eq!(state.selected_id.as_deref(), Some("524901"));
    assert_eq!(state.locations.len(), 1);
    assert_eq!(h.forecast_calls(), vec![(55.75, 37.62)]);
    assert_eq!(h.text(view::STATUS_ID), strings::LOADING);
    assert!(h.controller.view().input.is_empty());

    // Saved before the forecast arrives
    assert_eq!(h.saved().selected_id.as_deref(), Some("524901"));

    h.settle().await;
    assert_eq!(h.text(view::STATUS_ID), strings::READY);
    assert_eq!(h.text(view::TITLE_ID), "Moscow, Russia");
    let cards = h.text(view::CARDS_ID);
    assert!(cards.contains("⛈️"));
    assert!(cards.contains("Гроза"));
}

#[tokio::test(start_paused = true)]
async fn test_add_without_pick_is_rejected() {
    let mut h = harness();
    h.type_query("Paris").await;

    h.controller.dispatch(&Event::click(view::ADD_ID));
    assert!(h.controller.state().locations.is_empty());
    assert_eq!(h.text(view::CITY_ERROR_ID), strings::PICK_FROM_LIST);
    assert!(h.forecast_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_city_is_rejected() {
    let mut saved = AppState::default();
    saved.add(Location::city("524901", "Moscow, Russia", 55.75, 37.62));
    let mut h = harness_with(Some(saved), FakeGeo::Denied, false);

    h.type_query("Moscow").await;
    h.controller
        .dispatch(&Event::pointer_down(view::suggestion_id(0)));
    h.controller.dispatch(&Event::click(view::ADD_ID));

    assert_eq!(h.controller.state().locations.len(), 1);
    assert_eq!(h.text(view::CITY_ERROR_ID), strings::ALREADY_ADDED);
}

#[tokio::test(start_paused = true)]
async fn test_short_query_hides_suggestions() {
    let mut h = harness();
    h.type_query("Mo").await;
    assert!(h.controller.view().suggestions_open);

    h.type_query(" M ").await;
    assert!(!h.controller.view().suggestions_open);
    assert_eq!(*h.places.queries.lock().unwrap(), vec!["Mo".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_typing_burst_searches_once() {
    let mut h = harness();
    for query in ["Mo", "Mos", "Mosc", "Mosco"] {
        h.controller
            .dispatch(&Event::input(view::INPUT_ID, query));
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    h.settle().await;

    assert_eq!(*h.places.queries.lock().unwrap(), vec!["Mosco".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_pointer_down_outside_closes_suggestions() {
    let mut h = harness();
    h.type_query("Msk").await;

    h.controller
        .dispatch(&Event::pointer_down(view::INPUT_ID));
    assert!(h.controller.view().suggestions_open);

    h.controller
        .dispatch(&Event::pointer_down(view::TITLE_ID));
    assert!(!h.controller.view().suggestions_open);
}

#[tokio::test(start_paused = true)]
async fn test_geo_location_cannot_be_removed() {
    let mut saved = AppState::default();
    saved.upsert_geo(Location::geo(strings::CURRENT_LOCATION, 10.0, 20.0));
    let mut h = harness_with(Some(saved.clone()), FakeGeo::Denied, false);

    assert!(h.controller.page().find(&view::remove_id("geo")).is_none());
    h.controller.handle(Action::RemoveCity("geo".into()));
    assert_eq!(h.controller.state(), &saved);
}

#[tokio::test(start_paused = true)]
async fn test_removing_selected_city_falls_back() {
    let mut h = harness_with(Some(two_cities()), FakeGeo::Denied, false);
    assert_eq!(h.controller.state().selected_id.as_deref(), Some("fast"));

    h.controller
        .dispatch(&Event::pointer_down(view::remove_id("fast")));
    let_jobs_start().await;
    assert_eq!(h.controller.state().selected_id.as_deref(), Some("slow"));
    assert_eq!(h.forecast_calls(), vec![(SLOW_LAT, 0.0)]);
    assert_eq!(h.saved().locations.len(), 1);

    h.controller
        .dispatch(&Event::pointer_down(view::remove_id("slow")));
    assert!(h.controller.state().locations.is_empty());
    assert_eq!(h.text(view::TITLE_ID), strings::NO_LOCATION);
    assert_eq!(h.text(view::STATUS_ID), strings::PLACEHOLDER);
    assert!(!h.controller.view().refresh_disabled);

    // The cancelled load for "slow" never lands
    h.settle().await;
    assert!(h.controller.view().forecast.is_none());
    assert_eq!(h.text(view::STATUS_ID), strings::PLACEHOLDER);
}

#[tokio::test(start_paused = true)]
async fn test_latest_forecast_request_wins() {
    let mut h = harness_with(Some(two_cities()), FakeGeo::Denied, false);

    h.controller
        .dispatch(&Event::pointer_down(view::chip_name_id("slow")));
    let_jobs_start().await;
    h.controller
        .dispatch(&Event::pointer_down(view::chip_name_id("fast")));
    h.settle().await;

    assert_eq!(h.forecast_calls().len(), 2);
    let forecast = h.controller.view().forecast.clone().unwrap();
    assert_eq!(forecast.days[0].temp_max, Some(2.0));
    assert_eq!(h.text(view::TITLE_ID), "Fastville");
    assert_eq!(h.text(view::STATUS_ID), strings::READY);
}

#[tokio::test(start_paused = true)]
async fn test_forecast_failure_clears_cards() {
    let mut h = harness_with(Some(two_cities()), FakeGeo::Denied, true);
    h.controller.start();
    h.settle().await;

    assert_eq!(h.text(view::STATUS_ID), strings::LOAD_ERROR);
    assert!(h.text(view::CARDS_ID).is_empty());
    assert!(!h.controller.view().refresh_disabled);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_reloads_selected_city() {
    let mut h = harness_with(Some(two_cities()), FakeGeo::Denied, false);
    h.controller.start();
    h.settle().await;

    h.controller.dispatch(&Event::click(view::REFRESH_ID));
    assert!(h.controller.view().refresh_disabled);
    // Disabled while loading
    h.controller.dispatch(&Event::click(view::REFRESH_ID));
    h.settle().await;

    assert_eq!(h.forecast_calls(), vec![(2.0, 0.0), (2.0, 0.0)]);
}

#[tokio::test(start_paused = true)]
async fn test_first_run_uses_device_position() {
    let position = Position {
        latitude: 59.94,
        longitude: 30.31,
    };
    let mut h = harness_with(None, FakeGeo::At(position), false);

    h.controller.start();
    assert_eq!(h.text(view::STATUS_ID), strings::GEO_REQUEST);
    h.settle().await;

    let state = h.controller.state();
    assert_eq!(state.locations.len(), 1);
    assert!(state.locations[0].is_geo);
    assert_eq!(state.selected_id.as_deref(), Some("geo"));
    assert_eq!(h.text(view::TITLE_ID), strings::CURRENT_LOCATION);
    assert_eq!(h.forecast_calls(), vec![(59.94, 30.31)]);
    assert_eq!(h.saved().selected_id.as_deref(), Some("geo"));
}

#[tokio::test(start_paused = true)]
async fn test_denied_geolocation_asks_for_a_city() {
    let mut h = harness();
    h.controller.start();
    h.settle().await;

    assert_eq!(h.text(view::STATUS_ID), strings::GEO_DENIED);
    assert_eq!(h.text(view::TITLE_ID), strings::NO_LOCATION);
    assert!(h.controller.state().locations.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_silent_geolocation_times_out() {
    let mut h = harness_with(None, FakeGeo::Silent, false);
    h.controller.start();
    h.settle().await;

    assert_eq!(h.text(view::STATUS_ID), strings::GEO_DENIED);
    assert!(h.forecast_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_selection_survives_restart() {
    let mut h = harness_with(Some(two_cities()), FakeGeo::Denied, false);
    h.controller
        .dispatch(&Event::pointer_down(view::chip_name_id("slow")));

    let restored = Controller::new(
        StateStore::new(Rc::clone(&h.kv)),
        Services {
            forecast: h.forecast.clone(),
            places: h.places.clone(),
            geolocator: Arc::new(FakeGeo::Denied),
        },
        Settings::default(),
    );
    assert_eq!(restored.state().selected_id.as_deref(), Some("slow"));
}

#[tokio::test(start_paused = true)]
async fn test_hidden_suggestions_cannot_be_picked() {
    let mut h = harness();
    h.type_query("Msk").await;
    h.run_command(Command::Pick(1));
    assert_eq!(h.controller.view().input, "Moscow, Russia");

    // The list is closed now; its second entry is out of reach
    h.run_command(Command::Pick(2));
    assert_eq!(h.controller.view().input, "Moscow, Russia");
    assert_eq!(
        h.controller.view().picked.as_ref().map(|p| p.id.as_str()),
        Some("524901")
    );

    // Shortening the query drops the old list entirely
    h.type_query("M").await;
    assert!(h.controller.view().suggestions.is_empty());
    h.run_command(Command::Pick(1));
    assert!(h.controller.view().picked.is_none());

    h.run_command(Command::Add);
    assert!(h.controller.state().locations.is_empty());
    assert_eq!(h.text(view::CITY_ERROR_ID), strings::PICK_FROM_LIST);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_suggestions_are_dropped() {
    let mut h = harness();
    h.controller
        .dispatch(&Event::input(view::INPUT_ID, "Msk"));
    // Debounce elapses and the "Msk" lookup starts
    h.controller.step().await;
    let stale = h.controller.next_input().await.unwrap();
    assert!(matches!(
        stale,
        Input::Task(TaskEvent::SuggestionsLoaded { .. })
    ));

    h.type_query("Paris").await;
    assert_eq!(h.text(&view::suggestion_id(0)), "Paris, France");

    h.controller.handle_input(stale);
    let names: Vec<_> = h
        .controller
        .view()
        .suggestions
        .iter()
        .map(|s| s.name.clone())
        .collect();
    assert_eq!(names, vec!["Paris, France".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_is_reported_and_app_continues() {
    let forecast = Arc::new(FakeForecast::default());
    let services = Services {
        forecast: forecast.clone(),
        places: Arc::new(FakePlaces::default()),
        geolocator: Arc::new(FakeGeo::Denied),
    };
    let mut controller = Controller::new(
        StateStore::new(ReadOnlyStore),
        services,
        Settings::default(),
    );

    controller.dispatch(&Event::input(view::INPUT_ID, "Msk"));
    settle(&mut controller).await;
    controller.dispatch(&Event::pointer_down(view::suggestion_id(0)));
    controller.dispatch(&Event::click(view::ADD_ID));

    assert_eq!(controller.state().selected_id.as_deref(), Some("524901"));
    assert_eq!(
        text_of(&controller.page(), view::STORAGE_STATUS_ID),
        "Не удалось сохранить данные"
    );

    settle(&mut controller).await;
    assert_eq!(text_of(&controller.page(), view::STATUS_ID), strings::READY);
    assert_eq!(forecast.calls.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_terminal_script_adds_city() {
    let mut h = harness();
    let script = tokio_test::io::Builder::new()
        .read(b"type Msk\n")
        .wait(Duration::from_secs(1))
        .read(b"pick 1\n")
        .read(b"add\n")
        .wait(Duration::from_secs(1))
        .read(b"show\n")
        .read(b"bogus\n")
        .read(b"quit\n")
        .build();

    let mut output = Vec::new();
    terminal::run(&mut h.controller, BufReader::new(script), &mut output)
        .await
        .unwrap();
    let output = String::from_utf8(output).unwrap();

    assert_eq!(h.controller.state().selected_id.as_deref(), Some("524901"));
    assert!(output.starts_with(terminal::HELP));
    assert!(output.contains("! unknown command: bogus"));
    assert!(output.contains("[✕](#rm-524901) [Moscow, Russia](#chip-name-524901)"));
    // Printed when the forecast lands and again for `show`, never for `bogus`
    assert_eq!(output.matches(strings::READY).count(), 2);
}
