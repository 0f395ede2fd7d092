//! Page rendering.
//!
//! Render functions are pure: they take the saved state and the view state
//! by reference and return a fresh element tree.

use chrono::NaiveDate;
use wxdash_core::{AppState, Location};
use wxdash_weather::{weather_info, Forecast, ForecastDay, PlaceSuggestion};

use crate::controller::Action;
use crate::dom::{el, text, ElementSpec, EventKind, Node};
use crate::strings;

pub const ROOT_ID: &str = "app";
pub const TITLE_ID: &str = "loc-title";
pub const STATUS_ID: &str = "loc-status";
pub const CARDS_ID: &str = "cards";
pub const REFRESH_ID: &str = "btn-refresh";
pub const INPUT_ID: &str = "city-input";
pub const SUGGEST_ID: &str = "suggest";
pub const ADD_ID: &str = "btn-add";
pub const CITY_ERROR_ID: &str = "city-error";
pub const CHIPS_ID: &str = "chips";
pub const STORAGE_STATUS_ID: &str = "status";

pub fn suggestion_id(index: usize) -> String {
    format!("suggest-{index}")
}

pub fn chip_id(location_id: &str) -> String {
    format!("chip-{location_id}")
}

pub fn chip_name_id(location_id: &str) -> String {
    format!("chip-name-{location_id}")
}

pub fn remove_id(location_id: &str) -> String {
    format!("rm-{location_id}")
}

/// Coordinates of the suggestion the user picked, attached to the input
#[derive(Debug, Clone, PartialEq)]
pub struct PickedPlace {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

/// Everything on screen that is not part of the saved state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub title: String,
    pub status: String,
    pub storage_status: String,
    /// `None` renders no cards
    pub forecast: Option<Forecast>,
    pub refresh_disabled: bool,
    pub input: String,
    pub picked: Option<PickedPlace>,
    pub suggestions: Vec<PlaceSuggestion>,
    pub suggestions_open: bool,
    pub city_error: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            title: strings::PLACEHOLDER.to_string(),
            status: strings::PLACEHOLDER.to_string(),
            storage_status: strings::STORAGE_OK.to_string(),
            forecast: None,
            refresh_disabled: false,
            input: String::new(),
            picked: None,
            suggestions: Vec::new(),
            suggestions_open: false,
            city_error: String::new(),
        }
    }
}

/// Name shown for a location in titles and chips
pub fn display_name(location: &Location) -> &str {
    if location.is_geo {
        strings::CURRENT_LOCATION
    } else {
        &location.name
    }
}

/// Round half toward positive infinity, so -2.5 becomes -2.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn degrees(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}°", round_half_up(v)),
        None => format!("{}°", strings::PLACEHOLDER),
    }
}

/// "Сегодня", "Завтра", then dd.mm
pub fn day_label(index: usize, date: NaiveDate) -> String {
    match index {
        0 => strings::TODAY.to_string(),
        1 => strings::TOMORROW.to_string(),
        _ => date.format("%d.%m").to_string(),
    }
}

fn forecast_card(index: usize, day: &ForecastDay) -> Node<Action> {
    let info = weather_info(day.weather_code);
    el(
        ElementSpec::new("div").class("card"),
        [
            el(
                ElementSpec::new("div")
                    .class("day")
                    .text(day_label(index, day.date)),
                [],
            ),
            el(
                ElementSpec::new("div")
                    .class("temp")
                    .text(format!("{} {}", degrees(day.temp_max), info.glyph)),
                [],
            ),
            el(
                ElementSpec::new("div").class("sub").text(format!(
                    "{} {}  •  {}",
                    strings::MIN_PREFIX,
                    degrees(day.temp_min),
                    info.label
                )),
                [],
            ),
        ],
    )
}

/// One card per forecast day
pub fn forecast_cards(forecast: &Forecast) -> Vec<Node<Action>> {
    forecast
        .days
        .iter()
        .enumerate()
        .map(|(i, day)| forecast_card(i, day))
        .collect()
}

fn city_chip(location: &Location, active: bool) -> Node<Action> {
    let class = if active { "chip active" } else { "chip" };

    let marker = if location.is_geo {
        el(ElementSpec::new("span").class("rm").text(strings::GEO_GLYPH), [])
    } else {
        el(
            ElementSpec::new("button")
                .id(remove_id(&location.id))
                .class("rm")
                .attr("type", "button")
                .attr("title", strings::REMOVE)
                .text(strings::REMOVE_GLYPH)
                .on_stop(EventKind::PointerDown, Action::RemoveCity(location.id.clone())),
            [],
        )
    };

    let name = el(
        ElementSpec::new("button")
            .id(chip_name_id(&location.id))
            .class("name")
            .attr("type", "button")
            .text(display_name(location))
            .on_stop(EventKind::PointerDown, Action::SelectCity(location.id.clone())),
        [],
    );

    el(
        ElementSpec::new("div").id(chip_id(&location.id)).class(class),
        [marker, name],
    )
}

/// One chip per saved location, the selected one marked active
pub fn city_chips(state: &AppState) -> Vec<Node<Action>> {
    state
        .locations
        .iter()
        .map(|loc| city_chip(loc, state.is_selected(&loc.id)))
        .collect()
}

/// Buttons for the suggestion box
pub fn suggestion_list(items: &[PlaceSuggestion]) -> Vec<Node<Action>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            el(
                ElementSpec::new("button")
                    .id(suggestion_id(i))
                    .attr("type", "button")
                    .text(item.name.clone())
                    .on_stop(EventKind::PointerDown, Action::PickSuggestion(item.clone())),
                [],
            )
        })
        .collect()
}

/// The whole page
pub fn render_page(state: &AppState, view: &ViewState) -> Node<Action> {
    let header = el(
        ElementSpec::new("header").class("header"),
        [
            el(ElementSpec::new("h1").text(strings::APP_TITLE), []),
            el(
                ElementSpec::new("div").class("actions"),
                [el(
                    ElementSpec::new("button")
                        .id(REFRESH_ID)
                        .class("btn btn-primary")
                        .attr("type", "button")
                        .flag("disabled", view.refresh_disabled)
                        .text(strings::REFRESH)
                        .on(EventKind::Click, Action::Refresh),
                    [],
                )],
            ),
        ],
    );

    let cards = view
        .forecast
        .as_ref()
        .map(forecast_cards)
        .unwrap_or_default();

    let panel = el(
        ElementSpec::new("section").class("panel"),
        [
            el(
                ElementSpec::new("div").class("title-row"),
                [
                    el(
                        ElementSpec::new("h2").id(TITLE_ID).text(view.title.clone()),
                        [],
                    ),
                    el(
                        ElementSpec::new("div")
                            .id(STATUS_ID)
                            .class("status")
                            .text(view.status.clone()),
                        [],
                    ),
                ],
            ),
            el(ElementSpec::new("div").id(CARDS_ID).class("cards"), cards),
        ],
    );

    let mut input = ElementSpec::new("input")
        .id(INPUT_ID)
        .class("input")
        .attr("placeholder", strings::ADD_PLACEHOLDER)
        .attr("value", view.input.clone())
        .on_value(EventKind::Input, Action::QueryChanged);
    if let Some(picked) = &view.picked {
        input = input
            .attr("data-sel-id", picked.id.clone())
            .attr("data-lat", picked.lat.to_string())
            .attr("data-lon", picked.lon.to_string());
    }

    let suggest = el(
        ElementSpec::new("div")
            .id(SUGGEST_ID)
            .class("suggest")
            .flag("hidden", !view.suggestions_open),
        suggestion_list(&view.suggestions),
    );

    let sidebar = el(
        ElementSpec::new("aside").class("panel sidebar"),
        [
            el(ElementSpec::new("h3").text(strings::CITIES), []),
            el(
                ElementSpec::new("div").class("input-row"),
                [
                    el(
                        ElementSpec::new("div").class("dropdown"),
                        [el(input, []), suggest],
                    ),
                    el(
                        ElementSpec::new("button")
                            .id(ADD_ID)
                            .class("btn btn-ghost")
                            .attr("type", "button")
                            .text(strings::ADD)
                            .on(EventKind::Click, Action::AddCity),
                        [],
                    ),
                ],
            ),
            el(
                ElementSpec::new("div")
                    .id(CITY_ERROR_ID)
                    .class("err")
                    .text(view.city_error.clone()),
                [],
            ),
            el(ElementSpec::new("div").id(CHIPS_ID).class("chips"), city_chips(state)),
            el(
                ElementSpec::new("div")
                    .id(STORAGE_STATUS_ID)
                    .class("status")
                    .text(view.storage_status.clone()),
                [],
            ),
        ],
    );

    el(
        ElementSpec::new("div")
            .id(ROOT_ID)
            .class("container")
            .on_target(EventKind::PointerDown, |target| Action::PointerDown { target }),
        [
            header,
            el(ElementSpec::new("div").class("layout"), [panel, sidebar]),
        ],
    )
}

/// Text of the element with `id`, empty if absent
pub fn text_of(page: &Node<Action>, id: &str) -> String {
    page.find(id).map(|e| e.text_content()).unwrap_or_default()
}
