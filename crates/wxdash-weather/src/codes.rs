//! WMO weather code → glyph and Russian label.
//! See: https://open-meteo.com/en/docs#weathervariables

/// Display pair for a weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherInfo {
    pub glyph: &'static str,
    pub label: &'static str,
}

const fn info(glyph: &'static str, label: &'static str) -> WeatherInfo {
    WeatherInfo { glyph, label }
}

/// Shown for codes missing from the table
pub const UNKNOWN: WeatherInfo = info("❔", "Погода");

/// Look up a weather code. `None` (a missing sample) maps to [`UNKNOWN`].
pub fn weather_info(code: Option<i32>) -> WeatherInfo {
    let Some(code) = code else {
        return UNKNOWN;
    };
    match code {
        0 => info("☀️", "Ясно"),
        1 => info("🌤️", "Преимущественно ясно"),
        2 => info("⛅", "Переменная облачность"),
        3 => info("☁️", "Облачно"),
        45 => info("🌫️", "Туман"),
        48 => info("🌫️", "Иней/туман"),
        51 | 53 => info("🌦️", "Морось"),
        55 => info("🌧️", "Сильная морось"),
        56 => info("🌧️", "Ледяная морось"),
        57 => info("🌧️", "Сильная ледяная морось"),
        61 => info("🌦️", "Слабый дождь"),
        63 => info("🌧️", "Дождь"),
        65 => info("🌧️", "Ливень"),
        66 => info("🌧️", "Ледяной дождь"),
        67 => info("🌧️", "Сильный ледяной дождь"),
        71 | 73 => info("🌨️", "Снег"),
        75 => info("❄️", "Сильный снег"),
        77 => info("🌨️", "Снежная крупа"),
        80 | 81 => info("🌦️", "Кратковременные дожди"),
        82 => info("🌧️", "Ливни"),
        85 => info("🌨️", "Снегопад"),
        86 => info("❄️", "Сильный снегопад"),
        95 => info("⛈️", "Гроза"),
        96 => info("⛈️", "Гроза с градом"),
        99 => info("⛈️", "Сильная гроза с градом"),
        _ => UNKNOWN,
    }
}
