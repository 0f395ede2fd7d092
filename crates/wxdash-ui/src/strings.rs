//! User-visible text (ru-RU).

pub const APP_TITLE: &str = "Погода";
pub const REFRESH: &str = "Обновить";
pub const CITIES: &str = "Города";
pub const ADD: &str = "Добавить";
pub const ADD_PLACEHOLDER: &str = "Добавить город";
pub const REMOVE: &str = "Удалить";
pub const REMOVE_GLYPH: &str = "✕";
pub const GEO_GLYPH: &str = "📍";

pub const PLACEHOLDER: &str = "—";
pub const CURRENT_LOCATION: &str = "Текущее местоположение";
pub const NO_LOCATION: &str = "Нет локации";

pub const LOADING: &str = "Загрузка…";
pub const READY: &str = "Готово";
pub const LOAD_ERROR: &str = "Ошибка загрузки прогноза";
pub const GEO_REQUEST: &str = "Запрашиваем геолокацию…";
pub const GEO_DENIED: &str = "Геолокация отклонена — добавьте город";
pub const STORAGE_OK: &str = "Данные сохраняются локально";

pub const PICK_FROM_LIST: &str = "Выберите город из выпадающего списка";
pub const ALREADY_ADDED: &str = "Город уже добавлен";

pub const TODAY: &str = "Сегодня";
pub const TOMORROW: &str = "Завтра";
pub const MIN_PREFIX: &str = "мин";
