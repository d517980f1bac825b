//! Display structures for the dashboard.
//!
//! Everything here is a pure function of its inputs: no I/O, no clock reads.
//! Callers pass `today` explicitly so date labels are deterministic.

use chrono::NaiveDate;

use clima_services::SavedCityStore;
use clima_weather::{
    icon_for_code, CurrentConditions, DayForecast, ForecastBundle, HourForecast, Location,
};

/// 16-point compass, clockwise from north.
pub const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub const SAVED_CITY_FAILED: &str = "Failed to load weather data";
pub const NO_SAVED_CITIES: &str = "No saved cities yet";
pub const NO_SAVED_CITIES_HINT: &str = "Search for a city and tap the star to save it";
pub const NO_SEARCH_RESULTS: &str = "No cities found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastMode {
    #[default]
    Daily,
    Hourly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentView {
    pub location_name: String,
    pub coordinates: String,
    pub icon: &'static str,
    pub description: String,
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind_speed: String,
    pub wind_direction: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyCard {
    pub label: String,
    pub icon: &'static str,
    pub description: String,
    pub temperature_max: String,
    pub temperature_min: String,
    /// Only present when some precipitation is expected
    pub precipitation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyCard {
    pub time: String,
    pub icon: &'static str,
    pub temperature: String,
    pub humidity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastView {
    Daily(Vec<DailyCard>),
    Hourly(Vec<HourlyCard>),
}

impl ForecastView {
    pub fn mode(&self) -> ForecastMode {
        match self {
            ForecastView::Daily(_) => ForecastMode::Daily,
            ForecastView::Hourly(_) => ForecastMode::Hourly,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultRow {
    pub index: usize,
    pub name: String,
    pub coordinates: String,
    pub is_saved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchResultsView {
    Empty { message: &'static str },
    Results(Vec<SearchResultRow>),
}

/// A saved city together with its latest conditions, if they could be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedCityWeather {
    pub location: Location,
    pub weather: Option<CurrentConditions>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SavedCityStatus {
    Weather {
        icon: &'static str,
        temperature: String,
        description: String,
    },
    Failed {
        message: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedCityCard {
    pub location: Location,
    pub name: String,
    pub status: SavedCityStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SavedCitiesView {
    Empty {
        message: &'static str,
        hint: &'static str,
    },
    Cards(Vec<SavedCityCard>),
}

/// Nearest of the 16 compass points; any finite degree value is accepted.
pub fn compass_point(degrees: f64) -> &'static str {
    let index = round_half_up(degrees / 22.5);
    COMPASS_POINTS[index.rem_euclid(16) as usize]
}

/// Nearest integer, halves rounded up (-2.5 becomes -2).
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn format_celsius(value: f64) -> String {
    format!("{}°C", round_half_up(value))
}

/// "Today", "Tomorrow" or a short date such as `Wed, 17 Jan`.
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.succ_opt() {
        "Tomorrow".to_string()
    } else {
        date.format("%a, %-d %b").to_string()
    }
}

pub fn render_current(data: &CurrentConditions) -> CurrentView {
    let location = Location::new(data.location.clone(), data.latitude, data.longitude);
    CurrentView {
        location_name: data.location.clone(),
        coordinates: location.format_coordinates(),
        icon: icon_for_code(data.weather_code),
        description: data.description.clone(),
        temperature: format_celsius(data.temperature),
        // the backend has no apparent temperature; show the air temperature
        feels_like: format_celsius(data.temperature),
        humidity: format!("{}%", round_half_up(data.humidity)),
        wind_speed: format!("{:.1} km/h", data.wind_speed),
        wind_direction: compass_point(data.wind_direction),
    }
}

fn daily_card(day: &DayForecast, today: NaiveDate) -> DailyCard {
    DailyCard {
        label: date_label(day.date, today),
        icon: icon_for_code(day.weather_code),
        description: day.description.clone(),
        temperature_max: format!("{}°", round_half_up(day.temperature_max)),
        temperature_min: format!("{}°", round_half_up(day.temperature_min)),
        precipitation: (day.precipitation > 0.0).then(|| format!("{} mm", day.precipitation)),
    }
}

fn hourly_card(hour: &HourForecast) -> HourlyCard {
    HourlyCard {
        time: hour.time.format("%H:%M").to_string(),
        icon: icon_for_code(hour.weather_code),
        temperature: format_celsius(hour.temperature),
        humidity: format!("{}%", round_half_up(hour.humidity)),
    }
}

pub fn render_forecast(
    bundle: &ForecastBundle,
    mode: ForecastMode,
    today: NaiveDate,
) -> ForecastView {
    match mode {
        ForecastMode::Daily => ForecastView::Daily(
            bundle
                .daily
                .iter()
                .map(|day| daily_card(day, today))
                .collect(),
        ),
        ForecastMode::Hourly => {
            ForecastView::Hourly(bundle.hourly.iter().map(hourly_card).collect())
        }
    }
}

pub fn render_saved_cities(cities: &[SavedCityWeather]) -> SavedCitiesView {
    if cities.is_empty() {
        return SavedCitiesView::Empty {
            message: NO_SAVED_CITIES,
            hint: NO_SAVED_CITIES_HINT,
        };
    }

    let cards = cities
        .iter()
        .map(|city| {
            let status = match &city.weather {
                Some(weather) => SavedCityStatus::Weather {
                    icon: icon_for_code(weather.weather_code),
                    temperature: format_celsius(weather.temperature),
                    description: weather.description.clone(),
                },
                None => SavedCityStatus::Failed {
                    message: SAVED_CITY_FAILED,
                },
            };
            SavedCityCard {
                location: city.location.clone(),
                name: city.location.name.clone(),
                status,
            }
        })
        .collect();

    SavedCitiesView::Cards(cards)
}

pub fn render_search_results(cities: &[Location], store: &SavedCityStore) -> SearchResultsView {
    if cities.is_empty() {
        return SearchResultsView::Empty {
            message: NO_SEARCH_RESULTS,
        };
    }

    SearchResultsView::Results(
        cities
            .iter()
            .enumerate()
            .map(|(index, city)| SearchResultRow {
                index,
                name: city.name.clone(),
                coordinates: city.format_coordinates(),
                is_saved: store.is_saved(city),
            })
            .collect(),
    )
}
