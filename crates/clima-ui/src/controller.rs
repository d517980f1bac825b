//! Dashboard controller.
//!
//! Turns user actions and timer ticks into weather lookups and paints the
//! results through a [`DashboardView`]. State lives behind a mutex that is
//! never held across an `.await`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use clima_core::{AppError, Config};
use clima_services::{ClearOutcome, SavedCityStore, ToggleOutcome};
use clima_weather::{
    CurrentConditions, DeviceLocator, ForecastBundle, GeolocationOptions, Geolocator, Location,
    WeatherApi, DEFAULT_FORECAST_DAYS,
};

use crate::error_mapping::IntoAppError;
use crate::render::{
    render_current, render_forecast, render_saved_cities, render_search_results, CurrentView,
    ForecastMode, ForecastView, SavedCitiesView, SavedCityWeather, SearchResultsView,
};

pub const ADDED_TO_FAVORITES: &str = "City added to favorites";
pub const REMOVED_FROM_FAVORITES: &str = "City removed from favorites";
pub const NOTHING_TO_CLEAR: &str = "No saved cities to clear";
pub const ALL_CLEARED: &str = "All saved cities removed";
pub const CLEAR_PROMPT: &str = "Are you sure you want to remove all saved cities?";
pub const EMPTY_QUERY: &str = "Please enter a city name";

/// What started a resolution cycle. Also identifies the control shown as busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Startup,
    Search,
    Geolocation,
    Refresh,
    SavedCity,
}

/// Navigable dashboard sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Current,
    Forecast,
    SavedCities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionState {
    #[default]
    Idle,
    Resolving,
    Ready,
    Failed,
}

#[derive(Debug)]
pub enum ResolutionOutcome {
    /// Data for the location was rendered and it became the current location.
    Ready(Location),
    Failed(AppError),
    /// A newer cycle rendered first; this result was dropped.
    Stale,
    /// The same trigger already has a cycle in flight.
    AlreadyResolving,
    /// Timer tick with no established location.
    Skipped,
}

impl ResolutionOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ResolutionOutcome::Ready(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearSavedOutcome {
    NothingToClear,
    Cancelled,
    Cleared(usize),
}

/// UI surface the controller paints into.
pub trait DashboardView: Send + Sync {
    fn show_current(&self, view: &CurrentView);
    fn show_forecast(&self, view: &ForecastView);
    /// Highlights the daily/hourly toggle.
    fn set_forecast_mode(&self, mode: ForecastMode);
    fn show_search_results(&self, view: &SearchResultsView);
    fn hide_search_results(&self);
    fn show_saved_cities(&self, view: &SavedCitiesView);
    fn set_busy(&self, control: Trigger, busy: bool);
    fn notify(&self, notification: &Notification);
    fn set_active_section(&self, section: Section);
    fn scroll_to(&self, section: Section);
    fn set_last_updated(&self, label: &str);
}

/// Yes/no question put to the user before destructive actions.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub default_location: Location,
    pub forecast_days: u32,
    pub refresh_interval: Duration,
    pub geolocation: GeolocationOptions,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            default_location: Location::new("São Paulo, SP", -23.5505, -46.6333),
            forecast_days: DEFAULT_FORECAST_DAYS,
            refresh_interval: Duration::from_secs(10 * 60),
            geolocation: GeolocationOptions::default(),
        }
    }
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        let default = &config.weather.default_location;
        let geo = &config.geolocation;
        Self {
            default_location: Location::new(
                default.name.clone(),
                default.latitude,
                default.longitude,
            ),
            forecast_days: config.weather.forecast_days,
            refresh_interval: config.weather.refresh_interval(),
            geolocation: GeolocationOptions {
                high_accuracy: geo.high_accuracy,
                timeout: Duration::from_secs(geo.timeout_secs),
                maximum_age: Duration::from_secs(geo.maximum_age_secs),
            },
        }
    }
}

#[derive(Debug, Default)]
struct DashboardState {
    current_location: Option<Location>,
    current: Option<CurrentConditions>,
    forecast: Option<ForecastBundle>,
    mode: ForecastMode,
    search_results: Vec<Location>,
    search_visible: bool,
    search_ticket: u64,
    searches_in_flight: usize,
    resolution: ResolutionState,
    busy: HashSet<Trigger>,
    next_ticket: u64,
    rendered_ticket: u64,
    last_updated: Option<NaiveDateTime>,
    active_section: Section,
}

pub struct DashboardController {
    api: Arc<dyn WeatherApi>,
    locator: DeviceLocator,
    view: Arc<dyn DashboardView>,
    confirm: Arc<dyn Confirm>,
    saved: Arc<Mutex<SavedCityStore>>,
    settings: ControllerSettings,
    state: Mutex<DashboardState>,
}

impl DashboardController {
    pub fn new(
        api: Arc<dyn WeatherApi>,
        geolocator: Arc<dyn Geolocator>,
        saved: SavedCityStore,
        view: Arc<dyn DashboardView>,
        confirm: Arc<dyn Confirm>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            api,
            locator: DeviceLocator::new(geolocator, settings.geolocation),
            view,
            confirm,
            saved: Arc::new(Mutex::new(saved)),
            settings,
            state: Mutex::new(DashboardState::default()),
        }
    }

    pub fn current_location(&self) -> Option<Location> {
        self.state.lock().current_location.clone()
    }

    pub fn current_conditions(&self) -> Option<CurrentConditions> {
        self.state.lock().current.clone()
    }

    pub fn forecast_mode(&self) -> ForecastMode {
        self.state.lock().mode
    }

    pub fn resolution_state(&self) -> ResolutionState {
        self.state.lock().resolution
    }

    pub fn search_results(&self) -> Vec<Location> {
        self.state.lock().search_results.clone()
    }

    pub fn saved_cities(&self) -> Vec<Location> {
        self.saved.lock().cities().to_vec()
    }

    pub fn last_updated(&self) -> Option<NaiveDateTime> {
        self.state.lock().last_updated
    }

    pub fn active_section(&self) -> Section {
        self.state.lock().active_section
    }

    /// Paint saved cities and load the default location.
    pub async fn start(&self) -> ResolutionOutcome {
        tracing::info!("Starting dashboard");
        let location = self.settings.default_location.clone();
        let (outcome, _) = tokio::join!(
            self.resolve(Trigger::Startup, location),
            self.refresh_saved_cities()
        );
        outcome
    }

    pub async fn search(&self, query: &str) -> Result<usize, AppError> {
        let query = query.trim();
        if query.is_empty() {
            let err = AppError::validation(EMPTY_QUERY);
            self.view.notify(&Notification::error(err.user_message()));
            return Err(err);
        }

        let (ticket, first_in_flight) = {
            let mut state = self.state.lock();
            state.search_ticket += 1;
            state.searches_in_flight += 1;
            (state.search_ticket, state.searches_in_flight == 1)
        };

        if first_in_flight {
            self.view.set_busy(Trigger::Search, true);
        }
        let result = self.api.search_cities(query).await;
        let (is_latest, all_done) = {
            let mut state = self.state.lock();
            state.searches_in_flight = state.searches_in_flight.saturating_sub(1);
            (ticket == state.search_ticket, state.searches_in_flight == 0)
        };
        if all_done {
            self.view.set_busy(Trigger::Search, false);
        }

        let cities = match result {
            Ok(cities) => cities,
            Err(e) => {
                let err = e.into_app_error();
                if !is_latest {
                    tracing::debug!(
                        "Ignoring failure of superseded search {:?}: {}",
                        query,
                        err
                    );
                    return Err(err);
                }
                tracing::warn!("City search for {:?} failed: {}", query, err);
                self.view.notify(&Notification::error(format!(
                    "Error searching for city: {}",
                    err.user_message()
                )));
                return Err(err);
            }
        };

        let count = cities.len();
        {
            let mut state = self.state.lock();
            if ticket != state.search_ticket {
                tracing::debug!("Dropping results of superseded search {:?}", query);
                return Ok(count);
            }
            state.search_results = cities.clone();
            state.search_visible = true;
        }

        let view = render_search_results(&cities, &self.saved.lock());
        self.view.show_search_results(&view);
        Ok(count)
    }

    /// Emptying the search box hides the results panel.
    pub fn clear_search_input(&self) {
        {
            let mut state = self.state.lock();
            state.search_results.clear();
            state.search_visible = false;
            state.search_ticket += 1;
        }
        self.view.hide_search_results();
    }

    pub async fn select_search_result(&self, index: usize) -> ResolutionOutcome {
        let location = self.state.lock().search_results.get(index).cloned();
        let Some(location) = location else {
            let err = AppError::validation(format!("No search result #{}", index + 1));
            self.view.notify(&Notification::error(err.user_message()));
            return ResolutionOutcome::Failed(err);
        };

        self.clear_search_input();
        self.resolve(Trigger::Search, location).await
    }

    /// Open a location directly, e.g. from a saved-city card.
    pub async fn select_location(&self, location: Location) -> ResolutionOutcome {
        self.navigate(Section::Current);
        self.resolve(Trigger::SavedCity, location).await
    }

    pub async fn use_device_location(&self) -> ResolutionOutcome {
        let trigger = Trigger::Geolocation;
        let Some(ticket) = self.begin(trigger) else {
            return ResolutionOutcome::AlreadyResolving;
        };

        let outcome = match self.locator.locate().await {
            Ok(location) => self.fetch_and_apply(ticket, location).await,
            Err(e) => self.fail(ticket, "Could not get your location", e.into_app_error()),
        };

        self.end(trigger);
        outcome
    }

    /// Timer-driven reload of the current location.
    pub async fn refresh(&self) -> ResolutionOutcome {
        let location = self.state.lock().current_location.clone();
        match location {
            Some(location) => self.resolve(Trigger::Refresh, location).await,
            None => {
                tracing::debug!("No location established, skipping refresh");
                ResolutionOutcome::Skipped
            }
        }
    }

    /// Runs [`refresh`](Self::refresh) every refresh interval until cancelled.
    pub async fn run_refresh_loop(&self, cancel: CancellationToken) {
        let period = self.settings.refresh_interval;
        if period.is_zero() {
            tracing::info!("Periodic refresh disabled");
            return;
        }
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Refreshing weather every {:?}", period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Refresh loop stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.refresh().await;
                }
            }
        }
    }

    pub fn show_daily(&self) {
        self.set_mode(ForecastMode::Daily);
    }

    pub fn show_hourly(&self) {
        self.set_mode(ForecastMode::Hourly);
    }

    fn set_mode(&self, mode: ForecastMode) {
        let today = Local::now().date_naive();
        let view = {
            let mut state = self.state.lock();
            state.mode = mode;
            state
                .forecast
                .as_ref()
                .map(|bundle| render_forecast(bundle, mode, today))
        };

        self.view.set_forecast_mode(mode);
        if let Some(view) = view {
            self.view.show_forecast(&view);
        }
    }

    pub async fn toggle_saved(&self, location: Location) -> Result<ToggleOutcome, AppError> {
        let outcome = self
            .update_saved(move |store| store.toggle(location))
            .await?;
        let message = match outcome {
            ToggleOutcome::Added => ADDED_TO_FAVORITES,
            ToggleOutcome::Removed => REMOVED_FROM_FAVORITES,
        };
        self.view.notify(&Notification::success(message));

        self.repaint_search_results();
        self.refresh_saved_cities().await;
        Ok(outcome)
    }

    pub async fn remove_saved(&self, location: &Location) -> Result<(), AppError> {
        let location = location.clone();
        self.update_saved(move |store| store.remove(&location))
            .await?;
        self.view.notify(&Notification::success(REMOVED_FROM_FAVORITES));

        self.repaint_search_results();
        self.refresh_saved_cities().await;
        Ok(())
    }

    pub async fn clear_saved(&self) -> Result<ClearSavedOutcome, AppError> {
        let is_empty = self.saved.lock().is_empty();
        if is_empty {
            self.view.notify(&Notification::error(NOTHING_TO_CLEAR));
            return Ok(ClearSavedOutcome::NothingToClear);
        }

        if !self.confirm.confirm(CLEAR_PROMPT).await {
            return Ok(ClearSavedOutcome::Cancelled);
        }

        let outcome = self.update_saved(SavedCityStore::clear).await?;
        let ClearOutcome::Cleared(count) = outcome else {
            return Ok(ClearSavedOutcome::NothingToClear);
        };

        tracing::info!("Cleared {} saved cities", count);
        self.view.notify(&Notification::success(ALL_CLEARED));
        self.repaint_search_results();
        self.refresh_saved_cities().await;
        Ok(ClearSavedOutcome::Cleared(count))
    }

    /// Fetch current conditions for every saved city and repaint the cards.
    ///
    /// Each lookup is independent; a failure only affects its own card.
    pub async fn refresh_saved_cities(&self) -> SavedCitiesView {
        let cities = self.saved_cities();

        let lookups = cities.into_iter().map(|location| async move {
            let weather = match self.api.fetch_current(&location).await {
                Ok(weather) => Some(weather),
                Err(e) => {
                    tracing::warn!("Failed to load weather for {}: {}", location.name, e);
                    None
                }
            };
            SavedCityWeather { location, weather }
        });
        let results = join_all(lookups).await;

        let view = render_saved_cities(&results);
        self.view.show_saved_cities(&view);
        view
    }

    pub fn navigate(&self, section: Section) {
        self.state.lock().active_section = section;
        self.view.set_active_section(section);
        self.view.scroll_to(section);
    }

    /// Applies a store mutation on the blocking pool, where its storage write happens.
    async fn update_saved<R, F>(&self, update: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut SavedCityStore) -> R + Send + 'static,
        R: Send + 'static,
    {
        let saved = Arc::clone(&self.saved);
        let result = tokio::task::spawn_blocking(move || {
            let mut store = saved.lock();
            update(&mut store)
        })
        .await;

        result.map_err(|e| {
            let err = AppError::storage(e.to_string());
            tracing::warn!("Saved cities update failed: {}", err);
            self.view.notify(&Notification::error(err.user_message()));
            err
        })
    }

    fn repaint_search_results(&self) {
        let cities = {
            let state = self.state.lock();
            if !state.search_visible {
                return;
            }
            state.search_results.clone()
        };
        let view = render_search_results(&cities, &self.saved.lock());
        self.view.show_search_results(&view);
    }

    async fn resolve(&self, trigger: Trigger, location: Location) -> ResolutionOutcome {
        let Some(ticket) = self.begin(trigger) else {
            tracing::debug!("{:?} already resolving, ignoring", trigger);
            return ResolutionOutcome::AlreadyResolving;
        };

        let outcome = self.fetch_and_apply(ticket, location).await;
        self.end(trigger);
        outcome
    }

    /// Marks `trigger` busy and hands out a ticket, unless it is already busy.
    fn begin(&self, trigger: Trigger) -> Option<u64> {
        let ticket = {
            let mut state = self.state.lock();
            if !state.busy.insert(trigger) {
                return None;
            }
            state.next_ticket += 1;
            state.resolution = ResolutionState::Resolving;
            state.next_ticket
        };
        self.view.set_busy(trigger, true);
        Some(ticket)
    }

    fn end(&self, trigger: Trigger) {
        self.state.lock().busy.remove(&trigger);
        self.view.set_busy(trigger, false);
    }

    async fn fetch_and_apply(&self, ticket: u64, location: Location) -> ResolutionOutcome {
        let days = self.settings.forecast_days;
        let (current, forecast) = tokio::join!(
            self.api.fetch_current(&location),
            self.api.fetch_forecast(&location, days)
        );

        match current.and_then(|current| forecast.map(|forecast| (current, forecast))) {
            Ok((current, forecast)) => self.apply(ticket, location, current, forecast),
            Err(e) => self.fail(
                ticket,
                "Error loading weather data",
                e.into_app_error(),
            ),
        }
    }

    fn apply(
        &self,
        ticket: u64,
        location: Location,
        current: CurrentConditions,
        forecast: ForecastBundle,
    ) -> ResolutionOutcome {
        let now = Local::now().naive_local();
        let (current_view, forecast_view) = {
            let mut state = self.state.lock();
            if ticket <= state.rendered_ticket {
                tracing::debug!("Discarding stale result for {}", location.name);
                return ResolutionOutcome::Stale;
            }
            state.rendered_ticket = ticket;

            let current_view = render_current(&current);
            let forecast_view = render_forecast(&forecast, state.mode, now.date());

            state.current_location = Some(location.clone());
            state.current = Some(current);
            state.forecast = Some(forecast);
            state.resolution = ResolutionState::Ready;
            state.last_updated = Some(now);
            (current_view, forecast_view)
        };

        self.view.show_current(&current_view);
        self.view.show_forecast(&forecast_view);
        self.view
            .set_last_updated(&format!("Updated at {}", now.format("%H:%M:%S")));

        tracing::info!("Weather loaded for {}", location.name);
        ResolutionOutcome::Ready(location)
    }

    fn fail(&self, ticket: u64, context: &str, error: AppError) -> ResolutionOutcome {
        {
            let mut state = self.state.lock();
            if ticket <= state.rendered_ticket {
                return ResolutionOutcome::Stale;
            }
            state.resolution = ResolutionState::Failed;
        }

        tracing::warn!("{}: {}", context, error);
        self.view.notify(&Notification::error(format!(
            "{}: {}",
            context,
            error.user_message()
        )));
        ResolutionOutcome::Failed(error)
    }
}

impl std::fmt::Debug for DashboardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardController")
            .field("settings", &self.settings)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
