//! One dashboard session: locate once, resolve the city/district pair, and
//! show weather for whichever slot is selected.
//!
//! All state lives in [`SessionState`], which presentation code only reads.
//! Every upstream failure ends up as a status string in that record; nothing
//! escapes [`LocationSession`] as an error.

use serde::Serialize;
use std::sync::Arc;

use crate::{
    cache::WeatherCache,
    config::HomeRegion,
    error::GeolocationError,
    geocoding::Geocoder,
    location::LocationProvider,
    model::{Coordinates, PlaceName, Slot, WeatherSnapshot},
    provider::WeatherSource,
};

pub const LOCATION_NAME_FAILED: &str = "Unable to determine location name";
pub const WEATHER_FAILED: &str = "Unable to fetch weather data";
pub const UNKNOWN_DISTRICT: &str = "Unknown District";

/// Receives the position of the slot currently on screen, e.g. a map overlay.
pub trait MarkerSink: Send {
    fn update_marker(&mut self, coords: Coordinates);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", content = "error", rename_all = "snake_case")]
pub enum LocatePhase {
    Locating,
    Located,
    LocateFailed(GeolocationErrorView),
}

/// Serializable view of a [`GeolocationError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeolocationErrorView {
    pub kind: &'static str,
    pub message: String,
}

impl From<&GeolocationError> for GeolocationErrorView {
    fn from(error: &GeolocationError) -> Self {
        let kind = match error {
            GeolocationError::PermissionDenied => "permission_denied",
            GeolocationError::Unavailable => "unavailable",
            GeolocationError::Timeout => "timeout",
            GeolocationError::Unsupported => "unsupported",
            GeolocationError::Other(_) => "other",
        };

        Self {
            kind,
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum WeatherView {
    #[default]
    Pending,
    Ready(Arc<WeatherSnapshot>),
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SlotCoordinates {
    pub city: Option<Coordinates>,
    pub district: Option<Coordinates>,
}

impl SlotCoordinates {
    pub fn get(&self, slot: Slot) -> Option<Coordinates> {
        match slot {
            Slot::City => self.city,
            Slot::District => self.district,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub phase: LocatePhase,
    pub place: PlaceName,
    pub coordinates: SlotCoordinates,
    pub selected: Slot,
    pub weather: WeatherView,
    /// Non-fatal location problems, e.g. a failed reverse geocode.
    pub location_status: Option<String>,
    pub home_name: String,
}

impl SessionState {
    fn new(selected: Slot, home_name: String) -> Self {
        Self {
            phase: LocatePhase::Locating,
            place: PlaceName::default(),
            coordinates: SlotCoordinates::default(),
            selected,
            weather: WeatherView::Pending,
            location_status: None,
            home_name,
        }
    }

    /// Name shown on the toggle for `slot`.
    pub fn slot_label(&self, slot: Slot) -> &str {
        match slot {
            Slot::City => self.place.city.as_deref().unwrap_or(&self.home_name),
            Slot::District => self.place.district.as_deref().unwrap_or(UNKNOWN_DISTRICT),
        }
    }

    pub fn selected_coordinates(&self) -> Option<Coordinates> {
        self.coordinates.get(self.selected)
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match &self.weather {
            WeatherView::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

pub struct LocationSession {
    locator: Box<dyn LocationProvider>,
    geocoder: Box<dyn Geocoder>,
    weather: Box<dyn WeatherSource>,
    home: HomeRegion,
    cache: WeatherCache,
    marker: Option<Box<dyn MarkerSink>>,
    state: SessionState,
}

impl LocationSession {
    pub fn new(
        locator: Box<dyn LocationProvider>,
        geocoder: Box<dyn Geocoder>,
        weather: Box<dyn WeatherSource>,
        home: HomeRegion,
        default_slot: Slot,
    ) -> Self {
        let state = SessionState::new(default_slot, home.name.clone());

        Self {
            locator,
            geocoder,
            weather,
            home,
            cache: WeatherCache::new(),
            marker: None,
            state,
        }
    }

    pub fn with_marker(mut self, marker: Box<dyn MarkerSink>) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    /// Acquire the position once, resolve names and coordinates, then load
    /// weather for the selected slot. Later calls do nothing.
    pub async fn start(&mut self) {
        if self.state.phase != LocatePhase::Locating {
            tracing::debug!("session already started");
            return;
        }

        let device = match self.locator.current_position().await {
            Ok(coords) => coords,
            Err(error) => {
                tracing::warn!(%error, detail = ?error, "geolocation failed");
                self.state.location_status = Some(error.to_string());
                self.state.phase = LocatePhase::LocateFailed((&error).into());
                return;
            }
        };

        self.state.phase = LocatePhase::Located;

        self.state.place = match self.geocoder.reverse_geocode(device).await {
            Ok(place) => place,
            Err(error) => {
                tracing::warn!(%error, "reverse geocoding failed; place names left unresolved");
                self.state.location_status = Some(LOCATION_NAME_FAILED.to_string());
                PlaceName::unresolved()
            }
        };

        let city = self.resolve_home_coordinates().await;

        self.state.coordinates = SlotCoordinates {
            city: Some(city),
            district: Some(device),
        };

        self.show_selected_marker();
        self.load_selected().await;
    }

    /// Switch the displayed slot. Ignored when the slot is already shown or its
    /// coordinates are not known yet.
    pub async fn select(&mut self, slot: Slot) {
        if slot == self.state.selected {
            return;
        }
        if self.state.coordinates.get(slot).is_none() {
            tracing::debug!(%slot, "slot has no coordinates yet; ignoring selection");
            return;
        }

        self.state.selected = slot;
        self.show_selected_marker();
        self.load_selected().await;
    }

    /// Cache-or-fetch for the selected slot. After a failed fetch this issues a
    /// new request, since failures are never cached.
    pub async fn reload(&mut self) {
        self.load_selected().await;
    }

    /// Fetch the selected slot again, replacing its cache entry on success.
    pub async fn refresh(&mut self) {
        let slot = self.state.selected;
        let Some(coords) = self.state.coordinates.get(slot) else {
            return;
        };

        tracing::info!(%slot, "refreshing weather");
        let weather = &self.weather;
        let result = self
            .cache
            .refresh(slot, coords, move |c| weather.fetch_weather(c))
            .await;
        self.apply_weather(slot, result);
    }

    async fn resolve_home_coordinates(&self) -> Coordinates {
        match self
            .geocoder
            .forward_geocode(&self.home.name, &self.home.name)
            .await
        {
            Ok(Some(coords)) => coords,
            Ok(None) => {
                tracing::warn!(home = %self.home.name, "home region not found; using fallback point");
                self.home.fallback
            }
            Err(error) => {
                tracing::warn!(%error, "forward geocoding failed; using fallback point");
                self.home.fallback
            }
        }
    }

    async fn load_selected(&mut self) {
        let slot = self.state.selected;
        let Some(coords) = self.state.coordinates.get(slot) else {
            return;
        };

        let weather = &self.weather;
        let result = self
            .cache
            .load_or_fetch(slot, coords, move |c| weather.fetch_weather(c))
            .await;
        self.apply_weather(slot, result);
    }

    fn apply_weather<E: std::fmt::Display>(
        &mut self,
        slot: Slot,
        result: Result<Arc<WeatherSnapshot>, E>,
    ) {
        self.state.weather = match result {
            Ok(snapshot) => WeatherView::Ready(snapshot),
            Err(error) => {
                tracing::warn!(%slot, %error, "weather fetch failed");
                WeatherView::Failed(WEATHER_FAILED.to_string())
            }
        };
    }

    fn show_selected_marker(&mut self) {
        if let (Some(marker), Some(coords)) = (self.marker.as_mut(), self.state.selected_coordinates()) {
            marker.update_marker(coords);
        }
    }
}

impl std::fmt::Debug for LocationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationSession")
            .field("locator", &self.locator)
            .field("geocoder", &self.geocoder)
            .field("weather", &self.weather)
            .field("cache", &self.cache)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GeocodeError, WeatherFetchError};
    use async_trait::async_trait;
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    const DEVICE: Coordinates = Coordinates::new(22.2819, 114.1585);
    const HOME: Coordinates = Coordinates::new(22.35, 114.18);

    #[derive(Debug, Default)]
    struct Counters {
        locate: AtomicUsize,
        reverse: AtomicUsize,
        forward: AtomicUsize,
        weather: AtomicUsize,
        weather_down: AtomicBool,
    }

    #[derive(Debug)]
    struct FakeLocator {
        result: Result<Coordinates, GeolocationError>,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl LocationProvider for FakeLocator {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            self.counters.locate.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Forward {
        Found,
        NoMatch,
        Down,
    }

    #[derive(Debug)]
    struct FakeGeocoder {
        reverse_ok: bool,
        forward: Forward,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn reverse_geocode(&self, _coords: Coordinates) -> Result<PlaceName, GeocodeError> {
            self.counters.reverse.fetch_add(1, Ordering::SeqCst);
            if !self.reverse_ok {
                return Err(GeocodeError::Malformed("no address".into()));
            }
            Ok(PlaceName {
                city: Some("Hong Kong".into()),
                district: Some("Central".into()),
            })
        }

        async fn forward_geocode(
            &self,
            _place_name: &str,
            _context_name: &str,
        ) -> Result<Option<Coordinates>, GeocodeError> {
            self.counters.forward.fetch_add(1, Ordering::SeqCst);
            match self.forward {
                Forward::Found => Ok(Some(HOME)),
                Forward::NoMatch => Ok(None),
                Forward::Down => Err(GeocodeError::Status {
                    status: 503,
                    body: "busy".into(),
                }),
            }
        }
    }

    #[derive(Debug)]
    struct FakeWeather {
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl WeatherSource for FakeWeather {
        async fn fetch_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, WeatherFetchError> {
            let n = self.counters.weather.fetch_add(1, Ordering::SeqCst);
            if self.counters.weather_down.load(Ordering::SeqCst) {
                return Err(WeatherFetchError::Status {
                    status: 500,
                    body: String::new(),
                });
            }
            Ok(WeatherSnapshot {
                // Encodes the coordinates and call number so tests can tell snapshots apart.
                temperature: coords.latitude.round() as i32 * 100 + n as i32,
                weather_code: 2,
                is_day: true,
                high_temp: Some(25),
                low_temp: Some(19),
                hourly_forecast: Vec::new(),
            })
        }
    }

    struct RecordingMarker(Arc<Mutex<Vec<Coordinates>>>);

    impl MarkerSink for RecordingMarker {
        fn update_marker(&mut self, coords: Coordinates) {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(coords);
            }
        }
    }

    struct Setup {
        locate: Result<Coordinates, GeolocationError>,
        reverse_ok: bool,
        forward: Forward,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                locate: Ok(DEVICE),
                reverse_ok: true,
                forward: Forward::Found,
            }
        }
    }

    fn session(setup: Setup) -> (LocationSession, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let session = LocationSession::new(
            Box::new(FakeLocator {
                result: setup.locate,
                counters: Arc::clone(&counters),
            }),
            Box::new(FakeGeocoder {
                reverse_ok: setup.reverse_ok,
                forward: setup.forward,
                counters: Arc::clone(&counters),
            }),
            Box::new(FakeWeather {
                counters: Arc::clone(&counters),
            }),
            HomeRegion::default(),
            Slot::City,
        );
        (session, counters)
    }

    fn weather_calls(counters: &Counters) -> usize {
        counters.weather.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn start_resolves_both_slots_and_loads_city_weather() {
        let (mut session, counters) = session(Setup::default());

        session.start().await;

        let state = session.state();
        assert_eq!(state.phase, LocatePhase::Located);
        assert_eq!(state.slot_label(Slot::City), "Hong Kong");
        assert_eq!(state.slot_label(Slot::District), "Central");
        assert_eq!(state.coordinates.city, Some(HOME));
        assert_eq!(state.coordinates.district, Some(DEVICE));
        assert_eq!(state.selected, Slot::City);
        assert_eq!(state.snapshot().map(|s| s.temperature), Some(2200));
        assert_eq!(state.location_status, None);
        assert_eq!(weather_calls(&counters), 1);
    }

    #[tokio::test]
    async fn toggling_slots_reuses_cached_snapshots() {
        let (mut session, counters) = session(Setup::default());
        session.start().await;

        session.select(Slot::District).await;
        assert_eq!(session.state().selected, Slot::District);
        assert_eq!(weather_calls(&counters), 2);
        let district_temp = session.state().snapshot().map(|s| s.temperature);

        session.select(Slot::City).await;
        session.select(Slot::District).await;

        assert_eq!(weather_calls(&counters), 2);
        assert_eq!(session.state().snapshot().map(|s| s.temperature), district_temp);
        assert_eq!(session.cache().len(), 2);
    }

    #[tokio::test]
    async fn selecting_the_current_slot_does_nothing() {
        let (mut session, counters) = session(Setup::default());
        session.start().await;

        session.select(Slot::City).await;

        assert_eq!(weather_calls(&counters), 1);
    }

    #[tokio::test]
    async fn select_before_location_is_known_is_ignored() {
        let (mut session, counters) = session(Setup::default());

        session.select(Slot::District).await;

        assert_eq!(session.state().selected, Slot::City);
        assert_eq!(session.state().weather, WeatherView::Pending);
        assert_eq!(weather_calls(&counters), 0);
    }

    #[tokio::test]
    async fn forward_geocode_failure_falls_back_to_constant_point() {
        let (mut session, _) = session(Setup {
            forward: Forward::Down,
            ..Setup::default()
        });

        session.start().await;

        let state = session.state();
        assert_eq!(state.coordinates.city, Some(HomeRegion::default().fallback));
        assert!(state.snapshot().is_some());
    }

    #[tokio::test]
    async fn forward_geocode_without_match_falls_back_to_constant_point() {
        let (mut session, _) = session(Setup {
            forward: Forward::NoMatch,
            ..Setup::default()
        });

        session.start().await;

        assert_eq!(
            session.state().coordinates.city,
            Some(HomeRegion::default().fallback)
        );
    }

    #[tokio::test]
    async fn reverse_geocode_failure_still_shows_weather() {
        let (mut session, counters) = session(Setup {
            reverse_ok: false,
            ..Setup::default()
        });

        session.start().await;

        let state = session.state();
        assert_eq!(state.phase, LocatePhase::Located);
        assert_eq!(state.place, PlaceName::unresolved());
        assert_eq!(state.location_status.as_deref(), Some(LOCATION_NAME_FAILED));
        assert_eq!(state.slot_label(Slot::City), "Hong Kong");
        assert_eq!(state.slot_label(Slot::District), UNKNOWN_DISTRICT);
        assert!(state.snapshot().is_some());
        assert_eq!(weather_calls(&counters), 1);
    }

    #[tokio::test]
    async fn geolocation_failure_is_terminal() {
        let (mut session, counters) = session(Setup {
            locate: Err(GeolocationError::PermissionDenied),
            ..Setup::default()
        });

        session.start().await;
        session.start().await;

        let state = session.state();
        assert_eq!(
            state.phase,
            LocatePhase::LocateFailed(GeolocationErrorView {
                kind: "permission_denied",
                message: "Location permission denied".into(),
            })
        );
        assert_eq!(state.location_status.as_deref(), Some("Location permission denied"));
        assert_eq!(state.weather, WeatherView::Pending);
        assert_eq!(counters.locate.load(Ordering::SeqCst), 1);
        assert_eq!(counters.reverse.load(Ordering::SeqCst), 0);
        assert_eq!(weather_calls(&counters), 0);
    }

    #[tokio::test]
    async fn start_locates_only_once() {
        let (mut session, counters) = session(Setup::default());

        session.start().await;
        session.start().await;

        assert_eq!(counters.locate.load(Ordering::SeqCst), 1);
        assert_eq!(counters.forward.load(Ordering::SeqCst), 1);
        assert_eq!(weather_calls(&counters), 1);
    }

    #[tokio::test]
    async fn weather_failure_becomes_status_and_reload_retries() {
        let (mut session, counters) = session(Setup::default());
        counters.weather_down.store(true, Ordering::SeqCst);

        session.start().await;
        assert_eq!(
            session.state().weather,
            WeatherView::Failed(WEATHER_FAILED.to_string())
        );
        assert!(session.cache().is_empty());

        counters.weather_down.store(false, Ordering::SeqCst);
        session.reload().await;

        assert!(session.state().snapshot().is_some());
        assert_eq!(weather_calls(&counters), 2);
    }

    #[tokio::test]
    async fn reload_uses_cache_but_refresh_refetches() {
        let (mut session, counters) = session(Setup::default());
        session.start().await;

        session.reload().await;
        assert_eq!(weather_calls(&counters), 1);

        session.refresh().await;
        assert_eq!(weather_calls(&counters), 2);
        assert_eq!(session.state().snapshot().map(|s| s.temperature), Some(2201));
        assert_eq!(
            session.cache().get(Slot::City).map(|s| s.temperature),
            Some(2201)
        );
    }

    #[tokio::test]
    async fn marker_follows_selected_slot() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (session, _) = session(Setup::default());
        let mut session = session.with_marker(Box::new(RecordingMarker(Arc::clone(&seen))));

        session.start().await;
        session.select(Slot::District).await;

        let seen = seen.lock().map(|v| v.clone()).unwrap_or_default();
        assert_eq!(seen, vec![HOME, DEVICE]);
    }

    #[test]
    fn state_serializes_for_json_output() {
        let state = SessionState::new(Slot::District, "Hong Kong".into());
        let json = serde_json::to_value(&state).expect("json");

        assert_eq!(json["phase"]["phase"], "locating");
        assert_eq!(json["selected"], "district");
        assert_eq!(json["weather"]["status"], "pending");
    }
}
