//! Session-lifetime weather cache keyed by location slot.
//!
//! Entries never expire. A slot is only overwritten by a fresh successful
//! fetch; failed fetches leave the previous entry (or the gap) untouched.

use std::{collections::HashMap, future::Future, sync::Arc};

use crate::model::{Coordinates, Slot, WeatherSnapshot};

#[derive(Debug, Clone, Default)]
pub struct WeatherCache {
    entries: HashMap<Slot, Arc<WeatherSnapshot>>,
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Option<Arc<WeatherSnapshot>> {
        self.entries.get(&slot).cloned()
    }

    /// Unconditional overwrite.
    pub fn put(&mut self, slot: Slot, snapshot: WeatherSnapshot) -> Arc<WeatherSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.entries.insert(slot, Arc::clone(&snapshot));
        snapshot
    }

    /// Returns the cached snapshot for `slot`, or runs `fetch` once and stores
    /// its result. Errors from `fetch` are passed through and nothing is stored.
    pub async fn load_or_fetch<F, Fut, E>(
        &mut self,
        slot: Slot,
        coords: Coordinates,
        fetch: F,
    ) -> Result<Arc<WeatherSnapshot>, E>
    where
        F: FnOnce(Coordinates) -> Fut,
        Fut: Future<Output = Result<WeatherSnapshot, E>>,
    {
        if let Some(hit) = self.get(slot) {
            tracing::debug!(%slot, "weather cache hit");
            return Ok(hit);
        }

        tracing::debug!(%slot, "weather cache miss");
        self.refresh(slot, coords, fetch).await
    }

    /// Fetches regardless of what is cached and overwrites the slot on success.
    pub async fn refresh<F, Fut, E>(
        &mut self,
        slot: Slot,
        coords: Coordinates,
        fetch: F,
    ) -> Result<Arc<WeatherSnapshot>, E>
    where
        F: FnOnce(Coordinates) -> Fut,
        Fut: Future<Output = Result<WeatherSnapshot, E>>,
    {
        let snapshot = fetch(coords).await?;
        Ok(self.put(slot, snapshot))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot(temperature: i32) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature,
            weather_code: 0,
            is_day: true,
            high_temp: None,
            low_temp: None,
            hourly_forecast: Vec::new(),
        }
    }

    const HERE: Coordinates = Coordinates::new(22.28, 114.15);

    #[tokio::test]
    async fn fetches_once_per_slot() {
        let mut cache = WeatherCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let got = cache
                .load_or_fetch(Slot::City, HERE, |_| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(snapshot(20))
                })
                .await
                .expect("snapshot");
            assert_eq!(got.temperature, 20);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slots_are_cached_independently() {
        let mut cache = WeatherCache::new();
        let calls = AtomicUsize::new(0);

        for slot in [Slot::City, Slot::District, Slot::City, Slot::District] {
            cache
                .load_or_fetch(slot, HERE, |_| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(snapshot(18))
                })
                .await
                .expect("snapshot");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let mut cache = WeatherCache::new();

        let err = cache
            .load_or_fetch(Slot::District, HERE, |_| async { Err::<WeatherSnapshot, _>("boom") })
            .await
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(cache.get(Slot::District).is_none());

        let got = cache
            .load_or_fetch(Slot::District, HERE, |_| async { Ok::<_, &str>(snapshot(9)) })
            .await
            .expect("snapshot");
        assert_eq!(got.temperature, 9);
    }

    #[tokio::test]
    async fn fetch_receives_slot_coordinates() {
        let mut cache = WeatherCache::new();

        cache
            .load_or_fetch(Slot::City, HERE, |coords| async move {
                assert_eq!(coords, HERE);
                Ok::<_, String>(snapshot(1))
            })
            .await
            .expect("snapshot");
    }

    #[tokio::test]
    async fn refresh_overwrites_and_keeps_old_entry_on_failure() {
        let mut cache = WeatherCache::new();
        cache.put(Slot::City, snapshot(10));

        let err = cache
            .refresh(Slot::City, HERE, |_| async { Err::<WeatherSnapshot, _>("down") })
            .await
            .unwrap_err();
        assert_eq!(err, "down");
        assert_eq!(cache.get(Slot::City).map(|s| s.temperature), Some(10));

        cache
            .refresh(Slot::City, HERE, |_| async { Ok::<_, &str>(snapshot(11)) })
            .await
            .expect("snapshot");
        assert_eq!(cache.get(Slot::City).map(|s| s.temperature), Some(11));
    }

    #[test]
    fn put_overwrites_unconditionally() {
        let mut cache = WeatherCache::new();
        cache.put(Slot::District, snapshot(1));
        cache.put(Slot::District, snapshot(2));

        assert_eq!(cache.get(Slot::District).map(|s| s.temperature), Some(2));
        assert!(cache.get(Slot::City).is_none());
    }
}
