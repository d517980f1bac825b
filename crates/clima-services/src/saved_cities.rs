//! Favorite cities, persisted as a JSON list of `{name, lat, lon}`.
//!
//! Persistence is best-effort: storage failures are logged and the in-memory
//! list stays authoritative for the rest of the session.

use std::sync::Arc;

use clima_weather::Location;

use crate::storage::KeyValueStorage;

/// Storage key holding the saved list.
pub const SAVED_CITIES_KEY: &str = "clima_saved_cities";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    NothingToClear,
    Cleared(usize),
}

pub struct SavedCityStore {
    storage: Arc<dyn KeyValueStorage>,
    cities: Vec<Location>,
}

impl SavedCityStore {
    /// Load the saved list; a missing key or unreadable value yields an empty list.
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let cities = match storage.get_item(SAVED_CITIES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Location>>(&raw) {
                Ok(cities) => cities,
                Err(e) => {
                    tracing::warn!("Saved cities are unreadable, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read saved cities: {}", e);
                Vec::new()
            }
        };

        tracing::info!("Loaded {} saved cities", cities.len());
        Self { storage, cities }
    }

    pub fn cities(&self) -> &[Location] {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn is_saved(&self, city: &Location) -> bool {
        self.cities.iter().any(|saved| saved.is_same_place(city))
    }

    /// Appends `city` unless a nearby city is already saved.
    pub fn add(&mut self, city: Location) {
        if self.is_saved(&city) {
            return;
        }
        self.cities.push(city);
        self.persist();
    }

    /// Removes every saved city within the proximity threshold of `city`.
    pub fn remove(&mut self, city: &Location) {
        self.cities.retain(|saved| !saved.is_same_place(city));
        self.persist();
    }

    pub fn toggle(&mut self, city: Location) -> ToggleOutcome {
        if self.is_saved(&city) {
            self.remove(&city);
            ToggleOutcome::Removed
        } else {
            self.add(city);
            ToggleOutcome::Added
        }
    }

    pub fn clear(&mut self) -> ClearOutcome {
        if self.cities.is_empty() {
            return ClearOutcome::NothingToClear;
        }
        let count = self.cities.len();
        self.cities.clear();
        self.persist();
        ClearOutcome::Cleared(count)
    }

    /// Write the full list to storage. An empty list drops the key.
    /// Failures are logged, never returned.
    pub fn persist(&self) {
        if self.cities.is_empty() {
            if let Err(e) = self.storage.remove_item(SAVED_CITIES_KEY) {
                tracing::warn!("Failed to remove saved cities: {}", e);
            }
            return;
        }

        let json = match serde_json::to_string(&self.cities) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize saved cities: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.set_item(SAVED_CITIES_KEY, &json) {
            tracing::warn!("Failed to persist saved cities: {}", e);
        }
    }
}

impl std::fmt::Debug for SavedCityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavedCityStore")
            .field("cities", &self.cities)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage, StorageError, StorageResult};
    use tempfile::tempdir;

    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get_item(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }

        fn remove_item(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }
    }

    fn rio() -> Location {
        Location::new("Rio de Janeiro", -22.9068, -43.1729)
    }

    fn recife() -> Location {
        Location::new("Recife", -8.0476, -34.877)
    }

    fn stored(storage: &MemoryStorage) -> Vec<Location> {
        let raw = storage.get_item(SAVED_CITIES_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_load_missing_key_is_empty() {
        let store = SavedCityStore::load(Arc::new(MemoryStorage::new()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_garbage_is_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(SAVED_CITIES_KEY, "{not json").unwrap();
        let store = SavedCityStore::load(storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_existing_list() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item(
                SAVED_CITIES_KEY,
                r#"[{"name":"Recife","lat":-8.0476,"lon":-34.877}]"#,
            )
            .unwrap();
        let store = SavedCityStore::load(storage);
        assert_eq!(store.cities(), &[recife()]);
    }

    #[test]
    fn test_toggle_adds_then_removes_and_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SavedCityStore::load(storage.clone());

        assert_eq!(store.toggle(rio()), ToggleOutcome::Added);
        assert_eq!(store.len(), 1);
        assert_eq!(stored(&storage), vec![rio()]);

        let nearby = Location::new("Rio", -22.91, -43.17);
        assert_eq!(store.toggle(nearby), ToggleOutcome::Removed);
        assert!(store.is_empty());
        assert_eq!(storage.get_item(SAVED_CITIES_KEY).unwrap(), None);
    }

    #[test]
    fn test_add_is_deduplicated_by_proximity() {
        let mut store = SavedCityStore::load(Arc::new(MemoryStorage::new()));
        store.add(rio());
        store.add(Location::new("Rio (centro)", -22.905, -43.175));
        assert_eq!(store.len(), 1);
        assert_eq!(store.cities()[0].name, "Rio de Janeiro");
    }

    #[test]
    fn test_remove_drops_all_matches() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item(
                SAVED_CITIES_KEY,
                r#"[{"name":"A","lat":1.0,"lon":1.0},{"name":"B","lat":1.005,"lon":1.005},{"name":"C","lat":5.0,"lon":5.0}]"#,
            )
            .unwrap();
        let mut store = SavedCityStore::load(storage.clone());

        store.remove(&Location::new("A", 1.0, 1.0));
        assert_eq!(store.len(), 1);
        assert_eq!(store.cities()[0].name, "C");
        assert_eq!(stored(&storage).len(), 1);
    }

    #[test]
    fn test_clear() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = SavedCityStore::load(storage.clone());
        assert_eq!(store.clear(), ClearOutcome::NothingToClear);

        store.add(rio());
        store.add(recife());
        assert_eq!(stored(&storage).len(), 2);

        assert_eq!(store.clear(), ClearOutcome::Cleared(2));
        assert!(store.is_empty());
        assert_eq!(storage.get_item(SAVED_CITIES_KEY).unwrap(), None);
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
        let mut store = SavedCityStore::load(storage);
        store.add(recife());
        let file = dir.path().join(format!("{}.json", SAVED_CITIES_KEY));
        assert!(file.exists());

        store.clear();
        assert!(!file.exists());
        assert!(SavedCityStore::load(Arc::new(FileStorage::open(dir.path()).unwrap())).is_empty());
    }

    #[test]
    fn test_storage_failures_are_not_surfaced() {
        let mut store = SavedCityStore::load(Arc::new(BrokenStorage));
        assert!(store.is_empty());

        assert_eq!(store.toggle(rio()), ToggleOutcome::Added);
        assert!(store.is_saved(&rio()));
    }

    #[test]
    fn test_file_storage_survives_reload() {
        let dir = tempdir().unwrap();
        {
            let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
            let mut store = SavedCityStore::load(storage);
            store.add(recife());
        }

        let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
        let store = SavedCityStore::load(storage);
        assert_eq!(store.cities(), &[recife()]);
    }
}
