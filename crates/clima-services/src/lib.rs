pub mod saved_cities;
pub mod storage;

pub use saved_cities::{ClearOutcome, SavedCityStore, ToggleOutcome, SAVED_CITIES_KEY};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError, StorageResult};
