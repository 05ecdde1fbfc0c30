//! The photo record store.
//!
//! Persists [`PhotoRecord`]s into a [`KeyValueBackend`], one encoded value per
//! key. The store is the single source of truth for every view: consumers
//! re-read the full listing, either when a [`StoreEvent`] arrives or on their
//! own refresh interval.
//!
//! Failure policy:
//!
//! - `write` follows the configured [`Durability`]. Best-effort writes log a
//!   failing medium and return `Ok(None)`; strict writes return the error.
//! - `list_all` never fails. Undecodable values become URI-only records and a
//!   failing medium yields an empty listing.
//! - `delete_all` always reports failure to the caller.

pub mod codec;
pub mod keys;
pub mod record;

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::{Durability, KeyMode, StoreConfig};
use crate::db::{KeyValueBackend, SqliteBackend};
use crate::error::StoreResult;

pub use keys::{key_millis, Clock, KeyGenerator, SystemClock, KEY_PREFIX};
pub use record::{Coordinates, NewPhoto, PhotoRecord};

const EVENT_CAPACITY: usize = 64;

/// Change notification published after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Written { key: String },
    Cleared,
}

pub struct PhotoStore {
    backend: Box<dyn KeyValueBackend>,
    clock: Arc<dyn Clock>,
    keys: KeyGenerator,
    durability: Durability,
    events: broadcast::Sender<StoreEvent>,
}

impl PhotoStore {
    pub fn new(backend: Box<dyn KeyValueBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            clock: Arc::new(SystemClock),
            keys: KeyGenerator::new(KeyMode::default()),
            durability: Durability::default(),
            events,
        }
    }

    /// Open the SQLite-backed store described by `config`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let backend = SqliteBackend::open(&config.path)?;
        backend.initialize()?;
        let store = Self::new(Box::new(backend))
            .with_durability(config.durability)
            .with_key_mode(config.keys);
        store.resume_keys()?;
        info!("Photo store opened at {:?}", config.path);
        Ok(store)
    }

    /// Continue key generation after the newest key already in the medium,
    /// so a restart cannot reissue a bumped key.
    fn resume_keys(&self) -> StoreResult<()> {
        if let Some(newest) = self
            .backend
            .get_all_keys()?
            .iter()
            .filter_map(|key| key_millis(key))
            .max()
        {
            debug!(newest, "Resuming keys after existing records");
            self.keys.resume_after(newest);
        }
        Ok(())
    }

    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    pub fn with_key_mode(mut self, mode: KeyMode) -> Self {
        self.keys = KeyGenerator::new(mode);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Receive a [`StoreEvent`] for every later successful write or clear.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Persist `photo` under a freshly generated key.
    ///
    /// Returns the key on success. A failing medium yields `Ok(None)` in
    /// best-effort mode and an error in strict mode.
    pub fn write(&self, photo: &NewPhoto) -> StoreResult<Option<String>> {
        match self.try_write(photo) {
            Ok(key) => {
                debug!(key = %key, uri = %photo.image_uri, "Photo record written");
                let _ = self.events.send(StoreEvent::Written { key: key.clone() });
                Ok(Some(key))
            }
            Err(e) => match self.durability {
                Durability::BestEffort => {
                    error!("Error saving image {}: {}", photo.image_uri, e);
                    Ok(None)
                }
                Durability::Strict => Err(e),
            },
        }
    }

    fn try_write(&self, photo: &NewPhoto) -> StoreResult<String> {
        let key = self.keys.next_key(self.clock.now());
        let value = codec::encode(photo)?;
        self.backend.set_value(&key, &value)?;
        Ok(key)
    }

    /// Every stored record, in the order the medium yields its keys.
    pub fn list_all(&self) -> Vec<PhotoRecord> {
        match self.try_list_all() {
            Ok(records) => records,
            Err(e) => {
                error!("Error loading images: {}", e);
                Vec::new()
            }
        }
    }

    fn try_list_all(&self) -> StoreResult<Vec<PhotoRecord>> {
        let keys = self.backend.get_all_keys()?;
        let entries = self.backend.get_many(&keys)?;
        let records = entries
            .into_iter()
            .filter_map(|(key, value)| match value {
                Some(raw) => Some(codec::decode(&key, &raw)),
                None => {
                    // Removed between listing keys and fetching values.
                    warn!(key = %key, "Entry vanished while listing");
                    None
                }
            })
            .collect();
        Ok(records)
    }

    /// Remove every record. Irreversible.
    pub fn delete_all(&self) -> StoreResult<()> {
        self.backend.clear_all().map_err(|e| {
            error!("Error deleting all photos: {}", e);
            e
        })?;
        info!("All photo records deleted");
        let _ = self.events.send(StoreEvent::Cleared);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::MemoryBackend;
    use crate::error::StoreError;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    /// Clock that only moves when told to.
    pub(crate) struct FixedClock(pub(crate) Mutex<DateTime<Utc>>);

    impl FixedClock {
        pub(crate) fn at(millis: i64) -> Arc<Self> {
            Arc::new(Self(Mutex::new(Utc.timestamp_millis_opt(millis).unwrap())))
        }

        pub(crate) fn advance_millis(&self, millis: i64) {
            let mut now = self.0.lock().unwrap();
            *now += chrono::Duration::milliseconds(millis);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    /// Medium whose every operation fails.
    pub(crate) struct UnavailableBackend;

    impl KeyValueBackend for UnavailableBackend {
        fn get_all_keys(&self) -> StoreResult<Vec<String>> {
            Err(StoreError::PersistenceUnavailable("offline".to_string()))
        }

        fn get_many(&self, _keys: &[String]) -> StoreResult<Vec<(String, Option<String>)>> {
            Err(StoreError::PersistenceUnavailable("offline".to_string()))
        }

        fn set_value(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::PersistenceUnavailable("offline".to_string()))
        }

        fn clear_all(&self) -> StoreResult<()> {
            Err(StoreError::PersistenceUnavailable("offline".to_string()))
        }
    }

    /// Lists a key whose value is gone by the time it is fetched.
    struct VanishingBackend {
        inner: MemoryBackend,
        gone: &'static str,
    }

    impl KeyValueBackend for VanishingBackend {
        fn get_all_keys(&self) -> StoreResult<Vec<String>> {
            let mut keys = self.inner.get_all_keys()?;
            keys.push(self.gone.to_string());
            Ok(keys)
        }

        fn get_many(&self, keys: &[String]) -> StoreResult<Vec<(String, Option<String>)>> {
            self.inner.get_many(keys)
        }

        fn set_value(&self, key: &str, value: &str) -> StoreResult<()> {
            self.inner.set_value(key, value)
        }

        fn clear_all(&self) -> StoreResult<()> {
            self.inner.clear_all()
        }
    }

    fn shared_store(clock: Arc<FixedClock>) -> (Arc<MemoryBackend>, PhotoStore) {
        let medium = Arc::new(MemoryBackend::new());
        let store = PhotoStore::new(Box::new(medium.clone())).with_clock(clock);
        (medium, store)
    }

    fn new_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_write_then_list_roundtrip() {
        let store = PhotoStore::new(Box::new(MemoryBackend::new()));
        let photo = NewPhoto::new("file:///DCIM/one.jpg")
            .with_location(Coordinates::new(51.5, -0.12))
            .with_captured_at(new_year());

        let key = store.write(&photo).unwrap().unwrap();
        let records = store.list_all();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, key);
        assert_eq!(records[0].image_uri, photo.image_uri);
        assert_eq!(records[0].location, photo.location);
        assert_eq!(records[0].captured_at, photo.captured_at);
    }

    #[test]
    fn test_sub_millisecond_date_roundtrip() {
        let store = PhotoStore::new(Box::new(MemoryBackend::new()));
        let at = Utc.timestamp_opt(1_704_067_200, 123_456_789).unwrap();
        let photo = NewPhoto::new("b.jpg").with_captured_at(at);

        store.write(&photo).unwrap();
        let records = store.list_all();
        assert_eq!(records[0].captured_at, photo.captured_at);
        assert_eq!(
            records[0].captured_at.map(|at| at.timestamp_millis()),
            Some(1_704_067_200_123)
        );
    }

    #[test]
    fn test_key_uses_clock_millis() {
        let clock = FixedClock::at(1_704_067_200_123);
        let (_, store) = shared_store(clock);
        let key = store.write(&NewPhoto::new("a.jpg")).unwrap().unwrap();
        assert_eq!(key, "photo-1704067200123");
    }

    #[test]
    fn test_two_photos_one_millisecond_apart() {
        let clock = FixedClock::at(1_704_067_200_000);
        let (_, store) = shared_store(clock.clone());

        store
            .write(
                &NewPhoto::new("img1.jpg")
                    .with_location(Coordinates::new(1.0, 2.0))
                    .with_captured_at(new_year()),
            )
            .unwrap();
        clock.advance_millis(1);
        store.write(&NewPhoto::new("img2.jpg")).unwrap();

        let records = store.list_all();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].image_uri, "img1.jpg");
        assert_eq!(records[0].location, Some(Coordinates::new(1.0, 2.0)));
        assert_eq!(records[0].captured_at, Some(new_year()));
        assert_eq!(records[1].image_uri, "img2.jpg");
        assert_eq!(records[1].location, None);
        assert_eq!(records[1].captured_at, None);
    }

    #[test]
    fn test_same_millisecond_timestamp_keys_overwrite() {
        let clock = FixedClock::at(5_000);
        let (_, store) = shared_store(clock);
        let store = store.with_key_mode(KeyMode::Timestamp);

        let first = store.write(&NewPhoto::new("first.jpg")).unwrap();
        let second = store.write(&NewPhoto::new("second.jpg")).unwrap();
        assert_eq!(first, second);

        let records = store.list_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].image_uri, "second.jpg");
    }

    #[test]
    fn test_same_millisecond_monotonic_keys_are_distinct() {
        let clock = FixedClock::at(5_000);
        let (_, store) = shared_store(clock);

        let first = store.write(&NewPhoto::new("first.jpg")).unwrap().unwrap();
        let second = store.write(&NewPhoto::new("second.jpg")).unwrap().unwrap();
        assert_eq!(first, "photo-5000");
        assert_eq!(second, "photo-5001");

        let uris: Vec<_> = store.list_all().into_iter().map(|r| r.image_uri).collect();
        assert_eq!(uris, vec!["first.jpg", "second.jpg"]);
    }

    #[test]
    fn test_absent_location_is_not_zero() {
        let store = PhotoStore::new(Box::new(MemoryBackend::new()));
        store.write(&NewPhoto::new("nowhere.jpg")).unwrap();

        let records = store.list_all();
        assert_eq!(records[0].location, None);
    }

    #[test]
    fn test_legacy_bare_string_entry() {
        let (medium, store) = shared_store(FixedClock::at(0));
        medium
            .set_value("photo-1600000000000", "file:///DCIM/old.jpg")
            .unwrap();

        let records = store.list_all();
        assert_eq!(
            records,
            vec![PhotoRecord {
                key: "photo-1600000000000".to_string(),
                image_uri: "file:///DCIM/old.jpg".to_string(),
                location: None,
                captured_at: None,
            }]
        );
    }

    #[test]
    fn test_malformed_entry_is_kept() {
        let (medium, store) = shared_store(FixedClock::at(10));
        medium.set_value("photo-1", "{not json").unwrap();
        store.write(&NewPhoto::new("good.jpg")).unwrap();

        let records = store.list_all();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].image_uri, "{not json");
        assert_eq!(records[0].location, None);
        assert_eq!(records[0].captured_at, None);
        assert_eq!(records[1].image_uri, "good.jpg");
    }

    #[test]
    fn test_delete_all_twice() {
        let store = PhotoStore::new(Box::new(MemoryBackend::new()));
        store.write(&NewPhoto::new("a.jpg")).unwrap();
        store.write(&NewPhoto::new("b.jpg")).unwrap();

        assert!(store.delete_all().is_ok());
        assert!(store.list_all().is_empty());
        assert!(store.delete_all().is_ok());
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_best_effort_write_swallows_failure() {
        let store = PhotoStore::new(Box::new(UnavailableBackend));
        let result = store.write(&NewPhoto::new("a.jpg"));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_strict_write_reports_failure() {
        let store =
            PhotoStore::new(Box::new(UnavailableBackend)).with_durability(Durability::Strict);
        let result = store.write(&NewPhoto::new("a.jpg"));
        assert!(matches!(result, Err(StoreError::PersistenceUnavailable(_))));
    }

    #[test]
    fn test_unavailable_medium_lists_empty() {
        let store = PhotoStore::new(Box::new(UnavailableBackend));
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_delete_all_reports_failure() {
        let store = PhotoStore::new(Box::new(UnavailableBackend));
        assert!(store.delete_all().is_err());
    }

    #[test]
    fn test_events_published() {
        let clock = FixedClock::at(42);
        let (_, store) = shared_store(clock);
        let mut rx = store.subscribe();

        store.write(&NewPhoto::new("a.jpg")).unwrap();
        store.delete_all().unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent::Written {
                key: "photo-42".to_string()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::Cleared);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failed_write_publishes_nothing() {
        let store = PhotoStore::new(Box::new(UnavailableBackend));
        let mut rx = store.subscribe();
        store.write(&NewPhoto::new("a.jpg")).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_open_sqlite_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: dir.path().join("photos.db"),
            durability: Durability::Strict,
            keys: KeyMode::Monotonic,
        };

        {
            let store = PhotoStore::open(&config).unwrap();
            store
                .write(&NewPhoto::new("persisted.jpg").with_location(Coordinates::new(3.0, 4.0)))
                .unwrap();
        }

        let store = PhotoStore::open(&config).unwrap();
        let records = store.list_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].image_uri, "persisted.jpg");
        assert_eq!(records[0].location, Some(Coordinates::new(3.0, 4.0)));
    }

    #[test]
    fn test_vanished_entry_is_skipped() {
        let backend = VanishingBackend {
            inner: MemoryBackend::new(),
            gone: "photo-99",
        };
        let store = PhotoStore::new(Box::new(backend)).with_clock(FixedClock::at(10));
        store.write(&NewPhoto::new("kept.jpg")).unwrap();

        let records = store.list_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "photo-10");
        assert_eq!(records[0].image_uri, "kept.jpg");
    }

    #[test]
    fn test_reopened_store_does_not_reuse_keys() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: dir.path().join("photos.db"),
            durability: Durability::Strict,
            keys: KeyMode::Monotonic,
        };

        {
            let store = PhotoStore::open(&config).unwrap().with_clock(FixedClock::at(5_000));
            assert_eq!(store.write(&NewPhoto::new("a.jpg")).unwrap().unwrap(), "photo-5000");
            assert_eq!(store.write(&NewPhoto::new("b.jpg")).unwrap().unwrap(), "photo-5001");
        }

        let store = PhotoStore::open(&config).unwrap().with_clock(FixedClock::at(5_000));
        assert_eq!(store.write(&NewPhoto::new("c.jpg")).unwrap().unwrap(), "photo-5002");

        let uris: Vec<_> = store.list_all().into_iter().map(|r| r.image_uri).collect();
        assert_eq!(uris, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }
}
