use std::io;

use thiserror::Error;

use super::model::Reminder;
use super::storage::KeyValueStorage;

/// Slot holding the whole reminder collection.
pub const STORAGE_KEY: &str = "event_reminders";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reminder storage unavailable: {0}")]
    Io(#[from] io::Error),
    #[error("stored reminders are corrupted: {source}")]
    Corrupted {
        source: serde_json::Error,
        /// Slot holding a copy of the unreadable blob, if writing it worked.
        backup_key: Option<String>,
    },
    #[error("failed to encode reminders: {0}")]
    Encode(serde_json::Error),
}

/// Ordered reminder collection mirrored into a single persisted blob.
///
/// Every mutation rewrites the entire blob. Mutations take `&mut self`, so
/// the read-modify-write cycle is one unit for the single writer.
pub struct Store {
    storage: Box<dyn KeyValueStorage>,
    reminders: Vec<Reminder>,
}

impl Store {
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            reminders: Vec::new(),
        }
    }

    /// Replace the in-memory collection with the persisted one.
    ///
    /// A missing slot is an empty collection. An unreadable blob is copied to
    /// `<key>.corrupt` and reported; the collection is left empty. A failed
    /// copy is logged and still reported as corruption.
    pub fn load_all(&mut self) -> Result<&[Reminder], StoreError> {
        self.reminders.clear();
        let Some(blob) = self.storage.get(STORAGE_KEY)? else {
            tracing::debug!("no stored reminders");
            return Ok(&self.reminders);
        };

        match decode(&blob) {
            Ok(reminders) => {
                tracing::info!(count = reminders.len(), "loaded reminders");
                self.reminders = reminders;
                Ok(&self.reminders)
            }
            Err(source) => {
                let key = format!("{STORAGE_KEY}.corrupt");
                let backup_key = match self.storage.set(&key, &blob) {
                    Ok(()) => Some(key),
                    Err(e) => {
                        tracing::warn!(error = %e, backup = %key, "could not back up corrupted reminders");
                        None
                    }
                };
                tracing::error!(error = %source, backup = ?backup_key, "stored reminders are corrupted");
                Err(StoreError::Corrupted { source, backup_key })
            }
        }
    }

    pub fn add(&mut self, reminder: Reminder) -> Result<(), StoreError> {
        self.reminders.push(reminder);
        if let Err(e) = self.persist() {
            self.reminders.pop();
            return Err(e);
        }
        tracing::info!(count = self.reminders.len(), "reminder added");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        let previous = std::mem::take(&mut self.reminders);
        if let Err(e) = self.persist() {
            self.reminders = previous;
            return Err(e);
        }
        tracing::info!(removed = previous.len(), "reminders cleared");
        Ok(())
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    pub fn storage(&self) -> &dyn KeyValueStorage {
        self.storage.as_ref()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let blob = encode(&self.reminders)?;
        self.storage.set(STORAGE_KEY, &blob)?;
        Ok(())
    }
}

pub fn encode(reminders: &[Reminder]) -> Result<String, StoreError> {
    serde_json::to_string(reminders).map_err(StoreError::Encode)
}

pub fn decode(blob: &str) -> serde_json::Result<Vec<Reminder>> {
    serde_json::from_str(blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::storage::MemoryStorage;
    use chrono::{Duration, Local};

    fn reminder(title: &str, hours_ahead: i64) -> Reminder {
        let start = Local::now() + Duration::hours(hours_ahead);
        Reminder::new(title, "desc", start, start + Duration::hours(1), "47.03", "2.21")
    }

    fn persisted(store: &Store) -> Vec<Reminder> {
        let blob = store.storage().get(STORAGE_KEY).unwrap().unwrap();
        decode(&blob).unwrap()
    }

    /// Reads return `blob`; every write fails.
    struct FailingStorage {
        blob: Option<String>,
    }

    impl FailingStorage {
        fn empty() -> Self {
            Self { blob: None }
        }

        fn holding(items: &[Reminder]) -> Self {
            Self { blob: Some(encode(items).unwrap()) }
        }
    }

    impl KeyValueStorage for FailingStorage {
        fn get(&self, _key: &str) -> io::Result<Option<String>> {
            Ok(self.blob.clone())
        }

        fn set(&mut self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn add_add_clear_scenario() {
        let mut store = Store::new(Box::new(MemoryStorage::new()));
        assert!(store.load_all().unwrap().is_empty());

        let r1 = reminder("first", 2);
        let r2 = reminder("second", 200);

        store.add(r1.clone()).unwrap();
        assert_eq!(persisted(&store), vec![r1.clone()]);

        store.add(r2.clone()).unwrap();
        assert_eq!(persisted(&store), vec![r1, r2]);

        store.clear().unwrap();
        assert_eq!(persisted(&store), Vec::<Reminder>::new());
        assert!(store.is_empty());
    }

    #[test]
    fn reload_preserves_insertion_order() {
        let mut storage = MemoryStorage::new();
        let items = vec![reminder("b", 5), reminder("a", 1), reminder("c", 3)];
        storage.set(STORAGE_KEY, &encode(&items).unwrap()).unwrap();

        let mut store = Store::new(Box::new(storage));
        let loaded = store.load_all().unwrap();
        let titles: Vec<&str> = loaded.iter().map(|r| r.title()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
    }

    #[test]
    fn corrupted_blob_is_an_error_and_backed_up() {
        let mut storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "{not json").unwrap();

        let mut store = Store::new(Box::new(storage));
        match store.load_all() {
            Err(StoreError::Corrupted { backup_key, .. }) => {
                assert_eq!(backup_key.as_deref(), Some("event_reminders.corrupt"));
            }
            other => panic!("expected corruption error, got {other:?}"),
        }
        assert!(store.is_empty());
        assert_eq!(
            store.storage().get("event_reminders.corrupt").unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn failed_write_rolls_back_add() {
        let mut store = Store::new(Box::new(FailingStorage::empty()));
        let err = store.add(reminder("x", 1)).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn failed_write_rolls_back_clear() {
        let items = vec![reminder("kept", 1), reminder("also kept", 30)];
        let mut store = Store::new(Box::new(FailingStorage::holding(&items)));
        assert_eq!(store.load_all().unwrap().len(), 2);

        let err = store.clear().unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(store.reminders(), items.as_slice());
    }

    #[test]
    fn corrupted_blob_without_backup_is_still_corruption() {
        let mut store = Store::new(Box::new(FailingStorage {
            blob: Some("{not json".to_string()),
        }));
        match store.load_all() {
            Err(StoreError::Corrupted { backup_key, .. }) => assert_eq!(backup_key, None),
            other => panic!("expected corruption error, got {other:?}"),
        }
        assert!(store.is_empty());
    }
}
