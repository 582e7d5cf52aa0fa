//! ==============================================================================
//! store - reading persistence
//! ==============================================================================
//!
//! purpose:
//!     the analysis engine never owns storage. it asks a `ReadingStore` for a
//!     consistent snapshot of the series and computes on that.
//!
//! backends:
//!     - SqliteStore: sqlx + a local sqlite file (production)
//!     - MemoryStore: a Vec behind an RwLock (development / tests, no files)
//!
//! ordering contract:
//!     readings are ordered by reception time, ties broken by insertion
//!     order. `recent` is newest first (history view), `window` is oldest
//!     first (analysis input).
//!
//! ==============================================================================

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewReading, Reading};
use crate::error::SensorError;

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// persist a reading and return it with its assigned id
    async fn insert(&self, reading: NewReading) -> Result<Reading, SensorError>;

    /// most recently received reading, valid or not
    async fn latest(&self) -> Result<Option<Reading>, SensorError>;

    /// newest first, optionally bounded by reception time and count
    async fn recent(
        &self,
        since: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> Result<Vec<Reading>, SensorError>;

    /// every reading received at or after `since`, oldest first
    async fn window(&self, since: DateTime<Utc>) -> Result<Vec<Reading>, SensorError>;

    /// highest sequence number among valid readings, for watermark restore
    async fn max_valid_sequence(&self) -> Result<Option<i64>, SensorError>;

    /// short backend name for logs
    fn backend(&self) -> &'static str;
}

#[cfg(test)]
pub(crate) mod contract {
    //! behaviour every backend must share; each backend's tests run these

    use super::*;
    use crate::domain::Sample;
    use chrono::Duration;

    pub fn new_reading(at: DateTime<Utc>, sequence_num: i64, is_valid: bool) -> NewReading {
        NewReading {
            created_at: at,
            sample: Sample {
                particle: 1000.0,
                pm25: 20.0,
                hcho: 10.0,
                co2: 600.0,
                temperature: 22.0,
                humidity: 50.0,
                voc: 100.0,
                sequence_num,
            },
            is_valid,
        }
    }

    /// a store whose backend has gone away; `restore` controls whether the
    /// watermark lookup at startup still succeeds
    pub struct UnavailableStore {
        pub restore: bool,
    }

    fn closed() -> SensorError {
        SensorError::Store(sqlx::Error::PoolClosed)
    }

    #[async_trait]
    impl ReadingStore for UnavailableStore {
        async fn insert(&self, _reading: NewReading) -> Result<Reading, SensorError> {
            Err(closed())
        }

        async fn latest(&self) -> Result<Option<Reading>, SensorError> {
            Err(closed())
        }

        async fn recent(
            &self,
            _since: Option<DateTime<Utc>>,
            _limit: Option<usize>,
        ) -> Result<Vec<Reading>, SensorError> {
            Err(closed())
        }

        async fn window(&self, _since: DateTime<Utc>) -> Result<Vec<Reading>, SensorError> {
            Err(closed())
        }

        async fn max_valid_sequence(&self) -> Result<Option<i64>, SensorError> {
            if self.restore {
                Ok(None)
            } else {
                Err(closed())
            }
        }

        fn backend(&self) -> &'static str {
            "unavailable"
        }
    }

    pub async fn insert_assigns_ids(store: &dyn ReadingStore) {
        let now = Utc::now();
        let a = store.insert(new_reading(now, 1, true)).await.unwrap();
        let b = store.insert(new_reading(now, 2, true)).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(a.sequence_num, 1);
        assert_eq!(a.pm25, 20.0);
        assert!(a.is_valid);
    }

    pub async fn empty_store(store: &dyn ReadingStore) {
        assert!(store.latest().await.unwrap().is_none());
        assert!(store.recent(None, None).await.unwrap().is_empty());
        assert!(store.window(Utc::now() - Duration::hours(24)).await.unwrap().is_empty());
        assert_eq!(store.max_valid_sequence().await.unwrap(), None);
    }

    pub async fn ordering_and_filters(store: &dyn ReadingStore) {
        let now = Utc::now();
        store.insert(new_reading(now - Duration::hours(30), 1, true)).await.unwrap();
        store.insert(new_reading(now - Duration::hours(2), 2, true)).await.unwrap();
        store.insert(new_reading(now - Duration::hours(1), 3, true)).await.unwrap();
        // same instant as the previous one: insertion order breaks the tie
        store.insert(new_reading(now - Duration::hours(1), 9, false)).await.unwrap();

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.sequence_num, 9);
        assert!(!latest.is_valid);

        let all: Vec<i64> = store.recent(None, None).await.unwrap().iter().map(|r| r.sequence_num).collect();
        assert_eq!(all, vec![9, 3, 2, 1]);

        let limited: Vec<i64> = store.recent(None, Some(2)).await.unwrap().iter().map(|r| r.sequence_num).collect();
        assert_eq!(limited, vec![9, 3]);

        let since = Some(now - Duration::hours(24));
        let day: Vec<i64> = store.recent(since, None).await.unwrap().iter().map(|r| r.sequence_num).collect();
        assert_eq!(day, vec![9, 3, 2]);

        let both: Vec<i64> = store.recent(since, Some(1)).await.unwrap().iter().map(|r| r.sequence_num).collect();
        assert_eq!(both, vec![9]);

        let window: Vec<i64> = store
            .window(now - Duration::hours(24))
            .await
            .unwrap()
            .iter()
            .map(|r| r.sequence_num)
            .collect();
        assert_eq!(window, vec![2, 3, 9]);

        // suspect readings never count toward the watermark
        assert_eq!(store.max_valid_sequence().await.unwrap(), Some(3));
    }

    pub async fn timestamps_survive_a_round_trip(store: &dyn ReadingStore) {
        let at = DateTime::from_timestamp_millis(1_705_312_800_123).unwrap();
        store.insert(new_reading(at, 1, true)).await.unwrap();
        let stored = store.latest().await.unwrap().unwrap();
        assert_eq!(stored.created_at, at);
    }
}
