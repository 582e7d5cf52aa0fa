use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::ReadingStore;
use crate::domain::{NewReading, Reading};
use crate::error::SensorError;

/// in-process store; readings live as long as the process does
#[derive(Default)]
pub struct MemoryStore {
    // kept sorted by (created_at, id)
    readings: RwLock<Vec<Reading>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn insert(&self, reading: NewReading) -> Result<Reading, SensorError> {
        let mut readings = self.readings.write().await;
        // nothing is ever deleted, so ids are dense
        let id = readings.len() as i64 + 1;
        let stored = Reading::from_new(id, reading);

        // received timestamps are normally monotonic, so this is an append
        let at = readings.partition_point(|r| r.created_at <= stored.created_at);
        readings.insert(at, stored.clone());
        Ok(stored)
    }

    async fn latest(&self) -> Result<Option<Reading>, SensorError> {
        Ok(self.readings.read().await.last().cloned())
    }

    async fn recent(
        &self,
        since: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> Result<Vec<Reading>, SensorError> {
        let readings = self.readings.read().await;
        Ok(readings
            .iter()
            .rev()
            .filter(|r| since.map_or(true, |t| r.created_at >= t))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn window(&self, since: DateTime<Utc>) -> Result<Vec<Reading>, SensorError> {
        let readings = self.readings.read().await;
        let start = readings.partition_point(|r| r.created_at < since);
        Ok(readings[start..].to_vec())
    }

    async fn max_valid_sequence(&self) -> Result<Option<i64>, SensorError> {
        let readings = self.readings.read().await;
        Ok(readings.iter().filter(|r| r.is_valid).map(|r| r.sequence_num).max())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    #[tokio::test]
    async fn insert_assigns_ids() {
        contract::insert_assigns_ids(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn empty_store() {
        contract::empty_store(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn ordering_and_filters() {
        contract::ordering_and_filters(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn timestamps_survive_a_round_trip() {
        contract::timestamps_survive_a_round_trip(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn late_timestamp_is_placed_in_time_order() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.insert(contract::new_reading(now, 2, true)).await.unwrap();
        store
            .insert(contract::new_reading(now - chrono::Duration::minutes(5), 1, true))
            .await
            .unwrap();

        let window: Vec<i64> = store
            .window(now - chrono::Duration::hours(1))
            .await
            .unwrap()
            .iter()
            .map(|r| r.sequence_num)
            .collect();
        assert_eq!(window, vec![1, 2]);
    }
}
