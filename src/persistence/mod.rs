//! # Persistence Module
//!
//! Seam to the external measurement store.
//!
//! The core treats the backend as a keyed row store: one row per stored
//! measurement, tagged with a location label and a client id, listed back in
//! reverse creation order. The backend also serves as the target of the
//! stream's latency probe (`health_check`), so implementations should keep
//! that call as close to a no-op round trip as the transport allows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WifiScopeError};
use crate::measurement::record::MeasurementRecord;

/// Optional client details attached to a stored measurement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub phone: Option<String>,
    pub subscriber_number: Option<String>,
    pub order_number: Option<String>,
    pub service_type: Option<String>,
}

/// One persisted measurement row, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Server-assigned row id.
    pub id: u64,
    #[serde(flatten)]
    pub record: MeasurementRecord,
    pub location_name: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ClientMetadata>,
    pub created_at: DateTime<Utc>,
}

/// External measurement store.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Persist one measurement.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on any store error. Callers must treat this as
    /// transient: log, notify, and carry on.
    async fn store(
        &self,
        record: &MeasurementRecord,
        location_name: &str,
        client_id: &str,
        metadata: Option<&ClientMetadata>,
    ) -> Result<StoredRecord>;

    /// All rows for one client, newest first.
    async fn list_by_client(&self, client_id: &str) -> Result<Vec<StoredRecord>>;

    /// Minimal round trip used by the stream's latency probe.
    async fn health_check(&self) -> Result<()>;
}

/// In-memory [`PersistenceBackend`].
///
/// The default backend when no remote store is configured, and the test
/// double for everything that talks to the seam. Failure injection and an
/// artificial health-check delay cover the degraded paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: Mutex<Vec<StoredRecord>>,
    next_id: AtomicU64,
    fail_stores: Mutex<bool>,
    health_delay_ms: Mutex<u64>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `store` calls fail.
    pub fn set_fail_stores(&self, fail: bool) {
        *self.fail_stores.lock().unwrap() = fail;
    }

    /// Delay every `health_check` by `ms` milliseconds.
    pub fn set_health_delay_ms(&self, ms: u64) {
        *self.health_delay_ms.lock().unwrap() = ms;
    }

    /// Total stored row count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    async fn store(
        &self,
        record: &MeasurementRecord,
        location_name: &str,
        client_id: &str,
        metadata: Option<&ClientMetadata>,
    ) -> Result<StoredRecord> {
        if *self.fail_stores.lock().unwrap() {
            return Err(WifiScopeError::Persistence(
                "store rejected by backend".to_string(),
            ));
        }
        let stored = StoredRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            record: record.clone(),
            location_name: location_name.to_string(),
            client_id: client_id.to_string(),
            metadata: metadata.cloned(),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_by_client(&self, client_id: &str) -> Result<Vec<StoredRecord>> {
        let mut rows: Vec<StoredRecord> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect();
        // Newest first; ids are assigned in creation order
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn health_check(&self) -> Result<()> {
        let delay = *self.health_delay_ms.lock().unwrap();
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn record(ts: i64) -> MeasurementRecord {
        MeasurementRecord {
            signal_strength: -60.0,
            speed: 40.0,
            latency: 18.0,
            timestamp: ts,
            location: Vec3::new(1.0, 2.0, 3.0),
        }
    }

    #[tokio::test]
    async fn test_store_assigns_unique_ids() {
        let backend = MemoryBackend::new();
        let a = backend.store(&record(1), "kitchen", "c1", None).await.unwrap();
        let b = backend.store(&record(2), "hall", "c1", None).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_client_filters_and_orders_newest_first() {
        let backend = MemoryBackend::new();
        backend.store(&record(1), "kitchen", "c1", None).await.unwrap();
        backend.store(&record(2), "hall", "c2", None).await.unwrap();
        backend.store(&record(3), "garage", "c1", None).await.unwrap();

        let rows = backend.list_by_client("c1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].location_name, "garage");
        assert_eq!(rows[1].location_name, "kitchen");
    }

    #[tokio::test]
    async fn test_store_failure_injection() {
        let backend = MemoryBackend::new();
        backend.set_fail_stores(true);
        let result = backend.store(&record(1), "kitchen", "c1", None).await;
        assert!(matches!(result, Err(WifiScopeError::Persistence(_))));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_round_trips() {
        let backend = MemoryBackend::new();
        let metadata = ClientMetadata {
            phone: Some("555-0100".to_string()),
            service_type: Some("fiber".to_string()),
            ..Default::default()
        };
        let stored = backend
            .store(&record(1), "kitchen", "c1", Some(&metadata))
            .await
            .unwrap();
        assert_eq!(stored.metadata, Some(metadata));
    }

    #[tokio::test]
    async fn test_stored_record_json_flattens_measurement() {
        let backend = MemoryBackend::new();
        let stored = backend.store(&record(5), "kitchen", "c1", None).await.unwrap();
        let json = serde_json::to_value(&stored).unwrap();
        // Measurement fields sit at the top level of the row
        assert_eq!(json["signal_strength"], -60.0);
        assert_eq!(json["location_name"], "kitchen");
        assert_eq!(json["client_id"], "c1");
    }
}
