use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::models::job::ResultRecord;

/// Process-wide map from vendor correlation id to a finished staging
/// result, with TTL-based eviction.
///
/// Absence of a key is not an error: callers report "still processing".
/// Internally synchronized; handlers share it behind an `Arc`.
pub struct ResultStore {
    ttl: TimeDelta,
    records: RwLock<HashMap<String, ResultRecord>>,
}

impl ResultStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn put(&self, record: ResultRecord) {
        let mut records = self.records.write().expect("result store lock poisoned");
        records.insert(record.correlation_id.clone(), record);
    }

    pub fn get(&self, correlation_id: &str) -> Option<ResultRecord> {
        let records = self.records.read().expect("result store lock poisoned");
        records.get(correlation_id).cloned()
    }

    /// Evict every record strictly older than the TTL. Idempotent; safe to
    /// call from any handler or from the background sweeper.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write().expect("result store lock poisoned");
        let before = records.len();
        records.retain(|_, record| now - record.stored_at <= self.ttl);
        before - records.len()
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("result store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobStatus;

    fn record_stored_at(id: &str, stored_at: DateTime<Utc>) -> ResultRecord {
        ResultRecord {
            correlation_id: id.to_string(),
            status: JobStatus::Completed,
            output_urls: vec![format!("https://i.ibb.co/{id}.jpg")],
            original_vendor_url: None,
            error: None,
            stored_at,
        }
    }

    #[test]
    fn test_get_absent_is_none_not_error() {
        let store = ResultStore::new(Duration::from_secs(3600));
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn test_put_then_get() {
        let store = ResultStore::new(Duration::from_secs(3600));
        store.put(record_stored_at("req-1", Utc::now()));

        let record = store.get("req-1").unwrap();
        assert_eq!(record.correlation_id, "req-1");
        assert_eq!(record.status, JobStatus::Completed);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let store = ResultStore::new(Duration::from_secs(3600));
        let now = Utc::now();

        store.put(record_stored_at("old", now - TimeDelta::hours(2)));
        store.put(record_stored_at("young", now - TimeDelta::minutes(30)));

        assert_eq!(store.sweep_expired(now), 1);
        assert!(store.get("old").is_none());
        assert!(store.get("young").is_some());
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let store = ResultStore::new(Duration::from_secs(3600));
        let now = Utc::now();

        store.put(record_stored_at("young", now - TimeDelta::minutes(30)));

        for _ in 0..3 {
            assert_eq!(store.sweep_expired(now), 0);
        }
        assert!(store.get("young").is_some());
    }

    #[test]
    fn test_record_exactly_ttl_old_survives() {
        // Eviction is strictly "older than", not "at least as old as".
        let store = ResultStore::new(Duration::from_secs(3600));
        let now = Utc::now();

        store.put(record_stored_at("edge", now - TimeDelta::hours(1)));
        assert_eq!(store.sweep_expired(now), 0);
        assert!(store.get("edge").is_some());
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let store = std::sync::Arc::new(ResultStore::new(Duration::from_secs(3600)));

        std::thread::scope(|scope| {
            let writer = std::sync::Arc::clone(&store);
            scope.spawn(move || {
                for i in 0..100 {
                    writer.put(record_stored_at(&format!("req-{i}"), Utc::now()));
                }
            });
            for _ in 0..4 {
                let reader = std::sync::Arc::clone(&store);
                scope.spawn(move || {
                    for i in 0..100 {
                        let _ = reader.get(&format!("req-{i}"));
                    }
                });
            }
        });

        assert_eq!(store.len(), 100);
    }
}
