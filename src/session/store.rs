use crate::models::SessionRecord;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory session records keyed by session id
///
/// Readers never block each other; writes only contend with operations on the
/// same map. Expired records are treated as absent and dropped on access.
#[derive(Default)]
pub struct SessionStore {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: SessionRecord) {
        self.records
            .write()
            .insert(record.session_id.clone(), record);
    }

    /// Live record for `session_id`
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        let record = self.records.read().get(session_id).cloned()?;
        if record.is_expired() {
            self.records.write().remove(session_id);
            return None;
        }
        Some(record)
    }

    /// Remove a record, returning whether one was present
    pub fn remove(&self, session_id: &str) -> bool {
        self.records.write().remove(session_id).is_some()
    }

    /// Drop every expired record and return how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, record| !record.is_expired());
        before - records.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
