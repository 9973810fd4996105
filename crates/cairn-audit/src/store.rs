//! Append-only audit storage.
//!
//! The [`AuditStore`] trait is the seam for a durable backend; the in-memory
//! implementation here is what the library ships. The trait deliberately has
//! no update or delete operation — append-only is a structural guarantee,
//! not a convention.

use std::sync::{PoisonError, RwLock};

use crate::record::AuditRecord;

/// Storage-layer failures. Always caught and absorbed by the engine; only
/// [`AuditQuerySurface`](crate::AuditQuerySurface) callers see them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected or could not complete the operation.
    #[error("audit store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only persistence for audit records.
///
/// Implementations must assign each appended record a strictly increasing
/// `sequence` reflecting persist order, and must tolerate concurrent appends
/// and scans.
pub trait AuditStore: Send + Sync {
    /// Persists one record, assigning its sequence.
    fn append(&self, record: AuditRecord) -> Result<(), StoreError>;

    /// Returns every stored record. Filtering and ordering are the query
    /// surface's concern.
    fn scan(&self) -> Result<Vec<AuditRecord>, StoreError>;
}

/// In-memory append-only store.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&self, mut record: AuditRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        // Sequence is assigned under the write lock, so persist order and
        // sequence order cannot diverge.
        record.sequence = records.len() as u64;
        records.push(record);
        Ok(())
    }

    fn scan(&self) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
