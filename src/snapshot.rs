use crate::model::{ErrorCode, LogRecord, TaskStatus};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    version: u64,
    records: Vec<LogRecord>,
}

impl Snapshot {
    pub fn new(version: u64, records: Vec<LogRecord>) -> Self {
        Self { version, records }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Appends are serialized and publish in one swap; readers holding an
/// `Arc<Snapshot>` never see a half-applied batch.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::new(1, records))),
            writer: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn append(&self, batch: Vec<LogRecord>) -> Arc<Snapshot> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let base = self.current();

        let mut records = Vec::with_capacity(base.len() + batch.len());
        records.extend_from_slice(base.records());
        records.extend(batch);

        let next = Arc::new(Snapshot::new(base.version() + 1, records));
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&next);
        next
    }

    pub fn unseen(&self, batch: Vec<LogRecord>) -> Vec<LogRecord> {
        let base = self.current();
        let mut seen: HashSet<RowKey> = base.records().iter().map(row_key).collect();
        batch
            .into_iter()
            .filter(|record| seen.insert(row_key(record)))
            .collect()
    }
}

type RowKey = (OffsetDateTime, String, u64, TaskStatus, ErrorCode);

fn row_key(record: &LogRecord) -> RowKey {
    (
        record.timestamp,
        record.machine_id.clone(),
        record.task_duration.to_bits(),
        record.status,
        record.error_code,
    )
}
