use crate::generator::Generator;
use crate::model::{self, ErrorCode, LogRecord, TaskStatus};
use rand::Rng;
use rusqlite::{Connection, params};
use std::path::PathBuf;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

pub const DEFAULT_PATH: &str = "warehouse.db";

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT,
    machine_id TEXT,
    task_duration REAL,
    status TEXT,
    error_code TEXT
)";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("create logs table: {0}")]
    Schema(#[source] rusqlite::Error),
    #[error("insert logs: {0}")]
    Insert(#[source] rusqlite::Error),
    #[error("query logs: {0}")]
    Query(#[source] rusqlite::Error),
    #[error("decode log row {id}: {message}")]
    Decode { id: i64, message: String },
    #[error("format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Storage for generated log records. Appends only; nothing is updated or
/// removed once saved.
pub trait RecordStore {
    fn ensure_initialized(&mut self) -> Result<(), StoreError>;
    fn load(&self) -> Result<Vec<LogRecord>, StoreError>;
    fn save(&mut self, records: &[LogRecord]) -> Result<(), StoreError>;
}

#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let conn = Connection::open(&path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { path, conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }
}

impl RecordStore for SqliteStore {
    fn ensure_initialized(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .map_err(StoreError::Schema)
    }

    fn load(&self) -> Result<Vec<LogRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, machine_id, task_duration, status, error_code
                 FROM logs ORDER BY id",
            )
            .map_err(StoreError::Query)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(RawRow {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    machine_id: row.get(2)?,
                    task_duration: row.get(3)?,
                    status: row.get(4)?,
                    error_code: row.get(5)?,
                })
            })
            .map_err(StoreError::Query)?;

        let mut records = Vec::new();
        for row in rows {
            let raw = row.map_err(StoreError::Query)?;
            records.push(raw.decode()?);
        }

        debug!(path = %self.path.display(), count = records.len(), "loaded log records");
        Ok(records)
    }

    fn save(&mut self, records: &[LogRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction().map_err(StoreError::Insert)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO logs (timestamp, machine_id, task_duration, status, error_code)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(StoreError::Insert)?;

            for record in records {
                let timestamp = model::format_timestamp(record.timestamp)?;
                stmt.execute(params![
                    timestamp,
                    record.machine_id,
                    record.task_duration,
                    record.status.as_str(),
                    record.error_code.as_str(),
                ])
                .map_err(StoreError::Insert)?;
            }
        }
        tx.commit().map_err(StoreError::Insert)?;

        debug!(path = %self.path.display(), count = records.len(), "saved log records");
        Ok(())
    }
}

struct RawRow {
    id: i64,
    timestamp: String,
    machine_id: String,
    task_duration: f64,
    status: String,
    error_code: String,
}

impl RawRow {
    fn decode(self) -> Result<LogRecord, StoreError> {
        let id = self.id;
        let decode_err = |message: String| StoreError::Decode { id, message };

        let timestamp = model::parse_timestamp(&self.timestamp)
            .map_err(|e| decode_err(format!("timestamp {:?}: {e}", self.timestamp)))?;
        let status = self.status.parse::<TaskStatus>().map_err(decode_err)?;
        let error_code = self.error_code.parse::<ErrorCode>().map_err(decode_err)?;

        let record = LogRecord {
            timestamp,
            machine_id: self.machine_id,
            task_duration: self.task_duration,
            status,
            error_code,
        };

        if !record.is_consistent() {
            return Err(decode_err(format!(
                "error code {} does not match status {}",
                record.error_code, record.status
            )));
        }

        Ok(record)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<LogRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn ensure_initialized(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn load(&self) -> Result<Vec<LogRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn save(&mut self, records: &[LogRecord]) -> Result<(), StoreError> {
        self.records.extend_from_slice(records);
        Ok(())
    }
}

pub fn bootstrap<S, R>(
    store: &mut S,
    generator: &Generator,
    rng: &mut R,
    now: OffsetDateTime,
    batch: usize,
) -> Result<Vec<LogRecord>, StoreError>
where
    S: RecordStore + ?Sized,
    R: Rng,
{
    store.ensure_initialized()?;

    let existing = store.load()?;
    if !existing.is_empty() {
        info!(count = existing.len(), "reusing stored log records");
        return Ok(existing);
    }

    let generated = generator.generate(rng, now, batch);
    store.save(&generated)?;
    info!(count = generated.len(), "seeded empty store with generated records");

    store.load()
}
