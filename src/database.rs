use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::invoices::InvoiceStore;
use crate::models::{round2, BillingConfig, DayOverrides, MonthInvoice, SelectedDays, WeeklySchedule};

/// Stable keys of the stored documents
pub mod keys {
    pub const CONFIG: &str = "creche_config";
    pub const SCHEDULE: &str = "creche_schedule";
    pub const SELECTED_DAYS: &str = "creche_selected_days";
    pub const DAY_OVERRIDES: &str = "creche_day_overrides";
    pub const INVOICES: &str = "creche_invoices";
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Failed to serialize document '{key}': {source}")]
    SerializeError {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value document store backed by SQLite.
///
/// Every `load_*` falls back to its default when the stored document is
/// missing or cannot be decoded; only SQLite failures are reported.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        let db = Database { conn };
        db.initialize_schema()?;
        tracing::debug!(path = %db_path.display(), "Database opened");
        Ok(db)
    }

    /// Throwaway database, used by tests
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database { conn: Connection::open_in_memory()? };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Raw JSON text stored under `key`
    pub fn get_raw(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM documents WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Store raw text under `key`, replacing any previous value
    pub fn put_raw(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO documents (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![
                key,
                value,
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_or<T: DeserializeOwned>(&self, key: &str, fallback: impl FnOnce() -> T) -> Result<T, DatabaseError> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(fallback());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Stored document is malformed, using default");
                Ok(fallback())
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(value).map_err(|source| DatabaseError::SerializeError {
            key: key.to_string(),
            source,
        })?;
        self.put_raw(key, &json)
    }

    /// Billing config with the rate kept to cents
    pub fn load_config(&self) -> Result<BillingConfig, DatabaseError> {
        let config: BillingConfig = self.load_or(keys::CONFIG, BillingConfig::default)?;
        Ok(BillingConfig { hourly_rate: round2(config.hourly_rate) })
    }

    pub fn save_config(&self, config: &BillingConfig) -> Result<(), DatabaseError> {
        self.save(keys::CONFIG, config)
    }

    pub fn load_schedule(&self) -> Result<WeeklySchedule, DatabaseError> {
        self.load_or(keys::SCHEDULE, WeeklySchedule::default)
    }

    pub fn save_schedule(&self, schedule: &WeeklySchedule) -> Result<(), DatabaseError> {
        self.save(keys::SCHEDULE, schedule)
    }

    pub fn load_selected_days(&self) -> Result<SelectedDays, DatabaseError> {
        self.load_or(keys::SELECTED_DAYS, SelectedDays::default)
    }

    pub fn save_selected_days(&self, days: &SelectedDays) -> Result<(), DatabaseError> {
        self.save(keys::SELECTED_DAYS, days)
    }

    pub fn load_day_overrides(&self) -> Result<DayOverrides, DatabaseError> {
        self.load_or(keys::DAY_OVERRIDES, DayOverrides::default)
    }

    pub fn save_day_overrides(&self, overrides: &DayOverrides) -> Result<(), DatabaseError> {
        self.save(keys::DAY_OVERRIDES, overrides)
    }

    /// Stored invoices, sorted by month key
    pub fn load_invoices(&self) -> Result<InvoiceStore, DatabaseError> {
        let records: Vec<MonthInvoice> = self.load_or(keys::INVOICES, Vec::new)?;
        Ok(InvoiceStore::from_records(records))
    }

    pub fn save_invoices(&self, store: &InvoiceStore) -> Result<(), DatabaseError> {
        self.save(keys::INVOICES, store.list())
    }
}
