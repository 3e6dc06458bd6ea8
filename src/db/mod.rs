pub mod sqlite;
pub mod repository;

pub use sqlite::*;
pub use repository::*;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Storage format for instants. Lexicographic order matches chronological
/// order, which the date-range queries rely on.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid stored value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub fn parse_datetime(field: &str, value: &str) -> Result<NaiveDateTime, StorageError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|_| StorageError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| StorageError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}
