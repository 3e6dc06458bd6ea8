//! Repository layer: collection-scoped database operations.
//!
//! One sub-module per collection. Every function takes a borrowed
//! connection and touches a single table; nothing here spans collections.

mod dose_event;
mod family;
mod medication;
mod settings;

use uuid::Uuid;

use super::StorageError;

// Re-export all public items from sub-modules
pub use dose_event::*;
pub use family::*;
pub use medication::*;
pub use settings::*;

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(value).map_err(|_| StorageError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}
