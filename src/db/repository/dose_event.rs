use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::{format_datetime, parse_datetime, StorageError};
use crate::models::{DoseEvent, DoseStatus};

const DOSE_EVENT_COLUMNS: &str =
    "id, medication_id, scheduled_time, taken_at, status, created_at";

/// Append a dose event. An existing id is rejected, never overwritten.
pub fn insert_dose_event(conn: &Connection, event: &DoseEvent) -> Result<(), StorageError> {
    conn.execute(
        &format!(
            "INSERT INTO dose_events ({DOSE_EVENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ),
        params![
            event.id.to_string(),
            event.medication_id.to_string(),
            format_datetime(&event.scheduled_time),
            event.taken_at.as_ref().map(format_datetime),
            event.status.as_str(),
            format_datetime(&event.created_at),
        ],
    )?;
    Ok(())
}

/// Overwrite status and taken-at of an existing event.
pub fn update_dose_event_status(
    conn: &Connection,
    id: &Uuid,
    status: DoseStatus,
    taken_at: Option<NaiveDateTime>,
) -> Result<(), StorageError> {
    let updated = conn.execute(
        "UPDATE dose_events SET status = ?1, taken_at = ?2 WHERE id = ?3",
        params![
            status.as_str(),
            taken_at.as_ref().map(format_datetime),
            id.to_string(),
        ],
    )?;
    if updated == 0 {
        return Err(StorageError::NotFound {
            entity_type: "DoseEvent".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Events whose scheduled time falls on `date`, in insertion order.
pub fn get_dose_events_by_date(
    conn: &Connection,
    date: NaiveDate,
) -> Result<Vec<DoseEvent>, StorageError> {
    let start = date.and_time(chrono::NaiveTime::MIN);
    let end = start + Duration::days(1);

    let mut stmt = conn.prepare(&format!(
        "SELECT {DOSE_EVENT_COLUMNS} FROM dose_events
         WHERE scheduled_time >= ?1 AND scheduled_time < ?2
         ORDER BY seq ASC"
    ))?;
    let rows = stmt.query_map(
        params![format_datetime(&start), format_datetime(&end)],
        dose_event_row_from_rusqlite,
    )?;
    collect_events(rows)
}

/// Events for one medication, in insertion order.
pub fn get_dose_events_by_medication(
    conn: &Connection,
    medication_id: &Uuid,
) -> Result<Vec<DoseEvent>, StorageError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOSE_EVENT_COLUMNS} FROM dose_events
         WHERE medication_id = ?1
         ORDER BY seq ASC"
    ))?;
    let rows = stmt.query_map(params![medication_id.to_string()], dose_event_row_from_rusqlite)?;
    collect_events(rows)
}

/// Events recorded for one medication at one scheduled instant.
pub fn get_dose_events_for_occurrence(
    conn: &Connection,
    medication_id: &Uuid,
    scheduled_time: &NaiveDateTime,
) -> Result<Vec<DoseEvent>, StorageError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOSE_EVENT_COLUMNS} FROM dose_events
         WHERE medication_id = ?1 AND scheduled_time = ?2
         ORDER BY seq ASC"
    ))?;
    let rows = stmt.query_map(
        params![medication_id.to_string(), format_datetime(scheduled_time)],
        dose_event_row_from_rusqlite,
    )?;
    collect_events(rows)
}

fn collect_events(
    rows: impl Iterator<Item = Result<DoseEventRow, rusqlite::Error>>,
) -> Result<Vec<DoseEvent>, StorageError> {
    let mut events = Vec::new();
    for row in rows {
        events.push(dose_event_from_row(row?)?);
    }
    Ok(events)
}

struct DoseEventRow {
    id: String,
    medication_id: String,
    scheduled_time: String,
    taken_at: Option<String>,
    status: String,
    created_at: String,
}

fn dose_event_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<DoseEventRow, rusqlite::Error> {
    Ok(DoseEventRow {
        id: row.get(0)?,
        medication_id: row.get(1)?,
        scheduled_time: row.get(2)?,
        taken_at: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn dose_event_from_row(row: DoseEventRow) -> Result<DoseEvent, StorageError> {
    Ok(DoseEvent {
        id: parse_uuid("dose_events.id", &row.id)?,
        medication_id: parse_uuid("dose_events.medication_id", &row.medication_id)?,
        scheduled_time: parse_datetime("dose_events.scheduled_time", &row.scheduled_time)?,
        taken_at: row
            .taken_at
            .map(|t| parse_datetime("dose_events.taken_at", &t))
            .transpose()?,
        status: DoseStatus::from_str(&row.status)?,
        created_at: parse_datetime("dose_events.created_at", &row.created_at)?,
    })
}
