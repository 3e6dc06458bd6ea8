//! Adherence ledger: append-only dose history and its derivations.
//!
//! Writes go through [`record`]; reads return storage order. Counts,
//! percentages and the plain-text day report are computed from the
//! returned events and never stored.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, StorageError};
use crate::models::{DoseEvent, DoseStatus, Medication};

/// Append one event.
pub fn record(conn: &Connection, event: &DoseEvent) -> Result<(), StorageError> {
    if !event.is_consistent() {
        return Err(StorageError::ConstraintViolation(format!(
            "dose event {} is taken without taken_at",
            event.id
        )));
    }
    db::insert_dose_event(conn, event)?;
    tracing::debug!(
        event_id = %event.id,
        medication_id = %event.medication_id,
        status = event.status.as_str(),
        "Dose event recorded"
    );
    Ok(())
}

/// Events scheduled on `date`, storage order. Sort by `scheduled_time`
/// for a chronological view.
pub fn by_date(conn: &Connection, date: NaiveDate) -> Result<Vec<DoseEvent>, StorageError> {
    db::get_dose_events_by_date(conn, date)
}

pub fn by_medication(conn: &Connection, medication_id: &Uuid) -> Result<Vec<DoseEvent>, StorageError> {
    db::get_dose_events_by_medication(conn, medication_id)
}

/// Correct the status of an existing event.
pub fn update_status(
    conn: &Connection,
    id: &Uuid,
    status: DoseStatus,
    taken_at: Option<NaiveDateTime>,
) -> Result<(), StorageError> {
    if status == DoseStatus::Taken && taken_at.is_none() {
        return Err(StorageError::ConstraintViolation(
            "status taken requires taken_at".into(),
        ));
    }
    db::update_dose_event_status(conn, id, status, taken_at)?;
    tracing::info!(event_id = %id, status = status.as_str(), "Dose event corrected");
    Ok(())
}

/// Whether a decision (taken, skipped or delayed) already exists for this
/// medication at this scheduled instant.
pub fn has_decision(
    conn: &Connection,
    medication_id: &Uuid,
    scheduled_time: &NaiveDateTime,
) -> Result<bool, StorageError> {
    let events = db::get_dose_events_for_occurrence(conn, medication_id, scheduled_time)?;
    Ok(events.iter().any(|e| e.status.is_decision()))
}

// ═══════════════════════════════════════════
// Derivations
// ═══════════════════════════════════════════

/// Per-status counts for a set of events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCounts {
    pub pending: u32,
    pub taken: u32,
    pub skipped: u32,
    pub delayed: u32,
}

impl DayCounts {
    pub fn total(&self) -> u32 {
        self.pending + self.taken + self.skipped + self.delayed
    }
}

pub fn count_by_status(events: &[DoseEvent]) -> DayCounts {
    let mut counts = DayCounts::default();
    for event in events {
        match event.status {
            DoseStatus::Pending => counts.pending += 1,
            DoseStatus::Taken => counts.taken += 1,
            DoseStatus::Skipped => counts.skipped += 1,
            DoseStatus::Delayed => counts.delayed += 1,
        }
    }
    counts
}

/// Taken / total for one medication, rounded to the nearest integer.
/// Zero events gives 0.
pub fn adherence_percentage(events: &[DoseEvent], medication_id: &Uuid) -> u8 {
    let (taken, total) = events
        .iter()
        .filter(|e| &e.medication_id == medication_id)
        .fold((0u32, 0u32), |(taken, total), e| {
            (taken + u32::from(e.status == DoseStatus::Taken), total + 1)
        });
    if total == 0 {
        return 0;
    }
    ((f64::from(taken) / f64::from(total)) * 100.0).round() as u8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationAdherence {
    pub medication_id: Uuid,
    pub name: String,
    pub taken: u32,
    pub total: u32,
    pub percentage: u8,
}

/// Adherence for every medication, in medication order.
pub fn medication_adherence(
    events: &[DoseEvent],
    medications: &[Medication],
) -> Vec<MedicationAdherence> {
    medications
        .iter()
        .map(|med| {
            let mine: Vec<&DoseEvent> =
                events.iter().filter(|e| e.medication_id == med.id).collect();
            MedicationAdherence {
                medication_id: med.id,
                name: med.name.clone(),
                taken: mine.iter().filter(|e| e.status == DoseStatus::Taken).count() as u32,
                total: mine.len() as u32,
                percentage: adherence_percentage(events, &med.id),
            }
        })
        .collect()
}

/// Plain-text history export for one day.
pub fn day_report(conn: &Connection, date: NaiveDate) -> Result<String, StorageError> {
    let events = by_date(conn, date)?;
    let medications: HashMap<Uuid, Medication> = db::get_all_medications(conn)?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    Ok(render_day_report(date, &events, &medications))
}

fn render_day_report(
    date: NaiveDate,
    events: &[DoseEvent],
    medications: &HashMap<Uuid, Medication>,
) -> String {
    let mut report = format!("Histórico de Medicamentos - {}\n\n", date.format("%d/%m/%Y"));
    let lines: Vec<String> = events
        .iter()
        .map(|event| {
            let (name, dosage) = medications
                .get(&event.medication_id)
                .map(|m| (m.name.as_str(), m.dosage.as_str()))
                .unwrap_or(("?", "?"));
            format!(
                "{} - {} ({}) - {}",
                event.scheduled_time.format("%H:%M"),
                name,
                dosage,
                event.status.label()
            )
        })
        .collect();
    report.push_str(&lines.join("\n"));
    report
}
