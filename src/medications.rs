//! Medication registry: add form validation, listing and deletion.
//!
//! View types for the home screen cards plus the functions that sit between
//! the add form and the medications collection.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, StorageError};
use crate::models::{Medication, MedicationType, FREQUENCY_OPTIONS, MEDICATION_COLORS};
use crate::schedule::{self, ScheduleError, TimePoint};

#[derive(Error, Debug)]
pub enum MedicationError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ═══════════════════════════════════════════
// View types
// ═══════════════════════════════════════════

/// Input from the add form.
#[derive(Debug, Clone, Deserialize)]
pub struct MedicationInput {
    pub name: String,
    pub photo: Option<String>,
    pub color: Option<String>,
    pub med_type: MedicationType,
    pub dosage: String,
    pub schedules: Vec<String>,
    pub frequency: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
}

/// A medication card for the home list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationCard {
    pub id: Uuid,
    pub name: String,
    pub dosage: String,
    pub color: String,
    pub med_type: MedicationType,
    pub has_photo: bool,
    pub next_time: Option<TimePoint>,
}

// ═══════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate the form input, assign id and creation time, persist.
pub fn add_medication(
    conn: &Connection,
    input: &MedicationInput,
    now: NaiveDateTime,
) -> Result<Medication, MedicationError> {
    let name = input.name.trim();
    let dosage = input.dosage.trim();
    if name.is_empty() || dosage.is_empty() {
        return Err(MedicationError::Validation(
            "Por favor, preencha o nome e a dosagem do medicamento.".into(),
        ));
    }
    if input.schedules.is_empty() {
        return Err(MedicationError::Validation(
            "Adicione pelo menos um horário.".into(),
        ));
    }
    let schedules = schedule::parse_time_points(&input.schedules)?;

    if let Some(end) = input.end_date {
        if end < input.start_date {
            return Err(MedicationError::Validation(
                "A data de término não pode ser anterior ao início.".into(),
            ));
        }
    }

    let med = Medication {
        id: Uuid::new_v4(),
        name: name.to_string(),
        photo: non_blank(input.photo.as_deref()),
        color: non_blank(input.color.as_deref())
            .unwrap_or_else(|| MEDICATION_COLORS[0].1.to_string()),
        med_type: input.med_type,
        dosage: dosage.to_string(),
        schedules,
        frequency: non_blank(input.frequency.as_deref())
            .unwrap_or_else(|| FREQUENCY_OPTIONS[0].to_string()),
        start_date: input.start_date,
        end_date: input.end_date,
        instructions: non_blank(input.instructions.as_deref()),
        created_at: now,
    };
    db::insert_medication(conn, &med)?;

    tracing::info!(
        medication_id = %med.id,
        time_points = med.schedules.len(),
        "Medication added"
    );
    Ok(med)
}

pub fn list_medications(conn: &Connection) -> Result<Vec<Medication>, StorageError> {
    db::get_all_medications(conn)
}

pub fn get_medication(conn: &Connection, id: &Uuid) -> Result<Option<Medication>, StorageError> {
    db::get_medication(conn, id)
}

/// Delete a medication. Its dose events stay in the ledger.
pub fn delete_medication(conn: &Connection, id: &Uuid) -> Result<bool, StorageError> {
    let removed = db::delete_medication(conn, id)?;
    if removed {
        tracing::info!(medication_id = %id, "Medication deleted; ledger entries kept");
    }
    Ok(removed)
}

/// Home list cards with each medication's next time point.
pub fn medication_cards(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<Vec<MedicationCard>, StorageError> {
    let meds = db::get_all_medications(conn)?;
    Ok(meds
        .into_iter()
        .map(|m| MedicationCard {
            next_time: schedule::next_occurrence(&m.schedules, now),
            id: m.id,
            name: m.name,
            dosage: m.dosage,
            color: m.color,
            med_type: m.med_type,
            has_photo: m.photo.is_some(),
        })
        .collect())
}
