use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::MedicationType;
use crate::schedule::TimePoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    /// Opaque photo reference (file path or data URL), used as the
    /// notification icon when present.
    pub photo: Option<String>,
    pub color: String,
    pub med_type: MedicationType,
    pub dosage: String,
    /// Daily time points in the order the user entered them.
    pub schedules: Vec<TimePoint>,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Medication {
    /// A medication without time points never becomes due.
    pub fn is_schedulable(&self) -> bool {
        !self.schedules.is_empty()
    }

    /// Whether `date` lies within the start/end range (both inclusive).
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        if date < self.start_date {
            return false;
        }
        match self.end_date {
            Some(end) => date <= end,
            None => true,
        }
    }
}

/// Swatches offered by the add form (name, hex value).
pub const MEDICATION_COLORS: &[(&str, &str)] = &[
    ("Branco", "#FFFFFF"),
    ("Amarelo", "#FEF08A"),
    ("Rosa", "#FBCFE8"),
    ("Azul", "#BFDBFE"),
    ("Verde", "#BBF7D0"),
    ("Laranja", "#FED7AA"),
    ("Roxo", "#DDD6FE"),
    ("Vermelho", "#FECACA"),
    ("Marrom", "#D6BCAB"),
];

/// Frequency labels offered by the add form. The stored label is free-form.
pub const FREQUENCY_OPTIONS: &[&str] = &[
    "1x ao dia",
    "2x ao dia",
    "3x ao dia",
    "4x ao dia",
    "A cada 4 horas",
    "A cada 6 horas",
    "A cada 8 horas",
    "A cada 12 horas",
    "Quando necessário",
];
