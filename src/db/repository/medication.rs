use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::{format_datetime, parse_date, parse_datetime, StorageError, DATE_FORMAT};
use crate::models::{Medication, MedicationType};
use crate::schedule::TimePoint;

const MEDICATION_COLUMNS: &str = "id, name, photo, color, med_type, dosage, schedules, frequency,
     start_date, end_date, instructions, created_at";

/// Insert a new medication. Fails if the id already exists.
pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), StorageError> {
    write_medication(conn, "INSERT", med)
}

/// Insert or replace a medication keyed by id.
pub fn put_medication(conn: &Connection, med: &Medication) -> Result<(), StorageError> {
    write_medication(conn, "INSERT OR REPLACE", med)
}

fn write_medication(conn: &Connection, verb: &str, med: &Medication) -> Result<(), StorageError> {
    let schedules = serde_json::to_string(&med.schedules)?;
    conn.execute(
        &format!(
            "{verb} INTO medications ({MEDICATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            med.id.to_string(),
            med.name,
            med.photo,
            med.color,
            med.med_type.as_str(),
            med.dosage,
            schedules,
            med.frequency,
            med.start_date.format(DATE_FORMAT).to_string(),
            med.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
            med.instructions,
            format_datetime(&med.created_at),
        ],
    )?;
    Ok(())
}

/// Fetch one medication. Absent is `Ok(None)`, not an error.
pub fn get_medication(conn: &Connection, id: &Uuid) -> Result<Option<Medication>, StorageError> {
    let row = conn
        .query_row(
            &format!("SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = ?1"),
            params![id.to_string()],
            medication_row_from_rusqlite,
        )
        .optional()?;
    row.map(medication_from_row).transpose()
}

/// All medications in insertion order.
pub fn get_all_medications(conn: &Connection) -> Result<Vec<Medication>, StorageError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications ORDER BY rowid ASC"
    ))?;

    let rows = stmt.query_map([], medication_row_from_rusqlite)?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medication_from_row(row?)?);
    }
    Ok(meds)
}

/// Delete a medication. Returns whether a row was removed.
///
/// Dose events referencing the medication are left in place.
pub fn delete_medication(conn: &Connection, id: &Uuid) -> Result<bool, StorageError> {
    let removed = conn.execute("DELETE FROM medications WHERE id = ?1", params![id.to_string()])?;
    Ok(removed > 0)
}

// Internal row type for Medication mapping
struct MedicationRow {
    id: String,
    name: String,
    photo: Option<String>,
    color: String,
    med_type: String,
    dosage: String,
    schedules: String,
    frequency: String,
    start_date: String,
    end_date: Option<String>,
    instructions: Option<String>,
    created_at: String,
}

fn medication_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicationRow, rusqlite::Error> {
    Ok(MedicationRow {
        id: row.get(0)?,
        name: row.get(1)?,
        photo: row.get(2)?,
        color: row.get(3)?,
        med_type: row.get(4)?,
        dosage: row.get(5)?,
        schedules: row.get(6)?,
        frequency: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
        instructions: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, StorageError> {
    let schedules: Vec<TimePoint> = serde_json::from_str(&row.schedules)?;
    Ok(Medication {
        id: parse_uuid("medications.id", &row.id)?,
        name: row.name,
        photo: row.photo,
        color: row.color,
        med_type: MedicationType::from_str(&row.med_type)?,
        dosage: row.dosage,
        schedules,
        frequency: row.frequency,
        start_date: parse_date("medications.start_date", &row.start_date)?,
        end_date: row
            .end_date
            .map(|d| parse_date("medications.end_date", &d))
            .transpose()?,
        instructions: row.instructions,
        created_at: parse_datetime("medications.created_at", &row.created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn test_db() -> Connection {
        open_memory_database().expect("in-memory DB")
    }

    fn created() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn make_med(name: &str) -> Medication {
        Medication {
            id: Uuid::new_v4(),
            name: name.into(),
            photo: Some("data:image/jpeg;base64,AAAA".into()),
            color: "#BFDBFE".into(),
            med_type: MedicationType::Capsule,
            dosage: "1 cápsula".into(),
            schedules: vec!["20:00".parse().unwrap(), "08:00".parse().unwrap()],
            frequency: "2x ao dia".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()),
            instructions: Some("Tomar após o café".into()),
            created_at: created(),
        }
    }

    #[test]
    fn insert_then_get_preserves_every_field() {
        let conn = test_db();
        let med = make_med("Omeprazol");
        insert_medication(&conn, &med).unwrap();

        let loaded = get_medication(&conn, &med.id).unwrap().expect("present");
        assert_eq!(loaded, med);
        // entry order of time points is kept
        assert_eq!(loaded.schedules[0].to_string(), "20:00");
    }

    #[test]
    fn get_missing_is_none() {
        let conn = test_db();
        assert!(get_medication(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let conn = test_db();
        let med = make_med("Omeprazol");
        insert_medication(&conn, &med).unwrap();
        assert!(insert_medication(&conn, &med).is_err());
    }

    #[test]
    fn put_replaces_existing_record() {
        let conn = test_db();
        let mut med = make_med("Omeprazol");
        insert_medication(&conn, &med).unwrap();

        med.dosage = "2 cápsulas".into();
        med.end_date = None;
        put_medication(&conn, &med).unwrap();

        let all = get_all_medications(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].dosage, "2 cápsulas");
        assert_eq!(all[0].end_date, None);
    }

    #[test]
    fn get_all_keeps_insertion_order() {
        let conn = test_db();
        for name in ["Losartana", "Metformina", "AAS"] {
            insert_medication(&conn, &make_med(name)).unwrap();
        }
        let names: Vec<_> = get_all_medications(&conn)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Losartana", "Metformina", "AAS"]);
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let conn = test_db();
        let med = make_med("Losartana");
        insert_medication(&conn, &med).unwrap();
        assert!(delete_medication(&conn, &med.id).unwrap());
        assert!(!delete_medication(&conn, &med.id).unwrap());
        assert!(get_all_medications(&conn).unwrap().is_empty());
    }

    #[test]
    fn corrupt_med_type_surfaces_invalid_enum() {
        let conn = test_db();
        let med = make_med("Losartana");
        insert_medication(&conn, &med).unwrap();
        conn.execute("UPDATE medications SET med_type = 'syrup'", []).unwrap();
        assert!(matches!(
            get_medication(&conn, &med.id),
            Err(StorageError::InvalidEnum { .. })
        ));
    }

    #[test]
    fn corrupt_schedule_json_surfaces_json_error() {
        let conn = test_db();
        let med = make_med("Losartana");
        insert_medication(&conn, &med).unwrap();
        conn.execute("UPDATE medications SET schedules = '[\"99:99\"]'", []).unwrap();
        assert!(matches!(
            get_all_medications(&conn),
            Err(StorageError::Json(_))
        ));
    }
}
