use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::StorageError;
use crate::models::{FontSize, Settings};

/// Get the stored settings (singleton row, id=1). `None` before first save.
pub fn get_settings_row(conn: &Connection) -> Result<Option<Settings>, StorageError> {
    let row = conn
        .query_row(
            "SELECT font_size, high_contrast, sound_enabled, voice_enabled, vibration_enabled,
                    reminder_interval_minutes, pin, backup_enabled
             FROM settings WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i32>(1)?,
                    row.get::<_, i32>(2)?,
                    row.get::<_, i32>(3)?,
                    row.get::<_, i32>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, i32>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((font_size, contrast, sound, voice, vibration, interval, pin, backup)) = row else {
        return Ok(None);
    };

    let reminder_interval_minutes =
        u32::try_from(interval).map_err(|_| StorageError::InvalidValue {
            field: "settings.reminder_interval_minutes".into(),
            value: interval.to_string(),
        })?;

    Ok(Some(Settings {
        font_size: FontSize::from_str(&font_size)?,
        high_contrast: contrast != 0,
        sound_enabled: sound != 0,
        voice_enabled: voice != 0,
        vibration_enabled: vibration != 0,
        reminder_interval_minutes,
        pin,
        backup_enabled: backup != 0,
    }))
}

/// Write the singleton settings row (upsert).
pub fn put_settings(conn: &Connection, settings: &Settings) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO settings (id, font_size, high_contrast, sound_enabled, voice_enabled,
                               vibration_enabled, reminder_interval_minutes, pin, backup_enabled)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            font_size = ?1, high_contrast = ?2, sound_enabled = ?3, voice_enabled = ?4,
            vibration_enabled = ?5, reminder_interval_minutes = ?6, pin = ?7,
            backup_enabled = ?8",
        params![
            settings.font_size.as_str(),
            settings.high_contrast as i32,
            settings.sound_enabled as i32,
            settings.voice_enabled as i32,
            settings.vibration_enabled as i32,
            i64::from(settings.reminder_interval_minutes),
            settings.pin,
            settings.backup_enabled as i32,
        ],
    )?;
    Ok(())
}
