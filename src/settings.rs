//! Settings: singleton record with defaults on first access.

use std::time::Duration;

use rusqlite::Connection;

use crate::db::{self, StorageError};
use crate::models::Settings;

/// Load settings, inserting the defaults the first time.
pub fn load_settings(conn: &Connection) -> Result<Settings, StorageError> {
    if let Some(settings) = db::get_settings_row(conn)? {
        return Ok(settings);
    }
    let defaults = Settings::default();
    db::put_settings(conn, &defaults)?;
    tracing::info!("Settings initialized with defaults");
    Ok(defaults)
}

/// Replace the stored settings in place.
pub fn save_settings(conn: &Connection, settings: &Settings) -> Result<(), StorageError> {
    db::put_settings(conn, settings)?;
    tracing::debug!(
        interval_minutes = settings.reminder_interval_minutes,
        sound = settings.sound_enabled,
        voice = settings.voice_enabled,
        vibration = settings.vibration_enabled,
        "Settings saved"
    );
    Ok(())
}

impl Settings {
    /// The "Lembrar Depois" delay. Never shorter than one minute.
    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.reminder_interval_minutes.max(1)) * 60)
    }
}
