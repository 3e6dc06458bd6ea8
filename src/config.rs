use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedicFácil";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "MEDICFACIL_DB";

/// Half-width of the due window around a scheduled time point.
pub const DUE_WINDOW_MINUTES: u32 = 30;

/// How often the reminder session re-runs the resolver.
pub const POLL_INTERVAL_SECS: u64 = 60;

/// "Lembrar Depois" delay used until the user changes it in settings.
pub const DEFAULT_REMINDER_INTERVAL_MINUTES: u32 = 5;

/// Speech parameters: slower than normal for elderly listeners.
pub const SPEECH_LOCALE: &str = "pt-BR";
pub const SPEECH_RATE: f32 = 0.8;
pub const SPEECH_PITCH: f32 = 1.0;
pub const SPEECH_VOLUME: f32 = 1.0;

/// Vibration pattern in milliseconds (on, off, on, off, on).
pub const VIBRATION_PATTERN_MS: &[u64] = &[500, 200, 500, 200, 500];

pub const ALERT_SOUND: &str = "alert.mp3";
pub const DEFAULT_ICON: &str = "icon-512x512.png";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medicfacil_lib=info,medicfacil=info,warn"
}

/// Get the application data directory
/// ~/MedicFacil/ on all platforms; falls back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("MedicFacil")
}

/// Database file, honouring the `MEDICFACIL_DB` override.
pub fn database_path() -> PathBuf {
    match std::env::var_os(DB_PATH_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => app_data_dir().join("medicfacil.db"),
    }
}
