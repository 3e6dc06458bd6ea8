use serde::{Deserialize, Serialize};

use super::enums::FontSize;
use crate::config;

/// Singleton settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub font_size: FontSize,
    pub high_contrast: bool,
    pub sound_enabled: bool,
    pub voice_enabled: bool,
    pub vibration_enabled: bool,
    pub reminder_interval_minutes: u32,
    pub pin: Option<String>,
    pub backup_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_size: FontSize::ExtraLarge,
            high_contrast: false,
            sound_enabled: true,
            voice_enabled: true,
            vibration_enabled: true,
            reminder_interval_minutes: config::DEFAULT_REMINDER_INTERVAL_MINUTES,
            pin: None,
            backup_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_favour_accessibility() {
        let s = Settings::default();
        assert_eq!(s.font_size, FontSize::ExtraLarge);
        assert!(s.sound_enabled && s.voice_enabled && s.vibration_enabled);
        assert_eq!(s.reminder_interval_minutes, 5);
        assert!(s.pin.is_none());
        assert!(!s.backup_enabled);
    }
}
