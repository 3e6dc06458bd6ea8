//! Delivery channels: the capability set a reminder is announced through.
//!
//! Each runtime capability (system notification, audio cue, vibration,
//! speech) sits behind a small backend trait. A channel adapts one backend
//! to the common [`DeliveryChannel`] operation so the dispatcher treats
//! every capability the same way: deliver, and log what failed.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::models::{Medication, Settings};
use crate::schedule::{DueOccurrence, TimePoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Notification,
    Audio,
    Haptic,
    Speech,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::Audio => "audio",
            Self::Haptic => "haptic",
            Self::Speech => "speech",
        }
    }

    /// Whether the user's settings allow this channel.
    pub fn enabled_by(&self, settings: &Settings) -> bool {
        match self {
            Self::Notification => true,
            Self::Audio => settings.sound_enabled,
            Self::Haptic => settings.vibration_enabled,
            Self::Speech => settings.voice_enabled,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Permission denied for {0} channel")]
    PermissionDenied(ChannelKind),

    #[error("{0} channel unavailable on this runtime")]
    Unavailable(ChannelKind),

    #[error("{kind} delivery failed: {reason}")]
    Failed { kind: ChannelKind, reason: String },
}

// ═══════════════════════════════════════════
// Alert content
// ═══════════════════════════════════════════

/// Everything the channels need to announce one occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderAlert {
    pub medication_id: Uuid,
    pub medication_name: String,
    pub dosage: String,
    pub instructions: Option<String>,
    pub color: String,
    pub time_point: TimePoint,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub tag: String,
    pub speech_text: String,
}

impl ReminderAlert {
    pub fn new(medication: &Medication, occurrence: &DueOccurrence) -> Self {
        let time = occurrence.time_point.to_string();
        let mut speech_text = format!(
            "Atenção! Hora de tomar o remédio {}. Dosagem: {}.",
            medication.name, medication.dosage
        );
        if let Some(instructions) = &medication.instructions {
            speech_text.push(' ');
            speech_text.push_str(instructions);
        }

        Self {
            medication_id: medication.id,
            medication_name: medication.name.clone(),
            dosage: medication.dosage.clone(),
            instructions: medication.instructions.clone(),
            color: medication.color.clone(),
            time_point: occurrence.time_point,
            title: "⏰ Hora do Remédio!".into(),
            body: format!("{}\n{}\n{}", medication.name, medication.dosage, time),
            icon: medication
                .photo
                .clone()
                .unwrap_or_else(|| config::DEFAULT_ICON.to_string()),
            tag: format!("medication-{}-{}", medication.id, time),
            speech_text,
        }
    }
}

// ═══════════════════════════════════════════
// Backends
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

pub trait NotificationBackend: Send {
    fn permission(&self) -> Permission;
    fn request_permission(&mut self) -> Result<Permission, ChannelError>;
    fn show(&mut self, title: &str, body: &str, icon: &str, tag: &str) -> Result<(), ChannelError>;
}

pub trait SpeechBackend: Send {
    fn speak(
        &mut self,
        text: &str,
        locale: &str,
        rate: f32,
        pitch: f32,
        volume: f32,
    ) -> Result<(), ChannelError>;
}

pub trait HapticBackend: Send {
    fn vibrate(&mut self, pattern_ms: &[u64]) -> Result<(), ChannelError>;
}

pub trait AudioBackend: Send {
    fn play_cue(&mut self, sound_ref: &str) -> Result<(), ChannelError>;
}

/// One best-effort delivery capability.
pub trait DeliveryChannel: Send {
    fn kind(&self) -> ChannelKind;

    /// One-time setup before the first reminder (permission prompts).
    fn prepare(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }

    fn deliver(&mut self, alert: &ReminderAlert) -> Result<(), ChannelError>;
}

// ═══════════════════════════════════════════
// Channels
// ═══════════════════════════════════════════

pub struct NotificationChannel<B> {
    backend: B,
}

impl<B: NotificationBackend> NotificationChannel<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: NotificationBackend> DeliveryChannel for NotificationChannel<B> {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Notification
    }

    fn prepare(&mut self) -> Result<(), ChannelError> {
        match self.backend.request_permission()? {
            Permission::Granted => Ok(()),
            _ => Err(ChannelError::PermissionDenied(ChannelKind::Notification)),
        }
    }

    fn deliver(&mut self, alert: &ReminderAlert) -> Result<(), ChannelError> {
        // Permission can change between reminders; re-check every time.
        if self.backend.permission() != Permission::Granted
            && self.backend.request_permission()? != Permission::Granted
        {
            return Err(ChannelError::PermissionDenied(ChannelKind::Notification));
        }
        self.backend
            .show(&alert.title, &alert.body, &alert.icon, &alert.tag)
    }
}

pub struct AudioChannel<B> {
    backend: B,
    sound_ref: String,
}

impl<B: AudioBackend> AudioChannel<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            sound_ref: config::ALERT_SOUND.to_string(),
        }
    }
}

impl<B: AudioBackend> DeliveryChannel for AudioChannel<B> {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Audio
    }

    fn deliver(&mut self, _alert: &ReminderAlert) -> Result<(), ChannelError> {
        self.backend.play_cue(&self.sound_ref)
    }
}

pub struct HapticChannel<B> {
    backend: B,
    pattern_ms: Vec<u64>,
}

impl<B: HapticBackend> HapticChannel<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            pattern_ms: config::VIBRATION_PATTERN_MS.to_vec(),
        }
    }
}

impl<B: HapticBackend> DeliveryChannel for HapticChannel<B> {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Haptic
    }

    fn deliver(&mut self, _alert: &ReminderAlert) -> Result<(), ChannelError> {
        self.backend.vibrate(&self.pattern_ms)
    }
}

pub struct SpeechChannel<B> {
    backend: B,
}

impl<B: SpeechBackend> SpeechChannel<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: SpeechBackend> DeliveryChannel for SpeechChannel<B> {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Speech
    }

    fn deliver(&mut self, alert: &ReminderAlert) -> Result<(), ChannelError> {
        self.backend.speak(
            &alert.speech_text,
            config::SPEECH_LOCALE,
            config::SPEECH_RATE,
            config::SPEECH_PITCH,
            config::SPEECH_VOLUME,
        )
    }
}

// ═══════════════════════════════════════════
// Capability set
// ═══════════════════════════════════════════

/// Outcome of announcing one alert across the capability set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub delivered: Vec<ChannelKind>,
    pub disabled: Vec<ChannelKind>,
    pub failed: Vec<(ChannelKind, String)>,
}

impl DeliveryReport {
    pub fn reached_user(&self) -> bool {
        !self.delivered.is_empty()
    }
}

#[derive(Default)]
pub struct CapabilitySet {
    channels: Vec<Box<dyn DeliveryChannel>>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: impl DeliveryChannel + 'static) -> Self {
        self.channels.push(Box::new(channel));
        self
    }

    pub fn kinds(&self) -> Vec<ChannelKind> {
        self.channels.iter().map(|c| c.kind()).collect()
    }

    /// Run every channel's one-time setup. Failures are logged only.
    pub fn prepare_all(&mut self) {
        for channel in &mut self.channels {
            if let Err(e) = channel.prepare() {
                tracing::warn!(channel = %channel.kind(), error = %e, "Channel setup failed; continuing without it");
            }
        }
    }

    /// Deliver `alert` through every channel the settings allow.
    ///
    /// Channels are independent: one failing never stops the rest.
    pub fn deliver(&mut self, alert: &ReminderAlert, settings: &Settings) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for channel in &mut self.channels {
            let kind = channel.kind();
            if !kind.enabled_by(settings) {
                report.disabled.push(kind);
                continue;
            }
            match channel.deliver(alert) {
                Ok(()) => report.delivered.push(kind),
                Err(e) => {
                    match &e {
                        ChannelError::Unavailable(_) => {
                            tracing::debug!(channel = %kind, "Channel unavailable, skipped")
                        }
                        _ => tracing::warn!(channel = %kind, error = %e, "Channel delivery failed"),
                    }
                    report.failed.push((kind, e.to_string()));
                }
            }
        }
        report
    }

    /// Deliver through one kind of channel only (e.g. "Ouvir Novamente").
    pub fn deliver_only(&mut self, kind: ChannelKind, alert: &ReminderAlert) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for channel in self.channels.iter_mut().filter(|c| c.kind() == kind) {
            match channel.deliver(alert) {
                Ok(()) => report.delivered.push(kind),
                Err(e) => {
                    tracing::warn!(channel = %kind, error = %e, "Channel delivery failed");
                    report.failed.push((kind, e.to_string()));
                }
            }
        }
        report
    }
}
