//! Console presentation: terminal-backed delivery channels, the stdin
//! command reader and rendering of session events.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::ledger::DayCounts;
use crate::reminders::channels::{
    AudioBackend, AudioChannel, CapabilitySet, ChannelError, ChannelKind, HapticBackend, HapticChannel,
    NotificationBackend, NotificationChannel, Permission, SpeechBackend, SpeechChannel,
};
use crate::reminders::{SessionEvent, UserCommand};

pub const HELP: &str = "[t] TOMEI  [l] Lembrar Depois  [p] Pular  [o] Ouvir Novamente  \
[s] Status  [h] Histórico  [a] Nome | Dosagem | 08:00, 20:00  [q] Sair";

// ═══════════════════════════════════════════
// Backends
// ═══════════════════════════════════════════

/// Prints the reminder card to stdout. A terminal never refuses.
pub struct ConsoleNotifier;

impl NotificationBackend for ConsoleNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&mut self) -> Result<Permission, ChannelError> {
        Ok(Permission::Granted)
    }

    fn show(&mut self, title: &str, body: &str, _icon: &str, _tag: &str) -> Result<(), ChannelError> {
        let mut out = std::io::stdout().lock();
        write_card(&mut out, title, body).map_err(|e| ChannelError::Failed {
            kind: ChannelKind::Notification,
            reason: e.to_string(),
        })
    }
}

fn write_card(out: &mut impl Write, title: &str, body: &str) -> std::io::Result<()> {
    let width = body
        .lines()
        .chain(std::iter::once(title))
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        + 2;
    let rule = "═".repeat(width);
    writeln!(out)?;
    writeln!(out, "╔{rule}╗")?;
    writeln!(out, "║ {title:<w$} ║", w = width - 2)?;
    writeln!(out, "╟{}╢", "─".repeat(width))?;
    for line in body.lines() {
        writeln!(out, "║ {line:<w$} ║", w = width - 2)?;
    }
    writeln!(out, "╚{rule}╝")?;
    writeln!(out, "{HELP}")?;
    out.flush()
}

/// ASCII BEL as the audio cue.
pub struct TerminalBell;

impl AudioBackend for TerminalBell {
    fn play_cue(&mut self, _sound_ref: &str) -> Result<(), ChannelError> {
        let mut out = std::io::stdout().lock();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|e| ChannelError::Failed {
                kind: ChannelKind::Audio,
                reason: e.to_string(),
            })
    }
}

/// Stand-in for capabilities a terminal does not have.
pub struct Unsupported;

impl SpeechBackend for Unsupported {
    fn speak(&mut self, _: &str, _: &str, _: f32, _: f32, _: f32) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable(ChannelKind::Speech))
    }
}

impl HapticBackend for Unsupported {
    fn vibrate(&mut self, _: &[u64]) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable(ChannelKind::Haptic))
    }
}

pub fn console_capabilities() -> CapabilitySet {
    CapabilitySet::new()
        .with(NotificationChannel::new(ConsoleNotifier))
        .with(AudioChannel::new(TerminalBell))
        .with(HapticChannel::new(Unsupported))
        .with(SpeechChannel::new(Unsupported))
}

// ═══════════════════════════════════════════
// Input / output tasks
// ═══════════════════════════════════════════

/// Read commands from stdin until EOF or the session stops listening.
pub async fn read_commands(commands: mpsc::UnboundedSender<UserCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match line.parse::<UserCommand>() {
                Ok(command) => {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => println!("{e}\n{HELP}"),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
    tracing::debug!("Command reader finished");
}

/// Print session events until the session closes its sender.
pub async fn print_events(mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        if let Some(text) = render_event(&event) {
            println!("{text}");
        }
    }
}

/// Text for an event. Announcements are already drawn by the notifier.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Announced { report, .. } if report.reached_user() => None,
        SessionEvent::Announced { alert, .. } => Some(format!(
            "{}\n{} - {}",
            alert.title, alert.medication_name, alert.dosage
        )),
        SessionEvent::Recorded {
            event,
            medication_name,
        } => Some(format!("✓ {} - {}", medication_name, event.status.label())),
        SessionEvent::Status {
            current,
            queued,
            next,
            today,
        } => {
            let mut lines = Vec::new();
            match current {
                Some(c) => lines.push(format!("Agora: {} ({})", c.medication_name, c.time_point)),
                None => lines.push("Nenhum lembrete no momento.".to_string()),
            }
            if !queued.is_empty() {
                lines.push(format!("Na fila: {}", queued.len()));
            }
            if let Some(next) = next {
                lines.push(format!(
                    "Próximo: {} às {} (em {})",
                    next.medication_name,
                    next.time_point,
                    format_wait(next.wait_minutes)
                ));
            }
            lines.push(format_counts(today));
            Some(lines.join("\n"))
        }
        SessionEvent::History(report) => Some(report.clone()),
        SessionEvent::MedicationAdded { name, schedules } => {
            Some(format!("Medicamento salvo: {} ({})", name, schedules.join(", ")))
        }
        SessionEvent::Notice(message) => Some(message.clone()),
        SessionEvent::Error(message) => Some(format!("⚠ {message}")),
    }
}

fn format_wait(minutes: i64) -> String {
    if minutes >= 60 {
        format!("{}h{:02}min", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}min")
    }
}

fn format_counts(counts: &DayCounts) -> String {
    format!(
        "Hoje: {} tomados, {} adiados, {} pulados",
        counts.taken, counts.delayed, counts.skipped
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::models::DoseEvent;
    use crate::reminders::channels::DeliveryReport;
    use crate::schedule::NextDose;

    #[test]
    fn card_is_boxed_and_lists_body() {
        let mut out = Vec::new();
        write_card(&mut out, "⏰ Hora do Remédio!", "Losartana\n50mg\n08:00").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("║ Losartana"));
        assert!(text.contains("║ 08:00"));
        assert!(text.contains(HELP));
    }

    #[test]
    fn unsupported_capabilities_report_unavailable() {
        assert_eq!(
            Unsupported.speak("x", "pt-BR", 0.8, 1.0, 1.0),
            Err(ChannelError::Unavailable(ChannelKind::Speech))
        );
        assert_eq!(
            Unsupported.vibrate(&[500]),
            Err(ChannelError::Unavailable(ChannelKind::Haptic))
        );
    }

    #[test]
    fn console_set_has_all_four_kinds() {
        assert_eq!(console_capabilities().kinds().len(), 4);
    }

    #[test]
    fn renders_recorded_and_status() {
        let at = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let recorded = SessionEvent::Recorded {
            event: DoseEvent::taken(Uuid::new_v4(), at, at),
            medication_name: "Losartana".into(),
        };
        assert_eq!(render_event(&recorded).unwrap(), "✓ Losartana - Tomado");

        let status = SessionEvent::Status {
            current: None,
            queued: vec![],
            next: Some(NextDose {
                medication_id: Uuid::new_v4(),
                medication_name: "Metformina".into(),
                time_point: "12:00".parse().unwrap(),
                at,
                wait_minutes: 125,
            }),
            today: DayCounts {
                taken: 1,
                ..DayCounts::default()
            },
        };
        let text = render_event(&status).unwrap();
        assert!(text.contains("Próximo: Metformina às 12:00 (em 2h05min)"));
        assert!(text.contains("Hoje: 1 tomados"));
    }

    #[test]
    fn delivered_announcement_prints_nothing_extra() {
        let occurrence = crate::schedule::DueOccurrence {
            medication_id: Uuid::new_v4(),
            medication_name: "Losartana".into(),
            time_point: "08:00".parse().unwrap(),
            scheduled_at: NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            minutes_until: 0,
        };
        let medication = crate::models::Medication {
            id: occurrence.medication_id,
            name: "Losartana".into(),
            photo: None,
            color: "#FFFFFF".into(),
            med_type: crate::models::MedicationType::Tablet,
            dosage: "50mg".into(),
            schedules: vec![occurrence.time_point],
            frequency: "1x ao dia".into(),
            start_date: occurrence.scheduled_at.date(),
            end_date: None,
            instructions: None,
            created_at: occurrence.scheduled_at,
        };
        let alert = crate::reminders::ReminderAlert::new(&medication, &occurrence);
        let delivered = SessionEvent::Announced {
            occurrence: occurrence.clone(),
            alert: alert.clone(),
            report: DeliveryReport {
                delivered: vec![ChannelKind::Notification],
                ..DeliveryReport::default()
            },
        };
        assert!(render_event(&delivered).is_none());

        let silent = SessionEvent::Announced {
            occurrence,
            alert,
            report: DeliveryReport::default(),
        };
        assert!(render_event(&silent).unwrap().contains("Losartana - 50mg"));
    }
}
