//! Reminder session: the long-running loop that drives the dispatcher.
//!
//! Four event sources are multiplexed on one task:
//! - the poll ticker (first tick immediate, then every poll interval)
//! - snoozed occurrences coming back from their timers
//! - user commands
//! - the shutdown signal
//!
//! Everything the user should see is emitted as a [`SessionEvent`].

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::channels::{DeliveryReport, ReminderAlert};
use super::dispatcher::{Announcement, DispatchError, ReminderDispatcher, Resolution};
use crate::config;
use crate::ledger::{self, DayCounts};
use crate::medications::{self, MedicationInput};
use crate::models::{DoseEvent, MedicationType};
use crate::schedule::{self, DueOccurrence, NextDose};

/// Source of "now". Local wall clock in production.
pub type Clock = Box<dyn Fn() -> NaiveDateTime + Send>;

pub fn local_clock() -> Clock {
    Box::new(|| Local::now().naive_local())
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Take,
    RemindLater,
    Skip,
    RepeatVoice,
    Status,
    History,
    AddMedication {
        name: String,
        dosage: String,
        schedules: Vec<String>,
    },
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Comando desconhecido: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for UserCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word.to_lowercase().as_str() {
            "t" | "tomei" => Ok(Self::Take),
            "l" | "depois" => Ok(Self::RemindLater),
            "p" | "pular" => Ok(Self::Skip),
            "o" | "ouvir" => Ok(Self::RepeatVoice),
            "s" | "status" => Ok(Self::Status),
            "h" | "historico" | "histórico" => Ok(Self::History),
            "q" | "sair" => Ok(Self::Quit),
            "a" | "adicionar" => parse_add(rest).ok_or_else(|| UnknownCommand(line.to_string())),
            _ => Err(UnknownCommand(line.to_string())),
        }
    }
}

/// `adicionar Nome | Dosagem | 08:00, 20:00`
fn parse_add(rest: &str) -> Option<UserCommand> {
    let mut parts = rest.split('|').map(str::trim);
    let name = parts.next()?.to_string();
    let dosage = parts.next()?.to_string();
    let schedules = parts
        .next()?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if parts.next().is_some() {
        return None;
    }
    Some(UserCommand::AddMedication {
        name,
        dosage,
        schedules,
    })
}

/// What the session reports back to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub enum SessionEvent {
    Announced {
        occurrence: DueOccurrence,
        alert: ReminderAlert,
        report: DeliveryReport,
    },
    Recorded {
        event: DoseEvent,
        medication_name: String,
    },
    Status {
        current: Option<DueOccurrence>,
        queued: Vec<DueOccurrence>,
        next: Option<NextDose>,
        today: DayCounts,
    },
    History(String),
    MedicationAdded {
        name: String,
        schedules: Vec<String>,
    },
    Notice(String),
    Error(String),
}

impl From<&Announcement> for SessionEvent {
    fn from(a: &Announcement) -> Self {
        SessionEvent::Announced {
            occurrence: a.occurrence.clone(),
            alert: a.alert.clone(),
            report: a.report.clone(),
        }
    }
}

pub struct ReminderSession {
    conn: Connection,
    dispatcher: ReminderDispatcher,
    snoozed: mpsc::UnboundedReceiver<DueOccurrence>,
    poll_interval: Duration,
    clock: Clock,
}

impl ReminderSession {
    pub fn new(
        conn: Connection,
        dispatcher: ReminderDispatcher,
        snoozed: mpsc::UnboundedReceiver<DueOccurrence>,
    ) -> Self {
        Self {
            conn,
            dispatcher,
            snoozed,
            poll_interval: Duration::from_secs(config::POLL_INTERVAL_SECS),
            clock: local_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run until `shutdown` resolves, a quit command arrives, or the
    /// command stream closes. Returns the connection for reuse.
    pub async fn run<S>(
        mut self,
        mut commands: mpsc::UnboundedReceiver<UserCommand>,
        events: mpsc::UnboundedSender<SessionEvent>,
        shutdown: S,
    ) -> Connection
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.dispatcher.prepare();

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            poll_secs = self.poll_interval.as_secs(),
            "Reminder session started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                _ = ticker.tick() => self.on_tick(&events),
                Some(occurrence) = self.snoozed.recv() => self.on_snooze_fired(occurrence, &events),
                command = commands.recv() => match command {
                    None | Some(UserCommand::Quit) => break,
                    Some(command) => self.on_command(command, &events),
                },
            }
        }

        self.dispatcher.scheduler().cancel_all();
        tracing::info!("Reminder session stopped");
        self.conn
    }

    fn on_tick(&mut self, events: &mpsc::UnboundedSender<SessionEvent>) {
        let now = (self.clock)();
        match self.dispatcher.poll(&self.conn, now) {
            Ok(Some(announcement)) => emit(events, announcement.into()),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "Reminder poll failed");
                emit(events, SessionEvent::Error(e.to_string()));
            }
        }
    }

    fn on_snooze_fired(&mut self, occurrence: DueOccurrence, events: &mpsc::UnboundedSender<SessionEvent>) {
        let now = (self.clock)();
        match self.dispatcher.reannounce(&self.conn, occurrence, now) {
            Ok(Some(announcement)) => emit(events, announcement.into()),
            Ok(None) => {}
            Err(e) => emit(events, SessionEvent::Error(e.to_string())),
        }
    }

    fn on_command(&mut self, command: UserCommand, events: &mpsc::UnboundedSender<SessionEvent>) {
        let now = (self.clock)();
        match command {
            UserCommand::Take => {
                let result = self.dispatcher.take(&self.conn, now);
                report_resolution(result, events);
            }
            UserCommand::RemindLater => {
                let result = self.dispatcher.remind_later(&self.conn, now);
                report_resolution(result, events);
            }
            UserCommand::Skip => {
                let result = self.dispatcher.skip(&self.conn, now);
                report_resolution(result, events);
            }
            UserCommand::RepeatVoice => match self.dispatcher.repeat_voice() {
                Ok(report) if report.reached_user() => {}
                Ok(_) => emit(
                    events,
                    SessionEvent::Notice("Voz indisponível neste dispositivo.".into()),
                ),
                Err(e) => report_dispatch_error(e, events),
            },
            UserCommand::Status => self.emit_status(now, events),
            UserCommand::History => match ledger::day_report(&self.conn, now.date()) {
                Ok(report) => emit(events, SessionEvent::History(report)),
                Err(e) => emit(events, SessionEvent::Error(e.to_string())),
            },
            UserCommand::AddMedication {
                name,
                dosage,
                schedules,
            } => {
                let input = MedicationInput {
                    name,
                    photo: None,
                    color: None,
                    med_type: MedicationType::Tablet,
                    dosage,
                    schedules,
                    frequency: None,
                    start_date: now.date(),
                    end_date: None,
                    instructions: None,
                };
                match medications::add_medication(&self.conn, &input, now) {
                    Ok(med) => emit(
                        events,
                        SessionEvent::MedicationAdded {
                            name: med.name,
                            schedules: med.schedules.iter().map(|t| t.to_string()).collect(),
                        },
                    ),
                    Err(e) => emit(events, SessionEvent::Error(e.to_string())),
                }
            }
            UserCommand::Quit => {}
        }
    }

    fn emit_status(&self, now: NaiveDateTime, events: &mpsc::UnboundedSender<SessionEvent>) {
        let next = match medications::list_medications(&self.conn) {
            Ok(meds) => schedule::next_dose(&meds, now),
            Err(e) => {
                emit(events, SessionEvent::Error(e.to_string()));
                return;
            }
        };
        let today = today_counts(&self.conn, now.date());
        emit(
            events,
            SessionEvent::Status {
                current: self.dispatcher.current().map(|a| a.occurrence.clone()),
                queued: self.dispatcher.queued().cloned().collect(),
                next,
                today,
            },
        );
    }
}

fn today_counts(conn: &Connection, date: NaiveDate) -> DayCounts {
    match ledger::by_date(conn, date) {
        Ok(events) => ledger::count_by_status(&events),
        Err(e) => {
            tracing::warn!(error = %e, "Could not count today's doses");
            DayCounts::default()
        }
    }
}

fn report_resolution(
    result: Result<Resolution, DispatchError>,
    events: &mpsc::UnboundedSender<SessionEvent>,
) {
    match result {
        Ok(resolution) => {
            emit(
                events,
                SessionEvent::Recorded {
                    event: resolution.event,
                    medication_name: resolution.medication_name,
                },
            );
            if let Some(next) = &resolution.next {
                emit(events, next.into());
            }
        }
        Err(e) => report_dispatch_error(e, events),
    }
}

fn report_dispatch_error(error: DispatchError, events: &mpsc::UnboundedSender<SessionEvent>) {
    let event = match error {
        DispatchError::NothingAnnouncing => {
            SessionEvent::Notice("Nenhum lembrete no momento.".into())
        }
        DispatchError::Storage(_) => SessionEvent::Error("Erro ao registrar. Tente novamente.".into()),
        DispatchError::Snooze(_) => {
            SessionEvent::Error("Não foi possível adiar o lembrete. Tente novamente.".into())
        }
    };
    emit(events, event);
}

fn emit(events: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Session event dropped, no listener");
    }
}
