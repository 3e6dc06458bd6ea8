//! Reminder dispatcher: turns due occurrences into announcements and
//! user decisions into ledger entries.
//!
//! At most one occurrence is announced at a time. Others wait in a queue,
//! soonest first. Every occurrence is announced at most once per session;
//! occurrences that already carry a decision in the ledger are not
//! announced again after a restart. A queued occurrence whose due window
//! closed while it waited is dropped; snoozed ones are exempt.

use std::collections::{HashSet, VecDeque};

use chrono::NaiveDateTime;
use rusqlite::Connection;
use thiserror::Error;
use tokio::sync::mpsc;

use super::channels::{CapabilitySet, ChannelKind, DeliveryReport, ReminderAlert};
use super::delayed::{DelayError, DelayedReminderScheduler};
use crate::config;
use crate::db::{self, StorageError};
use crate::ledger;
use crate::models::{DoseEvent, DoseStatus, Settings};
use crate::schedule::{self, DueOccurrence, OccurrenceKey};
use crate::settings;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Erro ao registrar. Tente novamente. ({0})")]
    Storage(#[from] StorageError),

    #[error("No reminder is being announced")]
    NothingAnnouncing,

    #[error("Cannot snooze: {0}")]
    Snooze(#[from] DelayError),
}

/// A waiting occurrence and how it got into the queue.
#[derive(Debug, Clone)]
struct Queued {
    occurrence: DueOccurrence,
    snoozed: bool,
}

/// The occurrence currently in front of the user.
#[derive(Debug, Clone)]
pub struct Announcement {
    pub occurrence: DueOccurrence,
    pub alert: ReminderAlert,
    pub report: DeliveryReport,
}

/// Result of a user decision on the current announcement.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub event: DoseEvent,
    pub medication_name: String,
    /// The announcement that replaced it, if the queue was not empty.
    pub next: Option<Announcement>,
}

pub struct ReminderDispatcher {
    channels: CapabilitySet,
    scheduler: DelayedReminderScheduler,
    snoozed_tx: mpsc::UnboundedSender<DueOccurrence>,
    tolerance_minutes: u32,
    seen: HashSet<OccurrenceKey>,
    queue: VecDeque<Queued>,
    current: Option<Announcement>,
}

impl ReminderDispatcher {
    /// Build a dispatcher. Snoozed occurrences come back on the returned
    /// receiver when their timer fires; hand them to [`Self::reannounce`].
    pub fn new(
        channels: CapabilitySet,
        scheduler: DelayedReminderScheduler,
    ) -> (Self, mpsc::UnboundedReceiver<DueOccurrence>) {
        let (snoozed_tx, snoozed_rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            channels,
            scheduler,
            snoozed_tx,
            tolerance_minutes: config::DUE_WINDOW_MINUTES,
            seen: HashSet::new(),
            queue: VecDeque::new(),
            current: None,
        };
        (dispatcher, snoozed_rx)
    }

    pub fn with_tolerance(mut self, minutes: u32) -> Self {
        self.tolerance_minutes = minutes;
        self
    }

    /// One-time channel setup (notification permission prompt).
    pub fn prepare(&mut self) {
        self.channels.prepare_all();
    }

    pub fn current(&self) -> Option<&Announcement> {
        self.current.as_ref()
    }

    pub fn queued(&self) -> impl Iterator<Item = &DueOccurrence> {
        self.queue.iter().map(|q| &q.occurrence)
    }

    pub fn scheduler(&self) -> &DelayedReminderScheduler {
        &self.scheduler
    }

    /// Resolve due occurrences at `now`, queue the new ones and announce
    /// the first if nothing is on screen.
    ///
    /// Returns the announcement started by this poll, if any.
    pub fn poll(
        &mut self,
        conn: &Connection,
        now: NaiveDateTime,
    ) -> Result<Option<&Announcement>, DispatchError> {
        let medications = db::get_all_medications(conn)?;
        let due = schedule::due_occurrences(&medications, now, self.tolerance_minutes);

        // Keys from earlier days can never match again.
        let today = now.date();
        self.seen.retain(|k| k.scheduled_at.date() >= today);

        let mut added = 0usize;
        for occurrence in due {
            let key = occurrence.key();
            if self.seen.contains(&key) {
                continue;
            }
            if ledger::has_decision(conn, &key.medication_id, &key.scheduled_at)? {
                tracing::debug!(
                    medication_id = %key.medication_id,
                    scheduled_at = %key.scheduled_at,
                    "Occurrence already decided, not announcing"
                );
                self.seen.insert(key);
                continue;
            }
            self.seen.insert(key);
            self.enqueue(occurrence, false);
            added += 1;
        }
        if added > 0 {
            tracing::info!(added, queued = self.queue.len(), "Due occurrences queued");
        }

        if self.current.is_some() {
            return Ok(None);
        }
        self.announce_next(conn, now)
    }

    /// "TOMEI": record the current occurrence as taken at `now`.
    pub fn take(&mut self, conn: &Connection, now: NaiveDateTime) -> Result<Resolution, DispatchError> {
        self.resolve(conn, now, DoseStatus::Taken)
    }

    /// "Lembrar Depois": record a delay and re-announce after the
    /// configured interval.
    pub fn remind_later(
        &mut self,
        conn: &Connection,
        now: NaiveDateTime,
    ) -> Result<Resolution, DispatchError> {
        let interval = load_settings_or_default(conn).reminder_interval();
        let occurrence = self
            .current
            .as_ref()
            .map(|a| a.occurrence.clone())
            .ok_or(DispatchError::NothingAnnouncing)?;
        // Without a timer the delay would never come back; refuse before writing.
        self.scheduler.ensure_available()?;

        let resolution = self.resolve(conn, now, DoseStatus::Delayed)?;

        let tx = self.snoozed_tx.clone();
        let medication_id = occurrence.medication_id;
        let scheduled = self.scheduler.after(interval, move || {
            // Receiver gone means the session ended; the snooze is dropped.
            let _ = tx.send(occurrence);
        });
        match scheduled {
            Ok(()) => tracing::info!(
                medication_id = %medication_id,
                delay_minutes = interval.as_secs() / 60,
                "Reminder snoozed"
            ),
            Err(e) => tracing::warn!(medication_id = %medication_id, error = %e, "Snooze timer not set"),
        }
        Ok(resolution)
    }

    /// "Pular": record the current occurrence as skipped.
    pub fn skip(&mut self, conn: &Connection, now: NaiveDateTime) -> Result<Resolution, DispatchError> {
        self.resolve(conn, now, DoseStatus::Skipped)
    }

    /// "Ouvir Novamente": speak the current alert again. No ledger write.
    pub fn repeat_voice(&mut self) -> Result<DeliveryReport, DispatchError> {
        let announcement = self.current.as_ref().ok_or(DispatchError::NothingAnnouncing)?;
        Ok(self
            .channels
            .deliver_only(ChannelKind::Speech, &announcement.alert))
    }

    /// A snoozed occurrence came back. Queue it ahead of later occurrences
    /// and announce it if nothing is on screen.
    pub fn reannounce(
        &mut self,
        conn: &Connection,
        occurrence: DueOccurrence,
        now: NaiveDateTime,
    ) -> Result<Option<&Announcement>, DispatchError> {
        tracing::info!(medication_id = %occurrence.medication_id, "Snoozed reminder due again");
        self.seen.insert(occurrence.key());
        self.enqueue(occurrence, true);
        if self.current.is_some() {
            return Ok(None);
        }
        self.announce_next(conn, now)
    }

    fn enqueue(&mut self, occurrence: DueOccurrence, snoozed: bool) {
        let at = self
            .queue
            .iter()
            .position(|q| q.occurrence.scheduled_at > occurrence.scheduled_at)
            .unwrap_or(self.queue.len());
        self.queue.insert(at, Queued { occurrence, snoozed });
    }

    /// Polled occurrences only count while `now` is inside their window.
    fn still_due(&self, entry: &Queued, now: NaiveDateTime) -> bool {
        entry.snoozed
            || (entry.occurrence.scheduled_at.date() == now.date()
                && schedule::is_due_now(entry.occurrence.time_point, now, self.tolerance_minutes))
    }

    fn resolve(
        &mut self,
        conn: &Connection,
        now: NaiveDateTime,
        status: DoseStatus,
    ) -> Result<Resolution, DispatchError> {
        let announcement = self.current.as_ref().ok_or(DispatchError::NothingAnnouncing)?;
        let occurrence = &announcement.occurrence;
        let event = match status {
            DoseStatus::Taken => DoseEvent::taken(occurrence.medication_id, occurrence.scheduled_at, now),
            DoseStatus::Delayed => DoseEvent::delayed(occurrence.medication_id, occurrence.scheduled_at, now),
            DoseStatus::Skipped => DoseEvent::skipped(occurrence.medication_id, occurrence.scheduled_at, now),
            DoseStatus::Pending => DoseEvent::pending(occurrence.medication_id, occurrence.scheduled_at, now),
        };

        // On failure the announcement stays up so the user can retry.
        if let Err(e) = ledger::record(conn, &event) {
            tracing::error!(
                medication_id = %occurrence.medication_id,
                status = status.as_str(),
                error = %e,
                "Failed to record dose decision"
            );
            return Err(e.into());
        }

        tracing::info!(
            medication_id = %occurrence.medication_id,
            scheduled_at = %occurrence.scheduled_at,
            status = status.as_str(),
            "Dose decision recorded"
        );
        let medication_name = occurrence.medication_name.clone();
        self.current = None;
        // The decision is stored; a failure to show the next one is retried on the next poll.
        let next = match self.announce_next(conn, now) {
            Ok(next) => next.cloned(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not announce next reminder");
                None
            }
        };
        Ok(Resolution {
            event,
            medication_name,
            next,
        })
    }

    fn announce_next(
        &mut self,
        conn: &Connection,
        now: NaiveDateTime,
    ) -> Result<Option<&Announcement>, DispatchError> {
        let settings = load_settings_or_default(conn);
        while let Some(entry) = self.queue.pop_front() {
            if !self.still_due(&entry, now) {
                tracing::info!(
                    medication_id = %entry.occurrence.medication_id,
                    scheduled_at = %entry.occurrence.scheduled_at,
                    "Due window closed while queued, dropping"
                );
                continue;
            }
            let medication = match db::get_medication(conn, &entry.occurrence.medication_id) {
                Ok(medication) => medication,
                Err(e) => {
                    self.queue.push_front(entry);
                    return Err(e.into());
                }
            };
            let occurrence = entry.occurrence;
            let Some(medication) = medication else {
                tracing::info!(
                    medication_id = %occurrence.medication_id,
                    "Medication deleted before its reminder, dropping"
                );
                continue;
            };
            let alert = ReminderAlert::new(&medication, &occurrence);
            let report = self.channels.deliver(&alert, &settings);
            if !report.reached_user() {
                tracing::warn!(
                    medication_id = %medication.id,
                    "No channel could deliver the reminder"
                );
            }
            tracing::info!(
                medication_id = %medication.id,
                time_point = %occurrence.time_point,
                delivered = report.delivered.len(),
                "Reminder announced"
            );
            self.current = Some(Announcement {
                occurrence,
                alert,
                report,
            });
            return Ok(self.current.as_ref());
        }
        Ok(None)
    }
}

/// Settings for channel gating. A read failure must not block a reminder.
fn load_settings_or_default(conn: &Connection) -> Settings {
    settings::load_settings(conn).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Settings unavailable, using defaults");
        Settings::default()
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::super::channels::testing::*;
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Medication, MedicationType};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn add(conn: &Connection, name: &str, times: &[&str]) -> Medication {
        let med = Medication {
            id: Uuid::new_v4(),
            name: name.into(),
            photo: None,
            color: "#FFFFFF".into(),
            med_type: MedicationType::Tablet,
            dosage: "50mg".into(),
            schedules: crate::schedule::parse_time_points(times).unwrap(),
            frequency: "1x ao dia".into(),
            start_date: day(),
            end_date: None,
            instructions: None,
            created_at: at(0, 0),
        };
        db::insert_medication(conn, &med).unwrap();
        med
    }

    fn dispatcher(log: &Log) -> (ReminderDispatcher, mpsc::UnboundedReceiver<DueOccurrence>) {
        ReminderDispatcher::new(recording_capabilities(log), DelayedReminderScheduler::new())
    }

    fn notifications(log: &Log) -> usize {
        log.lock()
            .unwrap()
            .iter()
            .filter(|d| matches!(d, Delivered::Notification { .. }))
            .count()
    }

    #[test]
    fn announces_one_at_a_time_soonest_first() {
        let conn = open_memory_database().unwrap();
        let later = add(&conn, "Metformina", &["08:10"]);
        let sooner = add(&conn, "Losartana", &["08:00"]);
        let log = new_log();
        let (mut d, _rx) = dispatcher(&log);

        let first = d.poll(&conn, at(8, 5)).unwrap().unwrap();
        assert_eq!(first.occurrence.medication_id, sooner.id);
        assert_eq!(d.queued().count(), 1);
        assert_eq!(notifications(&log), 1);

        let resolution = d.take(&conn, at(8, 6)).unwrap();
        assert_eq!(resolution.event.status, DoseStatus::Taken);
        assert_eq!(resolution.event.taken_at, Some(at(8, 6)));
        assert_eq!(resolution.event.scheduled_time, at(8, 0));
        assert_eq!(resolution.next.unwrap().occurrence.medication_id, later.id);
        assert_eq!(notifications(&log), 2);
    }

    #[test]
    fn equal_times_keep_registry_order() {
        let conn = open_memory_database().unwrap();
        let a = add(&conn, "A", &["08:00"]);
        let b = add(&conn, "B", &["08:00"]);
        let log = new_log();
        let (mut d, _rx) = dispatcher(&log);

        assert_eq!(d.poll(&conn, at(8, 0)).unwrap().unwrap().occurrence.medication_id, a.id);
        let next = d.skip(&conn, at(8, 1)).unwrap().next.unwrap();
        assert_eq!(next.occurrence.medication_id, b.id);
    }

    #[test]
    fn announces_each_occurrence_once_per_session() {
        let conn = open_memory_database().unwrap();
        add(&conn, "Losartana", &["08:00"]);
        let log = new_log();
        let (mut d, _rx) = dispatcher(&log);

        assert!(d.poll(&conn, at(7, 45)).unwrap().is_some());
        d.skip(&conn, at(7, 46)).unwrap();
        for minute in 47..60 {
            assert!(d.poll(&conn, at(7, minute)).unwrap().is_none());
        }
        assert!(d.poll(&conn, at(8, 20)).unwrap().is_none());
        assert_eq!(notifications(&log), 1);
        assert_eq!(ledger::by_date(&conn, day()).unwrap().len(), 1);
    }

    #[test]
    fn repeated_polls_while_announcing_do_not_requeue() {
        let conn = open_memory_database().unwrap();
        add(&conn, "Losartana", &["08:00"]);
        let (mut d, _rx) = dispatcher(&new_log());
        d.poll(&conn, at(8, 0)).unwrap();
        d.poll(&conn, at(8, 1)).unwrap();
        assert_eq!(d.queued().count(), 0);
        assert!(d.current().is_some());
    }

    #[test]
    fn decided_occurrence_is_not_announced_after_restart() {
        let conn = open_memory_database().unwrap();
        add(&conn, "Losartana", &["08:00"]);

        let (mut first, _rx) = dispatcher(&new_log());
        first.poll(&conn, at(8, 0)).unwrap();
        first.take(&conn, at(8, 2)).unwrap();
        drop(first);

        let log = new_log();
        let (mut second, _rx) = dispatcher(&log);
        assert!(second.poll(&conn, at(8, 10)).unwrap().is_none());
        assert_eq!(notifications(&log), 0);
    }

    #[test]
    fn storage_failure_keeps_announcement() {
        let conn = open_memory_database().unwrap();
        let med = add(&conn, "Losartana", &["08:00"]);
        let (mut d, _rx) = dispatcher(&new_log());
        d.poll(&conn, at(8, 0)).unwrap();

        conn.execute_batch("ALTER TABLE dose_events RENAME TO dose_events_off;").unwrap();
        let err = d.take(&conn, at(8, 1)).unwrap_err();
        assert!(err.to_string().starts_with("Erro ao registrar. Tente novamente."));
        assert_eq!(d.current().unwrap().occurrence.medication_id, med.id);

        conn.execute_batch("ALTER TABLE dose_events_off RENAME TO dose_events;").unwrap();
        d.take(&conn, at(8, 2)).unwrap();
        assert!(d.current().is_none());
        assert_eq!(ledger::by_medication(&conn, &med.id).unwrap().len(), 1);
    }

    #[test]
    fn decisions_need_an_announcement() {
        let conn = open_memory_database().unwrap();
        let (mut d, _rx) = dispatcher(&new_log());
        assert!(matches!(d.take(&conn, at(8, 0)), Err(DispatchError::NothingAnnouncing)));
        assert!(matches!(d.repeat_voice(), Err(DispatchError::NothingAnnouncing)));
    }

    #[test]
    fn repeat_voice_speaks_without_writing() {
        let conn = open_memory_database().unwrap();
        add(&conn, "Losartana", &["08:00"]);
        let log = new_log();
        let (mut d, _rx) = dispatcher(&log);
        d.poll(&conn, at(8, 0)).unwrap();

        let report = d.repeat_voice().unwrap();
        assert_eq!(report.delivered, vec![ChannelKind::Speech]);
        let speeches = log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Delivered::Speech { .. }))
            .count();
        assert_eq!(speeches, 2);
        assert!(ledger::by_date(&conn, day()).unwrap().is_empty());
    }

    #[test]
    fn silenced_settings_still_show_notification() {
        let conn = open_memory_database().unwrap();
        add(&conn, "Losartana", &["08:00"]);
        settings::save_settings(
            &conn,
            &Settings {
                sound_enabled: false,
                voice_enabled: false,
                vibration_enabled: false,
                ..Settings::default()
            },
        )
        .unwrap();
        let log = new_log();
        let (mut d, _rx) = dispatcher(&log);
        let report = &d.poll(&conn, at(8, 0)).unwrap().unwrap().report;
        assert_eq!(report.delivered, vec![ChannelKind::Notification]);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn deleted_medication_is_dropped_from_queue() {
        let conn = open_memory_database().unwrap();
        add(&conn, "A", &["08:00"]);
        let b = add(&conn, "B", &["08:05"]);
        let c = add(&conn, "C", &["08:10"]);
        let (mut d, _rx) = dispatcher(&new_log());
        d.poll(&conn, at(8, 10)).unwrap();
        db::delete_medication(&conn, &b.id).unwrap();

        let next = d.take(&conn, at(8, 11)).unwrap().next.unwrap();
        assert_eq!(next.occurrence.medication_id, c.id);
    }

    #[test]
    fn queued_occurrence_past_its_window_is_dropped() {
        let conn = open_memory_database().unwrap();
        let a = add(&conn, "A", &["08:00"]);
        let b = add(&conn, "B", &["08:25"]);
        let log = new_log();
        let (mut d, _rx) = dispatcher(&log);

        assert_eq!(d.poll(&conn, at(8, 25)).unwrap().unwrap().occurrence.medication_id, a.id);
        assert_eq!(d.queued().count(), 1);

        let resolution = d.take(&conn, at(10, 30)).unwrap();
        assert!(resolution.next.is_none());
        assert!(d.current().is_none());
        assert_eq!(d.queued().count(), 0);
        assert_eq!(notifications(&log), 1);
        assert!(ledger::by_medication(&conn, &b.id).unwrap().is_empty());
    }

    #[test]
    fn queued_occurrence_inside_its_window_is_announced() {
        let conn = open_memory_database().unwrap();
        add(&conn, "A", &["08:00"]);
        let b = add(&conn, "B", &["08:25"]);
        let (mut d, _rx) = dispatcher(&new_log());

        d.poll(&conn, at(8, 25)).unwrap();
        let next = d.take(&conn, at(8, 55)).unwrap().next.unwrap();
        assert_eq!(next.occurrence.medication_id, b.id);
    }

    #[test]
    fn snoozed_occurrence_is_announced_after_its_window() {
        let conn = open_memory_database().unwrap();
        let med = add(&conn, "Losartana", &["08:00"]);
        let (mut d, _rx) = dispatcher(&new_log());
        let snoozed = DueOccurrence {
            medication_id: med.id,
            medication_name: "Losartana".into(),
            time_point: "08:00".parse().unwrap(),
            scheduled_at: at(8, 0),
            minutes_until: 0,
        };
        let again = d.reannounce(&conn, snoozed, at(8, 45)).unwrap().unwrap();
        assert_eq!(again.occurrence.medication_id, med.id);
    }

    #[test]
    fn seen_keys_from_earlier_days_are_pruned() {
        let conn = open_memory_database().unwrap();
        add(&conn, "Losartana", &["08:00"]);
        let (mut d, _rx) = dispatcher(&new_log());

        d.poll(&conn, at(8, 0)).unwrap();
        d.skip(&conn, at(8, 1)).unwrap();
        assert_eq!(d.seen.len(), 1);

        let next_day = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert!(d.poll(&conn, next_day).unwrap().is_none());
        assert!(d.seen.is_empty());
    }

    #[test]
    fn remind_later_without_timer_runtime_records_nothing() {
        let conn = open_memory_database().unwrap();
        let med = add(&conn, "Losartana", &["08:00"]);
        let (mut d, _rx) = dispatcher(&new_log());
        d.poll(&conn, at(8, 0)).unwrap();

        assert!(matches!(
            d.remind_later(&conn, at(8, 1)),
            Err(DispatchError::Snooze(_))
        ));
        assert_eq!(d.current().unwrap().occurrence.medication_id, med.id);
        assert!(ledger::by_medication(&conn, &med.id).unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn remind_later_reannounces_after_interval() {
        let conn = open_memory_database().unwrap();
        let med = add(&conn, "Losartana", &["08:00"]);
        let log = new_log();
        let (mut d, mut rx) = dispatcher(&log);

        d.poll(&conn, at(8, 0)).unwrap();
        let resolution = d.remind_later(&conn, at(8, 0)).unwrap();
        assert_eq!(resolution.event.status, DoseStatus::Delayed);
        assert!(resolution.event.taken_at.is_none());
        assert!(d.current().is_none());
        assert_eq!(d.scheduler().pending(), 1);

        tokio::time::sleep(Duration::from_secs(4 * 60 + 59)).await;
        assert!(rx.try_recv().is_err());

        let occurrence = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(occurrence.medication_id, med.id);

        let again = d.reannounce(&conn, occurrence, at(8, 5)).unwrap().unwrap();
        assert_eq!(again.occurrence.scheduled_at, at(8, 0));
        assert_eq!(notifications(&log), 2);

        // The snooze does not make the occurrence fresh for polling.
        d.take(&conn, at(8, 5)).unwrap();
        assert!(d.poll(&conn, at(8, 6)).unwrap().is_none());

        let statuses: Vec<DoseStatus> = ledger::by_medication(&conn, &med.id)
            .unwrap()
            .into_iter()
            .map(|e| e.status)
            .collect();
        assert_eq!(statuses, vec![DoseStatus::Delayed, DoseStatus::Taken]);
    }

    #[tokio::test(start_paused = true)]
    async fn reannounce_waits_behind_current() {
        let conn = open_memory_database().unwrap();
        let a = add(&conn, "A", &["08:00"]);
        let b = add(&conn, "B", &["08:02"]);
        let (mut d, _rx) = dispatcher(&new_log());

        d.poll(&conn, at(8, 0)).unwrap();
        d.remind_later(&conn, at(8, 0)).unwrap();
        let snoozed = DueOccurrence {
            medication_id: a.id,
            medication_name: "A".into(),
            time_point: "08:00".parse().unwrap(),
            scheduled_at: at(8, 0),
            minutes_until: 0,
        };
        assert_eq!(d.current().unwrap().occurrence.medication_id, b.id);
        assert!(d.reannounce(&conn, snoozed, at(8, 5)).unwrap().is_none());
        assert_eq!(d.queued().count(), 1);
    }
}
