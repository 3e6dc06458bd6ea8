use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DoseStatus;

/// One adherence ledger entry.
///
/// `medication_id` is informational: the medication may have been deleted
/// since the event was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseEvent {
    pub id: Uuid,
    pub medication_id: Uuid,
    pub scheduled_time: NaiveDateTime,
    pub taken_at: Option<NaiveDateTime>,
    pub status: DoseStatus,
    pub created_at: NaiveDateTime,
}

impl DoseEvent {
    fn with_status(
        medication_id: Uuid,
        scheduled_time: NaiveDateTime,
        status: DoseStatus,
        taken_at: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            medication_id,
            scheduled_time,
            taken_at,
            status,
            created_at: now,
        }
    }

    /// Dose confirmed at `now`.
    pub fn taken(medication_id: Uuid, scheduled_time: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self::with_status(medication_id, scheduled_time, DoseStatus::Taken, Some(now), now)
    }

    /// "Remind me later": no taken-at.
    pub fn delayed(medication_id: Uuid, scheduled_time: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self::with_status(medication_id, scheduled_time, DoseStatus::Delayed, None, now)
    }

    pub fn skipped(medication_id: Uuid, scheduled_time: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self::with_status(medication_id, scheduled_time, DoseStatus::Skipped, None, now)
    }

    pub fn pending(medication_id: Uuid, scheduled_time: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self::with_status(medication_id, scheduled_time, DoseStatus::Pending, None, now)
    }

    /// `taken` implies `taken_at` is set.
    pub fn is_consistent(&self) -> bool {
        self.status != DoseStatus::Taken || self.taken_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn taken_sets_taken_at_to_now() {
        let med = Uuid::new_v4();
        let event = DoseEvent::taken(med, at(8, 0), at(8, 4));
        assert_eq!(event.status, DoseStatus::Taken);
        assert_eq!(event.taken_at, Some(at(8, 4)));
        assert_eq!(event.scheduled_time, at(8, 0));
        assert!(event.is_consistent());
    }

    #[test]
    fn delayed_and_skipped_leave_taken_at_unset() {
        let med = Uuid::new_v4();
        let delayed = DoseEvent::delayed(med, at(8, 0), at(8, 4));
        let skipped = DoseEvent::skipped(med, at(8, 0), at(8, 4));
        assert_eq!(delayed.taken_at, None);
        assert_eq!(skipped.taken_at, None);
        assert!(delayed.is_consistent());
        assert!(skipped.is_consistent());
    }

    #[test]
    fn each_event_gets_a_fresh_id() {
        let med = Uuid::new_v4();
        let a = DoseEvent::taken(med, at(8, 0), at(8, 0));
        let b = DoseEvent::taken(med, at(8, 0), at(8, 0));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn taken_without_timestamp_is_inconsistent() {
        let mut event = DoseEvent::taken(Uuid::new_v4(), at(8, 0), at(8, 0));
        event.taken_at = None;
        assert!(!event.is_consistent());
    }
}
