//! Time/schedule resolver: pure functions over daily "HH:MM" time points.
//!
//! Every function takes the reference instant as a parameter; nothing here
//! reads the system clock. Time points are always placed on the reference's
//! own calendar day: there is no wrap across midnight when deciding whether
//! a dose is due.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::models::Medication;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid time point '{0}', expected HH:MM (00:00-23:59)")]
    InvalidTimePoint(String),
}

// ═══════════════════════════════════════════
// TimePoint
// ═══════════════════════════════════════════

/// A daily clock time with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimePoint {
    minutes: u16,
}

impl TimePoint {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self {
                minutes: (hour * 60 + minute) as u16,
            })
        } else {
            None
        }
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.minutes / 60)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.minutes % 60)
    }

    pub fn minutes_since_midnight(&self) -> i64 {
        i64::from(self.minutes)
    }

    /// This time point on `date`.
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.as_naive_time())
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for TimePoint {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidTimePoint(s.to_string());
        let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;

        let digits_only = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits_only(hours) || hours.len() > 2 || !digits_only(minutes) || minutes.len() != 2 {
            return Err(invalid());
        }

        let hour: u32 = hours.parse().map_err(|_| invalid())?;
        let minute: u32 = minutes.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for TimePoint {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimePoint> for String {
    fn from(value: TimePoint) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Parse a list of "HH:MM" strings, failing on the first bad entry.
pub fn parse_time_points<S: AsRef<str>>(values: &[S]) -> Result<Vec<TimePoint>, ScheduleError> {
    values.iter().map(|v| v.as_ref().parse()).collect()
}

fn minute_of_day(reference: NaiveDateTime) -> i64 {
    i64::from(reference.hour() * 60 + reference.minute())
}

// ═══════════════════════════════════════════
// Resolver
// ═══════════════════════════════════════════

/// Next time point after the reference's time-of-day.
///
/// Falls back to the earliest point (tomorrow's first dose) when every
/// point has already passed today. `None` only for an empty set.
pub fn next_occurrence(points: &[TimePoint], reference: NaiveDateTime) -> Option<TimePoint> {
    let now = minute_of_day(reference);
    points
        .iter()
        .copied()
        .filter(|p| p.minutes_since_midnight() > now)
        .min()
        .or_else(|| points.iter().copied().min())
}

/// Signed minutes from the reference's time-of-day to `point` on the same
/// day. Negative when the point has passed.
pub fn minutes_until(point: TimePoint, reference: NaiveDateTime) -> i64 {
    point.minutes_since_midnight() - minute_of_day(reference)
}

/// Whether `point` lies within `tolerance_minutes` of the reference, on
/// either side. Both bounds are inclusive.
pub fn is_due_now(point: TimePoint, reference: NaiveDateTime, tolerance_minutes: u32) -> bool {
    minutes_until(point, reference).abs() <= i64::from(tolerance_minutes)
}

/// [`is_due_now`] with the default ±30 minute window.
pub fn is_due_now_default(point: TimePoint, reference: NaiveDateTime) -> bool {
    is_due_now(point, reference, config::DUE_WINDOW_MINUTES)
}

/// The subset of `points` due at `reference`, in input order.
pub fn due_points(
    points: &[TimePoint],
    reference: NaiveDateTime,
    tolerance_minutes: u32,
) -> Vec<TimePoint> {
    points
        .iter()
        .copied()
        .filter(|p| is_due_now(*p, reference, tolerance_minutes))
        .collect()
}

/// Identity of one occurrence: a medication at a concrete instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OccurrenceKey {
    pub medication_id: Uuid,
    pub scheduled_at: NaiveDateTime,
}

/// A medication dose that is due at the reference instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueOccurrence {
    pub medication_id: Uuid,
    pub medication_name: String,
    pub time_point: TimePoint,
    pub scheduled_at: NaiveDateTime,
    /// Signed minutes from the reference to the scheduled time.
    pub minutes_until: i64,
}

impl DueOccurrence {
    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey {
            medication_id: self.medication_id,
            scheduled_at: self.scheduled_at,
        }
    }
}

/// Every due (medication, time point) pair, soonest first.
///
/// Medications without time points or outside their start/end dates are
/// skipped. The sort is stable, so ties keep medication order and then
/// time-point order.
pub fn due_occurrences(
    medications: &[Medication],
    reference: NaiveDateTime,
    tolerance_minutes: u32,
) -> Vec<DueOccurrence> {
    let today = reference.date();
    let mut due: Vec<DueOccurrence> = Vec::new();

    for med in medications {
        if !med.is_schedulable() || !med.is_active_on(today) {
            continue;
        }
        for point in due_points(&med.schedules, reference, tolerance_minutes) {
            let scheduled_at = point.on(today);
            if due
                .iter()
                .any(|o| o.medication_id == med.id && o.scheduled_at == scheduled_at)
            {
                continue;
            }
            due.push(DueOccurrence {
                medication_id: med.id,
                medication_name: med.name.clone(),
                time_point: point,
                scheduled_at,
                minutes_until: minutes_until(point, reference),
            });
        }
    }

    due.sort_by_key(|o| o.minutes_until);
    due
}

/// The home screen's "next medication".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextDose {
    pub medication_id: Uuid,
    pub medication_name: String,
    pub time_point: TimePoint,
    pub at: NaiveDateTime,
    pub wait_minutes: i64,
}

/// The medication whose next occurrence is closest to `reference`.
///
/// An occurrence whose time-of-day is not strictly later than the
/// reference is placed on the following day. A medication that has not
/// started yet counts from its earliest point on the start date. The first
/// medication wins a tie.
pub fn next_dose(medications: &[Medication], reference: NaiveDateTime) -> Option<NextDose> {
    let now = minute_of_day(reference);
    let mut closest: Option<NextDose> = None;

    for med in medications {
        let Some(point) = next_occurrence(&med.schedules, reference) else {
            continue;
        };
        let day = if point.minutes_since_midnight() > now {
            reference.date()
        } else {
            reference.date() + Duration::days(1)
        };
        // Not started yet: first dose is the earliest point on the start date.
        let (point, day) = if med.is_active_on(day) {
            (point, day)
        } else if med.start_date > day && med.is_active_on(med.start_date) {
            match med.schedules.iter().copied().min() {
                Some(first) => (first, med.start_date),
                None => continue,
            }
        } else {
            continue;
        };
        let at = point.on(day);
        let wait_minutes = (at - reference).num_minutes();

        if closest.as_ref().map_or(true, |c| at < c.at) {
            closest = Some(NextDose {
                medication_id: med.id,
                medication_name: med.name.clone(),
                time_point: point,
                at,
                wait_minutes,
            });
        }
    }

    closest
}
