//! Scheduling rules for the dispatch floor.
//!
//! Everything in here is pure: callers load employees, shifts, requirements and
//! time off from the repositories and hand slices to these functions. All
//! calendar questions (which day, which ISO week) are answered in the center's
//! fixed UTC offset.

use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{ProposedShift, Shift};

pub mod assignment;
pub mod generate;
pub mod staffing;
pub mod swap;
pub mod time_off;
pub mod weekly_hours;

pub use assignment::{AssignmentConflict, AssignmentContext, ShiftWindowError};
pub use generate::{GenerateError, GenerateParams, GeneratedSchedule, UnfilledSlot};
pub use staffing::{CoverageRow, DailyCoverage, StaffingRuleError};
pub use swap::{SwapAction, SwapActor, SwapRuleError, SwapTransitionError};
pub use time_off::TimeOffRangeError;
pub use weekly_hours::{WeekKey, WeeklyHours, WeeklyHoursViolation};

/// Anything occupying an employee for a time window.
pub trait Scheduled {
    /// Persisted id, if any. Used to skip the shift itself when re-validating an update.
    fn shift_id(&self) -> Option<Uuid>;
    fn employee_id(&self) -> Uuid;
    fn starts_at(&self) -> DateTime<Utc>;
    fn ends_at(&self) -> DateTime<Utc>;
    fn is_supervisor(&self) -> bool;

    fn minutes(&self) -> i64 {
        weekly_hours::shift_minutes(self.starts_at(), self.ends_at())
    }

    /// Half-open intersection with `[start, end)`.
    fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.starts_at() < end && start < self.ends_at()
    }
}

impl Scheduled for Shift {
    fn shift_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn employee_id(&self) -> Uuid {
        self.employee_id
    }

    fn starts_at(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn ends_at(&self) -> DateTime<Utc> {
        self.end_time
    }

    fn is_supervisor(&self) -> bool {
        self.is_supervisor
    }
}

impl Scheduled for ProposedShift {
    fn shift_id(&self) -> Option<Uuid> {
        self.id
    }

    fn employee_id(&self) -> Uuid {
        self.employee_id
    }

    fn starts_at(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn ends_at(&self) -> DateTime<Utc> {
        self.end_time
    }

    fn is_supervisor(&self) -> bool {
        self.is_supervisor
    }
}

/// Calendar years accepted from callers. Everything the rules derive from a
/// date in this range stays representable.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1970..=9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("date {0} is outside the supported calendar")]
pub struct DateOutOfRange(pub NaiveDate);

pub fn check_supported(date: NaiveDate) -> Result<NaiveDate, DateOutOfRange> {
    if SUPPORTED_YEARS.contains(&date.year()) {
        Ok(date)
    } else {
        Err(DateOutOfRange(date))
    }
}

/// `date` moved by `days` calendar days, either direction.
pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate, DateOutOfRange> {
    let moved = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    moved.ok_or(DateOutOfRange(date))
}

/// The instant a center-local wall-clock time occurs, if representable.
pub fn local_instant(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    date.and_time(time)
        .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
        .map(|utc| Utc.from_utc_datetime(&utc))
}

/// Center-local midnight starting the day `days` after `date`.
pub fn local_midnight(
    date: NaiveDate,
    days: i64,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, DateOutOfRange> {
    let day = add_days(date, days)?;
    local_instant(day, NaiveTime::MIN, offset).ok_or(DateOutOfRange(day))
}

/// Center-local calendar date of an instant.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// Inclusive iterator over calendar days.
pub fn days(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= to)
}


#[cfg(test)]
mod tests {
    use super::*;
    use fixtures::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn local_instant_applies_offset() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let instant = local_instant(date(2025, 3, 10), NaiveTime::from_hms_opt(7, 0, 0).unwrap(), offset);
        assert_eq!(instant, Some(at(2025, 3, 10, 12)));
        assert_eq!(local_date(at(2025, 3, 11, 3), offset), date(2025, 3, 10));
    }

    #[test]
    fn calendar_edges_do_not_overflow() {
        let east = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(local_instant(NaiveDate::MIN, NaiveTime::MIN, east), None);
        assert_eq!(add_days(NaiveDate::MAX, 1), Err(DateOutOfRange(NaiveDate::MAX)));
        assert_eq!(add_days(NaiveDate::MIN, -1), Err(DateOutOfRange(NaiveDate::MIN)));
        assert!(local_midnight(NaiveDate::MAX, 2, east).is_err());
        assert_eq!(local_midnight(date(2025, 3, 10), -7, east), Ok(at(2025, 3, 2, 22)));
    }

    #[test]
    fn only_supported_years_are_accepted() {
        assert!(check_supported(date(2025, 1, 1)).is_ok());
        assert!(check_supported(NaiveDate::MAX).is_err());
        assert!(check_supported(date(1969, 12, 31)).is_err());
    }

    #[test]
    fn overlap_is_half_open() {
        let s = shift(Uuid::new_v4(), at(2025, 3, 10, 6), at(2025, 3, 10, 14));
        assert!(s.overlaps(at(2025, 3, 10, 13), at(2025, 3, 10, 22)));
        assert!(!s.overlaps(at(2025, 3, 10, 14), at(2025, 3, 10, 22)));
        assert!(!s.overlaps(at(2025, 3, 10, 0), at(2025, 3, 10, 6)));
    }

    #[test]
    fn days_is_inclusive() {
        let all: Vec<_> = days(date(2025, 2, 27), date(2025, 3, 2)).collect();
        assert_eq!(all.len(), 4);
        assert_eq!(all.last(), Some(&date(2025, 3, 2)));
    }
}
