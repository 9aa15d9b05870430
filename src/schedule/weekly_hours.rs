use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::Scheduled;

pub const DEFAULT_WEEKLY_CAP_HOURS: i64 = 40;

/// ISO-8601 week, Monday based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    pub fn of(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        let iso = instant.with_timezone(&offset).iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyHours {
    pub week: WeekKey,
    pub minutes: i64,
    pub hours: f64,
    pub shift_count: usize,
}

impl WeeklyHours {
    fn new(week: WeekKey, minutes: i64, shift_count: usize) -> Self {
        Self {
            week,
            minutes,
            hours: minutes as f64 / 60.0,
            shift_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error(
    "employee {employee_id} would work {:.2}h in {week}, over the {cap_hours}h weekly cap",
    *.scheduled_minutes as f64 / 60.0
)]
pub struct WeeklyHoursViolation {
    pub employee_id: Uuid,
    pub week: WeekKey,
    pub scheduled_minutes: i64,
    pub cap_hours: i64,
}

pub fn shift_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes().max(0)
}

/// Sums shift durations per ISO week of the shift start, ordered by week.
///
/// A shift crossing into the next week counts entirely toward the week it
/// started in.
pub fn weekly_totals<'a, S, I>(shifts: I, offset: FixedOffset) -> Vec<WeeklyHours>
where
    S: Scheduled + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let mut weeks: BTreeMap<WeekKey, (i64, usize)> = BTreeMap::new();
    for shift in shifts {
        let entry = weeks
            .entry(WeekKey::of(shift.starts_at(), offset))
            .or_default();
        entry.0 += shift.minutes();
        entry.1 += 1;
    }

    weeks
        .into_iter()
        .map(|(week, (minutes, count))| WeeklyHours::new(week, minutes, count))
        .collect()
}

/// Weeks whose total strictly exceeds the cap.
pub fn over_cap<'a, S, I>(shifts: I, cap_hours: i64, offset: FixedOffset) -> Vec<WeeklyHours>
where
    S: Scheduled + 'a,
    I: IntoIterator<Item = &'a S>,
{
    weekly_totals(shifts, offset)
        .into_iter()
        .filter(|w| w.minutes > cap_hours * 60)
        .collect()
}

/// Minutes `employee_id` already works in `week`, ignoring the shift with id `skip`.
pub fn minutes_in_week<S: Scheduled>(
    shifts: &[S],
    employee_id: Uuid,
    week: WeekKey,
    skip: Option<Uuid>,
    offset: FixedOffset,
) -> i64 {
    shifts
        .iter()
        .filter(|s| s.employee_id() == employee_id)
        .filter(|s| skip.is_none() || s.shift_id() != skip)
        .filter(|s| WeekKey::of(s.starts_at(), offset) == week)
        .map(Scheduled::minutes)
        .sum()
}

/// Checks that adding `candidate` keeps its owner within the weekly cap.
///
/// On success returns the minutes the owner would work that week. A shift in
/// `existing` with the candidate's id is treated as the version being replaced.
pub fn check_weekly_cap<S: Scheduled, C: Scheduled>(
    existing: &[S],
    candidate: &C,
    cap_hours: i64,
    offset: FixedOffset,
) -> Result<i64, WeeklyHoursViolation> {
    let week = WeekKey::of(candidate.starts_at(), offset);
    let total = minutes_in_week(
        existing,
        candidate.employee_id(),
        week,
        candidate.shift_id(),
        offset,
    ) + candidate.minutes();

    if total > cap_hours * 60 {
        return Err(WeeklyHoursViolation {
            employee_id: candidate.employee_id(),
            week,
            scheduled_minutes: total,
            cap_hours,
        });
    }

    Ok(total)
}
