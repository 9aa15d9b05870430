use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::{DateOutOfRange, Scheduled, check_supported, local_midnight};
use crate::database::models::{TimeOffRequest, TimeOffStatus};

pub const MAX_REQUEST_DAYS: i64 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeOffRangeError {
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("time off cannot start in the past ({start})")]
    StartsInPast { start: NaiveDate },

    #[error("time off spans {days} days, the limit is {max}", max = MAX_REQUEST_DAYS)]
    TooLong { days: i64 },

    #[error(transparent)]
    OutOfRange(#[from] DateOutOfRange),
}

/// Validates a request's inclusive date range and returns its length in days.
pub fn validate_range(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<i64, TimeOffRangeError> {
    check_supported(start)?;
    check_supported(end)?;
    if end < start {
        return Err(TimeOffRangeError::EndBeforeStart { start, end });
    }
    if start < today {
        return Err(TimeOffRangeError::StartsInPast { start });
    }

    let days = (end - start).num_days() + 1;
    if days > MAX_REQUEST_DAYS {
        return Err(TimeOffRangeError::TooLong { days });
    }

    Ok(days)
}

/// `[start 00:00, end + 1 day 00:00)` in center-local time.
pub fn range_window(
    start: NaiveDate,
    end: NaiveDate,
    offset: FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>), DateOutOfRange> {
    Ok((
        local_midnight(start, 0, offset)?,
        local_midnight(end, 1, offset)?,
    ))
}

pub fn overlaps<S: Scheduled>(
    start: NaiveDate,
    end: NaiveDate,
    shift: &S,
    offset: FixedOffset,
) -> bool {
    range_window(start, end, offset).is_ok_and(|(from, to)| shift.overlaps(from, to))
}

/// Shifts of `employee_id` that fall inside the requested dates.
pub fn conflicting_shifts<'a, S: Scheduled>(
    employee_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    shifts: &'a [S],
    offset: FixedOffset,
) -> Vec<&'a S> {
    let Ok((from, to)) = range_window(start, end, offset) else {
        return Vec::new();
    };
    shifts
        .iter()
        .filter(|s| s.employee_id() == employee_id && s.overlaps(from, to))
        .collect()
}

/// Approved leave of `employee_id` intersecting `[at_start, at_end)`, if any.
pub fn approved_leave_during<'a>(
    employee_id: Uuid,
    at_start: DateTime<Utc>,
    at_end: DateTime<Utc>,
    requests: &'a [TimeOffRequest],
    offset: FixedOffset,
) -> Option<&'a TimeOffRequest> {
    requests.iter().find(|r| {
        if r.employee_id != employee_id || r.status != TimeOffStatus::Approved {
            return false;
        }
        range_window(r.start_date, r.end_date, offset)
            .is_ok_and(|(from, to)| at_start < to && from < at_end)
    })
}
