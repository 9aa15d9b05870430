use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::{DateOutOfRange, Scheduled, check_supported};
use super::time_off::approved_leave_during;
use super::weekly_hours::{WeeklyHoursViolation, check_weekly_cap, shift_minutes};
use crate::database::models::{Employee, ShiftInput, TimeOffRequest};

pub const MAX_SHIFT_HOURS: i64 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShiftWindowError {
    #[error("shift must end after it starts")]
    EndNotAfterStart,

    #[error("shift lasts {minutes} minutes, the limit is {max} hours", max = MAX_SHIFT_HOURS)]
    TooLong { minutes: i64 },

    #[error(transparent)]
    OutOfRange(#[from] DateOutOfRange),
}

pub fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ShiftWindowError> {
    check_supported(start.date_naive())?;
    check_supported(end.date_naive())?;
    if end <= start {
        return Err(ShiftWindowError::EndNotAfterStart);
    }
    let minutes = shift_minutes(start, end);
    if minutes > MAX_SHIFT_HOURS * 60 {
        return Err(ShiftWindowError::TooLong { minutes });
    }
    Ok(())
}

pub fn validate_shift(input: &ShiftInput) -> Result<(), ShiftWindowError> {
    validate_window(input.start_time, input.end_time)
}

/// Why an employee cannot take a shift.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AssignmentConflict {
    #[serde(rename_all = "camelCase")]
    SupervisorRoleRequired { employee_id: Uuid },
    #[serde(rename_all = "camelCase")]
    InactiveEmployee { employee_id: Uuid },
    #[serde(rename_all = "camelCase")]
    OverlappingShift { shift_id: Option<Uuid> },
    #[serde(rename_all = "camelCase")]
    OnLeave {
        request_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    WeeklyCap(WeeklyHoursViolation),
}

impl std::fmt::Display for AssignmentConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SupervisorRoleRequired { employee_id } => write!(
                f,
                "employee {employee_id} cannot work a supervisor shift without a supervisor role"
            ),
            Self::InactiveEmployee { employee_id } => {
                write!(f, "employee {employee_id} is not active")
            }
            Self::OverlappingShift { shift_id: Some(id) } => {
                write!(f, "overlaps existing shift {id}")
            }
            Self::OverlappingShift { shift_id: None } => write!(f, "overlaps another planned shift"),
            Self::OnLeave {
                start_date,
                end_date,
                ..
            } => write!(f, "employee is on approved leave {start_date} to {end_date}"),
            Self::WeeklyCap(violation) => violation.fmt(f),
        }
    }
}

/// Everything known about the employee a shift is being assigned to.
pub struct AssignmentContext<'a, S: Scheduled> {
    pub employee: &'a Employee,
    /// Shifts already on the books. May include other employees.
    pub existing: &'a [S],
    pub time_off: &'a [TimeOffRequest],
    pub cap_hours: i64,
    pub offset: FixedOffset,
}

impl<'a, S: Scheduled> AssignmentContext<'a, S> {
    /// Every rule the candidate breaks. Empty means the assignment is allowed.
    pub fn validate<C: Scheduled>(&self, candidate: &C) -> Vec<AssignmentConflict> {
        let employee_id = self.employee.id;
        let mut conflicts = Vec::new();

        if !self.employee.is_active {
            conflicts.push(AssignmentConflict::InactiveEmployee { employee_id });
        }

        if candidate.is_supervisor() && !self.employee.role.can_supervise() {
            conflicts.push(AssignmentConflict::SupervisorRoleRequired { employee_id });
        }

        let own_id = candidate.shift_id();
        if let Some(other) = self.existing.iter().find(|s| {
            s.employee_id() == employee_id
                && (own_id.is_none() || s.shift_id() != own_id)
                && s.overlaps(candidate.starts_at(), candidate.ends_at())
        }) {
            conflicts.push(AssignmentConflict::OverlappingShift {
                shift_id: other.shift_id(),
            });
        }

        if let Some(leave) = approved_leave_during(
            employee_id,
            candidate.starts_at(),
            candidate.ends_at(),
            self.time_off,
            self.offset,
        ) {
            conflicts.push(AssignmentConflict::OnLeave {
                request_id: leave.id,
                start_date: leave.start_date,
                end_date: leave.end_date,
            });
        }

        if let Err(violation) =
            check_weekly_cap(self.existing, candidate, self.cap_hours, self.offset)
        {
            conflicts.push(AssignmentConflict::WeeklyCap(violation));
        }

        conflicts
    }
}

pub fn validate_assignment<S: Scheduled, C: Scheduled>(
    ctx: &AssignmentContext<'_, S>,
    candidate: &C,
) -> Vec<AssignmentConflict> {
    ctx.validate(candidate)
}
