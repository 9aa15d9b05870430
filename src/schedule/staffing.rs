use std::collections::HashSet;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::{DateOutOfRange, Scheduled, add_days, days, local_instant};
use crate::database::models::{StaffingRequirement, StaffingRequirementInput};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StaffingRuleError {
    #[error("requirement name cannot be empty")]
    EmptyName,

    #[error("day of week must be between 1 (Monday) and 7 (Sunday), got {0}")]
    InvalidDayOfWeek(i16),

    #[error("time block cannot start and end at {0}")]
    EmptyBlock(NaiveTime),

    #[error("minimum staff must be at least 1, got {0}")]
    InvalidMinStaff(i32),

    #[error("minimum supervisors ({min_supervisors}) must be between 0 and minimum staff ({min_staff})")]
    InvalidMinSupervisors { min_staff: i32, min_supervisors: i32 },
}

pub fn validate_requirement(input: &StaffingRequirementInput) -> Result<(), StaffingRuleError> {
    if input.name.trim().is_empty() {
        return Err(StaffingRuleError::EmptyName);
    }
    if let Some(day) = input.day_of_week {
        if !(1..=7).contains(&day) {
            return Err(StaffingRuleError::InvalidDayOfWeek(day));
        }
    }
    if input.start_time == input.end_time {
        return Err(StaffingRuleError::EmptyBlock(input.start_time));
    }
    if input.min_staff < 1 {
        return Err(StaffingRuleError::InvalidMinStaff(input.min_staff));
    }
    if input.min_supervisors < 0 || input.min_supervisors > input.min_staff {
        return Err(StaffingRuleError::InvalidMinSupervisors {
            min_staff: input.min_staff,
            min_supervisors: input.min_supervisors,
        });
    }
    Ok(())
}

pub fn applies_on(requirement: &StaffingRequirement, date: NaiveDate) -> bool {
    requirement
        .day_of_week
        .is_none_or(|day| u32::try_from(day).ok() == Some(date.weekday().number_from_monday()))
}

/// Concrete window of a requirement's block starting on `date`.
pub fn block_window(
    requirement: &StaffingRequirement,
    date: NaiveDate,
    offset: FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>), DateOutOfRange> {
    let end_date = if requirement.end_time <= requirement.start_time {
        add_days(date, 1)?
    } else {
        date
    };
    let start = local_instant(date, requirement.start_time, offset).ok_or(DateOutOfRange(date))?;
    let end = local_instant(end_date, requirement.end_time, offset).ok_or(DateOutOfRange(end_date))?;
    Ok((start, end))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRow {
    pub requirement_id: Uuid,
    pub name: String,
    pub block_start: DateTime<Utc>,
    pub block_end: DateTime<Utc>,
    pub required_staff: i32,
    pub current_staff: i32,
    pub required_supervisors: i32,
    pub current_supervisors: i32,
    pub staff_shortfall: i32,
    pub supervisor_shortfall: i32,
    pub is_met: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCoverage {
    pub date: NaiveDate,
    pub blocks: Vec<CoverageRow>,
    pub is_fully_staffed: bool,
}

/// Distinct employees on shift during `[start, end)`, and the subset working a
/// supervisor-tagged shift there.
pub fn headcount<'a, S, I>(shifts: I, start: DateTime<Utc>, end: DateTime<Utc>) -> (HashSet<Uuid>, HashSet<Uuid>)
where
    S: Scheduled + ?Sized + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let mut staff = HashSet::new();
    let mut supervisors = HashSet::new();
    for shift in shifts.into_iter().filter(|s| s.overlaps(start, end)) {
        staff.insert(shift.employee_id());
        if shift.is_supervisor() {
            supervisors.insert(shift.employee_id());
        }
    }
    (staff, supervisors)
}

/// Required vs. current staffing for every block that applies on `date`,
/// ordered by block start. Blocks with no representable window are left out.
pub fn coverage_for_date<S: Scheduled>(
    requirements: &[StaffingRequirement],
    shifts: &[S],
    date: NaiveDate,
    offset: FixedOffset,
) -> Vec<CoverageRow> {
    let mut rows: Vec<CoverageRow> = requirements
        .iter()
        .filter(|r| applies_on(r, date))
        .filter_map(|r| {
            let (block_start, block_end) = block_window(r, date, offset).ok()?;
            let (staff, supervisors) = headcount(shifts, block_start, block_end);
            let current_staff = staff.len() as i32;
            let current_supervisors = supervisors.len() as i32;
            let staff_shortfall = (r.min_staff - current_staff).max(0);
            let supervisor_shortfall = (r.min_supervisors - current_supervisors).max(0);

            Some(CoverageRow {
                requirement_id: r.id,
                name: r.name.clone(),
                block_start,
                block_end,
                required_staff: r.min_staff,
                current_staff,
                required_supervisors: r.min_supervisors,
                current_supervisors,
                staff_shortfall,
                supervisor_shortfall,
                is_met: staff_shortfall == 0 && supervisor_shortfall == 0,
            })
        })
        .collect();

    rows.sort_by(|a, b| a.block_start.cmp(&b.block_start).then_with(|| a.name.cmp(&b.name)));
    rows
}

pub fn coverage_for_range<S: Scheduled>(
    requirements: &[StaffingRequirement],
    shifts: &[S],
    from: NaiveDate,
    to: NaiveDate,
    offset: FixedOffset,
) -> Vec<DailyCoverage> {
    days(from, to)
        .map(|date| {
            let blocks = coverage_for_date(requirements, shifts, date, offset);
            let is_fully_staffed = blocks.iter().all(|b| b.is_met);
            DailyCoverage {
                date,
                blocks,
                is_fully_staffed,
            }
        })
        .collect()
}
