use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::assignment::{AssignmentContext, validate_window};
use super::staffing::{applies_on, block_window, headcount};
use super::weekly_hours::{WeekKey, minutes_in_week};
use super::{DateOutOfRange, check_supported, days};
use crate::database::models::{Employee, ProposedShift, Shift, StaffingRequirement, TimeOffRequest};

pub const MAX_RANGE_DAYS: i64 = 31;

#[derive(Debug, Clone, Copy)]
pub struct GenerateParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub cap_hours: i64,
    pub offset: FixedOffset,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("range end {to} is before start {from}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("range spans {days} days, the limit is {max}", max = MAX_RANGE_DAYS)]
    RangeTooLong { days: i64 },

    #[error(transparent)]
    OutOfRange(#[from] DateOutOfRange),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfilledSlot {
    pub date: NaiveDate,
    pub requirement_id: Uuid,
    pub requirement_name: String,
    pub block_start: DateTime<Utc>,
    pub block_end: DateTime<Utc>,
    pub missing_staff: i32,
    pub missing_supervisors: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSchedule {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub shifts: Vec<ProposedShift>,
    pub unfilled: Vec<UnfilledSlot>,
}

impl GeneratedSchedule {
    pub fn is_complete(&self) -> bool {
        self.unfilled.is_empty()
    }
}

/// Rejects reversed ranges, ranges longer than [`MAX_RANGE_DAYS`] and dates
/// outside the supported calendar.
pub fn check_range(from: NaiveDate, to: NaiveDate) -> Result<(), GenerateError> {
    check_supported(from)?;
    check_supported(to)?;
    if to < from {
        return Err(GenerateError::InvalidRange { from, to });
    }
    let days = (to - from).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(GenerateError::RangeTooLong { days });
    }
    Ok(())
}

struct Planner<'a> {
    params: GenerateParams,
    employees: &'a [Employee],
    time_off: &'a [TimeOffRequest],
    /// Existing shifts plus everything planned so far.
    occupied: Vec<ProposedShift>,
    planned: Vec<ProposedShift>,
}

impl Planner<'_> {
    /// Picks the least-loaded eligible employee for the window and books them.
    fn fill_one(
        &mut self,
        requirement: &StaffingRequirement,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        supervisor: bool,
    ) -> bool {
        let week = WeekKey::of(start, self.params.offset);
        let (on_block, _) = headcount(&self.occupied, start, end);

        let mut candidates: Vec<(i64, &Employee)> = self
            .employees
            .iter()
            .filter(|e| e.is_active && !on_block.contains(&e.id))
            .filter(|e| !supervisor || e.role.can_supervise())
            .map(|e| {
                let load = minutes_in_week(&self.occupied, e.id, week, None, self.params.offset);
                (load, e)
            })
            .collect();
        candidates.sort_by(|(la, a), (lb, b)| {
            la.cmp(lb)
                .then_with(|| a.full_name.cmp(&b.full_name))
                .then_with(|| a.id.cmp(&b.id))
        });

        let chosen = candidates.into_iter().find_map(|(_, employee)| {
            let proposal = ProposedShift {
                id: None,
                employee_id: employee.id,
                start_time: start,
                end_time: end,
                is_supervisor: supervisor,
                requirement_id: Some(requirement.id),
            };
            let ctx = AssignmentContext {
                employee,
                existing: &self.occupied,
                time_off: self.time_off,
                cap_hours: self.params.cap_hours,
                offset: self.params.offset,
            };
            ctx.validate(&proposal).is_empty().then_some(proposal)
        });

        match chosen {
            Some(proposal) => {
                self.occupied.push(proposal.clone());
                self.planned.push(proposal);
                true
            }
            None => false,
        }
    }
}

/// Greedily fills every staffing block in `[from, to]`.
///
/// Blocks are visited day by day in order of start time. Missing supervisors
/// are filled first from supervisors and managers, then the remaining
/// headcount from everyone. Among eligible employees the one with the fewest
/// minutes already scheduled in that ISO week wins, ties broken by name and id,
/// so identical inputs always produce the same schedule.
pub fn generate(
    params: GenerateParams,
    employees: &[Employee],
    requirements: &[StaffingRequirement],
    existing: &[Shift],
    time_off: &[TimeOffRequest],
) -> Result<GeneratedSchedule, GenerateError> {
    check_range(params.from, params.to)?;

    let mut planner = Planner {
        params,
        employees,
        time_off,
        occupied: existing
            .iter()
            .map(|s| ProposedShift::reassigned(s, s.employee_id))
            .collect(),
        planned: Vec::new(),
    };
    let mut unfilled = Vec::new();

    for date in days(params.from, params.to) {
        let mut blocks: Vec<(DateTime<Utc>, DateTime<Utc>, &StaffingRequirement)> = requirements
            .iter()
            .filter(|r| applies_on(r, date))
            .map(|r| {
                let (start, end) = block_window(r, date, params.offset)?;
                Ok((start, end, r))
            })
            .collect::<Result<_, DateOutOfRange>>()?;
        blocks.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.2.name.cmp(&b.2.name))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });

        for (start, end, requirement) in blocks {
            let (staff, supervisors) = headcount(&planner.occupied, start, end);
            let mut missing_supervisors =
                (requirement.min_supervisors - supervisors.len() as i32).max(0);
            let mut missing_staff = (requirement.min_staff - staff.len() as i32).max(0);

            if validate_window(start, end).is_err() {
                log::warn!(
                    "Staffing block '{}' on {} cannot be worked as a single shift",
                    requirement.name,
                    date
                );
            } else {
                while missing_supervisors > 0 && planner.fill_one(requirement, start, end, true) {
                    missing_supervisors -= 1;
                    missing_staff = (missing_staff - 1).max(0);
                }
                while missing_staff > 0 && planner.fill_one(requirement, start, end, false) {
                    missing_staff -= 1;
                }
            }

            if missing_staff > 0 || missing_supervisors > 0 {
                unfilled.push(UnfilledSlot {
                    date,
                    requirement_id: requirement.id,
                    requirement_name: requirement.name.clone(),
                    block_start: start,
                    block_end: end,
                    missing_staff,
                    missing_supervisors,
                });
            }
        }
    }

    Ok(GeneratedSchedule {
        from: params.from,
        to: params.to,
        shifts: planner.planned,
        unfilled,
    })
}
