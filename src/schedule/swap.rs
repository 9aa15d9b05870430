use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::assignment::{AssignmentConflict, AssignmentContext};
use crate::database::models::{Employee, ProposedShift, Shift, ShiftSwap, SwapStatus, TimeOffRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapRuleError {
    #[error("cannot swap a shift with yourself")]
    SameEmployee,

    #[error("cannot swap a shift with itself")]
    SameShift,

    #[error("shift {shift_id} is not assigned to employee {employee_id}")]
    ShiftNotOwned { shift_id: Uuid, employee_id: Uuid },

    #[error("shift {shift_id} has already started")]
    AlreadyStarted { shift_id: Uuid },

    #[error("supervisor shift {shift_id} can only go to a supervisor or manager")]
    SupervisorRoleRequired { shift_id: Uuid },
}

/// Structural checks for a proposed exchange of two shifts.
pub fn validate_swap(
    requester: &Employee,
    requester_shift: &Shift,
    recipient: &Employee,
    recipient_shift: &Shift,
    now: DateTime<Utc>,
) -> Result<(), SwapRuleError> {
    if requester.id == recipient.id {
        return Err(SwapRuleError::SameEmployee);
    }
    if requester_shift.id == recipient_shift.id {
        return Err(SwapRuleError::SameShift);
    }

    for (shift, owner) in [(requester_shift, requester), (recipient_shift, recipient)] {
        if shift.employee_id != owner.id {
            return Err(SwapRuleError::ShiftNotOwned {
                shift_id: shift.id,
                employee_id: owner.id,
            });
        }
        if shift.start_time <= now {
            return Err(SwapRuleError::AlreadyStarted { shift_id: shift.id });
        }
    }

    // each shift goes to the other employee
    for (shift, new_owner) in [(requester_shift, recipient), (recipient_shift, requester)] {
        if shift.is_supervisor && !new_owner.role.can_supervise() {
            return Err(SwapRuleError::SupervisorRoleRequired { shift_id: shift.id });
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftOwnerChange {
    pub shift_id: Uuid,
    pub from_employee_id: Uuid,
    pub to_employee_id: Uuid,
}

/// The two ownership changes accepting `swap` performs. Each is guarded on
/// the current owner when applied.
pub fn swapped(swap: &ShiftSwap) -> [ShiftOwnerChange; 2] {
    [
        ShiftOwnerChange {
            shift_id: swap.requester_shift_id,
            from_employee_id: swap.requester_id,
            to_employee_id: swap.recipient_id,
        },
        ShiftOwnerChange {
            shift_id: swap.recipient_shift_id,
            from_employee_id: swap.recipient_id,
            to_employee_id: swap.requester_id,
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapActor {
    Requester,
    Recipient,
    Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapAction {
    Accept,
    Reject,
    Cancel,
}

impl SwapAction {
    fn target(self) -> SwapStatus {
        match self {
            SwapAction::Accept => SwapStatus::Accepted,
            SwapAction::Reject => SwapStatus::Rejected,
            SwapAction::Cancel => SwapStatus::Cancelled,
        }
    }

    fn allowed_for(self, actor: SwapActor) -> bool {
        matches!(
            (self, actor),
            (SwapAction::Accept, SwapActor::Recipient)
                | (SwapAction::Reject, SwapActor::Recipient | SwapActor::Manager)
                | (SwapAction::Cancel, SwapActor::Requester | SwapActor::Manager)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapTransitionError {
    #[error("swap is already {0}")]
    AlreadyFinal(SwapStatus),

    #[error("not allowed to {action:?} this swap")]
    NotAllowed { action: SwapAction },
}

/// Roles the employee plays in `swap`. A manager who is also a party holds both.
pub fn actors_for(
    requester_id: Uuid,
    recipient_id: Uuid,
    employee_id: Uuid,
    is_manager: bool,
) -> Vec<SwapActor> {
    let mut actors = Vec::new();
    if employee_id == requester_id {
        actors.push(SwapActor::Requester);
    }
    if employee_id == recipient_id {
        actors.push(SwapActor::Recipient);
    }
    if is_manager {
        actors.push(SwapActor::Manager);
    }
    actors
}

/// Next status when one of `actors` performs `action` on a swap in `status`.
pub fn transition(
    status: SwapStatus,
    action: SwapAction,
    actors: &[SwapActor],
) -> Result<SwapStatus, SwapTransitionError> {
    if status.is_terminal() {
        return Err(SwapTransitionError::AlreadyFinal(status));
    }
    if !actors.iter().any(|a| action.allowed_for(*a)) {
        return Err(SwapTransitionError::NotAllowed { action });
    }
    Ok(action.target())
}

/// Conflicts both employees would have after the exchange, checked against
/// their schedules with the two shifts already moved.
#[allow(clippy::too_many_arguments)]
pub fn post_swap_conflicts(
    requester: &Employee,
    requester_shift: &Shift,
    recipient: &Employee,
    recipient_shift: &Shift,
    shifts: &[Shift],
    time_off: &[TimeOffRequest],
    cap_hours: i64,
    offset: FixedOffset,
) -> Vec<AssignmentConflict> {
    let to_recipient = ProposedShift::reassigned(requester_shift, recipient.id);
    let to_requester = ProposedShift::reassigned(recipient_shift, requester.id);

    let after: Vec<ProposedShift> = shifts
        .iter()
        .filter(|s| s.id != requester_shift.id && s.id != recipient_shift.id)
        .map(|s| ProposedShift::reassigned(s, s.employee_id))
        .chain([to_recipient.clone(), to_requester.clone()])
        .collect();

    let mut conflicts = AssignmentContext {
        employee: recipient,
        existing: &after,
        time_off,
        cap_hours,
        offset,
    }
    .validate(&to_recipient);

    conflicts.extend(
        AssignmentContext {
            employee: requester,
            existing: &after,
            time_off,
            cap_hours,
            offset,
        }
        .validate(&to_requester),
    );

    conflicts
}
