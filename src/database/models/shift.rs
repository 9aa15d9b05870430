use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_supervisor: bool,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftInput {
    pub employee_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_supervisor: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftQuery {
    pub employee_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub supervisor_only: bool,
}

/// A shift that is not (yet) persisted, or a persisted one under a
/// hypothetical change of owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProposedShift {
    pub id: Option<Uuid>,
    pub employee_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_supervisor: bool,
    pub requirement_id: Option<Uuid>,
}

impl ProposedShift {
    pub fn from_input(input: &ShiftInput, id: Option<Uuid>) -> Self {
        Self {
            id,
            employee_id: input.employee_id,
            start_time: input.start_time,
            end_time: input.end_time,
            is_supervisor: input.is_supervisor,
            requirement_id: None,
        }
    }

    /// The same shift handed to a different employee.
    pub fn reassigned(shift: &Shift, employee_id: Uuid) -> Self {
        Self {
            id: Some(shift.id),
            employee_id,
            start_time: shift.start_time,
            end_time: shift.end_time,
            is_supervisor: shift.is_supervisor,
            requirement_id: None,
        }
    }
}
