use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum headcount for a recurring time block.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffingRequirement {
    pub id: Uuid,
    pub name: String,
    /// ISO weekday, 1 = Monday .. 7 = Sunday. `None` applies every day.
    pub day_of_week: Option<i16>,
    pub start_time: NaiveTime,
    /// When not after `start_time` the block runs past midnight.
    pub end_time: NaiveTime,
    pub min_staff: i32,
    pub min_supervisors: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffingRequirementInput {
    pub name: String,
    pub day_of_week: Option<i16>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub min_staff: i32,
    #[serde(default)]
    pub min_supervisors: i32,
}
