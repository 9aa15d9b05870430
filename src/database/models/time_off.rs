use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub start_date: NaiveDate, // inclusive
    pub end_date: NaiveDate,   // inclusive
    pub request_type: TimeOffType,
    pub status: TimeOffStatus,
    pub reason: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffRequestInput {
    /// Defaults to the caller; supervisors and managers may file for others.
    pub employee_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub request_type: TimeOffType,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffQuery {
    pub employee_id: Option<Uuid>,
    pub status: Option<TimeOffStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum TimeOffType {
        Vacation => "vacation",
        Sick => "sick",
        Personal => "personal",
        Training => "training",
        Other => "other",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum TimeOffStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Cancelled => "cancelled",
    }
}
