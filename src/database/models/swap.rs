use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSwap {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub requester_shift_id: Uuid,
    pub recipient_id: Uuid,
    pub recipient_shift_id: Uuid,
    pub status: SwapStatus,
    pub notes: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The recipient is whoever currently holds `recipient_shift_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSwapInput {
    pub requester_shift_id: Uuid,
    pub recipient_shift_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuery {
    pub employee_id: Option<Uuid>,
    pub status: Option<SwapStatus>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum SwapStatus {
        Pending => "pending",
        Accepted => "accepted",
        Rejected => "rejected",
        Cancelled => "cancelled",
    }
}

impl SwapStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SwapStatus::Pending)
    }
}
