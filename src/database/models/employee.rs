use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub role: EmployeeRole,
    pub badge_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum EmployeeRole {
        #[default]
        Dispatcher => "dispatcher",
        Supervisor => "supervisor",
        Manager => "manager",
    }
}

impl EmployeeRole {
    /// Supervisor-tagged shifts may only be worked by supervisors and managers.
    pub fn can_supervise(&self) -> bool {
        matches!(self, EmployeeRole::Supervisor | EmployeeRole::Manager)
    }
}

/// Row data for a new employee; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: EmployeeRole,
    pub badge_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub badge_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInfo {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: EmployeeRole,
    pub badge_number: Option<String>,
}

impl From<Employee> for EmployeeInfo {
    fn from(employee: Employee) -> Self {
        Self {
            id: employee.id,
            email: employee.email,
            full_name: employee.full_name,
            role: employee.role,
            badge_number: employee.badge_number,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub employee: EmployeeInfo,
}
