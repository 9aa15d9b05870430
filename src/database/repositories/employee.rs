use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{Employee, EmployeeRole, NewEmployee},
    utils::sql,
};

const EMPLOYEE_COLUMNS: &str = r#"
    id,
    email,
    password_hash,
    full_name,
    role,
    badge_number,
    is_active,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, employee: NewEmployee) -> Result<Employee> {
        let employee = sqlx::query_as::<_, Employee>(&sql(&format!(
            r#"
            INSERT INTO
                employees (email, password_hash, full_name, role, badge_number)
            VALUES
                (?, ?, ?, ?, ?)
            RETURNING
                {EMPLOYEE_COLUMNS}
            "#
        )))
        .bind(employee.email.to_lowercase())
        .bind(employee.password_hash)
        .bind(employee.full_name)
        .bind(employee.role)
        .bind(employee.badge_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&sql(&format!(
            r#"
            SELECT
                {EMPLOYEE_COLUMNS}
            FROM
                employees
            WHERE
                email = ?
            "#
        )))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&sql(&format!(
            r#"
            SELECT
                {EMPLOYEE_COLUMNS}
            FROM
                employees
            WHERE
                id = ?
            "#
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Active employees ordered by name, optionally restricted to one role.
    pub async fn list_active(&self, role: Option<EmployeeRole>) -> Result<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(&format!(
            r#"
            SELECT
                {EMPLOYEE_COLUMNS}
            FROM
                employees
            WHERE
                is_active = TRUE
                AND ($1::VARCHAR IS NULL OR role = $1)
            ORDER BY
                full_name, id
            "#
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    pub async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(&format!(
            r#"
            SELECT
                {EMPLOYEE_COLUMNS}
            FROM
                employees
            WHERE
                id = ANY($1)
            "#
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }
}
