use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{StaffingRequirement, StaffingRequirementInput},
    utils::sql,
};

const REQUIREMENT_COLUMNS: &str = r#"
    id,
    name,
    day_of_week,
    start_time,
    end_time,
    min_staff,
    min_supervisors,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct StaffingRepository {
    pool: PgPool,
}

impl StaffingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: StaffingRequirementInput) -> Result<StaffingRequirement> {
        let requirement = sqlx::query_as::<_, StaffingRequirement>(&sql(&format!(
            r#"
            INSERT INTO
                staffing_requirements (
                    name,
                    day_of_week,
                    start_time,
                    end_time,
                    min_staff,
                    min_supervisors
                )
            VALUES
                (?, ?, ?, ?, ?, ?)
            RETURNING
                {REQUIREMENT_COLUMNS}
            "#
        )))
        .bind(input.name.trim())
        .bind(input.day_of_week)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.min_staff)
        .bind(input.min_supervisors)
        .fetch_one(&self.pool)
        .await?;

        Ok(requirement)
    }

    pub async fn list(&self) -> Result<Vec<StaffingRequirement>> {
        let requirements = sqlx::query_as::<_, StaffingRequirement>(&format!(
            r#"
            SELECT
                {REQUIREMENT_COLUMNS}
            FROM
                staffing_requirements
            ORDER BY
                day_of_week NULLS FIRST, start_time, name
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(requirements)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StaffingRequirement>> {
        let requirement = sqlx::query_as::<_, StaffingRequirement>(&sql(&format!(
            r#"
            SELECT
                {REQUIREMENT_COLUMNS}
            FROM
                staffing_requirements
            WHERE
                id = ?
            "#
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(requirement)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: StaffingRequirementInput,
    ) -> Result<Option<StaffingRequirement>> {
        let requirement = sqlx::query_as::<_, StaffingRequirement>(&sql(&format!(
            r#"
            UPDATE
                staffing_requirements
            SET
                name = ?,
                day_of_week = ?,
                start_time = ?,
                end_time = ?,
                min_staff = ?,
                min_supervisors = ?,
                updated_at = NOW()
            WHERE
                id = ?
            RETURNING
                {REQUIREMENT_COLUMNS}
            "#
        )))
        .bind(input.name.trim())
        .bind(input.day_of_week)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.min_staff)
        .bind(input.min_supervisors)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(requirement)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(&sql("DELETE FROM staffing_requirements WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
