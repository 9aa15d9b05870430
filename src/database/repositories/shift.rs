use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{ProposedShift, Shift, ShiftInput, ShiftQuery},
    utils::sql,
};
use crate::schedule::swap::ShiftOwnerChange;

const SHIFT_COLUMNS: &str = r#"
    id,
    employee_id,
    start_time,
    end_time,
    is_supervisor,
    notes,
    created_by,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct ShiftRepository {
    pool: PgPool,
}

impl ShiftRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: ShiftInput, created_by: Uuid) -> Result<Shift> {
        let shift = sqlx::query_as::<_, Shift>(&sql(&format!(
            r#"
            INSERT INTO
                shifts (employee_id, start_time, end_time, is_supervisor, notes, created_by)
            VALUES
                (?, ?, ?, ?, ?, ?)
            RETURNING
                {SHIFT_COLUMNS}
            "#
        )))
        .bind(input.employee_id)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.is_supervisor)
        .bind(input.notes)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Persists a batch of generated shifts, all or nothing.
    pub async fn create_many(&self, shifts: &[ProposedShift], created_by: Uuid) -> Result<Vec<Shift>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(shifts.len());

        for proposed in shifts {
            let shift = sqlx::query_as::<_, Shift>(&sql(&format!(
                r#"
                INSERT INTO
                    shifts (employee_id, start_time, end_time, is_supervisor, created_by)
                VALUES
                    (?, ?, ?, ?, ?)
                RETURNING
                    {SHIFT_COLUMNS}
                "#
            )))
            .bind(proposed.employee_id)
            .bind(proposed.start_time)
            .bind(proposed.end_time)
            .bind(proposed.is_supervisor)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;
            created.push(shift);
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&sql(&format!(
            r#"
            SELECT
                {SHIFT_COLUMNS}
            FROM
                shifts
            WHERE
                id = ?
            "#
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Shifts matching the filters, ordered by start. `from`/`to` select shifts
    /// intersecting that window.
    pub async fn list(&self, query: &ShiftQuery) -> Result<Vec<Shift>> {
        let shifts = sqlx::query_as::<_, Shift>(&format!(
            r#"
            SELECT
                {SHIFT_COLUMNS}
            FROM
                shifts
            WHERE
                ($1::UUID IS NULL OR employee_id = $1)
                AND ($2::TIMESTAMPTZ IS NULL OR end_time > $2)
                AND ($3::TIMESTAMPTZ IS NULL OR start_time < $3)
                AND ($4 = FALSE OR is_supervisor = TRUE)
            ORDER BY
                start_time, employee_id
            "#
        ))
        .bind(query.employee_id)
        .bind(query.from)
        .bind(query.to)
        .bind(query.supervisor_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }

    /// Every shift intersecting `[from, to)`.
    pub async fn in_window(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Shift>> {
        self.list(&ShiftQuery {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        })
        .await
    }

    /// Shifts of one employee intersecting `[from, to)`.
    pub async fn for_employee(
        &self,
        employee_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Shift>> {
        self.list(&ShiftQuery {
            employee_id: Some(employee_id),
            from: Some(from),
            to: Some(to),
            supervisor_only: false,
        })
        .await
    }

    pub async fn update(&self, id: Uuid, input: ShiftInput) -> Result<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&sql(&format!(
            r#"
            UPDATE
                shifts
            SET
                employee_id = ?,
                start_time = ?,
                end_time = ?,
                is_supervisor = ?,
                notes = ?,
                updated_at = NOW()
            WHERE
                id = ?
            RETURNING
                {SHIFT_COLUMNS}
            "#
        )))
        .bind(input.employee_id)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.is_supervisor)
        .bind(input.notes)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(&sql("DELETE FROM shifts WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Moves a shift to its new owner only if the old owner still holds it.
    /// Returns whether the row changed.
    pub async fn reassign(
        tx: &mut Transaction<'_, Postgres>,
        change: &ShiftOwnerChange,
    ) -> Result<bool> {
        let result = sqlx::query(&sql(
            r#"
            UPDATE
                shifts
            SET
                employee_id = ?,
                updated_at = NOW()
            WHERE
                id = ?
                AND employee_id = ?
            "#,
        ))
        .bind(change.to_employee_id)
        .bind(change.shift_id)
        .bind(change.from_employee_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
