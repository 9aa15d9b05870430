use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{TimeOffQuery, TimeOffRequest, TimeOffStatus, TimeOffType},
    utils::sql,
};

const TIME_OFF_COLUMNS: &str = r#"
    id,
    employee_id,
    start_date,
    end_date,
    request_type,
    status,
    reason,
    reviewed_by,
    review_notes,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct TimeOffRepository {
    pool: PgPool,
}

impl TimeOffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new pending time-off request
    pub async fn create(
        &self,
        employee_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        request_type: TimeOffType,
        reason: Option<String>,
    ) -> Result<TimeOffRequest> {
        let request = sqlx::query_as::<_, TimeOffRequest>(&sql(&format!(
            r#"
            INSERT INTO
                time_off_requests (
                    employee_id,
                    start_date,
                    end_date,
                    request_type,
                    status,
                    reason
                )
            VALUES
                (?, ?, ?, ?, ?, ?)
            RETURNING
                {TIME_OFF_COLUMNS}
            "#
        )))
        .bind(employee_id)
        .bind(start_date)
        .bind(end_date)
        .bind(request_type)
        .bind(TimeOffStatus::Pending)
        .bind(reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    /// Requests matching the filters. `from`/`to` select requests whose range
    /// intersects `[from, to]`.
    pub async fn list(&self, query: &TimeOffQuery) -> Result<Vec<TimeOffRequest>> {
        let requests = sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            SELECT
                {TIME_OFF_COLUMNS}
            FROM
                time_off_requests
            WHERE
                ($1::UUID IS NULL OR employee_id = $1)
                AND ($2::VARCHAR IS NULL OR status = $2)
                AND ($3::DATE IS NULL OR end_date >= $3)
                AND ($4::DATE IS NULL OR start_date <= $4)
            ORDER BY
                start_date DESC, created_at DESC
            "#
        ))
        .bind(query.employee_id)
        .bind(query.status)
        .bind(query.from)
        .bind(query.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Approved leave of anyone intersecting `[from, to]`.
    pub async fn approved_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<TimeOffRequest>> {
        self.list(&TimeOffQuery {
            employee_id: None,
            status: Some(TimeOffStatus::Approved),
            from: Some(from),
            to: Some(to),
        })
        .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeOffRequest>> {
        let request = sqlx::query_as::<_, TimeOffRequest>(&sql(&format!(
            r#"
            SELECT
                {TIME_OFF_COLUMNS}
            FROM
                time_off_requests
            WHERE
                id = ?
            "#
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Moves a pending request to `status`. Returns `None` when the request is
    /// missing or no longer pending.
    pub async fn review(
        &self,
        id: Uuid,
        status: TimeOffStatus,
        reviewed_by: Uuid,
        notes: Option<String>,
    ) -> Result<Option<TimeOffRequest>> {
        let request = sqlx::query_as::<_, TimeOffRequest>(&sql(&format!(
            r#"
            UPDATE
                time_off_requests
            SET
                status = ?,
                reviewed_by = ?,
                review_notes = ?,
                updated_at = NOW()
            WHERE
                id = ?
                AND status = ?
            RETURNING
                {TIME_OFF_COLUMNS}
            "#
        )))
        .bind(status)
        .bind(reviewed_by)
        .bind(notes)
        .bind(id)
        .bind(TimeOffStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Cancels a request that is still pending or approved.
    pub async fn cancel(&self, id: Uuid) -> Result<Option<TimeOffRequest>> {
        let request = sqlx::query_as::<_, TimeOffRequest>(&sql(&format!(
            r#"
            UPDATE
                time_off_requests
            SET
                status = ?,
                updated_at = NOW()
            WHERE
                id = ?
                AND status IN (?, ?)
            RETURNING
                {TIME_OFF_COLUMNS}
            "#
        )))
        .bind(TimeOffStatus::Cancelled)
        .bind(id)
        .bind(TimeOffStatus::Pending)
        .bind(TimeOffStatus::Approved)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }
}
