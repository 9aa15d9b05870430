use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{ShiftSwap, SwapQuery, SwapStatus},
    repositories::ShiftRepository,
    utils::sql,
};
use crate::schedule::swap::swapped;

const SWAP_COLUMNS: &str = r#"
    id,
    requester_id,
    requester_shift_id,
    recipient_id,
    recipient_shift_id,
    status,
    notes,
    responded_at,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct SwapRepository {
    pool: PgPool,
}

impl SwapRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        requester_id: Uuid,
        requester_shift_id: Uuid,
        recipient_id: Uuid,
        recipient_shift_id: Uuid,
        notes: Option<String>,
    ) -> Result<ShiftSwap> {
        let swap = sqlx::query_as::<_, ShiftSwap>(&sql(&format!(
            r#"
            INSERT INTO
                shift_swaps (
                    requester_id,
                    requester_shift_id,
                    recipient_id,
                    recipient_shift_id,
                    status,
                    notes
                )
            VALUES
                (?, ?, ?, ?, ?, ?)
            RETURNING
                {SWAP_COLUMNS}
            "#
        )))
        .bind(requester_id)
        .bind(requester_shift_id)
        .bind(recipient_id)
        .bind(recipient_shift_id)
        .bind(SwapStatus::Pending)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(swap)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ShiftSwap>> {
        let swap = sqlx::query_as::<_, ShiftSwap>(&sql(&format!(
            r#"
            SELECT
                {SWAP_COLUMNS}
            FROM
                shift_swaps
            WHERE
                id = ?
            "#
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(swap)
    }

    /// Swaps where `employee_id` (if given) is either party.
    pub async fn list(&self, query: &SwapQuery) -> Result<Vec<ShiftSwap>> {
        let swaps = sqlx::query_as::<_, ShiftSwap>(&format!(
            r#"
            SELECT
                {SWAP_COLUMNS}
            FROM
                shift_swaps
            WHERE
                ($1::UUID IS NULL OR requester_id = $1 OR recipient_id = $1)
                AND ($2::VARCHAR IS NULL OR status = $2)
            ORDER BY
                created_at DESC
            "#
        ))
        .bind(query.employee_id)
        .bind(query.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(swaps)
    }

    /// Pending swaps that involve either shift.
    pub async fn pending_for_shifts(&self, shift_ids: &[Uuid]) -> Result<Vec<ShiftSwap>> {
        let swaps = sqlx::query_as::<_, ShiftSwap>(&format!(
            r#"
            SELECT
                {SWAP_COLUMNS}
            FROM
                shift_swaps
            WHERE
                status = $1
                AND (requester_shift_id = ANY($2) OR recipient_shift_id = ANY($2))
            "#
        ))
        .bind(SwapStatus::Pending)
        .bind(shift_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(swaps)
    }

    /// Closes a pending swap with `status`. Returns `None` if it was no longer pending.
    pub async fn close(&self, id: Uuid, status: SwapStatus) -> Result<Option<ShiftSwap>> {
        let swap = sqlx::query_as::<_, ShiftSwap>(&sql(&format!(
            r#"
            UPDATE
                shift_swaps
            SET
                status = ?,
                responded_at = NOW(),
                updated_at = NOW()
            WHERE
                id = ?
                AND status = ?
            RETURNING
                {SWAP_COLUMNS}
            "#
        )))
        .bind(status)
        .bind(id)
        .bind(SwapStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(swap)
    }

    /// Marks the swap accepted and exchanges the two shift owners in one
    /// transaction. Returns `None` and rolls back if the swap is no longer
    /// pending or either shift changed hands since the request.
    pub async fn accept(&self, swap: &ShiftSwap) -> Result<Option<ShiftSwap>> {
        let mut tx = self.pool.begin().await?;

        let accepted = sqlx::query_as::<_, ShiftSwap>(&sql(&format!(
            r#"
            UPDATE
                shift_swaps
            SET
                status = ?,
                responded_at = NOW(),
                updated_at = NOW()
            WHERE
                id = ?
                AND status = ?
            RETURNING
                {SWAP_COLUMNS}
            "#
        )))
        .bind(SwapStatus::Accepted)
        .bind(swap.id)
        .bind(SwapStatus::Pending)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(accepted) = accepted else {
            return Ok(None);
        };

        for change in swapped(swap) {
            if !ShiftRepository::reassign(&mut tx, &change).await? {
                log::warn!(
                    "Shift {} for swap {} changed hands, rolling back",
                    change.shift_id,
                    swap.id
                );
                tx.rollback().await?;
                return Ok(None);
            }
        }

        tx.commit().await?;
        Ok(Some(accepted))
    }
}
