//! Acceptance persistence. The unique constraint on
//! `(mission_id, carrier_id)` is the durable duplicate guard; selection
//! settling runs in one transaction so no reader ever sees two accepted
//! rows.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cartage_core::{AcceptanceId, AcceptanceStatus, MissionId, UserId};
use cartage_store::MissionAcceptance;

/// Insert an acceptance row. Returns `false` if the `(mission, carrier)`
/// pair already exists — the durable duplicate guard fired.
pub async fn insert_acceptance(
    pool: &PgPool,
    acceptance: &MissionAcceptance,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO mission_acceptances (id, mission_id, carrier_id, status, message, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (mission_id, carrier_id) DO NOTHING",
    )
    .bind(acceptance.id.as_uuid())
    .bind(acceptance.mission_id.as_uuid())
    .bind(acceptance.carrier_id.as_uuid())
    .bind(acceptance.status.as_str())
    .bind(&acceptance.message)
    .bind(acceptance.created_at)
    .bind(acceptance.updated_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Settle a selection durably: the winner's pending row becomes ACCEPTED
/// and every other pending row becomes REJECTED, atomically.
pub async fn settle_selection(
    pool: &PgPool,
    mission_id: &MissionId,
    winner: &UserId,
    updated_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE mission_acceptances
         SET status = 'ACCEPTED', updated_at = $3
         WHERE mission_id = $1 AND carrier_id = $2 AND status = 'PENDING'",
    )
    .bind(mission_id.as_uuid())
    .bind(winner.as_uuid())
    .bind(updated_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE mission_acceptances
         SET status = 'REJECTED', updated_at = $3
         WHERE mission_id = $1 AND carrier_id <> $2 AND status = 'PENDING'",
    )
    .bind(mission_id.as_uuid())
    .bind(winner.as_uuid())
    .bind(updated_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Load all acceptance rows for hydration at startup, in submission order.
pub async fn load_all_acceptances(pool: &PgPool) -> Result<Vec<MissionAcceptance>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AcceptanceRow>(
        "SELECT id, mission_id, carrier_id, status, message, created_at, updated_at
         FROM mission_acceptances ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| MissionAcceptance {
            id: AcceptanceId::from_uuid(r.id),
            mission_id: MissionId::from_uuid(r.mission_id),
            carrier_id: UserId::from_uuid(r.carrier_id),
            status: parse_status(&r.status),
            message: r.message,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct AcceptanceRow {
    id: Uuid,
    mission_id: Uuid,
    carrier_id: Uuid,
    status: String,
    message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> AcceptanceStatus {
    AcceptanceStatus::parse(s).unwrap_or_else(|| {
        tracing::warn!(value = s, "unrecognized acceptance status in database, defaulting to PENDING");
        AcceptanceStatus::Pending
    })
}
