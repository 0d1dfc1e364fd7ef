//! Mission persistence: write-through upserts, the guarded carrier-binding
//! update, and hydration on startup.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cartage_core::{MissionId, MissionStatus, ShipmentClass, UserId};
use cartage_store::Mission;

/// Save a mission record (upsert). The structured blocks (stops, goods,
/// pricing) are stored as jsonb; the columns queried by the durable guards
/// are first-class.
pub async fn save_mission(pool: &PgPool, mission: &Mission) -> Result<(), sqlx::Error> {
    let pickup = to_json("pickup", &mission.pickup)?;
    let delivery = to_json("delivery", &mission.delivery)?;
    let goods = to_json("goods", &mission.goods)?;
    let pricing = to_json("pricing", &mission.pricing)?;

    sqlx::query(
        "INSERT INTO missions (id, shipper_id, carrier_id, shipment_class, pickup, delivery, goods, pricing, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         ON CONFLICT (id) DO UPDATE SET
            carrier_id = EXCLUDED.carrier_id,
            pricing = EXCLUDED.pricing,
            status = EXCLUDED.status,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(mission.id.as_uuid())
    .bind(mission.shipper_id.as_uuid())
    .bind(mission.carrier_id.map(|c| c.as_uuid()))
    .bind(mission.shipment_class.as_str())
    .bind(&pickup)
    .bind(&delivery)
    .bind(&goods)
    .bind(&pricing)
    .bind(mission.status.as_str())
    .bind(mission.created_at)
    .bind(mission.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// The durable half of the carrier-binding compare-and-set: claim the
/// mission iff no carrier is bound and the status still admits binding.
///
/// Returns `false` when zero rows were touched — another writer claimed the
/// mission first (or it no longer exists in a bindable state).
pub async fn bind_carrier_guarded(
    pool: &PgPool,
    mission_id: &MissionId,
    carrier_id: &UserId,
    updated_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE missions
         SET carrier_id = $2, status = 'ACCEPTED', updated_at = $3
         WHERE id = $1
           AND carrier_id IS NULL
           AND status IN ('CREATED', 'SEARCHING_CARRIER')",
    )
    .bind(mission_id.as_uuid())
    .bind(carrier_id.as_uuid())
    .bind(updated_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Load all missions for hydration at startup.
pub async fn load_all_missions(pool: &PgPool) -> Result<Vec<Mission>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MissionRow>(
        "SELECT id, shipper_id, carrier_id, shipment_class, pickup, delivery, goods, pricing, status, created_at, updated_at
         FROM missions ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut missions = Vec::with_capacity(rows.len());
    for row in rows {
        missions.push(Mission {
            id: MissionId::from_uuid(row.id),
            shipper_id: UserId::from_uuid(row.shipper_id),
            carrier_id: row.carrier_id.map(UserId::from_uuid),
            shipment_class: parse_class(&row.shipment_class),
            pickup: from_json("pickup", row.id, row.pickup)?,
            delivery: from_json("delivery", row.id, row.delivery)?,
            goods: from_json("goods", row.id, row.goods)?,
            pricing: from_json("pricing", row.id, row.pricing)?,
            status: parse_status(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        });
    }
    Ok(missions)
}

// ---------------------------------------------------------------------------
// Row type and parsing helpers
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct MissionRow {
    id: Uuid,
    shipper_id: Uuid,
    carrier_id: Option<Uuid>,
    shipment_class: String,
    pickup: serde_json::Value,
    delivery: serde_json::Value,
    goods: serde_json::Value,
    pricing: serde_json::Value,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn to_json<T: serde::Serialize>(field: &str, value: &T) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(value)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize {field}: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(
    field: &str,
    mission_id: Uuid,
    value: serde_json::Value,
) -> Result<T, sqlx::Error> {
    serde_json::from_value(value).map_err(|e| {
        sqlx::Error::Protocol(format!("corrupt {field} data in mission {mission_id}: {e}"))
    })
}

fn parse_class(s: &str) -> ShipmentClass {
    ShipmentClass::parse(s).unwrap_or_else(|| {
        tracing::warn!(value = s, "unrecognized shipment class in database, defaulting to STANDARD");
        ShipmentClass::Standard
    })
}

fn parse_status(s: &str) -> MissionStatus {
    MissionStatus::parse(s).unwrap_or_else(|| {
        tracing::warn!(value = s, "unrecognized mission status in database, defaulting to CREATED");
        MissionStatus::Created
    })
}
