//! PostgreSQL tray store.
//!
//! Queries are runtime-bound (`sqlx::query` + `row.get`) so the crate builds
//! without a live database. Slot uniqueness rides on the partial unique
//! index `trays_active_slot_idx (door, row, position) WHERE NOT removed`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use couvoir_core::tray::{Door, EggType, Position, Tray};

use crate::{StoreError, TrayStore, TrayUpdate};

/// Name of the partial unique index guarding the active-slot invariant.
const ACTIVE_SLOT_INDEX: &str = "trays_active_slot_idx";

const SELECT_COLUMNS: &str = "id, door, row, position, egg_type, added_date, removed, \
     removed_date, notification_sent, notes, created_at, updated_at";

pub struct PgTrayStore {
    pool: PgPool,
}

impl PgTrayStore {
    /// Connect and apply migrations. Connectivity or migration failure is a
    /// hard error — the caller decides whether to abort startup.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("PostgreSQL connected, migrations applied");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_tray(row: &PgRow) -> Result<Tray, StoreError> {
    let door: String = row.get("door");
    let position: String = row.get("position");
    let egg_type: String = row.get("egg_type");
    let row_num: i32 = row.get("row");
    Ok(Tray {
        id: row.get("id"),
        door: Door::parse(&door).map_err(|e| StoreError::Decode(e.to_string()))?,
        row: row_num as u8,
        position: Position::parse(&position).map_err(|e| StoreError::Decode(e.to_string()))?,
        egg_type: EggType::parse(&egg_type),
        added_date: row.get("added_date"),
        removed: row.get("removed"),
        removed_date: row.get("removed_date"),
        notification_sent: row.get("notification_sent"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn rows_to_trays(rows: Vec<PgRow>) -> Result<Vec<Tray>, StoreError> {
    rows.iter().map(row_to_tray).collect()
}

#[async_trait]
impl TrayStore for PgTrayStore {
    async fn insert(&self, tray: &Tray) -> Result<Tray, StoreError> {
        let result = sqlx::query(
            "INSERT INTO trays (id, door, row, position, egg_type, added_date, removed, \
             removed_date, notification_sent, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(tray.id)
        .bind(tray.door.as_str())
        .bind(tray.row as i32)
        .bind(tray.position.as_str())
        .bind(tray.egg_type.as_str())
        .bind(tray.added_date)
        .bind(tray.removed)
        .bind(tray.removed_date)
        .bind(tray.notification_sent)
        .bind(&tray.notes)
        .bind(tray.created_at)
        .bind(tray.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(tray.clone()),
            Err(sqlx::Error::Database(db)) if db.constraint() == Some(ACTIVE_SLOT_INDEX) => {
                Err(StoreError::SlotOccupied)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tray>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM trays WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_tray).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Tray>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM trays ORDER BY added_date DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows_to_trays(rows)
    }

    async fn find_active(&self) -> Result<Vec<Tray>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM trays WHERE NOT removed ORDER BY added_date ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows_to_trays(rows)
    }

    async fn find_active_in_slot(
        &self,
        door: Door,
        row: u8,
        position: Position,
    ) -> Result<Option<Tray>, StoreError> {
        let found = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM trays \
             WHERE NOT removed AND door = $1 AND row = $2 AND position = $3"
        ))
        .bind(door.as_str())
        .bind(row as i32)
        .bind(position.as_str())
        .fetch_optional(&self.pool)
        .await?;
        found.as_ref().map(row_to_tray).transpose()
    }

    async fn update(&self, id: Uuid, update: TrayUpdate) -> Result<Option<Tray>, StoreError> {
        let now: DateTime<Utc> = Utc::now();
        let row = sqlx::query(&format!(
            "UPDATE trays SET \
             removed = COALESCE($2, removed), \
             removed_date = COALESCE($3, removed_date), \
             notification_sent = COALESCE($4, notification_sent), \
             notes = COALESCE($5, notes), \
             updated_at = $6 \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id)
        .bind(update.removed)
        .bind(update.removed_date)
        .bind(update.notification_sent)
        .bind(update.notes)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_tray).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM trays WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
