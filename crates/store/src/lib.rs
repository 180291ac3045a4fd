//! Tray record store: one capability interface, two backends.
//!
//! - `MemoryTrayStore` — RwLock'd map for tests and credential-less dev runs
//! - `PgTrayStore` — PostgreSQL via sqlx, slot uniqueness enforced by a
//!   partial unique index
//!
//! The backend is chosen once at process start from config; call sites only
//! see `Arc<dyn TrayStore>`.

pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use couvoir_core::tray::{Door, Position, Tray};

pub use error::StoreError;
pub use memory::MemoryTrayStore;
pub use postgres::PgTrayStore;

/// Store-level partial update. `None` fields keep their stored value;
/// `removed_date` can only ever be set, never cleared (removal is one-way).
#[derive(Debug, Clone, Default)]
pub struct TrayUpdate {
    pub removed: Option<bool>,
    pub removed_date: Option<DateTime<Utc>>,
    pub notification_sent: Option<bool>,
    pub notes: Option<String>,
}

/// Persistence seam for tray records.
#[async_trait]
pub trait TrayStore: Send + Sync {
    /// Persist a new tray. Fails with [`StoreError::SlotOccupied`] when an
    /// active tray already holds (door, row, position) — the check is
    /// serialized by the backend, so two concurrent creates cannot both
    /// succeed.
    async fn insert(&self, tray: &Tray) -> Result<Tray, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tray>, StoreError>;

    /// Every tray, most-recently-added first.
    async fn find_all(&self) -> Result<Vec<Tray>, StoreError>;

    /// Active trays only, oldest-added first so the longest-incubating
    /// surface at the top.
    async fn find_active(&self) -> Result<Vec<Tray>, StoreError>;

    async fn find_active_in_slot(
        &self,
        door: Door,
        row: u8,
        position: Position,
    ) -> Result<Option<Tray>, StoreError>;

    /// Apply a partial update; returns the updated record, or `None` when
    /// the id is unknown. Bumps `updated_at`.
    async fn update(&self, id: Uuid, update: TrayUpdate) -> Result<Option<Tray>, StoreError>;

    /// Returns whether a record was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
