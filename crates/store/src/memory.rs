//! In-memory tray store.
//!
//! Backs tests and credential-less dev runs. Seeding is explicit via
//! [`MemoryTrayStore::seed`] — there is no lazy first-access initialisation.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use couvoir_core::tray::{Door, Position, Tray};

use crate::{StoreError, TrayStore, TrayUpdate};

#[derive(Default)]
pub struct MemoryTrayStore {
    trays: RwLock<HashMap<Uuid, Tray>>,
}

impl MemoryTrayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored records wholesale.
    pub fn seed(&self, trays: Vec<Tray>) {
        let mut map = self.trays.write().expect("trays lock poisoned");
        map.clear();
        map.extend(trays.into_iter().map(|t| (t.id, t)));
    }

    pub fn len(&self) -> usize {
        self.trays.read().expect("trays lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TrayStore for MemoryTrayStore {
    async fn insert(&self, tray: &Tray) -> Result<Tray, StoreError> {
        // Slot check and insert under one write lock: concurrent creates on
        // the same slot serialize here.
        let mut map = self.trays.write().expect("trays lock poisoned");
        let occupied = map.values().any(|t| {
            !t.removed && t.door == tray.door && t.row == tray.row && t.position == tray.position
        });
        if occupied {
            return Err(StoreError::SlotOccupied);
        }
        map.insert(tray.id, tray.clone());
        Ok(tray.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tray>, StoreError> {
        Ok(self.trays.read().expect("trays lock poisoned").get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Tray>, StoreError> {
        let map = self.trays.read().expect("trays lock poisoned");
        let mut trays: Vec<Tray> = map.values().cloned().collect();
        trays.sort_by(|a, b| b.added_date.cmp(&a.added_date));
        Ok(trays)
    }

    async fn find_active(&self) -> Result<Vec<Tray>, StoreError> {
        let map = self.trays.read().expect("trays lock poisoned");
        let mut trays: Vec<Tray> = map.values().filter(|t| !t.removed).cloned().collect();
        trays.sort_by(|a, b| a.added_date.cmp(&b.added_date));
        Ok(trays)
    }

    async fn find_active_in_slot(
        &self,
        door: Door,
        row: u8,
        position: Position,
    ) -> Result<Option<Tray>, StoreError> {
        let map = self.trays.read().expect("trays lock poisoned");
        Ok(map
            .values()
            .find(|t| !t.removed && t.door == door && t.row == row && t.position == position)
            .cloned())
    }

    async fn update(&self, id: Uuid, update: TrayUpdate) -> Result<Option<Tray>, StoreError> {
        let mut map = self.trays.write().expect("trays lock poisoned");
        let Some(tray) = map.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(removed) = update.removed {
            tray.removed = removed;
        }
        if let Some(removed_date) = update.removed_date {
            tray.removed_date = Some(removed_date);
        }
        if let Some(sent) = update.notification_sent {
            tray.notification_sent = sent;
        }
        if let Some(notes) = update.notes {
            tray.notes = Some(notes);
        }
        tray.updated_at = Utc::now();
        Ok(Some(tray.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut map = self.trays.write().expect("trays lock poisoned");
        Ok(map.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use couvoir_core::tray::{EggType, TrayInput};

    fn input(door: Door, row: u8, position: Position) -> TrayInput {
        TrayInput {
            door,
            row,
            position,
            egg_type: None,
            added_date: None,
            notes: None,
        }
    }

    fn tray(door: Door, row: u8, position: Position) -> Tray {
        Tray::from_input(input(door, row, position), Utc::now())
    }

    #[tokio::test]
    async fn slot_exclusivity() {
        let store = MemoryTrayStore::new();
        store
            .insert(&tray(Door::Left, 1, Position::Left))
            .await
            .unwrap();
        let second = store.insert(&tray(Door::Left, 1, Position::Left)).await;
        assert!(matches!(second, Err(StoreError::SlotOccupied)));
        // A different slot is fine.
        store
            .insert(&tray(Door::Left, 1, Position::Right))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn removed_tray_frees_the_slot() {
        let store = MemoryTrayStore::new();
        let first = store
            .insert(&tray(Door::Right, 2, Position::Left))
            .await
            .unwrap();
        store
            .update(
                first.id,
                TrayUpdate {
                    removed: Some(true),
                    removed_date: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .insert(&tray(Door::Right, 2, Position::Left))
            .await
            .expect("slot should be free after removal");
    }

    #[tokio::test]
    async fn round_trip_and_ordering() {
        let store = MemoryTrayStore::new();
        let now = Utc::now();

        let mut older = tray(Door::Left, 1, Position::Left);
        older.added_date = now - Duration::days(10);
        older.egg_type = EggType::Duck;
        older.notes = Some("first batch".into());
        let mut newer = tray(Door::Left, 2, Position::Left);
        newer.added_date = now - Duration::days(2);

        store.insert(&older).await.unwrap();
        store.insert(&newer).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        // Most recent first.
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);
        assert_eq!(all[1].egg_type, EggType::Duck);
        assert_eq!(all[1].notes.as_deref(), Some("first batch"));

        let active = store.find_active().await.unwrap();
        // Oldest first.
        assert_eq!(active[0].id, older.id);

        store
            .update(
                older.id,
                TrayUpdate {
                    removed: Some(true),
                    removed_date: Some(now),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let active = store.find_active().await.unwrap();
        assert_eq!(active.len(), 1);
        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|t| t.id == older.id && t.removed));
    }

    #[tokio::test]
    async fn update_unknown_id_is_none() {
        let store = MemoryTrayStore::new();
        let result = store
            .update(Uuid::new_v4(), TrayUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(!store.delete(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn seed_replaces_contents() {
        let store = MemoryTrayStore::new();
        store
            .insert(&tray(Door::Left, 1, Position::Left))
            .await
            .unwrap();
        let replacement = tray(Door::Right, 3, Position::Right);
        store.seed(vec![replacement.clone()]);
        assert_eq!(store.len(), 1);
        let found = store.find_by_id(replacement.id).await.unwrap();
        assert!(found.is_some());
    }
}
