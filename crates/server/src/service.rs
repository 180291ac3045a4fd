//! Tray lifecycle orchestration.
//!
//! `TrayService` owns the invariants the store alone can't express: slot
//! exclusivity on create, one-way idempotent removal, the delete-policy
//! gate, and the notification side effects. The store and dispatcher are
//! injected, so the service runs identically over the in-memory and
//! PostgreSQL backends.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use couvoir_core::error::ValidationError;
use couvoir_core::status::{can_delete, should_notify, DeletePolicy};
use couvoir_core::tray::{Tray, TrayInput, TrayPatch};
use couvoir_notify::{messages, Dispatcher};
use couvoir_store::{StoreError, TrayStore, TrayUpdate};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("there is already an active tray in this position")]
    SlotConflict,

    #[error("tray not found")]
    NotFound,

    #[error("tray cannot be deleted under the '{}' delete policy", .0.as_str())]
    DeleteRestricted(DeletePolicy),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            // The store-level uniqueness backstop fired (create race).
            StoreError::SlotOccupied => ServiceError::SlotConflict,
            other => ServiceError::Store(other),
        }
    }
}

/// Outcome of one notification sweep tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    /// Active trays inspected.
    pub scanned: usize,
    /// Trays marked as notified this tick.
    pub notified: usize,
    /// Dispatch attempts where no channel delivered.
    pub delivery_failures: usize,
}

#[derive(Clone)]
pub struct TrayService {
    store: Arc<dyn TrayStore>,
    dispatcher: Arc<Dispatcher>,
    delete_policy: DeletePolicy,
}

impl TrayService {
    pub fn new(
        store: Arc<dyn TrayStore>,
        dispatcher: Arc<Dispatcher>,
        delete_policy: DeletePolicy,
    ) -> Self {
        Self {
            store,
            dispatcher,
            delete_policy,
        }
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    /// Every tray, most-recently-added first.
    pub async fn list_all(&self) -> Result<Vec<Tray>, ServiceError> {
        Ok(self.store.find_all().await?)
    }

    /// Active trays, oldest-added first.
    pub async fn list_active(&self) -> Result<Vec<Tray>, ServiceError> {
        Ok(self.store.find_active().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Tray, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Create a tray in a free slot and send the "tray added" confirmation.
    ///
    /// The notification is best-effort: the dispatcher absorbs delivery
    /// failures, so a created record is never rolled back.
    pub async fn create(&self, input: TrayInput) -> Result<Tray, ServiceError> {
        let now = Utc::now();
        input.validate(now)?;

        if self
            .store
            .find_active_in_slot(input.door, input.row, input.position)
            .await?
            .is_some()
        {
            return Err(ServiceError::SlotConflict);
        }

        let tray = Tray::from_input(input, now);
        let created = self.store.insert(&tray).await?;
        debug!(tray_id = %created.id, door = created.door.as_str(), row = created.row, "Tray created");

        self.dispatcher
            .dispatch(&messages::tray_added(&created))
            .await;

        Ok(created)
    }

    /// Mark a tray as removed. Idempotent: removing an already-removed tray
    /// returns it unchanged and sends nothing, so a double-submit can't
    /// produce a duplicate notification.
    pub async fn mark_removed(&self, id: Uuid) -> Result<Tray, ServiceError> {
        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if existing.removed {
            return Ok(existing);
        }

        let updated = self
            .store
            .update(
                id,
                TrayUpdate {
                    removed: Some(true),
                    removed_date: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(ServiceError::NotFound)?;
        debug!(tray_id = %updated.id, "Tray marked as removed");

        self.dispatcher
            .dispatch(&messages::tray_removed(&updated))
            .await;

        Ok(updated)
    }

    /// Apply the whitelisted partial update (notes, notification flag).
    pub async fn update(&self, id: Uuid, patch: TrayPatch) -> Result<Tray, ServiceError> {
        self.store
            .update(
                id,
                TrayUpdate {
                    notification_sent: patch.notification_sent,
                    notes: patch.notes,
                    ..Default::default()
                },
            )
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Delete a single tray, subject to the configured delete policy.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let tray = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if !can_delete(&tray, Utc::now(), self.delete_policy) {
            return Err(ServiceError::DeleteRestricted(self.delete_policy));
        }

        if !self.store.delete(id).await? {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }

    /// Delete every tray the policy allows. Each delete is independent — a
    /// failure on one tray is logged and does not block the rest. Returns
    /// the surviving set.
    pub async fn clear_history(&self) -> Result<Vec<Tray>, ServiceError> {
        let now = Utc::now();
        let all = self.store.find_all().await?;
        for tray in all.iter().filter(|t| can_delete(t, now, self.delete_policy)) {
            if let Err(e) = self.store.delete(tray.id).await {
                warn!(tray_id = %tray.id, error = %e, "Failed to delete tray while clearing history");
            }
        }
        Ok(self.store.find_all().await?)
    }

    /// One sweep pass: alert every active, unnotified tray at or past its
    /// incubation period, then mark it notified — regardless of delivery
    /// outcome, so each tray alerts at most once.
    pub async fn sweep_notifications(&self) -> Result<SweepReport, ServiceError> {
        let now = Utc::now();
        let active = self.store.find_active().await?;

        let mut report = SweepReport {
            scanned: active.len(),
            ..Default::default()
        };

        for tray in active.iter().filter(|t| should_notify(t, now)) {
            let results = self
                .dispatcher
                .dispatch(&messages::tray_overdue(tray, now))
                .await;
            if !results.is_empty() && results.iter().all(|r| !r.success) {
                report.delivery_failures += 1;
            }

            match self
                .store
                .update(
                    tray.id,
                    TrayUpdate {
                        notification_sent: Some(true),
                        ..Default::default()
                    },
                )
                .await
            {
                Ok(Some(_)) => report.notified += 1,
                Ok(None) => {
                    // Deleted between the scan and the write; nothing to mark.
                    warn!(tray_id = %tray.id, "Tray vanished during notification sweep");
                }
                Err(e) => {
                    warn!(tray_id = %tray.id, error = %e, "Failed to persist notification flag");
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use couvoir_core::tray::{Door, EggType, Position};
    use couvoir_notify::{Notification, Notifier, NotifyError};
    use couvoir_store::MemoryTrayStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingNotifier {
        send_count: Arc<AtomicUsize>,
        bodies: Arc<Mutex<Vec<String>>>,
        should_fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for CountingNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .lock()
                .expect("bodies lock poisoned")
                .push(notification.body.clone());
            if self.should_fail {
                Err(NotifyError::Config("mock failure".to_string()))
            } else {
                Ok(())
            }
        }
        fn channel_name(&self) -> &str {
            "counting"
        }
    }

    struct Harness {
        service: TrayService,
        send_count: Arc<AtomicUsize>,
        bodies: Arc<Mutex<Vec<String>>>,
    }

    fn harness(policy: DeletePolicy, failing_notifier: bool) -> Harness {
        let send_count = Arc::new(AtomicUsize::new(0));
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::with_channels(vec![Box::new(CountingNotifier {
            send_count: send_count.clone(),
            bodies: bodies.clone(),
            should_fail: failing_notifier,
        })]);
        let service = TrayService::new(
            Arc::new(MemoryTrayStore::new()),
            Arc::new(dispatcher),
            policy,
        );
        Harness {
            service,
            send_count,
            bodies,
        }
    }

    fn input(door: Door, row: u8, added: Option<DateTime<Utc>>) -> TrayInput {
        TrayInput {
            door,
            row,
            position: Position::Left,
            egg_type: None,
            added_date: added,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_sends_added_notification() {
        let h = harness(DeletePolicy::RemovedOnly, false);
        let tray = h.service.create(input(Door::Left, 1, None)).await.unwrap();
        assert!(!tray.removed);
        assert_eq!(h.send_count.load(Ordering::SeqCst), 1);
        let bodies = h.bodies.lock().unwrap();
        assert!(bodies[0].contains("New tray"));
    }

    #[tokio::test]
    async fn create_rejects_occupied_slot() {
        let h = harness(DeletePolicy::RemovedOnly, false);
        h.service.create(input(Door::Left, 1, None)).await.unwrap();
        let second = h.service.create(input(Door::Left, 1, None)).await;
        assert!(matches!(second, Err(ServiceError::SlotConflict)));

        // Slot frees up after removal.
        let all = h.service.list_all().await.unwrap();
        h.service.mark_removed(all[0].id).await.unwrap();
        h.service
            .create(input(Door::Left, 1, None))
            .await
            .expect("slot should be free after removal");
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let h = harness(DeletePolicy::RemovedOnly, false);
        let bad_row = h.service.create(input(Door::Left, 9, None)).await;
        assert!(matches!(bad_row, Err(ServiceError::Validation(_))));

        let future = h
            .service
            .create(input(Door::Left, 1, Some(Utc::now() + Duration::days(1))))
            .await;
        assert!(matches!(future, Err(ServiceError::Validation(_))));
        // Nothing dispatched for rejected creates.
        assert_eq!(h.send_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mark_removed_is_idempotent() {
        let h = harness(DeletePolicy::RemovedOnly, false);
        let tray = h.service.create(input(Door::Right, 2, None)).await.unwrap();
        assert_eq!(h.send_count.load(Ordering::SeqCst), 1); // added

        let first = h.service.mark_removed(tray.id).await.unwrap();
        assert!(first.removed);
        assert!(first.removed_date.is_some());
        assert_eq!(h.send_count.load(Ordering::SeqCst), 2); // added + removed

        let second = h.service.mark_removed(tray.id).await.unwrap();
        assert_eq!(second.removed_date, first.removed_date);
        // No duplicate removal notification.
        assert_eq!(h.send_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn mark_removed_unknown_id() {
        let h = harness(DeletePolicy::RemovedOnly, false);
        let result = h.service.mark_removed(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn update_patches_whitelisted_fields() {
        let h = harness(DeletePolicy::RemovedOnly, false);
        let tray = h.service.create(input(Door::Left, 3, None)).await.unwrap();
        let patched = h
            .service
            .update(
                tray.id,
                TrayPatch {
                    notes: Some("candled, 2 clear".into()),
                    notification_sent: Some(true),
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.notes.as_deref(), Some("candled, 2 clear"));
        assert!(patched.notification_sent);

        let missing = h.service.update(Uuid::new_v4(), TrayPatch::default()).await;
        assert!(matches!(missing, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn delete_respects_removed_only_policy() {
        let h = harness(DeletePolicy::RemovedOnly, false);
        let seventeen_days_ago = Utc::now() - Duration::days(17);
        let active = h
            .service
            .create(input(Door::Left, 1, Some(seventeen_days_ago)))
            .await
            .unwrap();

        // Past the warning threshold but still active: refused under strict policy.
        let refused = h.service.delete(active.id).await;
        assert!(matches!(refused, Err(ServiceError::DeleteRestricted(_))));

        h.service.mark_removed(active.id).await.unwrap();
        h.service.delete(active.id).await.unwrap();
        assert!(h.service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_respects_past_threshold_policy() {
        let h = harness(DeletePolicy::PastThreshold, false);
        let past = h
            .service
            .create(input(Door::Left, 1, Some(Utc::now() - Duration::days(17))))
            .await
            .unwrap();
        let young = h
            .service
            .create(input(Door::Left, 2, Some(Utc::now() - Duration::days(5))))
            .await
            .unwrap();

        h.service
            .delete(past.id)
            .await
            .expect("past-threshold tray deletable under loose policy");
        let refused = h.service.delete(young.id).await;
        assert!(matches!(refused, Err(ServiceError::DeleteRestricted(_))));
    }

    #[tokio::test]
    async fn clear_history_returns_survivors() {
        let h = harness(DeletePolicy::RemovedOnly, false);
        let keep = h.service.create(input(Door::Left, 1, None)).await.unwrap();
        let gone = h.service.create(input(Door::Left, 2, None)).await.unwrap();
        h.service.mark_removed(gone.id).await.unwrap();

        let survivors = h.service.clear_history().await.unwrap();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, keep.id);
    }

    #[tokio::test]
    async fn sweep_notifies_once_per_tray() {
        let h = harness(DeletePolicy::RemovedOnly, false);
        let due = h
            .service
            .create(input(Door::Left, 1, Some(Utc::now() - Duration::days(18))))
            .await
            .unwrap();
        h.service
            .create(input(Door::Left, 2, Some(Utc::now() - Duration::days(3))))
            .await
            .unwrap();
        let after_creates = h.send_count.load(Ordering::SeqCst);

        let report = h.service.sweep_notifications().await.unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.notified, 1);
        assert_eq!(h.send_count.load(Ordering::SeqCst), after_creates + 1);
        assert!(h
            .bodies
            .lock()
            .unwrap()
            .last()
            .unwrap()
            .contains("ALERT"));
        assert!(h.service.get(due.id).await.unwrap().notification_sent);

        // Second sweep: nothing left to alert.
        let report = h.service.sweep_notifications().await.unwrap();
        assert_eq!(report.notified, 0);
        assert_eq!(h.send_count.load(Ordering::SeqCst), after_creates + 1);
    }

    #[tokio::test]
    async fn sweep_marks_sent_even_when_delivery_fails() {
        let h = harness(DeletePolicy::RemovedOnly, true);
        let due = h
            .service
            .create(input(Door::Right, 1, Some(Utc::now() - Duration::days(20))))
            .await
            .unwrap();

        let report = h.service.sweep_notifications().await.unwrap();
        assert_eq!(report.notified, 1);
        assert_eq!(report.delivery_failures, 1);
        assert!(h.service.get(due.id).await.unwrap().notification_sent);

        // Not retried on the next sweep.
        let report = h.service.sweep_notifications().await.unwrap();
        assert_eq!(report.notified, 0);
    }

    #[tokio::test]
    async fn sweep_respects_duck_period() {
        let h = harness(DeletePolicy::RemovedOnly, false);
        let mut duck = input(Door::Left, 1, Some(Utc::now() - Duration::days(20)));
        duck.egg_type = Some(EggType::Duck);
        h.service.create(duck).await.unwrap();
        let after_create = h.send_count.load(Ordering::SeqCst);

        // 20 days < the 25-day duck period: nothing due yet.
        let report = h.service.sweep_notifications().await.unwrap();
        assert_eq!(report.notified, 0);
        assert_eq!(h.send_count.load(Ordering::SeqCst), after_create);
    }
}
