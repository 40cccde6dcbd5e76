//! End-to-end scenarios across the store, outbox, sync engine, and triggers

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tokio::sync::Mutex;

use crate::db::{Database, LibSqlOutboxRepository, OutboxRepository};
use crate::models::{
    Category, OutboxEntry, OutboxOp, Priority, Recurrence, SyncStatus, Trigger, TriggerEdge,
};
use crate::owner::OwnerId;
use crate::service::{NewReminder, ReminderService};
use crate::sync::{InMemoryRemoteStore, RemoteReminder, RemoteStore, SyncOptions, SyncService};
use crate::triggers::mock::{MockGeoRegistrar, MockTimeScheduler};
use crate::triggers::SideEffectScheduler;
use crate::util::unix_millis_now;

/// One simulated device: its own local store and trigger platform, sharing
/// the remote store with every other device built from the same handle.
struct Device {
    db: Arc<Mutex<Database>>,
    time: MockTimeScheduler,
    geo: MockGeoRegistrar,
    service: ReminderService<MockTimeScheduler, MockGeoRegistrar>,
    sync: SyncService<InMemoryRemoteStore>,
}

async fn device(remote: &InMemoryRemoteStore) -> Device {
    let db = Arc::new(Mutex::new(Database::open_in_memory().await.unwrap()));
    let time = MockTimeScheduler::new();
    let geo = MockGeoRegistrar::new();
    let effects = SideEffectScheduler::new(db.clone(), time.clone(), geo.clone());
    let service = ReminderService::new(db.clone(), effects);
    let sync = SyncService::new(db.clone(), remote.clone(), SyncOptions::default());
    Device {
        db,
        time,
        geo,
        service,
        sync,
    }
}

fn time_input(owner: &OwnerId, title: &str, fire_at: i64) -> NewReminder {
    NewReminder {
        owner: owner.clone(),
        title: title.to_string(),
        notes: None,
        priority: Priority::Medium,
        category: Category::Personal,
        trigger: Trigger::Time {
            fire_at,
            recurrence: Recurrence::none(),
        },
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_create_then_reconnect_settles() {
    let remote = InMemoryRemoteStore::new();
    let dev = device(&remote).await;
    let owner = OwnerId::new("user-1");
    remote.set_offline(true);

    // Created while offline: queued, pending, and locally alerting
    let created = dev
        .service
        .create(time_input(&owner, "Dentist", unix_millis_now() + 3_600_000))
        .await
        .unwrap();

    assert_eq!(created.sync_status, SyncStatus::PendingCreate);
    assert_eq!(dev.time.len(), 1);
    let pending = dev.sync.pending_changes(&owner).await.unwrap();
    assert_eq!(pending.queued, 1);

    // The offline sync defers the entry and leaves everything intact
    let report = dev.sync.full_sync(&owner).await;
    assert!(report.is_err());
    assert_eq!(dev.sync.pending_changes(&owner).await.unwrap().queued, 1);

    // Reconnect: push acks, entry is consumed, record settles
    remote.set_offline(false);
    let report = dev.sync.full_sync(&owner).await.unwrap();
    assert_eq!(report.push.pushed, 1);

    let settled = dev.service.get(&created.id).await.unwrap().unwrap();
    assert_eq!(settled.sync_status, SyncStatus::Synced);
    assert_eq!(dev.sync.pending_changes(&owner).await.unwrap().queued, 0);
    assert_eq!(remote.live_len(), 1);
    // The trigger registration survived the whole round trip, exactly once
    assert_eq!(dev.time.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn two_devices_converge_to_the_later_edit() {
    let remote = InMemoryRemoteStore::new();
    let device_a = device(&remote).await;
    let device_b = device(&remote).await;
    let owner = OwnerId::new("user-1");

    // A creates and syncs; B pulls the record
    let created = device_a
        .service
        .create(time_input(&owner, "Original", unix_millis_now() + 3_600_000))
        .await
        .unwrap();
    device_a.sync.full_sync(&owner).await.unwrap();
    device_b.sync.full_sync(&owner).await.unwrap();
    assert_eq!(device_b.service.list(&owner).await.unwrap().len(), 1);

    // Both edit while offline; A's edit is timestamped later
    remote.set_offline(true);
    let mut edit_b = device_b.service.get(&created.id).await.unwrap().unwrap();
    edit_b.title = "B's edit".to_string();
    device_b.service.update(edit_b).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let mut edit_a = device_a.service.get(&created.id).await.unwrap().unwrap();
    edit_a.title = "A's edit".to_string();
    let edit_a = device_a.service.update(edit_a).await.unwrap();

    // Back online: B pushes first, A second, then both pull
    remote.set_offline(false);
    device_b.sync.full_sync(&owner).await.unwrap();
    device_a.sync.full_sync(&owner).await.unwrap();
    device_b.sync.full_sync(&owner).await.unwrap();

    let remote_title = remote.record(&created.id).unwrap().title;
    let on_a = device_a.service.get(&created.id).await.unwrap().unwrap();
    let on_b = device_b.service.get(&created.id).await.unwrap().unwrap();

    assert_eq!(remote_title, "A's edit");
    assert_eq!(on_a.title, "A's edit");
    assert_eq!(on_b.title, "A's edit");
    assert_eq!(on_b.updated_at, edit_a.updated_at);
}

#[tokio::test(flavor = "multi_thread")]
async fn guest_sign_up_migrates_and_pushes_everything() {
    let remote = InMemoryRemoteStore::new();
    let dev = device(&remote).await;
    let guest = OwnerId::guest();
    let account = OwnerId::new("user-1");

    for title in ["milk", "stamps", "keys"] {
        dev.service
            .create(time_input(&guest, title, unix_millis_now() + 3_600_000))
            .await
            .unwrap();
    }

    // Guest data is local-only: synced, nothing queued
    for reminder in dev.service.list(&guest).await.unwrap() {
        assert_eq!(reminder.sync_status, SyncStatus::Synced);
    }
    assert_eq!(dev.sync.pending_changes(&guest).await.unwrap().queued, 0);

    // Sign-up: everything moves to the account and is pushed
    let report = dev.sync.on_sign_in(&guest, &account).await.unwrap();
    assert_eq!(report.push.pushed, 3);

    let reminders = dev.service.list(&account).await.unwrap();
    assert_eq!(reminders.len(), 3);
    for reminder in &reminders {
        assert_eq!(reminder.owner, account);
        assert_eq!(reminder.sync_status, SyncStatus::Synced);
    }
    assert!(dev.service.list(&guest).await.unwrap().is_empty());
    assert_eq!(remote.live_len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_full_sync_converges_and_stays_stable() {
    let remote = InMemoryRemoteStore::new();
    let dev = device(&remote).await;
    let owner = OwnerId::new("user-1");

    // Some remote-only state plus local mutations
    remote.seed(RemoteReminder::from(
        &crate::models::Reminder::new(
            owner.clone(),
            "From another device",
            Trigger::Time {
                fire_at: unix_millis_now() + 7_200_000,
                recurrence: Recurrence::none(),
            },
        ),
    ));
    dev.service
        .create(time_input(&owner, "Local one", unix_millis_now() + 3_600_000))
        .await
        .unwrap();

    dev.sync.full_sync(&owner).await.unwrap();
    let after_first = dev.service.list(&owner).await.unwrap();
    assert_eq!(after_first.len(), 2);
    assert_eq!(remote.live_len(), 2);

    // With no new mutations, further syncs change nothing
    for _ in 0..3 {
        let report = dev.sync.full_sync(&owner).await.unwrap();
        assert_eq!(report.push.pushed, 0);
        assert_eq!(report.pull.applied, 0);
        assert_eq!(report.pull.removed, 0);
    }
    assert_eq!(dev.service.list(&owner).await.unwrap(), after_first);
}

#[tokio::test(flavor = "multi_thread")]
async fn replaying_an_acknowledged_entry_is_harmless() {
    let remote = InMemoryRemoteStore::new();
    let dev = device(&remote).await;
    let owner = OwnerId::new("user-1");

    let created = dev
        .service
        .create(time_input(&owner, "Idempotent", unix_millis_now() + 3_600_000))
        .await
        .unwrap();
    dev.sync.full_sync(&owner).await.unwrap();
    let first_state = remote.record(&created.id).unwrap();

    // Redeliver the same snapshot, as after a crash between ack and delete
    let replay = OutboxEntry::new(
        owner.clone(),
        created.id,
        OutboxOp::Create,
        serde_json::to_string(&RemoteReminder::from(
            &dev.service.get(&created.id).await.unwrap().unwrap(),
        ))
        .unwrap(),
    );
    {
        let db = dev.db.lock().await;
        LibSqlOutboxRepository::new(db.connection())
            .enqueue(&replay)
            .await
            .unwrap();
    }
    dev.sync.full_sync(&owner).await.unwrap();

    let second_state = remote.record(&created.id).unwrap();
    assert_eq!(second_state.title, first_state.title);
    assert_eq!(second_state.id, first_state.id);
    assert_eq!(remote.live_len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_deletion_propagates_and_disarms_triggers() {
    let remote = InMemoryRemoteStore::new();
    let dev = device(&remote).await;
    let owner = OwnerId::new("user-1");

    let created = dev
        .service
        .create(NewReminder {
            owner: owner.clone(),
            title: "Deleted elsewhere".to_string(),
            notes: None,
            priority: Priority::Low,
            category: Category::Other,
            trigger: Trigger::Location {
                latitude: 40.7,
                longitude: -74.0,
                radius_m: 100.0,
                edge: TriggerEdge::Enter,
                every_time: false,
            },
        })
        .await
        .unwrap();
    dev.sync.full_sync(&owner).await.unwrap();
    assert_eq!(dev.geo.len(), 1);

    // Another device logically deletes the record in the cloud
    remote.mark_deleted(&created.id).await.unwrap();

    let report = dev.sync.full_sync(&owner).await.unwrap();
    assert_eq!(report.pull.removed, 1);
    assert!(dev.service.get(&created.id).await.unwrap().is_none());

    // Restore reconciles registrations against the now-empty store
    dev.service.restore(&owner).await.unwrap();
    assert!(dev.geo.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_churn_leaves_no_orphan_registrations() {
    let remote = InMemoryRemoteStore::new();
    let dev = device(&remote).await;
    let owner = OwnerId::new("user-1");

    let keep = dev
        .service
        .create(time_input(&owner, "Keep", unix_millis_now() + 3_600_000))
        .await
        .unwrap();
    let complete = dev
        .service
        .create(time_input(&owner, "Complete", unix_millis_now() + 3_600_000))
        .await
        .unwrap();
    let remove = dev
        .service
        .create(time_input(&owner, "Remove", unix_millis_now() + 3_600_000))
        .await
        .unwrap();
    assert_eq!(dev.time.len(), 3);

    dev.service.toggle_complete(&complete.id).await.unwrap();
    dev.service.delete(&remove.id).await.unwrap();

    // Exactly the one active reminder holds a registration
    assert_eq!(dev.time.len(), 1);
    let report = dev.service.restore(&owner).await.unwrap();
    assert_eq!(report, crate::triggers::RestoreReport::default());

    let stored = dev.service.get(&keep.id).await.unwrap().unwrap();
    assert!(stored.trigger_handle.is_some());
}
