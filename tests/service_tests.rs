//! End-to-end scenarios for the service loop.
//!
//! Time is paused, so sleeping in a test auto-advances the clock and lets
//! re-poll timers fire deterministically.

use geofence::config::GeoFenceConfig;
use geofence::core::{Presence, SessionPhase};
use geofence::fence::{Coordinate, FenceRecord, TriggerOn};
use geofence::notify::{Presentation, RecordingSink, MONITORING_FAILED_BODY};
use geofence::provider::{
    AuthorizationLevel, ProviderCall, ProviderEvent, RegionProvider, RegionSpec, RegionState,
    SimulatedProvider,
};
use geofence::registry::RegistryError;
use geofence::service::{GeoFenceService, ServiceError, ServiceHandle};
use geofence::store::{encode, FenceStore, MemoryStore};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    handle: ServiceHandle,
    provider: SimulatedProvider,
    store: MemoryStore,
    sink: RecordingSink,
}

fn start_with(provider: SimulatedProvider, store: MemoryStore) -> Harness {
    let sink = RecordingSink::new();
    let service = GeoFenceService::new(
        GeoFenceConfig::default(),
        Arc::new(provider.clone()),
        Box::new(store.clone()),
        Arc::new(sink.clone()),
    );
    let (handle, _task) = service.start();
    Harness {
        handle,
        provider,
        store,
        sink,
    }
}

fn start() -> Harness {
    start_with(SimulatedProvider::new(), MemoryStore::new())
}

fn tokyo() -> Coordinate {
    Coordinate::new(35.0, 139.0)
}

fn state(identifier: &str, state: RegionState) -> ProviderEvent {
    ProviderEvent::StateDetermined {
        identifier: identifier.to_string(),
        state,
    }
}

fn started(identifier: &str) -> ProviderEvent {
    ProviderEvent::Started {
        identifier: identifier.to_string(),
    }
}

async fn add_home(h: &Harness, trigger_on: TriggerOn) -> String {
    h.handle
        .add(tokyo(), 500.0, "Home", trigger_on)
        .await
        .unwrap()
        .identifier()
        .to_string()
}

/// Wait past one re-poll interval.
async fn wait_poll_interval() {
    tokio::time::sleep(Duration::from_millis(2_100)).await;
}

#[tokio::test(start_paused = true)]
async fn device_already_inside_is_notified_once() {
    let h = start();
    let id = add_home(&h, TriggerOn::OnEntry).await;

    h.handle.deliver(started(&id)).unwrap();
    h.handle.deliver(state(&id, RegionState::Inside)).unwrap();
    h.handle
        .deliver(ProviderEvent::Entered {
            identifier: id.clone(),
        })
        .unwrap();

    let session = h.handle.session(&id).await.unwrap().unwrap();
    assert_eq!(session.phase, SessionPhase::Steady);
    assert_eq!(session.last_known, Presence::Inside);
    assert_eq!(h.provider.request_state_count(&id), 1);
    assert_eq!(h.sink.bodies(), vec!["Home: IN".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn ambiguous_state_is_polled_again_after_interval() {
    let h = start();
    let id = add_home(&h, TriggerOn::OnEntry).await;

    h.handle.deliver(started(&id)).unwrap();
    h.handle.deliver(state(&id, RegionState::Unknown)).unwrap();
    let session = h.handle.session(&id).await.unwrap().unwrap();
    assert_eq!(session.poll_budget, 9);
    assert_eq!(h.provider.request_state_count(&id), 1);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    h.handle.list().await.unwrap();
    assert_eq!(h.provider.request_state_count(&id), 1);

    tokio::time::sleep(Duration::from_millis(600)).await;
    h.handle.list().await.unwrap();
    assert_eq!(h.provider.request_state_count(&id), 2);

    h.handle.deliver(state(&id, RegionState::Inside)).unwrap();
    h.handle.list().await.unwrap();
    assert_eq!(h.sink.bodies(), vec!["Home: IN".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn exhausted_poll_budget_evicts_fence() {
    let h = start();
    let id = add_home(&h, TriggerOn::OnEntry).await;
    h.handle.deliver(started(&id)).unwrap();

    for _ in 0..10 {
        h.handle.deliver(state(&id, RegionState::Unknown)).unwrap();
        wait_poll_interval().await;
    }
    assert_eq!(h.provider.request_state_count(&id), 11);
    assert!(h.handle.find(&id).await.unwrap().is_some());

    h.handle.deliver(state(&id, RegionState::Unknown)).unwrap();
    assert!(h.handle.find(&id).await.unwrap().is_none());
    assert!(h.handle.session(&id).await.unwrap().is_none());
    assert_eq!(h.provider.stop_count(&id), 1);
    assert!(h.store.load_all().unwrap().is_empty());

    // Nothing more happens for the evicted fence.
    h.handle.deliver(state(&id, RegionState::Unknown)).unwrap();
    wait_poll_interval().await;
    h.handle.list().await.unwrap();
    assert_eq!(h.provider.request_state_count(&id), 11);
    assert!(h.sink.delivered().is_empty());
}

#[tokio::test(start_paused = true)]
async fn removal_during_backoff_cancels_poll() {
    let h = start();
    let id = add_home(&h, TriggerOn::OnEntry).await;
    h.handle.deliver(started(&id)).unwrap();
    h.handle.deliver(state(&id, RegionState::Unknown)).unwrap();

    let removed = h.handle.remove(&id).await.unwrap();
    assert_eq!(removed.map(|f| f.identifier().to_string()), Some(id.clone()));
    assert_eq!(h.provider.stop_count(&id), 1);

    wait_poll_interval().await;
    h.handle.deliver(state(&id, RegionState::Inside)).unwrap();
    h.handle.list().await.unwrap();

    assert_eq!(h.provider.request_state_count(&id), 1);
    assert!(h.sink.delivered().is_empty());
    assert!(h.handle.list().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn exit_fence_notifies_on_each_exit() {
    let h = start();
    let id = add_home(&h, TriggerOn::OnExit).await;
    h.handle.deliver(started(&id)).unwrap();

    for _ in 0..2 {
        h.handle
            .deliver(ProviderEvent::Entered {
                identifier: id.clone(),
            })
            .unwrap();
        h.handle
            .deliver(ProviderEvent::Exited {
                identifier: id.clone(),
            })
            .unwrap();
    }
    h.handle.list().await.unwrap();

    assert_eq!(h.provider.request_state_count(&id), 0);
    assert_eq!(
        h.sink.bodies(),
        vec!["Home: OUT".to_string(), "Home: OUT".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn presentation_follows_application_state() {
    let h = start();
    let id = add_home(&h, TriggerOn::OnEntry).await;
    h.handle.deliver(started(&id)).unwrap();
    h.handle.deliver(state(&id, RegionState::Inside)).unwrap();

    h.handle.set_foreground(false).unwrap();
    h.handle
        .deliver(ProviderEvent::Exited {
            identifier: id.clone(),
        })
        .unwrap();
    h.handle
        .deliver(ProviderEvent::Entered {
            identifier: id.clone(),
        })
        .unwrap();
    h.handle.list().await.unwrap();

    let delivered = h.sink.delivered();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].presentation, Presentation::Alert);
    assert_eq!(delivered[1].presentation, Presentation::System);
    assert_eq!(delivered[1].body, "Home: IN");
}

#[tokio::test(start_paused = true)]
async fn monitoring_failure_notifies_and_keeps_fence() {
    let h = start();
    let id = add_home(&h, TriggerOn::OnEntry).await;

    h.handle
        .deliver(ProviderEvent::MonitoringFailed {
            identifier: id.clone(),
            error: "region limit reached".into(),
        })
        .unwrap();

    assert!(h.handle.session(&id).await.unwrap().is_none());
    assert!(h.handle.find(&id).await.unwrap().is_some());
    let delivered = h.sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].presentation, Presentation::System);
    assert_eq!(delivered[0].body, MONITORING_FAILED_BODY);
}

#[tokio::test(start_paused = true)]
async fn events_without_location_fix_are_ignored() {
    let h = start();
    let id = add_home(&h, TriggerOn::OnEntry).await;
    h.handle.deliver(started(&id)).unwrap();

    h.provider.set_location_available(false);
    h.handle.deliver(state(&id, RegionState::Inside)).unwrap();
    let session = h.handle.session(&id).await.unwrap().unwrap();
    assert_eq!(session.phase, SessionPhase::Polling);
    assert!(h.sink.delivered().is_empty());

    h.provider.set_location_available(true);
    h.handle.deliver(state(&id, RegionState::Inside)).unwrap();
    h.handle.list().await.unwrap();
    assert_eq!(h.sink.bodies(), vec!["Home: IN".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn rejected_add_reports_registry_error() {
    let h = start_with(
        SimulatedProvider::new().with_authorization(AuthorizationLevel::AuthorizedWhenInUse),
        MemoryStore::new(),
    );

    let result = h.handle.add(tokyo(), 500.0, "Home", TriggerOn::OnEntry).await;

    assert_eq!(
        result,
        Err(ServiceError::Registry(RegistryError::Unauthorized {
            level: AuthorizationLevel::AuthorizedWhenInUse
        }))
    );
    assert!(h.handle.list().await.unwrap().is_empty());
    assert!(h.store.document().is_none());
}

#[tokio::test(start_paused = true)]
async fn remove_all_clears_everything() {
    let h = start();
    let a = add_home(&h, TriggerOn::OnEntry).await;
    let b = add_home(&h, TriggerOn::OnExit).await;
    h.handle.deliver(started(&a)).unwrap();
    h.handle.deliver(started(&b)).unwrap();
    h.handle.deliver(state(&a, RegionState::Unknown)).unwrap();

    assert_eq!(h.handle.remove_all().await.unwrap(), 2);
    assert!(h.handle.list().await.unwrap().is_empty());
    assert!(h.provider.region(&a).is_none());
    assert!(h.provider.region(&b).is_none());

    wait_poll_interval().await;
    h.handle.list().await.unwrap();
    assert_eq!(h.provider.request_state_count(&a), 1);
    assert!(h.store.load_all().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn startup_restores_fences_and_asks_authorization() {
    let persisted = FenceRecord::new("F1", tokyo(), 500.0, "Home", TriggerOn::OnEntry);
    let store = MemoryStore::with_document(encode(std::slice::from_ref(&persisted)).unwrap());
    let provider =
        SimulatedProvider::new().with_authorization(AuthorizationLevel::NotDetermined);

    let h = start_with(provider, store);

    assert_eq!(h.handle.list().await.unwrap(), vec![persisted]);
    assert!(h
        .provider
        .calls()
        .contains(&ProviderCall::RequestAlwaysAuthorization));
    // The simulated provider does not remember regions across instances.
    assert!(h.handle.session("F1").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn startup_resumes_sessions_still_monitored() {
    let persisted = FenceRecord::new("F1", tokyo(), 500.0, "Home", TriggerOn::OnEntry);
    let store = MemoryStore::new();
    store.save_all(std::slice::from_ref(&persisted)).unwrap();

    let provider = SimulatedProvider::new();
    provider.start_monitoring(&RegionSpec::from(&persisted));

    let h = start_with(provider, store);
    let session = h.handle.session("F1").await.unwrap().unwrap();
    assert_eq!(session.phase, SessionPhase::Steady);

    h.handle
        .deliver(ProviderEvent::Entered {
            identifier: "F1".into(),
        })
        .unwrap();
    h.handle.list().await.unwrap();
    assert_eq!(h.sink.bodies(), vec!["Home: IN".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn handle_fails_after_shutdown() {
    let sink = RecordingSink::new();
    let service = GeoFenceService::new(
        GeoFenceConfig::default(),
        Arc::new(SimulatedProvider::new()),
        Box::new(MemoryStore::new()),
        Arc::new(sink),
    );
    let (handle, task) = service.start();

    handle.shutdown().unwrap();
    task.await.unwrap();

    assert_eq!(handle.list().await, Err(ServiceError::Stopped));
    assert_eq!(
        handle.deliver(started("F1")),
        Err(ServiceError::Stopped)
    );
}

#[tokio::test(start_paused = true)]
async fn file_backed_service_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("geofences.json");
    let config = GeoFenceConfig::from_toml_str(&format!(
        "[store]\npath = \"{}\"\n\n[logging]\nlevel = \"debug\"\n",
        path.display()
    ))
    .unwrap();
    geofence::logging::init(&config.logging);

    let provider = SimulatedProvider::new();
    let first = GeoFenceService::with_file_store(
        config.clone(),
        Arc::new(provider.clone()),
        Arc::new(RecordingSink::new()),
    );
    let (handle, task) = first.start();
    let fence = handle
        .add(tokyo(), 500.0, "Office", TriggerOn::OnExit)
        .await
        .unwrap();
    handle.shutdown().unwrap();
    task.await.unwrap();

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored["geoFenceItems"][0]["note"], "Office");
    assert_eq!(stored["geoFenceItems"][0]["eventType"], 1);

    let sink = RecordingSink::new();
    let second = GeoFenceService::with_file_store(
        config,
        Arc::new(provider.clone()),
        Arc::new(sink.clone()),
    );
    let (handle, _task) = second.start();
    assert_eq!(handle.list().await.unwrap(), vec![fence.clone()]);

    handle
        .deliver(ProviderEvent::Exited {
            identifier: fence.identifier().to_string(),
        })
        .unwrap();
    handle.list().await.unwrap();
    assert_eq!(sink.bodies(), vec!["Office: OUT".to_string()]);
}
