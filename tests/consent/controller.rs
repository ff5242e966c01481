use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use concierge::consent::{
    ConsentController, ConsentPhase, ConsentRecord, ConsentStore, MemoryConsentStore, StoreError,
    TelemetryGate,
};
use serde_json::{Value, json};

/// Store that fails every operation, as on a host with storage blocked.
struct UnavailableStore;

impl ConsentStore for UnavailableStore {
    fn load(&self) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Unavailable("blocked".to_string()))
    }

    fn save(&self, _record: &ConsentRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("blocked".to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("blocked".to_string()))
    }
}

/// Store whose document is unreadable, counting how often it gets cleared.
struct CorruptStore {
    clear_calls: Arc<AtomicUsize>,
}

impl ConsentStore for CorruptStore {
    fn load(&self) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Corrupt("bad json".to_string()))
    }

    fn save(&self, _record: &ConsentRecord) -> Result<(), StoreError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn seeded_store(document: Value) -> Arc<MemoryConsentStore> {
    let store = Arc::new(MemoryConsentStore::new());
    store
        .save(&ConsentRecord::normalize(&document))
        .expect("seed save");
    store
}

#[test]
fn given_empty_store_when_initialized_then_panel_shows_and_phase_is_undecided() {
    let controller = ConsentController::init(Arc::new(MemoryConsentStore::new()), TelemetryGate::new());

    assert!(controller.panel_visible());
    assert_eq!(controller.phase(), ConsentPhase::Undecided);
    assert!(controller.record().necessary);
    assert!(!controller.gate_handle().analytics_allowed());
}

#[test]
fn given_decided_document_when_initialized_then_panel_hidden_and_gate_synced() {
    let store = seeded_store(json!({
        "analytics": true,
        "marketing": true,
        "decided": true,
        "updatedAt": "2026-08-20T09:00:00Z",
    }));
    let controller = ConsentController::init(store, TelemetryGate::new());

    assert!(!controller.panel_visible());
    assert_eq!(controller.phase(), ConsentPhase::DecidedAllow);
    assert!(controller.gate_handle().analytics_allowed());
    assert!(controller.analytics_draft());
    assert!(controller.marketing_draft());
}

#[test]
fn given_undecided_document_when_initialized_then_panel_shows_again() {
    let store = seeded_store(json!({ "analytics": true, "decided": false }));
    let controller = ConsentController::init(store, TelemetryGate::new());
    assert!(controller.panel_visible());
}

#[test]
fn given_corrupt_document_when_initialized_then_store_cleared_and_defaults_apply() {
    let clear_calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(CorruptStore {
        clear_calls: Arc::clone(&clear_calls),
    });

    let controller = ConsentController::init(store, TelemetryGate::new());

    assert_eq!(clear_calls.load(Ordering::SeqCst), 1);
    assert!(controller.panel_visible());
    assert_eq!(controller.phase(), ConsentPhase::Undecided);
}

#[test]
fn given_unavailable_store_when_initialized_then_controller_still_works_in_memory() {
    let mut controller = ConsentController::init(Arc::new(UnavailableStore), TelemetryGate::new());

    assert!(controller.panel_visible());

    controller.accept_all();

    assert!(!controller.panel_visible(), "decision closes the panel");
    assert_eq!(controller.phase(), ConsentPhase::DecidedAllow);
    assert!(controller.gate_handle().analytics_allowed());
    assert!(controller.record().updated_at.is_some());
}

#[test]
fn given_accept_all_when_applied_then_flags_persist_and_panel_closes() {
    let store = Arc::new(MemoryConsentStore::new());
    let mut controller = ConsentController::init(Arc::clone(&store) as Arc<dyn ConsentStore>, TelemetryGate::new());

    controller.accept_all();

    assert!(!controller.panel_visible());
    assert_eq!(controller.summary(), "Analytics enabled");
    assert!(controller.record().marketing);

    let persisted = store
        .load()
        .expect("load succeeds")
        .expect("document persisted");
    let persisted = ConsentRecord::normalize(&persisted);
    assert!(persisted.analytics && persisted.marketing && persisted.decided);
    assert!(persisted.updated_at.is_some());
}

#[test]
fn given_reject_optional_when_applied_then_gate_closes_and_decision_sticks() {
    let store = seeded_store(json!({ "analytics": true, "decided": true }));
    let mut controller = ConsentController::init(store, TelemetryGate::new());
    assert!(controller.gate_handle().analytics_allowed());

    controller.reject_optional();

    assert_eq!(controller.phase(), ConsentPhase::DecidedDeny);
    assert_eq!(controller.summary(), "Analytics disabled");
    assert!(!controller.gate_handle().analytics_allowed());
    assert!(controller.record().decided);
}

#[test]
fn given_draft_edits_when_saved_then_draft_values_become_the_record() {
    let store = Arc::new(MemoryConsentStore::new());
    let mut controller = ConsentController::init(store, TelemetryGate::new());

    controller.set_analytics_draft(true);
    controller.set_marketing_draft(false);
    controller.save_preferences();

    assert!(controller.record().analytics);
    assert!(!controller.record().marketing);
    assert!(controller.record().decided);
    assert!(controller.gate_handle().analytics_allowed());
}

#[test]
fn given_unapplied_draft_edits_when_panel_reopened_then_drafts_reset_from_record() {
    let store = seeded_store(json!({
        "analytics": false,
        "marketing": true,
        "decided": true,
    }));
    let mut controller = ConsentController::init(store, TelemetryGate::new());

    controller.open_settings();
    controller.set_analytics_draft(true);
    controller.set_marketing_draft(false);
    controller.close_panel();

    assert_eq!(controller.phase(), ConsentPhase::DecidedDeny, "closing applies nothing");
    assert!(!controller.gate_handle().analytics_allowed());

    controller.open_settings();
    assert!(controller.panel_visible());
    assert!(!controller.analytics_draft(), "draft reset from record");
    assert!(controller.marketing_draft(), "draft reset from record");
}

#[test]
fn given_each_mutation_when_applied_then_gate_reflects_analytics_immediately() {
    let store = Arc::new(MemoryConsentStore::new());
    let gate = TelemetryGate::new();
    let handle = gate.handle();
    let mut controller = ConsentController::init(store, gate);

    assert!(!handle.analytics_allowed());

    controller.accept_all();
    assert!(handle.analytics_allowed());

    controller.reject_optional();
    assert!(!handle.analytics_allowed());

    controller.set_analytics_draft(true);
    assert!(
        !handle.analytics_allowed(),
        "draft edits alone never touch the gate"
    );

    controller.save_preferences();
    assert!(handle.analytics_allowed());
}
