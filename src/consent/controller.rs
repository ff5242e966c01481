use std::sync::Arc;

use tracing::warn;

use crate::{
    clock::now_rfc3339,
    consent::{
        gate::{TelemetryGate, TelemetryGateHandle},
        record::{ConsentPhase, ConsentRecord},
        store::{ConsentStore, StoreError},
    },
};

/// Owns the consent decision and the settings-panel state for one visitor.
///
/// None of the operations here return errors. Storage trouble downgrades to
/// in-memory behavior with a warning; the decision flow must keep working on
/// hosts where persistence is blocked entirely.
pub struct ConsentController {
    store: Arc<dyn ConsentStore>,
    gate: TelemetryGate,
    record: ConsentRecord,
    analytics_draft: bool,
    marketing_draft: bool,
    panel_open: bool,
}

impl ConsentController {
    /// Hydrates from the store. A missing document means a first visit, so
    /// the panel opens; a corrupt document is cleared best-effort and treated
    /// the same way; an unavailable store leaves the controller fully
    /// functional on defaults.
    pub fn init(store: Arc<dyn ConsentStore>, gate: TelemetryGate) -> Self {
        let (record, panel_open) = match store.load() {
            Ok(Some(document)) => (ConsentRecord::normalize(&document), false),
            Ok(None) => (ConsentRecord::default(), true),
            Err(StoreError::Corrupt(message)) => {
                warn!(target: "consent", %message, "discarding corrupt consent document");
                if let Err(err) = store.clear() {
                    warn!(target: "consent", error = %err, "failed to clear corrupt consent document");
                }
                (ConsentRecord::default(), true)
            }
            Err(err) => {
                warn!(target: "consent", error = %err, "consent storage unavailable, continuing in memory");
                (ConsentRecord::default(), true)
            }
        };

        let controller = Self {
            store,
            gate,
            analytics_draft: record.analytics,
            marketing_draft: record.marketing,
            panel_open,
            record,
        };
        controller.sync_gate();
        controller
    }

    pub fn accept_all(&mut self) {
        self.apply(true, true);
    }

    pub fn reject_optional(&mut self) {
        self.apply(false, false);
    }

    pub fn save_preferences(&mut self) {
        self.apply(self.analytics_draft, self.marketing_draft);
    }

    /// Reopens the panel for editing. Drafts reset from the current record so
    /// abandoned edits from a previous visit to the panel do not leak in.
    pub fn open_settings(&mut self) {
        self.analytics_draft = self.record.analytics;
        self.marketing_draft = self.record.marketing;
        self.panel_open = true;
    }

    /// Closes the panel without applying drafts.
    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }

    pub fn set_analytics_draft(&mut self, value: bool) {
        self.analytics_draft = value;
    }

    pub fn set_marketing_draft(&mut self, value: bool) {
        self.marketing_draft = value;
    }

    /// The panel stays on screen until a decision exists, and can be brought
    /// back explicitly afterwards.
    pub fn panel_visible(&self) -> bool {
        self.panel_open || !self.record.decided
    }

    pub fn record(&self) -> &ConsentRecord {
        &self.record
    }

    pub fn phase(&self) -> ConsentPhase {
        self.record.phase()
    }

    pub fn summary(&self) -> &'static str {
        self.record.summary()
    }

    pub fn analytics_draft(&self) -> bool {
        self.analytics_draft
    }

    pub fn marketing_draft(&self) -> bool {
        self.marketing_draft
    }

    pub fn gate_handle(&self) -> TelemetryGateHandle {
        self.gate.handle()
    }

    fn apply(&mut self, analytics: bool, marketing: bool) {
        self.record = ConsentRecord {
            necessary: true,
            analytics,
            marketing,
            decided: true,
            updated_at: Some(now_rfc3339()),
        };
        if let Err(err) = self.store.save(&self.record) {
            warn!(target: "consent", error = %err, "failed to persist consent decision");
        }
        self.panel_open = false;
        self.sync_gate();
        self.analytics_draft = self.record.analytics;
        self.marketing_draft = self.record.marketing;
    }

    fn sync_gate(&self) {
        self.gate.set_analytics_allowed(self.record.analytics);
    }
}
