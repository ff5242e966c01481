use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Analytics kill switch. The consent controller is the only writer; script
/// loaders hold a [`TelemetryGateHandle`] and check it before injecting
/// anything. Starts closed, so nothing loads before a decision is known.
#[derive(Debug, Default)]
pub struct TelemetryGate {
    analytics_allowed: Arc<AtomicBool>,
}

impl TelemetryGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> TelemetryGateHandle {
        TelemetryGateHandle {
            analytics_allowed: Arc::clone(&self.analytics_allowed),
        }
    }

    pub fn analytics_allowed(&self) -> bool {
        self.analytics_allowed.load(Ordering::SeqCst)
    }

    pub(crate) fn set_analytics_allowed(&self, allowed: bool) {
        self.analytics_allowed.store(allowed, Ordering::SeqCst);
    }
}

/// Read-only view of the gate, cheap to clone and hand to loaders.
#[derive(Debug, Clone)]
pub struct TelemetryGateHandle {
    analytics_allowed: Arc<AtomicBool>,
}

impl TelemetryGateHandle {
    pub fn analytics_allowed(&self) -> bool {
        self.analytics_allowed.load(Ordering::SeqCst)
    }
}
