pub mod controller;
pub mod gate;
pub mod record;
pub mod store;

pub use controller::ConsentController;
pub use gate::{TelemetryGate, TelemetryGateHandle};
pub use record::{ConsentPhase, ConsentRecord};
pub use store::{ConsentStore, FileConsentStore, MemoryConsentStore, StoreError};
