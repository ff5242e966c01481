use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Visitor consent snapshot. `necessary` is not negotiable; the optional
/// categories stay off until the visitor makes an explicit decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    pub necessary: bool,
    pub analytics: bool,
    pub marketing: bool,
    pub decided: bool,
    pub updated_at: Option<String>,
}

impl Default for ConsentRecord {
    fn default() -> Self {
        Self {
            necessary: true,
            analytics: false,
            marketing: false,
            decided: false,
            updated_at: None,
        }
    }
}

/// Decision state derived from the record, never stored alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentPhase {
    Undecided,
    DecidedAllow,
    DecidedDeny,
}

impl ConsentRecord {
    /// Rebuilds a record from whatever was found in storage. Every field is
    /// coerced independently so partially-shaped or junk documents degrade to
    /// safe defaults instead of failing the load. `updated_at` keeps any
    /// string value verbatim; the stamp is informational, not validated.
    pub fn normalize(value: &Value) -> Self {
        Self {
            necessary: true,
            analytics: value
                .get("analytics")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            marketing: value
                .get("marketing")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            decided: value.get("decided").and_then(Value::as_bool).unwrap_or(false),
            updated_at: value
                .get("updatedAt")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }

    pub fn phase(&self) -> ConsentPhase {
        if !self.decided {
            ConsentPhase::Undecided
        } else if self.analytics {
            ConsentPhase::DecidedAllow
        } else {
            ConsentPhase::DecidedDeny
        }
    }

    /// Short label for settings surfaces.
    pub fn summary(&self) -> &'static str {
        match self.phase() {
            ConsentPhase::Undecided => "Preferences not set",
            ConsentPhase::DecidedAllow => "Analytics enabled",
            ConsentPhase::DecidedDeny => "Analytics disabled",
        }
    }
}
