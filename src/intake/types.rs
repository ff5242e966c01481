use serde::{Deserialize, Serialize};

pub const FULL_NAME_MAX_CHARS: usize = 140;
pub const EMAIL_MAX_CHARS: usize = 180;
pub const ORGANIZATION_MAX_CHARS: usize = 180;
pub const ROLE_MAX_CHARS: usize = 140;
pub const ORGANIZATION_TYPE_MAX_CHARS: usize = 140;
pub const USE_CASE_MAX_CHARS: usize = 2000;
pub const DEPLOYMENT_PREFERENCE_MAX_CHARS: usize = 140;
pub const TIMELINE_MAX_CHARS: usize = 80;
pub const COMPLIANCE_REQUIREMENTS_MAX_CHARS: usize = 2000;
pub const HONEYPOT_MAX_CHARS: usize = 100;

/// Contact form body as received on the wire. Every field defaults so a
/// sparse submission deserializes cleanly; the gateway decides what is
/// actually required. `website` is the honeypot and is never rendered in any
/// form a human fills in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub organization_type: String,
    #[serde(default)]
    pub use_case: String,
    #[serde(default)]
    pub deployment_preference: String,
    #[serde(default)]
    pub timeline: String,
    #[serde(default)]
    pub compliance_requirements: String,
    #[serde(default)]
    pub consent_accepted: bool,
    #[serde(default)]
    pub website: String,
}

/// The same submission after whitespace collapse and length caps.
#[derive(Debug, Clone)]
pub struct SanitizedSubmission {
    pub full_name: String,
    pub email: String,
    pub organization: String,
    pub role: String,
    pub organization_type: String,
    pub use_case: String,
    pub deployment_preference: String,
    pub timeline: String,
    pub compliance_requirements: String,
    pub consent_accepted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayStatus {
    Webhook,
    Manual,
}

/// Success body for an accepted submission. The honeypot path returns only
/// the message, so the routing fields are omitted when unset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_status: Option<RelayStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailto_url: Option<String>,
}

/// Envelope posted to the operator webhook.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayPayload {
    pub recipient: String,
    pub subject: String,
    pub message: String,
    pub metadata: RelayMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMetadata {
    pub source: String,
    pub received_at: String,
    pub client_identity: String,
}
