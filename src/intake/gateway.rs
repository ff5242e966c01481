use std::{sync::Arc, time::Duration};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clock::now_rfc3339,
    config::IntakeConfig,
    intake::{
        error::{IntakeError, invalid_email, missing_fields, rate_limited},
        mailto::mailto_url,
        rate_limit::SlidingWindowLimiter,
        relay::{RelayPort, WebhookRelay},
        sanitize::{clean, email_shape_ok},
        types::{
            COMPLIANCE_REQUIREMENTS_MAX_CHARS, DEPLOYMENT_PREFERENCE_MAX_CHARS, EMAIL_MAX_CHARS,
            FULL_NAME_MAX_CHARS, HONEYPOT_MAX_CHARS, ORGANIZATION_MAX_CHARS,
            ORGANIZATION_TYPE_MAX_CHARS, ROLE_MAX_CHARS, RelayMetadata, RelayPayload, RelayStatus,
            SanitizedSubmission, SubmissionPayload, SubmissionReceipt, TIMELINE_MAX_CHARS,
            USE_CASE_MAX_CHARS,
        },
    },
};

const GENERIC_ACCEPTED_MESSAGE: &str = "Request accepted.";
const ROUTED_MESSAGE: &str = "Qualification request received and routed.";
const MANUAL_MESSAGE: &str =
    "Qualification request received. Use the optional pre-filled email fallback to complete manual routing.";

/// Contact-intake pipeline: rate window, honeypot, hygiene, validation, and
/// relay with a manual fallback. A submission that clears validation is never
/// failed because of the relay; delivery trouble only downgrades the routing.
pub struct IntakeGateway {
    limiter: SlidingWindowLimiter,
    relay: Option<Arc<dyn RelayPort>>,
    inbox: String,
    source_tag: String,
}

impl IntakeGateway {
    pub fn new(config: &IntakeConfig) -> Self {
        let relay = config.webhook_url.as_deref().map(|url| {
            Arc::new(WebhookRelay::new(
                url,
                Duration::from_millis(config.relay_timeout_ms),
            )) as Arc<dyn RelayPort>
        });

        Self {
            limiter: SlidingWindowLimiter::new(
                Duration::from_secs(config.rate_window_secs),
                config.rate_max_requests,
                config.rate_max_identities,
            ),
            relay,
            inbox: config.inbox.clone(),
            source_tag: config.source_tag.clone(),
        }
    }

    pub fn with_relay(mut self, relay: Arc<dyn RelayPort>) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Runs one submission through the pipeline. Order matters here: the rate
    /// window records the attempt before any verdict, the honeypot is checked
    /// before validation so trapped bots learn nothing from the response, and
    /// required-field gaps outrank email-shape problems.
    pub async fn submit(
        &self,
        payload: SubmissionPayload,
        client_identity: &str,
    ) -> Result<SubmissionReceipt, IntakeError> {
        let submission_id = Uuid::now_v7();

        if !self.limiter.admit(client_identity).await {
            warn!(
                target: "intake",
                %submission_id,
                identity = %client_identity,
                "submission rejected by rate window"
            );
            return Err(rate_limited());
        }

        let trap = clean(&payload.website, HONEYPOT_MAX_CHARS);
        if !trap.is_empty() {
            info!(target: "intake", %submission_id, "honeypot tripped, acknowledging without routing");
            return Ok(SubmissionReceipt {
                message: GENERIC_ACCEPTED_MESSAGE.to_string(),
                relay_status: None,
                mailto_url: None,
            });
        }

        let submission = sanitize_payload(&payload);
        validate(&submission)?;

        let received_at = now_rfc3339();
        let relay_payload = build_relay_payload(
            &self.inbox,
            &self.source_tag,
            &submission,
            &received_at,
            client_identity,
        );

        let relay_status = match &self.relay {
            Some(relay) => match relay.deliver(&relay_payload).await {
                Ok(()) => RelayStatus::Webhook,
                Err(err) => {
                    warn!(
                        target: "intake",
                        %submission_id,
                        error = %err,
                        "webhook relay failed, downgrading to manual routing"
                    );
                    RelayStatus::Manual
                }
            },
            None => RelayStatus::Manual,
        };

        info!(
            target: "intake",
            %submission_id,
            relay_status = ?relay_status,
            organization = %submission.organization,
            "submission accepted"
        );

        let message = match relay_status {
            RelayStatus::Webhook => ROUTED_MESSAGE,
            RelayStatus::Manual => MANUAL_MESSAGE,
        };

        Ok(SubmissionReceipt {
            message: message.to_string(),
            relay_status: Some(relay_status),
            mailto_url: Some(mailto_url(
                &self.inbox,
                &relay_payload.subject,
                &relay_payload.message,
            )),
        })
    }
}

fn sanitize_payload(payload: &SubmissionPayload) -> SanitizedSubmission {
    SanitizedSubmission {
        full_name: clean(&payload.full_name, FULL_NAME_MAX_CHARS),
        email: clean(&payload.email, EMAIL_MAX_CHARS),
        organization: clean(&payload.organization, ORGANIZATION_MAX_CHARS),
        role: clean(&payload.role, ROLE_MAX_CHARS),
        organization_type: clean(&payload.organization_type, ORGANIZATION_TYPE_MAX_CHARS),
        use_case: clean(&payload.use_case, USE_CASE_MAX_CHARS),
        deployment_preference: clean(&payload.deployment_preference, DEPLOYMENT_PREFERENCE_MAX_CHARS),
        timeline: clean(&payload.timeline, TIMELINE_MAX_CHARS),
        compliance_requirements: clean(
            &payload.compliance_requirements,
            COMPLIANCE_REQUIREMENTS_MAX_CHARS,
        ),
        consent_accepted: payload.consent_accepted,
    }
}

fn validate(submission: &SanitizedSubmission) -> Result<(), IntakeError> {
    let required_present = !submission.full_name.is_empty()
        && !submission.email.is_empty()
        && !submission.organization.is_empty()
        && !submission.use_case.is_empty()
        && !submission.compliance_requirements.is_empty()
        && submission.consent_accepted;
    if !required_present {
        return Err(missing_fields());
    }

    if !email_shape_ok(&submission.email) {
        return Err(invalid_email());
    }

    Ok(())
}

fn build_relay_payload(
    inbox: &str,
    source_tag: &str,
    submission: &SanitizedSubmission,
    received_at: &str,
    client_identity: &str,
) -> RelayPayload {
    let subject = format!(
        "Healthcare AI qualification request - {}",
        submission.organization
    );
    let message = [
        format!("Timestamp: {received_at}"),
        format!("Full name: {}", submission.full_name),
        format!("Email: {}", submission.email),
        format!("Organization: {}", submission.organization),
        format!("Role: {}", submission.role),
        format!("Organization type: {}", submission.organization_type),
        format!("Use case: {}", submission.use_case),
        format!("Deployment preference: {}", submission.deployment_preference),
        format!("Timeline: {}", submission.timeline),
        format!(
            "Compliance requirements: {}",
            submission.compliance_requirements
        ),
        format!(
            "Consent accepted: {}",
            if submission.consent_accepted { "yes" } else { "no" }
        ),
    ]
    .join("\n");

    RelayPayload {
        recipient: inbox.to_string(),
        subject,
        message,
        metadata: RelayMetadata {
            source: source_tag.to_string(),
            received_at: received_at.to_string(),
            client_identity: client_identity.to_string(),
        },
    }
}
