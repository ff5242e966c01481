use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::{Duration, timeout};

use crate::intake::types::RelayPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    Timeout,
    Transport(String),
    Status(u16),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Timeout => write!(f, "webhook relay timed out"),
            RelayError::Transport(message) => {
                write!(f, "webhook relay transport error: {message}")
            }
            RelayError::Status(code) => write!(f, "webhook relay answered with status {code}"),
        }
    }
}

impl std::error::Error for RelayError {}

/// Delivery seam for qualified submissions.
#[async_trait]
pub trait RelayPort: Send + Sync {
    async fn deliver(&self, payload: &RelayPayload) -> Result<(), RelayError>;
}

/// Posts the submission envelope to the operator webhook. The deadline wraps
/// the whole request future, so a stalled connection cannot hold a
/// submission open past it.
pub struct WebhookRelay {
    client: Client,
    url: String,
    deadline: Duration,
}

impl WebhookRelay {
    pub fn new(url: impl Into<String>, deadline: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(deadline)
                .build()
                .expect("reqwest client must build"),
            url: url.into(),
            deadline,
        }
    }
}

#[async_trait]
impl RelayPort for WebhookRelay {
    async fn deliver(&self, payload: &RelayPayload) -> Result<(), RelayError> {
        let send = self.client.post(&self.url).json(payload).send();
        let response = match timeout(self.deadline, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(RelayError::Transport(err.to_string())),
            Err(_) => return Err(RelayError::Timeout),
        };

        if !response.status().is_success() {
            return Err(RelayError::Status(response.status().as_u16()));
        }

        Ok(())
    }
}
