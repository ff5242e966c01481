pub mod error;
pub mod gateway;
pub mod mailto;
pub mod rate_limit;
pub mod relay;
pub mod sanitize;
pub mod types;

pub use error::{IntakeError, IntakeErrorKind};
pub use gateway::IntakeGateway;
pub use rate_limit::SlidingWindowLimiter;
pub use relay::{RelayError, RelayPort, WebhookRelay};
pub use types::{RelayPayload, RelayStatus, SubmissionPayload, SubmissionReceipt};
