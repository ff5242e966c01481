use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeErrorKind {
    MethodNotAllowed,
    RateLimited,
    MissingFields,
    InvalidEmail,
    InvalidBody,
}

/// Client-facing rejection. The message is the exact text returned on the
/// wire, so keep it generic; details belong in logs, not responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeError {
    pub kind: IntakeErrorKind,
    pub message: String,
}

impl IntakeError {
    pub fn new(kind: IntakeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for IntakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for IntakeError {}

pub fn method_not_allowed() -> IntakeError {
    IntakeError::new(IntakeErrorKind::MethodNotAllowed, "Method not allowed.")
}

pub fn rate_limited() -> IntakeError {
    IntakeError::new(
        IntakeErrorKind::RateLimited,
        "Too many requests. Please retry later.",
    )
}

pub fn missing_fields() -> IntakeError {
    IntakeError::new(IntakeErrorKind::MissingFields, "Missing required fields.")
}

pub fn invalid_email() -> IntakeError {
    IntakeError::new(IntakeErrorKind::InvalidEmail, "Invalid email format.")
}

pub fn invalid_body() -> IntakeError {
    IntakeError::new(IntakeErrorKind::InvalidBody, "Invalid request body.")
}
