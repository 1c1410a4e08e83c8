pub mod api_error;
pub mod cancel;
pub mod clock;
pub mod services;

use serde::Serialize;

pub use api_error::ApiError;
pub use cancel::CancelSignal;
pub use clock::{Clock, ManualClock, SystemClock};
pub use services::{AvailabilityService, BookingService, PaymentService, ServiceResult};

/// Closed error taxonomy surfaced to the UI layer.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Local, pre-network. Never retried.
    Validation,
    /// A collaborator answered with an error or could not be reached.
    Service,
    /// The optional payment poll ceiling was exceeded.
    Timeout,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "VALIDATION_ERROR"),
            ErrorKind::Service => write!(f, "SERVICE_ERROR"),
            ErrorKind::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FlowError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FlowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Service,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }
}

impl From<ApiError> for FlowError {
    fn from(err: ApiError) -> Self {
        FlowError::service(err.message)
    }
}

pub type FlowResult<T> = Result<T, FlowError>;
