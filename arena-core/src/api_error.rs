use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized error envelope returned by every collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("{error} ({error_type}): {message}")]
pub struct ApiError {
    pub error: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// HTTP status the envelope arrived with, when there was one.
    #[serde(skip)]
    pub status: Option<u16>,
}

impl ApiError {
    /// Generic envelope used when the body is missing, not JSON, or not the expected shape.
    pub fn fallback(domain: &str, status: Option<u16>) -> Self {
        let error_type = match status {
            None => "NETWORK_ERROR",
            Some(400) => "BAD_REQUEST",
            Some(401) => "UNAUTHORIZED",
            Some(403) => "FORBIDDEN",
            Some(404) => "NOT_FOUND",
            Some(409) => "CONFLICT",
            Some(s) if s >= 500 => "SERVER_ERROR",
            Some(_) => "HTTP_ERROR",
        };
        let message = match status {
            Some(s) => format!(
                "{} service request failed with status {}",
                domain.to_lowercase(),
                s
            ),
            None => format!("{} service could not be reached", domain.to_lowercase()),
        };

        Self {
            error: format!("{}_API_ERROR", domain.to_uppercase()),
            error_type: error_type.to_string(),
            message,
            timestamp: Utc::now(),
            status,
        }
    }

    /// Parse an error body, falling back to the generic envelope.
    pub fn normalize(domain: &str, status: Option<u16>, body: &str) -> Self {
        match serde_json::from_str::<ApiError>(body) {
            Ok(mut parsed) => {
                parsed.status = status;
                parsed
            }
            Err(_) => {
                tracing::debug!("Unparseable {} error body (status {:?})", domain, status);
                Self::fallback(domain, status)
            }
        }
    }

    /// Transport failure with a known cause (timeout, refused connection, bad 2xx body).
    pub fn transport(domain: &str, cause: impl std::fmt::Display) -> Self {
        let mut err = Self::fallback(domain, None);
        err.message = format!("{}: {}", err.message, cause);
        err
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404) || self.error_type == "NOT_FOUND"
    }
}
