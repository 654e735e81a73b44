use std::time::Duration;

use thiserror::Error;

/// Failure of one logical request after the retry policy has been applied.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out after {attempts} attempt(s) ({}ms per attempt)", timeout.as_millis())]
    Timeout { attempts: u32, timeout: Duration },

    #[error("{message} (HTTP {status}, {attempts} attempt(s))")]
    Status {
        status: u16,
        message: String,
        attempts: u32,
    },

    #[error("network error after {attempts} attempt(s): {reason}")]
    Unreachable { attempts: u32, reason: String },

    #[error("malformed response body: {reason}")]
    MalformedBody { reason: String },

    #[error("authentication required, please login first")]
    AuthRequired,

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ClientError::Timeout { attempts, .. }
            | ClientError::Status { attempts, .. }
            | ClientError::Unreachable { attempts, .. } => *attempts,
            ClientError::MalformedBody { .. } => 1,
            ClientError::AuthRequired | ClientError::InvalidUrl { .. } => 0,
        }
    }

    /// Short user-facing text, without attempt bookkeeping.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Timeout { .. } => "Request timeout. Please try again.".to_string(),
            ClientError::Status { message, .. } => message.clone(),
            ClientError::Unreachable { .. } => {
                "Network error. Please check your internet connection.".to_string()
            }
            ClientError::MalformedBody { .. } => {
                "Unexpected response from server.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Fallback text used when the server does not explain a failed status.
pub fn generic_status_message(status: u16) -> String {
    match status {
        401 => "Session expired. Please login again.".to_string(),
        403 => "You do not have permission to perform this action.".to_string(),
        404 => "Resource not found.".to_string(),
        429 => "Too many requests. Please try again later.".to_string(),
        s if s >= 500 => "Server error. Please try again later.".to_string(),
        s => format!("HTTP {s}"),
    }
}
