#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Failures surfaced by the gateway and the workflows built on top of it.
/// Every variant is recoverable by the user retrying.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Malformed or empty input caught before any network call.
    #[error("{0}")]
    Validation(String),

    /// Credentials rejected, or the stored token is no longer accepted.
    #[error("Authentication failed: {}", .0.as_deref().unwrap_or("credentials were rejected"))]
    Authentication(Option<String>),

    /// No response reached the client, including timeouts.
    #[error("Backend unreachable: {0}")]
    Transport(String),

    /// The backend answered with a failure status.
    #[error("Backend failed with status {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Backend { status: u16, detail: Option<String> },

    /// The request could not be built before sending.
    #[error("Request could not be prepared: {0}")]
    Setup(String),

    /// An operation of the same kind is already in flight.
    #[error("{0}")]
    Busy(String),
}

impl ClientError {
    pub fn is_authentication(&self) -> bool {
        return matches!(self, ClientError::Authentication(_));
    }

    /// Text shown to the user. Backend detail is passed through verbatim when
    /// the backend supplied one, otherwise `fallback` is used.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation(msg) | ClientError::Busy(msg) => return msg.to_string(),
            ClientError::Authentication(Some(detail)) => return detail.to_string(),
            ClientError::Authentication(None) => {
                return "Your session is no longer valid. Please log in again.".to_string();
            }
            ClientError::Transport(_) => {
                return "Backend unreachable. Make sure the server is running and try again."
                    .to_string();
            }
            ClientError::Backend {
                detail: Some(detail),
                ..
            } => return detail.to_string(),
            ClientError::Backend { detail: None, .. } | ClientError::Setup(_) => {
                return fallback.to_string();
            }
        }
    }
}
