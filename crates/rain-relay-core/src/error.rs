//! Shared error type across RAIN relay crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Payload too large.
    PayloadTooLarge,
    /// Unsupported protocol or config version.
    UnsupportedVersion,
    /// Connection closed for inactivity.
    Timeout,
    /// A collaborator (upstream, audit, license) is unavailable.
    Unavailable,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("upstream: {0}")]
    Upstream(String),
    #[error("audit: {0}")]
    Audit(String),
    #[error("license: {0}")]
    License(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl RelayError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            RelayError::BadRequest(_) => ClientCode::BadRequest,
            RelayError::PayloadTooLarge => ClientCode::PayloadTooLarge,
            RelayError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            RelayError::Upstream(_) | RelayError::Audit(_) | RelayError::License(_) => {
                ClientCode::Unavailable
            }
            RelayError::Internal(_) => ClientCode::Internal,
        }
    }
}
