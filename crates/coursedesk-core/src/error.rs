// ── Core error types ──
//
// User-facing errors from coursedesk-core. Transport details stay inside
// coursedesk-api; the `From<coursedesk_api::Error>` impl translates them
// into domain-appropriate variants. Cloneable so the last error can live
// inside observable state.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Not authenticated -- log in first")]
    Unauthenticated,

    // ── Remote errors ────────────────────────────────────────────────
    /// Non-2xx response; `message` is shown verbatim.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The server could not be reached at all.
    #[error("Cannot reach server: {reason}")]
    Network { reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid entity token: {0}")]
    InvalidToken(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── State errors ─────────────────────────────────────────────────
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// Missing token or a token the server refused.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::Http { status: 401 | 403, .. }
        )
    }

    /// Remote failures, whether the server answered or not.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Network { .. } | Self::Timeout
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<coursedesk_api::Error> for CoreError {
    fn from(err: coursedesk_api::Error) -> Self {
        match err {
            coursedesk_api::Error::Unauthenticated => CoreError::Unauthenticated,
            coursedesk_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::Network {
                        reason: e.to_string(),
                    }
                }
            }
            coursedesk_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            coursedesk_api::Error::Tls(msg) => CoreError::Network {
                reason: format!("TLS error: {msg}"),
            },
            coursedesk_api::Error::Http { status, message } => CoreError::Http { status, message },
            coursedesk_api::Error::InvalidInput(msg) => CoreError::InvalidInput(msg),
            coursedesk_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            coursedesk_api::Error::TokenStorage(msg) => CoreError::Config {
                message: format!("Token storage: {msg}"),
            },
        }
    }
}
