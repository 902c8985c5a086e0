use thiserror::Error;

/// Top-level error type for the `coursedesk-api` crate.
///
/// Covers every failure mode of the admin API surface: missing session,
/// transport, non-2xx responses, malformed bodies, and token storage.
/// `coursedesk-core` maps these into user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// No bearer token is held by the session. Raised before any request
    /// is sent.
    #[error("Not authenticated -- log in first")]
    Unauthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx response. `message` is the server's `message` field when the
    /// body carried one, otherwise `HTTP error {status}`.
    #[error("{message}")]
    Http { status: u16, message: String },

    // ── Input ───────────────────────────────────────────────────────
    /// Caller handed us something unusable (empty endpoint, bad token).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Storage ─────────────────────────────────────────────────────
    /// Durable token storage failed to read, write, or clear.
    #[error("Token storage error: {0}")]
    TokenStorage(String),
}

impl Error {
    /// Returns `true` if logging in again might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::Http { status: 401, .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// HTTP status of the failed response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
