//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use coursedesk_config::ConfigError;
use coursedesk_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the admin API")]
    #[diagnostic(
        code(coursedesk::connection_failed),
        help(
            "Check that the API is running and the URL is right.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k)."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(coursedesk::timeout),
        help("Increase the timeout with --timeout or check the API's responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not logged in")]
    #[diagnostic(
        code(coursedesk::not_logged_in),
        help("Run: coursedesk login\nOr set COURSEDESK_TOKEN for a single run.")
    )]
    NotLoggedIn,

    #[error("The API rejected the token: {message}")]
    #[diagnostic(
        code(coursedesk::auth_failed),
        help("The token may have expired. Run: coursedesk login")
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(coursedesk::not_found),
        help("Run: coursedesk {list_command} to see what exists")
    )]
    NotFound {
        message: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(coursedesk::api_error), help("HTTP status {status}"))]
    ApiError { status: u16, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(coursedesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(coursedesk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: coursedesk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API URL configured")]
    #[diagnostic(
        code(coursedesk::no_config),
        help(
            "Create a profile with: coursedesk config init\n\
             Or pass --api-url. Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("{0}")]
    #[diagnostic(code(coursedesk::config))]
    Config(String),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(coursedesk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(coursedesk::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Unexpected response shape: {0}")]
    #[diagnostic(code(coursedesk::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotLoggedIn | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unauthenticated => CliError::NotLoggedIn,

            CoreError::Http {
                status: 401 | 403,
                message,
            } => CliError::AuthFailed { message },

            CoreError::Http {
                status: 404,
                message,
            } => CliError::NotFound {
                message,
                list_command: "<users|subjects|tasks> list".into(),
            },

            CoreError::Http { status, message } => CliError::ApiError { status, message },

            CoreError::Network { reason } => CliError::ConnectionFailed { reason },

            CoreError::Timeout => CliError::Timeout,

            CoreError::InvalidToken(token) => CliError::Validation {
                field: "id".into(),
                reason: format!("'{token}' is neither a numeric id nor a route token"),
            },

            CoreError::InvalidInput(reason) => CliError::Validation {
                field: "input".into(),
                reason,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "form".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Config(message),

            CoreError::InvalidState(message) | CoreError::Internal(message) => {
                CliError::Internal(message)
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile(name) => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let cases = [
            (CoreError::Unauthenticated, exit_code::AUTH),
            (
                CoreError::Http {
                    status: 401,
                    message: "bad token".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::Http {
                    status: 404,
                    message: "Task not found".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::Http {
                    status: 422,
                    message: "Validation failed".into(),
                },
                exit_code::GENERAL,
            ),
            (
                CoreError::Network {
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (CoreError::Timeout, exit_code::TIMEOUT),
            (CoreError::InvalidToken("x".into()), exit_code::USAGE),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn api_messages_are_shown_verbatim() {
        let err = CliError::from(CoreError::Http {
            status: 422,
            message: "Validation failed".into(),
        });
        assert_eq!(err.to_string(), "Validation failed");
    }
}
