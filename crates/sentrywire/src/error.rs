//! What the CLI reports when a command fails, and the exit code it leaves.
//!
//! Library errors are folded into the few cases an operator acts on
//! differently: unreachable appliance, rejected login, missing search or
//! object, busy appliance, bad input.

use miette::Diagnostic;
use thiserror::Error;

use sentrywire_api::Error as ApiError;

/// Exit statuses; 6 is unused.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const BUSY: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Could not connect to appliance at {url}")]
    #[diagnostic(
        code(sentrywire::connection_failed),
        help(
            "Check that the appliance is reachable and serving its REST API.\n\
             URL: {url}\n\
             Try: sentrywire status --insecure"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: ApiError,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(sentrywire::tls_error),
        help(
            "Appliances usually ship a self-signed certificate.\n\
             Accept it with --insecure (-k) or point ca_cert at its CA in the profile."
        )
    )]
    Tls { message: String },

    #[error("Login rejected: {message}")]
    #[diagnostic(
        code(sentrywire::auth_failed),
        help(
            "Verify the username and password for profile '{profile}'.\n\
             Set SW_USERNAME / SW_PASSWORD or pass --username / --password."
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("Missing username or password for profile '{profile}'")]
    #[diagnostic(
        code(sentrywire::no_credentials),
        help("Set SW_USERNAME and SW_PASSWORD, or add username to the profile.")
    )]
    NoCredentials { profile: String },

    #[error("No appliance configured")]
    #[diagnostic(
        code(sentrywire::no_target),
        help(
            "Pass --target, set TARGET, or add a profile with a target to\n\
             {path}"
        )
    )]
    NoTarget { path: String },

    #[error("Unknown profile '{name}'")]
    #[diagnostic(
        code(sentrywire::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Unreadable configuration: {0}")]
    #[diagnostic(code(sentrywire::config), help("Run `sentrywire config path` to locate the file."))]
    Config(Box<figment::Error>),

    #[error("Not found: {message}")]
    #[diagnostic(code(sentrywire::not_found))]
    NotFound { message: String },

    #[error("Appliance is busy: {message}")]
    #[diagnostic(
        code(sentrywire::busy),
        help("Wait for running searches to finish, or retry with --retries.")
    )]
    Busy { message: String },

    #[error(transparent)]
    #[diagnostic(code(sentrywire::api_error))]
    Api(ApiError),

    #[error("{failed} of {total} {what} failed")]
    #[diagnostic(code(sentrywire::partial_failure))]
    Partial {
        what: &'static str,
        failed: usize,
        total: usize,
    },

    #[error("Bad {field}: {reason}")]
    #[diagnostic(code(sentrywire::validation))]
    Validation { field: String, reason: String },

    #[error("Refusing to run '{action}' without confirmation")]
    #[diagnostic(
        code(sentrywire::confirmation_required),
        help("Pass --yes (-y) when running from a script.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(sentrywire::timeout),
        help("Increase the timeout with --timeout or check appliance load.")
    )]
    Timeout {
        #[source]
        source: ApiError,
    },

    #[error("Search '{search}' still pending after {seconds}s")]
    #[diagnostic(
        code(sentrywire::search_pending),
        help("Raise --deadline, or check progress with: sentrywire search pending")
    )]
    SearchPending { search: String, seconds: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    #[diagnostic(code(sentrywire::json), help("Trigger files hold a JSON array of trigger objects."))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Status `main` exits with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Tls { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Busy { .. } => exit_code::BUSY,
            Self::Timeout { .. } | Self::SearchPending { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::NoTarget { .. }
            | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

/// The appliance's own wording when it sent any.
fn server_text(err: &ApiError) -> String {
    err.server_message()
        .map_or_else(|| err.to_string(), ToOwned::to_owned)
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidAuthentication { .. } => Self::AuthFailed {
                profile: "(session)".into(),
                message: server_text(&err),
            },
            ApiError::NotFound { .. } => Self::NotFound {
                message: server_text(&err),
            },
            ApiError::TooManyRequests { .. } => Self::Busy {
                message: server_text(&err),
            },
            ApiError::PollTimeout { search, elapsed } => Self::SearchPending {
                search,
                seconds: elapsed.as_secs(),
            },
            ApiError::Tls(message) => Self::Tls { message },
            ApiError::InvalidHost { host, reason } => Self::Validation {
                field: "target".into(),
                reason: format!("{host}: {reason}"),
            },
            ApiError::Transport(ref e) if e.is_timeout() => Self::Timeout { source: err },
            ApiError::Transport(ref e) if e.is_connect() => Self::ConnectionFailed {
                url: e.url().map(ToString::to_string).unwrap_or_default(),
                source: err,
            },
            other => Self::Api(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn api_errors_map_to_exit_codes() {
        let cases = [
            (
                ApiError::InvalidAuthentication {
                    status: 401,
                    message: None,
                },
                exit_code::AUTH,
            ),
            (
                ApiError::NotFound {
                    message: Some("no pcaps found".into()),
                },
                exit_code::NOT_FOUND,
            ),
            (
                ApiError::TooManyRequests { message: None },
                exit_code::BUSY,
            ),
            (
                ApiError::PollTimeout {
                    search: "s1".into(),
                    elapsed: Duration::from_secs(90),
                },
                exit_code::TIMEOUT,
            ),
            (
                ApiError::InvalidHost {
                    host: "h:1".into(),
                    reason: "port".into(),
                },
                exit_code::USAGE,
            ),
            (ApiError::Server { message: None }, exit_code::GENERAL),
        ];

        for (err, code) in cases {
            let label = format!("{err:?}");
            assert_eq!(CliError::from(err).exit_code(), code, "{label}");
        }
    }

    #[test]
    fn not_found_keeps_server_message() {
        let err = CliError::from(ApiError::NotFound {
            message: Some("log not found".into()),
        });
        assert_eq!(err.to_string(), "Not found: log not found");
    }
}
