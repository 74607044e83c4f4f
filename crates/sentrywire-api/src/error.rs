use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Top-level error type for the `sentrywire-api` crate.
///
/// Server-reported failures carry the message the appliance put in its
/// response body (when it sent one). Local precondition, parsing and archive
/// failures never reach the network or happen after the exchange succeeded.
/// [`Error::kind`] folds the variants onto the coarse taxonomy callers
/// usually branch on.
#[derive(Debug, Error)]
pub enum Error {
    // ── Server-reported (mapped from HTTP status) ───────────────────
    /// HTTP 400: parameters are invalid or missing.
    #[error("Invalid parameters: {}", describe(.message.as_deref()))]
    InvalidParameters { message: Option<String> },

    /// HTTP 401 / 403: the session token is missing, bad or expired.
    #[error("Invalid authentication (HTTP {status}): {}", describe(.message.as_deref()))]
    InvalidAuthentication {
        status: u16,
        message: Option<String>,
    },

    /// HTTP 404, or a "nothing there" answer detected by the client.
    #[error("Not found: {}", describe(.message.as_deref()))]
    NotFound { message: Option<String> },

    /// HTTP 429: the appliance is full or busy.
    #[error("Too many requests: {}", describe(.message.as_deref()))]
    TooManyRequests { message: Option<String> },

    /// HTTP 500.
    #[error("Server error: {}", describe(.message.as_deref()))]
    Server { message: Option<String> },

    /// Any other non-2xx status.
    #[error("API error (HTTP {status}): {}", describe(.message.as_deref()))]
    Api {
        status: u16,
        message: Option<String>,
    },

    // ── Local preconditions ─────────────────────────────────────────
    /// Logout was requested but no token was given or held.
    #[error("No rest token to invalidate")]
    MissingToken,

    /// Request paths are relative to the versioned base URL.
    #[error("Path must start with '/': {0}")]
    InvalidPath(String),

    /// The target host could not be turned into a base URL.
    #[error("Invalid host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    // ── Response interpretation ─────────────────────────────────────
    /// A JSON body (or a body that had to be JSON) failed to parse.
    #[error("Failed to parse the server message: {message}")]
    Deserialization { message: String, body: String },

    /// A search status answer matched none of the known shapes.
    #[error("Unexpected search state: {body}")]
    UnexpectedSearchState { body: String },

    /// A zip payload was corrupt or lacked the expected member.
    #[error("Error in server archive: {0}")]
    Archive(String),

    /// The caller-supplied polling deadline passed before completion.
    #[error("Search {search} still pending after {elapsed:?}")]
    PollTimeout { search: String, elapsed: Duration },

    // ── Transport / local I/O ───────────────────────────────────────
    /// HTTP transport error (connection refused, DNS, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Reading an upload or writing a download failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error taxonomy, one entry per class the appliance distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParameters,
    InvalidAuthentication,
    NotFound,
    TooManyRequests,
    ServerError,
    /// Unmapped status codes, local preconditions, parse and archive failures.
    Client,
    /// The request never produced an HTTP status.
    Transport,
}

fn describe(message: Option<&str>) -> &str {
    message.unwrap_or("no message from server")
}

impl Error {
    /// Build the error for a final non-2xx status.
    ///
    /// 400 → invalid parameters, 401/403 → invalid authentication,
    /// 404 → not found, 429 → too many requests, 500 → server error,
    /// anything else → [`Error::Api`].
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status.as_u16() {
            400 => Self::InvalidParameters { message },
            code @ (401 | 403) => Self::InvalidAuthentication {
                status: code,
                message,
            },
            404 => Self::NotFound { message },
            429 => Self::TooManyRequests { message },
            500 => Self::Server { message },
            code => Self::Api {
                status: code,
                message,
            },
        }
    }

    pub(crate) fn not_found(message: &str) -> Self {
        Self::NotFound {
            message: Some(message.to_owned()),
        }
    }

    pub(crate) fn deserialization(err: &serde_json::Error, body: &[u8]) -> Self {
        let body = String::from_utf8_lossy(body).into_owned();
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }

    /// Project onto the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameters { .. } => ErrorKind::InvalidParameters,
            Self::InvalidAuthentication { .. } => ErrorKind::InvalidAuthentication,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TooManyRequests { .. } => ErrorKind::TooManyRequests,
            Self::Server { .. } => ErrorKind::ServerError,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Api { .. }
            | Self::MissingToken
            | Self::InvalidPath(_)
            | Self::InvalidHost { .. }
            | Self::Deserialization { .. }
            | Self::UnexpectedSearchState { .. }
            | Self::Archive(_)
            | Self::PollTimeout { .. }
            | Self::InvalidUrl(_)
            | Self::Tls(_)
            | Self::Io(_) => ErrorKind::Client,
        }
    }

    /// The HTTP status behind a server-reported error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidParameters { .. } => Some(400),
            Self::InvalidAuthentication { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::TooManyRequests { .. } => Some(429),
            Self::Server { .. } => Some(500),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The server's message, if the error came with one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::InvalidParameters { message }
            | Self::InvalidAuthentication { message, .. }
            | Self::NotFound { message }
            | Self::TooManyRequests { message }
            | Self::Server { message }
            | Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::InvalidAuthentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::TooManyRequests { .. } => true,
            Self::Api { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}
