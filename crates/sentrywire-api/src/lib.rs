// sentrywire-api: Async Rust client for the SentryWire capture appliance REST API

mod auth;
pub mod client;
mod endpoint;
pub mod error;
pub mod federation;
pub mod models;
pub mod precapture;
pub mod retry;
pub mod roles;
pub mod rules;
pub mod search;
pub mod server;
pub mod transport;
pub mod triggers;

pub use client::{
    Body, Client, ClientConfig, DEFAULT_API_VERSION, DEFAULT_PORT, FormPart, Payload, RawResponse,
    Request, api_base_url,
};
pub use endpoint::Download;
pub use error::{Error, ErrorKind};
pub use retry::{MaxRetries, RetryPolicy};
pub use roles::Permission;
pub use rules::RuleSetState;
pub use search::{PollConfig, SearchRequest, SearchState};
pub use transport::{TlsMode, TransportConfig};
