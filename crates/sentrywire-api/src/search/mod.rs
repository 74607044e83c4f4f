// Search lifecycle (`/fmsearch`)
//
// A search is created with a time range and filter, runs on the appliance,
// and is polled until its status document carries a result. Result
// retrieval lives in `data`.
//
//   create ─▶ Pending ─(poll every interval)─▶ Completed ─▶ objects/pcaps/logs

mod data;

use std::time::Duration;

use chrono::NaiveDateTime;
use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::client::{Client, Payload};
use crate::endpoint::{Endpoint, fields, one_or_many};
use crate::error::Error;
use crate::models::{ApiMessage, SearchCreated, SearchSummary};

/// Packet cap when the caller does not set one.
pub const DEFAULT_MAX_PACKETS: u32 = 1000;

/// Time format the appliance expects for search bounds.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Request / state types ────────────────────────────────────────────

/// Parameters of a new search.
///
/// Times are in the appliance's clock. The filter grammar is
/// `bpf <bpf> logtext <text> payload <bytes> extends <more>`, where every
/// keyword is optional; `None` lets the appliance apply its default.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub name: String,
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
    pub filter: Option<String>,
    pub max_packets: u32,
}

impl SearchRequest {
    pub fn new(name: impl Into<String>, begin: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            begin,
            end,
            filter: None,
            max_packets: DEFAULT_MAX_PACKETS,
        }
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn max_packets(mut self, max_packets: u32) -> Self {
        self.max_packets = max_packets;
        self
    }
}

/// Classified search status.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    /// The status document carries `SearchStatus`.
    Pending { status: String },
    /// The status document carries `SearchResult` and no `SearchStatus`.
    Completed { result: Value },
}

impl SearchState {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Classify a status answer against the known shapes.
///
/// Accepted: an object, or a one-element list holding an object. Anything
/// else, or an object with neither key, is [`Error::UnexpectedSearchState`].
pub fn classify_status(value: Value) -> Result<SearchState, Error> {
    let document = match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    };

    if let Value::Object(map) = &document {
        if let Some(status) = map.get("SearchStatus") {
            let status = match status {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Ok(SearchState::Pending { status });
        }
        if let Some(result) = map.get("SearchResult") {
            return Ok(SearchState::Completed {
                result: result.clone(),
            });
        }
    }

    Err(Error::UnexpectedSearchState {
        body: document.to_string(),
    })
}

/// Status polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between status queries.
    pub interval: Duration,
    /// Give up after this long. `None` polls until the search completes.
    pub timeout: Option<Duration>,
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: None,
        }
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub struct Searches<'a> {
    endpoint: Endpoint<'a>,
}

impl Client {
    pub fn searches(&self) -> Searches<'_> {
        Searches {
            endpoint: Endpoint::new(self, "/fmsearch"),
        }
    }
}

impl Searches<'_> {
    /// Start a search. The returned name identifies it from then on.
    pub async fn create(&self, request: &SearchRequest) -> Result<SearchCreated, Error> {
        debug!(name = %request.name, begin = %request.begin, end = %request.end, "creating search");
        self.endpoint
            .post(
                "",
                fields([
                    ("search_name", json!(request.name)),
                    ("search_filter", json!(request.filter)),
                    ("begin_time", json!(request.begin.format(TIME_FORMAT).to_string())),
                    ("end_time", json!(request.end.format(TIME_FORMAT).to_string())),
                    ("max_packets", json!(request.max_packets)),
                ]),
            )
            .await?
            .json()
    }

    /// Remove a search. The appliance exposes deletion as a GET on the
    /// collection with `searchname`.
    pub async fn delete(&self, search: &str) -> Result<ApiMessage, Error> {
        self.endpoint
            .get("", &[("searchname", search.to_owned())])
            .await?
            .json()
    }

    pub async fn status(&self, node: &str, search: &str) -> Result<SearchState, Error> {
        let value = self
            .endpoint
            .get(
                "/status",
                &[
                    ("searchname", search.to_owned()),
                    ("nodename", node.to_owned()),
                ],
            )
            .await?
            .into_json()?;
        classify_status(value)
    }

    /// Searches still running; `count == 0` lists all of them.
    pub async fn pending(&self, count: u32) -> Result<Vec<SearchSummary>, Error> {
        let value = self
            .endpoint
            .get("/pending", &[("count", count.to_string())])
            .await?
            .into_json()?;
        if is_empty(&value) {
            return Err(Error::not_found("no pending searches found"));
        }
        Payload::Json(one_or_many(value)).json()
    }

    /// Finished searches; `count == 0` lists all of them.
    pub async fn completed(&self, count: u32) -> Result<Vec<SearchSummary>, Error> {
        let value = self
            .endpoint
            .get("/completed", &[("count", count.to_string())])
            .await?
            .into_json()?;
        if is_empty(&value) {
            return Ok(Vec::new());
        }
        Payload::Json(one_or_many(value)).json()
    }

    /// Poll [`status`](Self::status) until the search completes and return
    /// its `SearchResult`.
    pub async fn wait_for_completion(
        &self,
        node: &str,
        search: &str,
        poll: &PollConfig,
    ) -> Result<Value, Error> {
        let started = Instant::now();
        loop {
            match self.status(node, search).await? {
                SearchState::Completed { result } => {
                    info!(search, elapsed = ?started.elapsed(), "search completed");
                    return Ok(result);
                }
                SearchState::Pending { status } => {
                    let elapsed = started.elapsed();
                    let pause = match poll.timeout {
                        Some(limit) if elapsed >= limit => {
                            return Err(Error::PollTimeout {
                                search: search.to_owned(),
                                elapsed,
                            });
                        }
                        // Never sleep past the deadline.
                        Some(limit) => poll.interval.min(limit - elapsed),
                        None => poll.interval,
                    };
                    debug!(search, %status, ?elapsed, "search pending");
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
