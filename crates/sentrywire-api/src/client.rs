// SentryWire REST client: request pipeline.
//
// Builds `{scheme}://{host}:{port}/v{version}{path}` URLs, serializes the
// body, retries transient statuses, maps failures onto `Error` and
// normalizes successful responses into JSON or raw bytes. Resource
// handlers live in their own modules and reach the pipeline through
// `Endpoint`.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::transport::TransportConfig;

/// Port the appliance serves its REST API on.
pub const DEFAULT_PORT: u16 = 41395;

/// REST API version prefix (`/v2`).
pub const DEFAULT_API_VERSION: &str = "2";

// ── Configuration ────────────────────────────────────────────────────

/// Everything needed to build a [`Client`] besides the host.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub port: u16,
    pub api_version: String,
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_version: DEFAULT_API_VERSION.to_owned(),
            transport: TransportConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Build the versioned API base URL for a host.
///
/// A bare host gets `https://`. The port always comes from `port`: a host
/// that names its own port is rejected rather than silently overridden.
pub fn api_base_url(host: &str, port: u16, api_version: &str) -> Result<Url, Error> {
    let invalid = |reason: &str| Error::InvalidHost {
        host: host.to_owned(),
        reason: reason.to_owned(),
    };

    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(invalid("host is empty"));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;
    if url.port().is_some() {
        return Err(invalid("specify a non-default port through the port setting"));
    }
    if url.path() != "/" {
        return Err(invalid("host must not include a path"));
    }
    url.set_port(Some(port))
        .map_err(|()| invalid("URL scheme cannot carry a port"))?;
    url.set_path(&format!("/v{api_version}"));
    Ok(url)
}

// ── Request descriptor ───────────────────────────────────────────────

/// One part of a multipart upload.
#[derive(Debug, Clone)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content: Bytes,
    },
}

/// Request body. The variants are mutually exclusive on the wire.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    Raw(Bytes),
    Multipart(Vec<FormPart>),
}

/// A request against the versioned API.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Body,
    timeout: Option<Duration>,
    retry_transient: Option<bool>,
}

impl Request {
    /// `path` is relative to the versioned base and must start with `/`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
            timeout: None,
            retry_transient: None,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn raw(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Raw(body.into());
        self
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Body::Multipart(parts);
        self
    }

    /// Per-call timeout replacing the client default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Per-call override of the client's retry switch.
    pub fn retry_transient(mut self, enabled: bool) -> Self {
        self.retry_transient = Some(enabled);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

// ── Response ─────────────────────────────────────────────────────────

/// A successful response that did not declare a JSON body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// A normalized successful response.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Raw(RawResponse),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Raw(_) => None,
        }
    }

    /// JSON value of the response. Some endpoints answer JSON without
    /// declaring it, so raw bodies are parsed too; an empty body is `null`.
    pub fn into_json(self) -> Result<Value, Error> {
        match self {
            Self::Json(v) => Ok(v),
            Self::Raw(raw) => parse_json(&raw.body),
        }
    }

    /// Deserialize the response into `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        let value = self.into_json()?;
        T::deserialize(&value).map_err(|e| Error::deserialization(&e, value.to_string().as_bytes()))
    }
}

fn parse_json(body: &[u8]) -> Result<Value, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| Error::deserialization(&e, body))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Pull a human-readable message out of an error body.
///
/// The first of `message`, `error`, `msg` present in a JSON object wins;
/// otherwise the raw body text; `None` for an empty body.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        let found = ["message", "error", "msg"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|v| !v.is_null());
        if let Some(value) = found {
            return Some(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_owned();
    (!text.is_empty()).then_some(text)
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one SentryWire appliance.
///
/// Holds the connection pool, the versioned base URL, the retry policy and
/// at most one session token. Calls run one at a time from the caller's
/// point of view; there is no background work.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
    token: RwLock<Option<SecretString>>,
}

impl Client {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `host` (bare name/IP or `scheme://host`).
    pub fn new(host: &str, config: &ClientConfig) -> Result<Self, Error> {
        let base_url = api_base_url(host, config.port, &config.api_version)?;
        let http = config.transport.build_client()?;
        Ok(Self::with_client(http, base_url, config.retry.clone()))
    }

    /// Wrap a pre-built `reqwest::Client` and an already versioned base URL.
    pub fn with_client(http: reqwest::Client, base_url: Url, retry: RetryPolicy) -> Self {
        Self {
            http,
            base_url,
            retry,
            token: RwLock::new(None),
        }
    }

    /// Parse `base_url` (e.g. `http://127.0.0.1:8080/v2`) and wrap `http`.
    pub fn from_base_url(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self::with_client(http, base_url, RetryPolicy::default()))
    }

    /// Start with a token issued elsewhere.
    pub fn with_token(self, token: SecretString) -> Self {
        self.set_token(Some(token));
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The versioned API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// The current session token.
    pub fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace (or clear) the session token.
    pub fn set_token(&self, token: Option<SecretString>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Plain token value for the `rest_token` parameter.
    pub(crate) fn token_value(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.expose_secret().to_owned())
    }

    /// Full URL for a path relative to the versioned base.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        if !path.starts_with('/') {
            return Err(Error::InvalidPath(path.to_owned()));
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Verbs ────────────────────────────────────────────────────────

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Payload, Error> {
        self.send(Request::new(Method::GET, path).query_pairs(owned(query)))
            .await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Payload, Error> {
        self.send(Request::new(Method::POST, path).json(body)).await
    }

    pub async fn put(&self, path: &str, query: &[(&str, String)]) -> Result<Payload, Error> {
        self.send(Request::new(Method::PUT, path).query_pairs(owned(query)))
            .await
    }

    pub async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<Payload, Error> {
        self.send(Request::new(Method::DELETE, path).query_pairs(owned(query)))
            .await
    }

    // ── Pipeline ─────────────────────────────────────────────────────

    /// Send a request, retrying transient statuses per the retry policy.
    pub async fn send(&self, request: Request) -> Result<Payload, Error> {
        let url = self.url(&request.path)?;
        let retry_enabled = request.retry_transient.unwrap_or(self.retry.enabled);
        let mut attempt: u32 = 0;

        loop {
            debug!(method = %request.method, path = %request.path, attempt, "sending request");
            let resp = self.build(&request, url.clone()).send().await?;
            let status = resp.status();

            if status.is_success() {
                return normalize(resp).await;
            }

            if retry_enabled && self.retry.is_transient(status) && self.retry.allows(attempt) {
                let delay = self.retry.delay(attempt, resp.headers());
                attempt += 1;
                warn!(%status, attempt, ?delay, path = %request.path, "transient server error, retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            let body = resp.bytes().await?;
            let err = Error::from_status(status, error_message(&body));
            debug!(%status, error = %err, "request failed");
            return Err(err);
        }
    }

    fn build(&self, request: &Request, url: Url) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Raw(bytes) => builder
                .header(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/octet-stream"),
                )
                .body(bytes.clone()),
            Body::Multipart(parts) => builder.multipart(form(parts)),
        }
    }
}

fn owned(query: &[(&str, String)]) -> Vec<(String, String)> {
    query
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

fn form(parts: &[FormPart]) -> reqwest::multipart::Form {
    parts
        .iter()
        .fold(reqwest::multipart::Form::new(), |form, part| match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                file_name,
                content,
            } => form.part(
                name.clone(),
                reqwest::multipart::Part::bytes(content.to_vec()).file_name(file_name.clone()),
            ),
        })
}

async fn normalize(resp: reqwest::Response) -> Result<Payload, Error> {
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.bytes().await?;

    if is_json(&headers) {
        trace!(%status, bytes = body.len(), "json response");
        parse_json(&body).map(Payload::Json)
    } else {
        trace!(%status, bytes = body.len(), "raw response");
        Ok(Payload::Raw(RawResponse {
            status,
            headers,
            body,
        }))
    }
}
