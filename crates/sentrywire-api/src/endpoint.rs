// Request-building capability shared by the resource handlers.
//
// An `Endpoint` is a borrowed client plus the resource's base path. It
// attaches the session token in the place the appliance expects it
// (`rest_token` query parameter, JSON body field or multipart text part)
// and writes binary answers to disk.

use std::path::{Path, PathBuf};

use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::client::{Client, FormPart, Payload, Request};
use crate::error::Error;

const TOKEN_PARAM: &str = "rest_token";

/// Outcome of a file download.
#[derive(Debug, Clone, PartialEq)]
pub enum Download {
    /// Binary content was written to `path`.
    Saved { path: PathBuf, bytes: u64 },
    /// The appliance answered with JSON instead; nothing was written.
    Message(Value),
}

impl Download {
    pub fn saved_path(&self) -> Option<&Path> {
        match self {
            Self::Saved { path, .. } => Some(path),
            Self::Message(_) => None,
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Endpoint<'a> {
    client: &'a Client,
    path: &'static str,
}

impl<'a> Endpoint<'a> {
    pub(crate) fn new(client: &'a Client, path: &'static str) -> Self {
        Self { client, path }
    }

    pub(crate) fn client(&self) -> &'a Client {
        self.client
    }

    fn full_path(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.path)
    }

    /// Query pairs with the token first. An absent token is left out and
    /// the appliance rejects the call.
    fn authed_query(&self, params: &[(&str, String)]) -> Vec<(String, String)> {
        self.client
            .token_value()
            .map(|token| (TOKEN_PARAM.to_owned(), token))
            .into_iter()
            .chain(params.iter().map(|(k, v)| ((*k).to_owned(), v.clone())))
            .collect()
    }

    /// JSON body with the token field. An absent token is sent as `null`.
    fn authed_body(&self, mut fields: Map<String, Value>) -> Value {
        let token = self.client.token_value().map_or(Value::Null, Value::String);
        fields.insert(TOKEN_PARAM.to_owned(), token);
        Value::Object(fields)
    }

    pub(crate) async fn get(&self, suffix: &str, params: &[(&str, String)]) -> Result<Payload, Error> {
        let request =
            Request::new(Method::GET, self.full_path(suffix)).query_pairs(self.authed_query(params));
        self.client.send(request).await
    }

    pub(crate) async fn put(&self, suffix: &str, params: &[(&str, String)]) -> Result<Payload, Error> {
        let request =
            Request::new(Method::PUT, self.full_path(suffix)).query_pairs(self.authed_query(params));
        self.client.send(request).await
    }

    pub(crate) async fn delete(
        &self,
        suffix: &str,
        params: &[(&str, String)],
    ) -> Result<Payload, Error> {
        let request = Request::new(Method::DELETE, self.full_path(suffix))
            .query_pairs(self.authed_query(params));
        self.client.send(request).await
    }

    pub(crate) async fn post(&self, suffix: &str, fields: Map<String, Value>) -> Result<Payload, Error> {
        let request = Request::new(Method::POST, self.full_path(suffix)).json(self.authed_body(fields));
        self.client.send(request).await
    }

    /// Multipart upload of one file under `part_name`, token as a text part.
    pub(crate) async fn upload(&self, part_name: &str, file: &Path) -> Result<Payload, Error> {
        let content = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(file = %file.display(), bytes = content.len(), "uploading");

        let mut parts = Vec::with_capacity(2);
        if let Some(token) = self.client.token_value() {
            parts.push(FormPart::Text {
                name: TOKEN_PARAM.to_owned(),
                value: token,
            });
        }
        parts.push(FormPart::File {
            name: part_name.to_owned(),
            file_name,
            content: content.into(),
        });

        let request = Request::new(Method::POST, self.full_path("")).multipart(parts);
        self.client.send(request).await
    }

    /// GET and hand the answer to [`save`].
    pub(crate) async fn download(
        &self,
        suffix: &str,
        params: &[(&str, String)],
        dest: &Path,
    ) -> Result<Download, Error> {
        let payload = self.get(suffix, params).await?;
        save(payload, dest).await
    }
}

/// Write a raw answer to `dest`, or surface a JSON answer untouched.
pub(crate) async fn save(payload: Payload, dest: &Path) -> Result<Download, Error> {
    match payload {
        Payload::Json(value) => {
            debug!(dest = %dest.display(), "server answered with JSON, nothing written");
            Ok(Download::Message(value))
        }
        Payload::Raw(raw) => {
            tokio::fs::write(dest, &raw.body).await?;
            let bytes = u64::try_from(raw.body.len()).unwrap_or(u64::MAX);
            info!(dest = %dest.display(), bytes, "download saved");
            Ok(Download::Saved {
                path: dest.to_path_buf(),
                bytes,
            })
        }
    }
}

/// Build a JSON object from field pairs.
pub(crate) fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

/// Some list endpoints answer a single object instead of a one-element list.
pub(crate) fn one_or_many(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        Value::Null => Value::Array(Vec::new()),
        other => Value::Array(vec![other]),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;

    fn client() -> Client {
        Client::from_base_url(reqwest::Client::new(), "https://h:41395/v2").unwrap()
    }

    #[test]
    fn token_goes_first_in_query() {
        let client = client().with_token(SecretString::from("tok".to_owned()));
        let endpoint = Endpoint::new(&client, "/activetriggers");
        let query = endpoint.authed_query(&[("trigger_name", "t1".into())]);
        assert_eq!(
            query,
            vec![
                ("rest_token".to_owned(), "tok".to_owned()),
                ("trigger_name".to_owned(), "t1".to_owned()),
            ]
        );
    }

    #[test]
    fn missing_token_is_omitted_from_query_and_null_in_body() {
        let client = client();
        let endpoint = Endpoint::new(&client, "/fmgroup");
        assert!(endpoint.authed_query(&[]).is_empty());
        let body = endpoint.authed_body(fields([("group_name", json!("g1"))]));
        assert_eq!(body, json!({"group_name": "g1", "rest_token": null}));
    }

    #[test]
    fn one_or_many_wraps_objects() {
        assert_eq!(one_or_many(json!({"a": 1})), json!([{"a": 1}]));
        assert_eq!(one_or_many(json!([1, 2])), json!([1, 2]));
        assert_eq!(one_or_many(Value::Null), json!([]));
    }
}
