// Appliance status (`/fmping`) and capture control (`/fmcapture`).

use serde_json::Value;
use strum::{AsRefStr, Display};
use tracing::debug;

use crate::client::{Client, Payload};
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::models::{ApiMessage, ServerStatus};

/// Top-level `/fmping` fields some firmware delivers as JSON text.
const NESTED_DOCUMENTS: [&str; 3] = ["ServerInfo", "FMNodes", "Groups"];

#[derive(Debug, Clone, Copy, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
enum CaptureAction {
    Pause,
    Resume,
}

pub struct Server<'a> {
    endpoint: Endpoint<'a>,
}

pub struct Capture<'a> {
    endpoint: Endpoint<'a>,
}

impl Client {
    pub fn server(&self) -> Server<'_> {
        Server {
            endpoint: Endpoint::new(self, "/fmping"),
        }
    }

    pub fn capture(&self) -> Capture<'_> {
        Capture {
            endpoint: Endpoint::new(self, "/fmcapture"),
        }
    }
}

impl Server<'_> {
    pub async fn status(&self) -> Result<ServerStatus, Error> {
        let mut value = self.endpoint.get("", &[]).await?.into_json()?;
        decode_nested_json(&mut value);
        Payload::Json(value).json()
    }
}

/// Compatibility shim: decode `ServerInfo`, `FMNodes` and `Groups` when
/// they arrive as JSON-encoded strings. Structured values and strings that
/// are not JSON are left alone.
pub fn decode_nested_json(status: &mut Value) {
    let Some(map) = status.as_object_mut() else {
        return;
    };
    for key in NESTED_DOCUMENTS {
        let Some(Value::String(text)) = map.get(key) else {
            continue;
        };
        if let Ok(decoded) = serde_json::from_str::<Value>(text) {
            debug!(field = key, "decoded string-encoded status document");
            map.insert(key.to_owned(), decoded);
        }
    }
}

impl Capture<'_> {
    /// Resume packet capture.
    pub async fn start(&self) -> Result<ApiMessage, Error> {
        self.act(CaptureAction::Resume).await
    }

    /// Pause packet capture.
    pub async fn stop(&self) -> Result<ApiMessage, Error> {
        self.act(CaptureAction::Pause).await
    }

    async fn act(&self, action: CaptureAction) -> Result<ApiMessage, Error> {
        self.endpoint
            .put("", &[("action", action.to_string())])
            .await?
            .json()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn string_encoded_documents_are_decoded() {
        let mut status = json!({
            "ServerInfo": "{\"NodeName\":\"sw138\",\"Status\":\"Running\"}",
            "FMNodes": "[{\"nodename\":\"sw138\"}]",
            "Groups": [{"groupname": "g138"}],
            "SWVersion": "7.3.0"
        });
        decode_nested_json(&mut status);
        assert_eq!(status["ServerInfo"]["NodeName"], "sw138");
        assert_eq!(status["FMNodes"][0]["nodename"], "sw138");
        assert_eq!(status["Groups"], json!([{"groupname": "g138"}]));
        assert_eq!(status["SWVersion"], "7.3.0");
    }

    #[test]
    fn non_json_strings_pass_through() {
        let mut status = json!({"ServerInfo": "not json", "Groups": ""});
        decode_nested_json(&mut status);
        assert_eq!(status, json!({"ServerInfo": "not json", "Groups": ""}));
    }

    #[test]
    fn non_objects_are_ignored() {
        let mut status = json!(["ServerInfo"]);
        decode_nested_json(&mut status);
        assert_eq!(status, json!(["ServerInfo"]));
    }
}
