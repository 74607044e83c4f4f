// Search result retrieval (`/fmsearch/data`).
//
// One endpoint, selected by `type`: `ObjectList`, `SearchObjects`,
// `LogData`, `PcapList`, or a chunk index for a single pcap.

use std::io::{Cursor, Read};
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::Searches;
use crate::client::Payload;
use crate::endpoint::{Download, save};
use crate::error::Error;

const CHUNK_LIST: &str = "chunklist.json";

impl Searches<'_> {
    async fn data(&self, kind: String, node: &str, search: &str) -> Result<Payload, Error> {
        debug!(%kind, node, search, "fetching search data");
        self.endpoint
            .get(
                "/data",
                &[
                    ("type", kind),
                    ("nodename", node.to_owned()),
                    ("searchname", search.to_owned()),
                ],
            )
            .await
    }

    /// Zip of the list of objects extracted by the search.
    pub async fn objects_list(&self, node: &str, search: &str, dest: &Path) -> Result<Download, Error> {
        let payload = self.data("ObjectList".into(), node, search).await?;
        save(payload, dest).await
    }

    /// Zip of the objects extracted by the search.
    pub async fn objects(&self, node: &str, search: &str, dest: &Path) -> Result<Download, Error> {
        let payload = self.data("SearchObjects".into(), node, search).await?;
        save(payload, dest).await
    }

    /// Zip of the alert/DPI log entries matched by the search.
    pub async fn logs(&self, node: &str, search: &str, dest: &Path) -> Result<Download, Error> {
        let payload = self.data("LogData".into(), node, search).await?;
        if let Payload::Json(value) = &payload {
            if reports_missing(value) {
                return Err(Error::not_found("log not found"));
            }
        }
        save(payload, dest).await
    }

    /// Chunk list of the search's pcaps.
    ///
    /// The appliance answers JSON when there is nothing to list, and a zip
    /// holding `chunklist.json` otherwise.
    pub async fn pcap_list(&self, node: &str, search: &str) -> Result<Value, Error> {
        let payload = self.data("PcapList".into(), node, search).await?;
        let body = match payload {
            Payload::Json(value) => return listing(value),
            Payload::Raw(raw) => raw.body,
        };

        if let Ok(value) = serde_json::from_slice::<Value>(&body) {
            return listing(value);
        }
        read_chunk_list(&body)
    }

    /// Download pcap chunk `index` (1-based, as listed by
    /// [`pcap_list`](Self::pcap_list)).
    pub async fn pcap(&self, node: &str, search: &str, index: u32, dest: &Path) -> Result<Download, Error> {
        let payload = self.data(index.to_string(), node, search).await?;
        if let Payload::Raw(raw) = &payload {
            if raw.body.is_empty() {
                return Err(Error::not_found("pcap not found"));
            }
        }
        save(payload, dest).await
    }
}

fn listing(value: Value) -> Result<Value, Error> {
    if reports_missing(&value) {
        return Err(Error::not_found("no pcaps found"));
    }
    Ok(value)
}

/// The appliance reports missing data as a message mentioning "Exist"
/// (e.g. "File does not Exist"), or as an `Exist` key.
fn reports_missing(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    map.contains_key("Exist")
        || ["msg", "message", "error"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .any(|text| text.contains("Exist"))
}

/// Parse `chunklist.json` out of an in-memory zip.
fn read_chunk_list(body: &[u8]) -> Result<Value, Error> {
    let mut archive = zip::ZipArchive::new(Cursor::new(body))
        .map_err(|e| Error::Archive(format!("unreadable pcap list archive: {e}")))?;
    let mut member = archive
        .by_name(CHUNK_LIST)
        .map_err(|e| Error::Archive(format!("{CHUNK_LIST}: {e}")))?;

    let mut text = String::new();
    member
        .read_to_string(&mut text)
        .map_err(|e| Error::Archive(format!("{CHUNK_LIST}: {e}")))?;
    serde_json::from_str(&text).map_err(|e| Error::Archive(format!("{CHUNK_LIST}: {e}")))
}
