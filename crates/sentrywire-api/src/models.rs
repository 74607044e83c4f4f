// SentryWire response types
//
// The appliance is loose about types: counters arrive as numbers or numeric
// strings, booleans as `true` or `"false"`, and key casing drifts between
// firmware versions. Fields use `#[serde(default)]` and the lenient helpers
// below; anything not modelled lands in `extra`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Generic answers ──────────────────────────────────────────────────

/// `{"message": "..."}` acknowledgement returned by most mutating calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Active triggers ──────────────────────────────────────────────────

/// Trigger slots after a create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCount {
    #[serde(rename = "currTriggerCount", deserialize_with = "lenient_u64")]
    pub current: u64,
    /// The appliance spells this key with a trailing colon.
    #[serde(
        rename = "maxTriggerCount:",
        alias = "maxTriggerCount",
        deserialize_with = "lenient_u64"
    )]
    pub max: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTrigger {
    pub trigger_name: String,
    #[serde(default)]
    pub search_filter: String,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub seconds_before: Option<u64>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub seconds_after: Option<u64>,
    #[serde(default, alias = "created_time")]
    pub createdtime: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── IDS rule sets ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetUploaded {
    pub uploaded: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub count: u64,
    /// The appliance found errors while parsing the rule file.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub error: bool,
}

// ── Precapture filters ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecaptureFilter {
    #[serde(default)]
    pub filtername: String,
    #[serde(default)]
    pub searchfilter: String,
    #[serde(default)]
    pub createdtime: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Authorization ────────────────────────────────────────────────────

/// A role and its permission flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Role {
    pub rolename: String,
    #[serde(rename = "Groups", default, deserialize_with = "lenient_bool")]
    pub groups: bool,
    #[serde(rename = "Licensing", default, deserialize_with = "lenient_bool")]
    pub licensing: bool,
    #[serde(rename = "Authentication", default, deserialize_with = "lenient_bool")]
    pub authentication: bool,
    #[serde(rename = "Authorization", default, deserialize_with = "lenient_bool")]
    pub authorization: bool,
    #[serde(rename = "Auditing", default, deserialize_with = "lenient_bool")]
    pub auditing: bool,
    #[serde(rename = "Search", default, deserialize_with = "lenient_bool")]
    pub search: bool,
    #[serde(rename = "Policy", default, deserialize_with = "lenient_bool")]
    pub policy: bool,
}

// ── Federation ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "GroupName", alias = "groupname")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAdded {
    pub nodename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDeleted {
    #[serde(rename = "DeleteNode")]
    pub address: String,
}

// ── Server ───────────────────────────────────────────────────────────

/// `/fmping` answer. The nested documents are kept as JSON because their
/// shape differs between standalone and federated appliances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(rename = "ServerInfo", default)]
    pub server_info: Value,
    #[serde(rename = "FMNodes", default)]
    pub nodes: Value,
    #[serde(rename = "Groups", default)]
    pub groups: Value,
    #[serde(rename = "SWVersion", default)]
    pub sw_version: Option<String>,
    #[serde(rename = "ApiVersion", default)]
    pub api_version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerStatus {
    /// `ServerInfo.<key>` as text.
    pub fn info(&self, key: &str) -> Option<&str> {
        self.server_info.get(key).and_then(Value::as_str)
    }
}

// ── Searches ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCreated {
    pub searchname: String,
}

/// One entry of the pending or completed search lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    #[serde(rename = "SearchName")]
    pub search_name: String,
    #[serde(rename = "SearchKey", default)]
    pub search_key: Option<String>,
    #[serde(rename = "CaseName", default)]
    pub case_name: Option<String>,
    #[serde(rename = "NodeName", default)]
    pub node_name: Option<String>,
    #[serde(rename = "Begintime", default)]
    pub begin_time: Option<String>,
    #[serde(rename = "Endtime", default)]
    pub end_time: Option<String>,
    #[serde(rename = "SearchFilter", default)]
    pub search_filter: Option<String>,
    #[serde(rename = "SearchStatus", default)]
    pub search_status: Option<String>,
    #[serde(rename = "MaxPacketCount", default, deserialize_with = "lenient_opt_u64")]
    pub max_packets: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Lenient field decoding ───────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(
        match Option::<NumberOrString>::deserialize(deserializer)? {
            Some(NumberOrString::Number(n)) => Some(n),
            Some(NumberOrString::String(s)) => s.trim().parse().ok(),
            None => None,
        },
    )
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => Ok(s.trim().eq_ignore_ascii_case("true")),
    }
}
