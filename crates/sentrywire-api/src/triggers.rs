// Active triggers (`/activetriggers`).

use serde_json::json;

use crate::client::{Client, Payload};
use crate::endpoint::{Endpoint, fields, one_or_many};
use crate::error::Error;
use crate::models::{ActiveTrigger, ApiMessage, TriggerCount};

/// Server-side rules that start a search when a matching packet shows up.
pub struct ActiveTriggers<'a> {
    endpoint: Endpoint<'a>,
}

impl Client {
    pub fn active_triggers(&self) -> ActiveTriggers<'_> {
        ActiveTriggers {
            endpoint: Endpoint::new(self, "/activetriggers"),
        }
    }
}

impl ActiveTriggers<'_> {
    /// Create a trigger.
    ///
    /// `filter` is a BPF expression; the search window spans
    /// `seconds_before` to `seconds_after` around the trigger time. The
    /// appliance stores the trigger as `<username>_<name>`.
    pub async fn create(
        &self,
        name: &str,
        filter: &str,
        seconds_before: u32,
        seconds_after: u32,
    ) -> Result<TriggerCount, Error> {
        self.endpoint
            .post(
                "",
                fields([
                    ("trigger_name", json!(name)),
                    ("search_filter", json!(filter)),
                    ("seconds_before", json!(seconds_before)),
                    ("seconds_after", json!(seconds_after)),
                ]),
            )
            .await?
            .json()
    }

    /// Delete a trigger by its stored name.
    pub async fn delete(&self, name: &str) -> Result<ApiMessage, Error> {
        self.endpoint
            .delete("", &[("trigger_name", name.to_owned())])
            .await?
            .json()
    }

    /// All triggers, or just `name`.
    pub async fn list(&self, name: Option<&str>) -> Result<Vec<ActiveTrigger>, Error> {
        let params: Vec<(&str, String)> = name
            .map(|n| ("trigger_name", n.to_owned()))
            .into_iter()
            .collect();
        let value = self.endpoint.get("", &params).await?.into_json()?;
        Payload::Json(one_or_many(value)).json()
    }
}
