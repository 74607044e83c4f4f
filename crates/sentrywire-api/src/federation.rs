// Federation: groups (`/fmgroup`), nodes (`/fmnode`) and policy export
// (`/exportpolicy`).

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::client::{Client, Payload};
use crate::endpoint::{Endpoint, fields};
use crate::error::Error;
use crate::models::{ApiMessage, Group, NodeAdded, NodeDeleted};

pub struct Groups<'a> {
    endpoint: Endpoint<'a>,
}

pub struct Nodes<'a> {
    endpoint: Endpoint<'a>,
}

pub struct Policy<'a> {
    endpoint: Endpoint<'a>,
}

impl Client {
    pub fn groups(&self) -> Groups<'_> {
        Groups {
            endpoint: Endpoint::new(self, "/fmgroup"),
        }
    }

    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            endpoint: Endpoint::new(self, "/fmnode"),
        }
    }

    pub fn policy(&self) -> Policy<'_> {
        Policy {
            endpoint: Endpoint::new(self, "/exportpolicy"),
        }
    }
}

impl Groups<'_> {
    pub async fn create(&self, name: &str) -> Result<ApiMessage, Error> {
        self.endpoint
            .post("", fields([("group_name", json!(name))]))
            .await?
            .json()
    }

    pub async fn delete(&self, name: &str) -> Result<ApiMessage, Error> {
        self.endpoint
            .delete("", &[("group_name", name.to_owned())])
            .await?
            .json()
    }

    pub async fn list(&self) -> Result<Vec<Group>, Error> {
        self.endpoint.get("", &[]).await?.json()
    }
}

impl Nodes<'_> {
    /// Federate the appliance at `address` into an existing group.
    pub async fn add(&self, address: &str, group: &str) -> Result<NodeAdded, Error> {
        let value = self
            .endpoint
            .post(
                "",
                fields([("nodeaddr", json!(address)), ("group_name", json!(group))]),
            )
            .await?
            .into_json()?;
        first(value)
    }

    pub async fn delete(&self, address: &str) -> Result<NodeDeleted, Error> {
        let value = self
            .endpoint
            .delete("", &[("nodeaddr", address.to_owned())])
            .await?
            .into_json()?;
        first(value)
    }
}

impl Policy<'_> {
    /// Save the federation policy (users, groups, nodes) so a federated
    /// node can take over as HA node.
    pub async fn export(&self) -> Result<ApiMessage, Error> {
        self.endpoint.post("", fields([])).await?.json()
    }
}

/// Node answers arrive either bare or wrapped in a one-element list.
fn first<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    let item = match value {
        Value::Array(items) => items.into_iter().next(),
        other => Some(other),
    };
    let item = item.ok_or_else(|| Error::Deserialization {
        message: "empty node response".into(),
        body: "[]".into(),
    })?;
    Payload::Json(item).json()
}
