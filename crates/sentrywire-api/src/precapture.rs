// Precapture filters (`/precapturefilters`).

use serde_json::json;

use crate::client::{Client, Payload};
use crate::endpoint::{Endpoint, fields, one_or_many};
use crate::error::Error;
use crate::models::{ApiMessage, PrecaptureFilter};

/// BPF filters applied before packets are stored.
pub struct PrecaptureFilters<'a> {
    endpoint: Endpoint<'a>,
}

impl Client {
    pub fn precapture_filters(&self) -> PrecaptureFilters<'_> {
        PrecaptureFilters {
            endpoint: Endpoint::new(self, "/precapturefilters"),
        }
    }
}

impl PrecaptureFilters<'_> {
    pub async fn set(&self, filter: &str) -> Result<ApiMessage, Error> {
        self.endpoint
            .post("", fields([("search_filter", json!(filter))]))
            .await?
            .json()
    }

    /// Drop every precapture filter.
    pub async fn reset(&self) -> Result<ApiMessage, Error> {
        self.endpoint.delete("", &[]).await?.json()
    }

    /// Active filters. An appliance without filters answers with an empty
    /// body, which lists as empty.
    pub async fn list(&self) -> Result<Vec<PrecaptureFilter>, Error> {
        let value = self.endpoint.get("", &[]).await?.into_json()?;
        Payload::Json(one_or_many(value)).json()
    }
}
