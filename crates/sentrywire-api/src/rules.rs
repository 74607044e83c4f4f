// IDS rule sets (`/idsruleset`, `/idsrulesetcontent`).

use std::path::Path;

use strum::{AsRefStr, Display, EnumString};

use crate::client::Client;
use crate::endpoint::{Download, Endpoint};
use crate::error::Error;
use crate::models::{ApiMessage, RuleSet, RuleSetUploaded};

/// Which rule sets to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum RuleSetState {
    Activated,
    Deactivated,
}

#[derive(Debug, Clone, Copy, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
enum RuleAction {
    Activate,
    Deactivate,
}

pub struct IdsRules<'a> {
    endpoint: Endpoint<'a>,
}

impl Client {
    pub fn ids_rules(&self) -> IdsRules<'_> {
        IdsRules {
            endpoint: Endpoint::new(self, "/idsruleset"),
        }
    }
}

impl IdsRules<'_> {
    /// Upload a `.rules` file. New rule sets start deactivated; a set with
    /// the same file name is replaced.
    pub async fn upload(&self, file: &Path) -> Result<RuleSetUploaded, Error> {
        self.endpoint.upload("fileUploadName", file).await?.json()
    }

    /// Delete a rule set by file name (including `.rules`).
    pub async fn delete(&self, name: &str) -> Result<ApiMessage, Error> {
        self.endpoint
            .delete("", &[("rulesetname", name.to_owned())])
            .await?
            .json()
    }

    pub async fn list(&self, state: RuleSetState) -> Result<Vec<RuleSet>, Error> {
        self.endpoint
            .get("", &[("type", state.to_string())])
            .await?
            .json()
    }

    pub async fn activate(&self, name: &str) -> Result<ApiMessage, Error> {
        self.set_state(name, RuleAction::Activate).await
    }

    pub async fn deactivate(&self, name: &str) -> Result<ApiMessage, Error> {
        self.set_state(name, RuleAction::Deactivate).await
    }

    async fn set_state(&self, name: &str, action: RuleAction) -> Result<ApiMessage, Error> {
        self.endpoint
            .put(
                "",
                &[
                    ("rulesetname", name.to_owned()),
                    ("action", action.to_string()),
                ],
            )
            .await?
            .json()
    }

    /// Fetch a rule file's content into `dest`.
    pub async fn download(&self, name: &str, dest: &Path) -> Result<Download, Error> {
        self.endpoint
            .download("content", &[("rulesetname", name.to_owned())], dest)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn states_render_lowercase() {
        assert_eq!(RuleSetState::Activated.to_string(), "activated");
        assert_eq!(
            RuleSetState::from_str("deactivated").unwrap(),
            RuleSetState::Deactivated
        );
        assert_eq!(RuleAction::Deactivate.as_ref(), "deactivate");
    }
}
