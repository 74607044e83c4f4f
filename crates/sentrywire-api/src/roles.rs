// Authorization roles (`/authorization`).

use serde_json::json;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::client::Client;
use crate::endpoint::{Endpoint, fields};
use crate::error::Error;
use crate::models::{ApiMessage, Role};

/// A permission a role can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum Permission {
    Groups,
    Licensing,
    Authentication,
    Authorization,
    Auditing,
    Search,
    Policy,
}

/// Comma-separated wire form, e.g. `Groups,Search`.
pub fn permission_list(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(",")
}

pub struct Roles<'a> {
    endpoint: Endpoint<'a>,
}

impl Client {
    pub fn roles(&self) -> Roles<'_> {
        Roles {
            endpoint: Endpoint::new(self, "/authorization"),
        }
    }
}

impl Roles<'_> {
    pub async fn create(&self, name: &str, permissions: &[Permission]) -> Result<ApiMessage, Error> {
        self.endpoint
            .post(
                "",
                fields([
                    ("rolename", json!(name)),
                    ("permissions", json!(permission_list(permissions))),
                ]),
            )
            .await?
            .json()
    }

    pub async fn delete(&self, name: &str) -> Result<ApiMessage, Error> {
        self.endpoint
            .delete("", &[("rolename", name.to_owned())])
            .await?
            .json()
    }

    pub async fn list(&self) -> Result<Vec<Role>, Error> {
        self.endpoint.get("", &[]).await?.json()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn all_permissions_join_in_declaration_order() {
        let all: Vec<Permission> = Permission::iter().collect();
        assert_eq!(
            permission_list(&all),
            "Groups,Licensing,Authentication,Authorization,Auditing,Search,Policy"
        );
        assert_eq!(permission_list(&[]), "");
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Permission::from_str("search").unwrap(), Permission::Search);
        assert!(Permission::from_str("root").is_err());
    }
}
