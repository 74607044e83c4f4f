//! Role command handlers.

use tabled::Tabled;

use sentrywire_api::Client;
use sentrywire_api::models::Role;

use crate::cli::{GlobalOpts, RolesArgs, RolesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RoleRow {
    #[tabled(rename = "Role")]
    name: String,
    #[tabled(rename = "Permissions")]
    permissions: String,
}

fn role_row(r: &Role) -> RoleRow {
    let granted = [
        ("Groups", r.groups),
        ("Licensing", r.licensing),
        ("Authentication", r.authentication),
        ("Authorization", r.authorization),
        ("Auditing", r.auditing),
        ("Search", r.search),
        ("Policy", r.policy),
    ];
    RoleRow {
        name: r.rolename.clone(),
        permissions: granted
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

pub async fn handle(client: &Client, args: RolesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let roles = client.roles();
    match args.command {
        RolesCommand::List => {
            let list = roles.list().await?;
            let out = output::render_list(&global.output, &list, role_row, |r| r.rolename.clone());
            output::print_output(&out, global.quiet);
        }
        RolesCommand::Create { name, permissions } => {
            util::print_message(&roles.create(&name, &permissions).await?, global);
        }
        RolesCommand::Delete { name } => {
            if !util::confirm(&format!("Delete role '{name}'?"), "roles delete", global.yes)? {
                return Ok(());
            }
            util::print_message(&roles.delete(&name).await?, global);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn row_lists_granted_permissions() {
        let role: Role = serde_json::from_value(json!({
            "rolename": "analyst",
            "Search": true,
            "Auditing": "true",
            "Policy": false,
        }))
        .unwrap();
        assert_eq!(role_row(&role).permissions, "Auditing, Search");
    }
}
