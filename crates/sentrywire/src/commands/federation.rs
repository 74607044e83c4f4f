//! Federation command handlers: groups, nodes, policy.

use tabled::Tabled;

use sentrywire_api::Client;
use sentrywire_api::models::Group;

use crate::cli::{
    GlobalOpts, GroupsArgs, GroupsCommand, NodesArgs, NodesCommand, PolicyArgs, PolicyCommand,
};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    name: String,
}

fn group_row(g: &Group) -> GroupRow {
    GroupRow {
        name: g.name.clone(),
    }
}

pub async fn groups(client: &Client, args: GroupsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let groups = client.groups();
    match args.command {
        GroupsCommand::List => {
            let list = groups.list().await?;
            let out = output::render_list(&global.output, &list, group_row, |g| g.name.clone());
            output::print_output(&out, global.quiet);
        }
        GroupsCommand::Create { name } => util::print_message(&groups.create(&name).await?, global),
        GroupsCommand::Delete { name } => {
            if !util::confirm(&format!("Delete group '{name}'?"), "groups delete", global.yes)? {
                return Ok(());
            }
            util::print_message(&groups.delete(&name).await?, global);
        }
    }
    Ok(())
}

pub async fn nodes(client: &Client, args: NodesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let nodes = client.nodes();
    let out = match args.command {
        NodesCommand::Add { address, group } => {
            let added = nodes.add(&address, &group).await?;
            output::render_single(
                &global.output,
                &added,
                |n| format!("Node {} added to group '{group}'", n.nodename),
                |n| n.nodename.clone(),
            )
        }
        NodesCommand::Delete { address } => {
            if !util::confirm(&format!("Remove node '{address}'?"), "nodes delete", global.yes)? {
                return Ok(());
            }
            let deleted = nodes.delete(&address).await?;
            output::render_single(
                &global.output,
                &deleted,
                |n| format!("Node {} removed", n.address),
                |n| n.address.clone(),
            )
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn policy(client: &Client, args: PolicyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        PolicyCommand::Export => util::print_message(&client.policy().export().await?, global),
    }
    Ok(())
}
