//! Command dispatch: bridges CLI args -> API calls -> output formatting.

pub mod config_cmd;
pub mod federation;
pub mod filters;
pub mod roles;
pub mod rules;
pub mod search;
pub mod server;
pub mod triggers;
pub mod util;

use sentrywire_api::Client;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status => server::status(client, global).await,
        Command::Capture(args) => server::capture(client, args, global).await,
        Command::Triggers(args) => triggers::handle(client, args, global).await,
        Command::Rules(args) => rules::handle(client, args, global).await,
        Command::Filters(args) => filters::handle(client, args, global).await,
        Command::Roles(args) => roles::handle(client, args, global).await,
        Command::Groups(args) => federation::groups(client, args, global).await,
        Command::Nodes(args) => federation::nodes(client, args, global).await,
        Command::Policy(args) => federation::policy(client, args, global).await,
        Command::Search(args) => search::handle(client, args, global).await,
        // Config and Completions never open a session
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
