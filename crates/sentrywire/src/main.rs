mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sentrywire_api::Client;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // No appliance needed for these two.
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "sentrywire", &mut std::io::stdout());
            Ok(())
        }

        // Everything else runs inside a login session
        cmd => {
            let client = open_session(&cli.global).await?;

            tracing::debug!(command = ?cmd, "running");
            let result = commands::dispatch(cmd, &client, &cli.global).await;

            // Log out even when the command failed; a failed logout only warns.
            if let Err(err) = client.logout(None).await {
                tracing::warn!(error = %err, "logout failed");
            }
            result
        }
    }
}

/// Resolve configuration, build the client and log in.
async fn open_session(global: &GlobalOpts) -> Result<Client, CliError> {
    let cfg = config::load_config()?;
    let session = config::resolve_session(&cfg, global)?;
    let client = Client::new(&session.target, &session.client)?;

    tracing::debug!(url = %client.base_url(), user = %session.username, "opening session");
    client
        .login(&session.username, &session.password)
        .await
        .map_err(|err| {
            if err.is_auth_failure() {
                CliError::AuthFailed {
                    profile: session.profile.clone(),
                    message: err
                        .server_message()
                        .map_or_else(|| err.to_string(), ToOwned::to_owned),
                }
            } else {
                err.into()
            }
        })?;
    Ok(client)
}
