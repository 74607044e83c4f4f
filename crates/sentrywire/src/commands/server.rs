//! Appliance status and capture control.

use std::fmt::Write as _;

use sentrywire_api::Client;
use sentrywire_api::models::ServerStatus;
use serde_json::Value;

use crate::cli::{CaptureArgs, CaptureCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(status: &ServerStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Version:      {}", output::or_dash(status.sw_version.as_deref()));
    let _ = writeln!(out, "API version:  {}", output::or_dash(status.api_version.as_deref()));
    if let Value::Object(info) = &status.server_info {
        for (key, value) in info {
            let text = value.as_str().map_or_else(|| value.to_string(), ToOwned::to_owned);
            let _ = writeln!(out, "{key}: {text}");
        }
    }
    if let Value::Array(nodes) = &status.nodes {
        let _ = writeln!(out, "Nodes:        {}", nodes.len());
    }
    out.trim_end().to_owned()
}

pub async fn status(client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    let status = client.server().status().await?;
    let out = output::render_single(&global.output, &status, detail, |s| {
        output::or_dash(s.sw_version.as_deref())
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn capture(client: &Client, args: CaptureArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let reply = match args.command {
        CaptureCommand::Start => client.capture().start().await?,
        CaptureCommand::Stop => client.capture().stop().await?,
    };
    util::print_message(&reply, global);
    Ok(())
}
