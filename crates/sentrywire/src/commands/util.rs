//! Prompting, printing and progress helpers used across commands.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use sentrywire_api::Download;
use sentrywire_api::models::ApiMessage;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Ask before deleting. `--yes` answers for the user; without a terminal
/// and without `--yes` the command is refused.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Validation {
            field: "confirmation".into(),
            reason: e.to_string(),
        })
}

/// Read and parse a JSON file.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Print a `{"message": ...}` acknowledgement.
pub fn print_message(reply: &ApiMessage, global: &GlobalOpts) {
    let out = output::render_single(
        &global.output,
        reply,
        |m| m.message.clone(),
        |m| m.message.clone(),
    );
    output::print_output(&out, global.quiet);
}

/// Report where a download went, or what the appliance said instead.
pub fn print_download(download: &Download, global: &GlobalOpts) {
    match download {
        Download::Saved { path, bytes } => {
            if !global.quiet {
                eprintln!("Saved {bytes} bytes to {}", path.display());
            }
        }
        Download::Message(value) => {
            output::print_output(&output::render_value(&global.output, value), global.quiet);
        }
    }
}

/// Spinner on stderr while waiting on the appliance. Hidden when quiet or
/// not attached to a terminal.
pub fn spinner(message: String, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Print the failures collected by a bulk command and turn them into
/// the command's result.
pub fn finish_bulk(
    what: &'static str,
    total: usize,
    errors: &[(String, CliError)],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if errors.is_empty() {
        if !global.quiet {
            eprintln!("Upload successful");
        }
        return Ok(());
    }
    eprintln!("Errors:");
    for (item, err) in errors {
        eprintln!("\t{item}: {err}");
    }
    Err(CliError::Partial {
        what,
        failed: errors.len(),
        total,
    })
}
