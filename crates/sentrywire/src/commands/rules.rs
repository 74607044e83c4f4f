//! IDS rule set command handlers.

use std::path::{Path, PathBuf};

use tabled::Tabled;
use tracing::debug;

use sentrywire_api::Client;
use sentrywire_api::models::RuleSet;

use crate::cli::{GlobalOpts, RulesArgs, RulesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RuleSetRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Rules")]
    count: u64,
    #[tabled(rename = "Errors")]
    error: &'static str,
}

fn rule_set_row(r: &RuleSet) -> RuleSetRow {
    RuleSetRow {
        name: r.name.clone(),
        count: r.count,
        error: if r.error { "yes" } else { "" },
    }
}

pub async fn handle(client: &Client, args: RulesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let rules = client.ids_rules();
    match args.command {
        RulesCommand::List { state } => {
            let list = rules.list(state).await?;
            let out = output::render_list(&global.output, &list, rule_set_row, |r| r.name.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RulesCommand::Upload { file } => {
            let uploaded = rules.upload(&file).await?;
            let out = output::render_single(
                &global.output,
                &uploaded,
                |u| format!("Uploaded {}", u.uploaded),
                |u| u.uploaded.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RulesCommand::Import { dir } => import(client, &dir, global).await,

        RulesCommand::Activate { name } => {
            util::print_message(&rules.activate(&name).await?, global);
            Ok(())
        }

        RulesCommand::Deactivate { name } => {
            util::print_message(&rules.deactivate(&name).await?, global);
            Ok(())
        }

        RulesCommand::Delete { name } => {
            util::print_message(&rules.delete(&name).await?, global);
            Ok(())
        }

        RulesCommand::Download { name, dest } => {
            let dest = dest.unwrap_or_else(|| PathBuf::from(format!("{name}.rules")));
            let download = rules.download(&name, &dest).await?;
            util::print_download(&download, global);
            Ok(())
        }
    }
}

/// `*.rules` files directly inside `dir`, sorted by name.
fn rule_files(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "rules") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Upload every rule file of a directory, collecting failures.
async fn import(client: &Client, dir: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let files = rule_files(dir)?;
    if !global.quiet {
        for file in &files {
            eprintln!("{}", file.display());
        }
    }

    let mut errors: Vec<(String, CliError)> = Vec::new();
    for file in &files {
        debug!(file = %file.display(), "uploading rule file");
        if let Err(e) = client.ids_rules().upload(file).await {
            errors.push((file.display().to_string(), e.into()));
        }
    }
    util::finish_bulk("rule files", files.len(), &errors, global)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rules_files_are_picked() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.rules", "a.rules", "notes.txt", "c.rules.bak"] {
            std::fs::write(dir.path().join(name), "alert tcp any any -> any any").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.rules")).unwrap();

        let names: Vec<_> = rule_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.rules", "b.rules"]);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let err = rule_files(Path::new("/nonexistent/sentrywire-rules")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
