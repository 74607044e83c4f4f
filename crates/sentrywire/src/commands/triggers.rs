//! Active trigger command handlers.

use std::path::Path;

use serde_json::Value;
use tabled::Tabled;
use tracing::debug;

use sentrywire_api::Client;
use sentrywire_api::models::ActiveTrigger;

use crate::cli::{GlobalOpts, TriggersArgs, TriggersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct TriggerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Filter")]
    filter: String,
    #[tabled(rename = "Before (s)")]
    before: String,
    #[tabled(rename = "After (s)")]
    after: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn trigger_row(t: &ActiveTrigger) -> TriggerRow {
    TriggerRow {
        name: t.trigger_name.clone(),
        filter: t.search_filter.clone(),
        before: output::or_dash(t.seconds_before),
        after: output::or_dash(t.seconds_after),
        created: output::or_dash(t.createdtime.as_deref()),
    }
}

pub async fn handle(client: &Client, args: TriggersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let triggers = client.active_triggers();
    match args.command {
        TriggersCommand::List { name } => {
            let list = triggers.list(name.as_deref()).await?;
            let out = output::render_list(&global.output, &list, trigger_row, |t| {
                t.trigger_name.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TriggersCommand::Create {
            name,
            filter,
            before,
            after,
        } => {
            let count = triggers.create(&name, &filter, before, after).await?;
            let out = output::render_single(
                &global.output,
                &count,
                |c| format!("Trigger '{name}' created ({} of {} slots used)", c.current, c.max),
                |c| c.current.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TriggersCommand::Delete { name } => {
            let reply = triggers.delete(&name).await?;
            util::print_message(&reply, global);
            Ok(())
        }

        TriggersCommand::Import { file } => import(client, &file, global).await,
    }
}

/// Create every trigger in a JSON array file. Failures are collected and
/// reported together once every entry was tried.
async fn import(client: &Client, file: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let Value::Array(entries) = util::read_json_file(file)? else {
        return Err(CliError::Validation {
            field: "file".into(),
            reason: "expected a JSON array of triggers".into(),
        });
    };

    let total = entries.len();
    let mut errors: Vec<(String, CliError)> = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let trigger: ActiveTrigger = match serde_json::from_value(entry) {
            Ok(trigger) => trigger,
            Err(e) => {
                errors.push((format!("entry {index}"), e.into()));
                continue;
            }
        };
        debug!(trigger = %trigger.trigger_name, "creating trigger");
        if let Err(e) = create_one(client, &trigger).await {
            errors.push((trigger.trigger_name.clone(), e));
        }
    }
    util::finish_bulk("triggers", total, &errors, global)
}

async fn create_one(client: &Client, trigger: &ActiveTrigger) -> Result<(), CliError> {
    let before = seconds(trigger.seconds_before, "seconds_before")?;
    let after = seconds(trigger.seconds_after, "seconds_after")?;
    client
        .active_triggers()
        .create(&trigger.trigger_name, &trigger.search_filter, before, after)
        .await?;
    Ok(())
}

fn seconds(value: Option<u64>, field: &str) -> Result<u32, CliError> {
    u32::try_from(value.unwrap_or(0)).map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "too large".into(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn row_fills_missing_fields_with_dash() {
        let trigger: ActiveTrigger = serde_json::from_value(json!({
            "trigger_name": "ssl_visibility",
            "search_filter": "vlan 5 or vlan 6",
            "seconds_before": "30",
        }))
        .unwrap();
        let row = trigger_row(&trigger);
        assert_eq!(row.before, "30");
        assert_eq!(row.after, "-");
        assert_eq!(row.created, "-");
    }

    #[test]
    fn seconds_default_to_zero_and_reject_overflow() {
        assert_eq!(seconds(None, "x").unwrap(), 0);
        assert_eq!(seconds(Some(45), "x").unwrap(), 45);
        assert!(seconds(Some(u64::MAX), "x").is_err());
    }
}
