//! Search command handlers: create, poll, download, purge.

use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde_json::json;
use tabled::Tabled;
use tracing::{debug, info};

use sentrywire_api::models::SearchSummary;
use sentrywire_api::{Client, PollConfig, SearchRequest, SearchState};

use crate::cli::{DownloadKind, GlobalOpts, PollOpts, SearchArgs, SearchCommand};
use crate::error::CliError;
use crate::output;

use super::util;

fn poll_config(opts: &PollOpts) -> PollConfig {
    PollConfig::new(
        Duration::from_secs(opts.interval),
        opts.deadline.map(Duration::from_secs),
    )
}

fn print_summaries(list: &[SearchSummary], global: &GlobalOpts) {
    let out = output::render_list(&global.output, list, search_row, |s| s.search_name.clone());
    output::print_output(&out, global.quiet);
}

pub async fn handle(client: &Client, args: SearchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let searches = client.searches();
    match args.command {
        SearchCommand::Create {
            name,
            begin,
            end,
            filter,
            max_packets,
        } => {
            if begin > end {
                return Err(CliError::Validation {
                    field: "begin".into(),
                    reason: "begin must not be after end".into(),
                });
            }
            let mut request = SearchRequest::new(name, begin, end).max_packets(max_packets);
            if let Some(filter) = filter {
                request = request.filter(filter);
            }
            let created = searches.create(&request).await?;
            let out = output::render_single(
                &global.output,
                &created,
                |c| format!("Search token: {}", c.searchname),
                |c| c.searchname.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SearchCommand::Status { node, search } => {
            let state = searches.status(&node, &search).await?;
            let value = match state {
                SearchState::Pending { status } => json!({ "SearchStatus": status }),
                SearchState::Completed { result } => json!({ "SearchResult": result }),
            };
            output::print_output(&output::render_value(&global.output, &value), global.quiet);
            Ok(())
        }

        SearchCommand::Pending { count } => {
            print_summaries(&searches.pending(count).await?, global);
            Ok(())
        }

        SearchCommand::Completed { count } => {
            print_summaries(&searches.completed(count).await?, global);
            Ok(())
        }

        SearchCommand::Delete { search } => {
            util::print_message(&searches.delete(&search).await?, global);
            Ok(())
        }

        SearchCommand::Wait { node, search, poll } => {
            let result = wait(client, &node, &search, &poll, global).await?;
            output::print_output(&output::render_value(&global.output, &result), global.quiet);
            Ok(())
        }

        SearchCommand::Download {
            node,
            search,
            dir,
            kind,
            chunk,
            poll,
        } => {
            wait(client, &node, &search, &poll, global).await?;
            tokio::fs::create_dir_all(&dir).await?;
            for kind in kind {
                let dest = dir.join(format!("{search}_{}.zip", kind.suffix()));
                download(client, &node, &search, kind, chunk, &dest, global).await?;
            }
            Ok(())
        }

        SearchCommand::Pcaps { node, search } => {
            let list = searches.pcap_list(&node, &search).await?;
            output::print_output(&output::render_value(&global.output, &list), global.quiet);
            Ok(())
        }

        SearchCommand::Purge { pattern, count } => purge(client, &pattern, count, global).await,
    }
}

async fn wait(
    client: &Client,
    node: &str,
    search: &str,
    poll: &PollOpts,
    global: &GlobalOpts,
) -> Result<serde_json::Value, CliError> {
    let bar = util::spinner(format!("Waiting for {search}"), global.quiet);
    let result = client
        .searches()
        .wait_for_completion(node, search, &poll_config(poll))
        .await;
    bar.finish_and_clear();
    Ok(result?)
}

async fn download(
    client: &Client,
    node: &str,
    search: &str,
    kind: DownloadKind,
    chunk: u32,
    dest: &Path,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    debug!(?kind, dest = %dest.display(), "downloading search data");
    let searches = client.searches();
    let saved = match kind {
        DownloadKind::Objects => searches.objects(node, search, dest).await?,
        DownloadKind::ObjectList => searches.objects_list(node, search, dest).await?,
        DownloadKind::Logs => searches.logs(node, search, dest).await?,
        DownloadKind::Pcap => searches.pcap(node, search, chunk, dest).await?,
    };
    util::print_download(&saved, global);
    Ok(())
}

/// Completed searches whose name matches `pattern`.
fn matching<'a>(pattern: &Regex, completed: &'a [SearchSummary]) -> Vec<&'a str> {
    completed
        .iter()
        .map(|s| s.search_name.as_str())
        .filter(|name| pattern.is_match(name))
        .collect()
}

/// Delete every completed search whose name matches a regex.
async fn purge(client: &Client, pattern: &str, count: u32, global: &GlobalOpts) -> Result<(), CliError> {
    let regex = Regex::new(pattern).map_err(|e| CliError::Validation {
        field: "pattern".into(),
        reason: e.to_string(),
    })?;

    let completed = client.searches().completed(count).await?;
    let targets = matching(&regex, &completed);
    if targets.is_empty() {
        if !global.quiet {
            eprintln!("No completed searches match '{pattern}'");
        }
        return Ok(());
    }

    let prompt = format!("Delete {} search(es) matching '{pattern}'?", targets.len());
    if !util::confirm(&prompt, "search purge", global.yes)? {
        return Ok(());
    }

    let mut deleted = Vec::new();
    let mut errors: Vec<(String, CliError)> = Vec::new();
    for name in &targets {
        info!(search = *name, "deleting search");
        match client.searches().delete(name).await {
            Ok(_) => deleted.push((*name).to_owned()),
            Err(e) => errors.push(((*name).to_owned(), e.into())),
        }
    }

    let out = output::render_value(&global.output, &json!(deleted));
    output::print_output(&out, global.quiet);
    if errors.is_empty() {
        return Ok(());
    }
    for (name, err) in &errors {
        eprintln!("\t{name}: {err}");
    }
    Err(CliError::Partial {
        what: "deletions",
        failed: errors.len(),
        total: targets.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_matches_by_regex() {
        let completed: Vec<SearchSummary> = serde_json::from_value(json!([
            {"SearchName": "admin_1645157014_124_continuum_a"},
            {"SearchName": "admin_1645157020_125_manual"},
            {"SearchName": "ops_1645157030_126_continuum_b"},
        ]))
        .unwrap();
        let regex = Regex::new("continuum").unwrap();
        assert_eq!(
            matching(&regex, &completed),
            [
                "admin_1645157014_124_continuum_a",
                "ops_1645157030_126_continuum_b"
            ]
        );
    }

    #[test]
    fn poll_options_convert() {
        let poll = poll_config(&PollOpts {
            interval: 2,
            deadline: Some(60),
        });
        assert_eq!(poll.interval, Duration::from_secs(2));
        assert_eq!(poll.timeout, Some(Duration::from_secs(60)));
    }
}
