//! Precapture filter command handlers.

use tabled::Tabled;

use sentrywire_api::Client;
use sentrywire_api::models::PrecaptureFilter;

use crate::cli::{FiltersArgs, FiltersCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct FilterRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Filter")]
    filter: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn filter_row(f: &PrecaptureFilter) -> FilterRow {
    FilterRow {
        name: f.filtername.clone(),
        filter: f.searchfilter.clone(),
        created: output::or_dash(f.createdtime.as_deref()),
    }
}

pub async fn handle(client: &Client, args: FiltersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let filters = client.precapture_filters();
    match args.command {
        FiltersCommand::List => {
            let list = filters.list().await?;
            let out =
                output::render_list(&global.output, &list, filter_row, |f| f.searchfilter.clone());
            output::print_output(&out, global.quiet);
        }
        FiltersCommand::Set { filter } => util::print_message(&filters.set(&filter).await?, global),
        FiltersCommand::Reset => util::print_message(&filters.reset().await?, global),
    }
    Ok(())
}
