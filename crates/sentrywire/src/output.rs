//! Rendering for the `--output` formats.
//!
//! Tables come from per-command `Tabled` rows; JSON and YAML serialize the
//! appliance data itself; `plain` prints one name per line for piping into
//! other commands.

use std::io::{self, Write};

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;

/// Serialize in one of the structured formats. `None` for table and plain,
/// which each caller lays out itself.
fn structured<T: Serialize + ?Sized>(format: &OutputFormat, data: &T) -> Option<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Table | OutputFormat::Plain => return None,
    };
    Some(rendered.unwrap_or_else(|e| format!("<unserializable: {e}>")))
}

/// A collection: `to_row` builds the table rows, `name` the plain lines.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    name: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    if let Some(out) = structured(format, data) {
        return out;
    }
    if matches!(format, OutputFormat::Plain) {
        return data.iter().map(name).collect::<Vec<_>>().join("\n");
    }
    let rows: Vec<R> = data.iter().map(to_row).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// One item: `detail` is the human-readable view, `name` the plain line.
pub fn render_single<T: Serialize>(
    format: &OutputFormat,
    data: &T,
    detail: impl Fn(&T) -> String,
    name: impl Fn(&T) -> String,
) -> String {
    match (structured(format, data), format) {
        (Some(out), _) => out,
        (None, OutputFormat::Plain) => name(data),
        (None, _) => detail(data),
    }
}

/// Free-form appliance JSON (search results, pcap listings). It has no
/// table layout, so table and plain print it as pretty JSON.
pub fn render_value(format: &OutputFormat, data: &serde_json::Value) -> String {
    structured(format, data)
        .or_else(|| structured(&OutputFormat::Json, data))
        .unwrap_or_default()
}

/// Write to stdout unless `--quiet` or there is nothing to say.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let _ = writeln!(io::stdout().lock(), "{output}");
}

/// `-` for an absent cell.
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Item {
        name: String,
        count: u64,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Count")]
        count: u64,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                name: "emerging-threats".into(),
                count: 112,
            },
            Item {
                name: "local".into(),
                count: 3,
            },
        ]
    }

    fn render(format: &OutputFormat) -> String {
        render_list(
            format,
            &items(),
            |i| ItemRow {
                name: i.name.clone(),
                count: i.count,
            },
            |i| i.name.clone(),
        )
    }

    #[test]
    fn table_has_headers_and_rows() {
        let out = render(&OutputFormat::Table);
        assert!(out.contains("Name"));
        assert!(out.contains("emerging-threats"));
        assert!(out.contains("112"));
    }

    #[test]
    fn plain_is_one_id_per_line() {
        assert_eq!(render(&OutputFormat::Plain), "emerging-threats\nlocal");
    }

    #[test]
    fn structured_formats_serialize_source_data() {
        assert_eq!(
            render(&OutputFormat::JsonCompact),
            r#"[{"name":"emerging-threats","count":112},{"name":"local","count":3}]"#
        );
        assert!(render(&OutputFormat::Yaml).contains("- name: local"));
    }

    #[test]
    fn free_form_values_fall_back_to_pretty_json() {
        let value = serde_json::json!({"SearchResult": "done"});
        assert_eq!(
            render_value(&OutputFormat::Table, &value),
            "{\n  \"SearchResult\": \"done\"\n}"
        );
        assert_eq!(
            render_value(&OutputFormat::JsonCompact, &value),
            r#"{"SearchResult":"done"}"#
        );
    }

    #[test]
    fn dash_for_missing() {
        assert_eq!(or_dash(None::<u64>), "-");
        assert_eq!(or_dash(Some(30)), "30");
    }
}
