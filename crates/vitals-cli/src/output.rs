//! Output formatting helpers for the CLI.
//!
//! Tables render with comfy-table on a terminal and as plain
//! space-separated lines otherwise, so output stays scriptable.

use std::io::IsTerminal;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use serde::Serialize;

/// Placeholder for a reading that has never been recorded.
pub const MISSING: &str = "-";

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn reading(value: Option<i64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

pub fn text(value: Option<&str>) -> String {
    value.unwrap_or(MISSING).to_string()
}

/// Render rows under `headers`.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    render_table(headers, rows, std::io::stdout().is_terminal())
}

/// Render label/value pairs as a two-column table.
pub fn key_values(pairs: &[(&str, String)]) -> String {
    let rows: Vec<Vec<String>> = pairs
        .iter()
        .map(|(label, value)| vec![label.to_string(), value.clone()])
        .collect();
    render_table(&["", ""], &rows, std::io::stdout().is_terminal())
}

fn render_table(headers: &[&str], rows: &[Vec<String>], pretty: bool) -> String {
    if !pretty {
        return rows
            .iter()
            .map(|row| row.join(" "))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if headers.iter().any(|h| !h.is_empty()) {
        table.set_header(headers.iter().map(Cell::new));
    }
    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_rows_are_space_separated() {
        let rows = vec![
            vec!["1".to_string(), "Medication A".to_string()],
            vec!["2".to_string(), "Vitamin D".to_string()],
        ];
        assert_eq!(
            render_table(&["ID", "NAME"], &rows, false),
            "1 Medication A\n2 Vitamin D"
        );
    }

    #[test]
    fn test_pretty_table_has_headers() {
        let rows = vec![vec!["Steps".to_string(), "5000".to_string()]];
        let rendered = render_table(&["READING", "VALUE"], &rows, true);
        assert!(rendered.contains("READING"));
        assert!(rendered.contains("5000"));
    }

    #[test]
    fn test_missing_readings_render_as_dash() {
        assert_eq!(reading(None), "-");
        assert_eq!(reading(Some(72)), "72");
        assert_eq!(text(None), "-");
    }
}
