//! Tabular output

use prettytable::{format, Cell, Row, Table};

/// Render rows under a header line using the clean prettytable format,
/// indented by two spaces. Returns an empty string when there are no rows.
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.add_row(Row::new(headers.iter().map(|header| Cell::new(header)).collect()));
    for row in rows {
        table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
    }

    table
        .to_string()
        .lines()
        .map(|line| format!("  {}\n", line))
        .collect()
}
