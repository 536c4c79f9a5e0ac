//! Purpose: Plain-text renderers for record listings.
//! Exports: `render_table`, `render_records`, `render_record_fields`.
//! Role: Shared by the interactive shell and the CLI `list --table` output.
//! Invariants: Output is deterministic; newlines inside cells are escaped.
//! Invariants: Positions shown to users are 1-based.
use crate::core::record::Record;

const RULE_WIDTH: usize = 40;

/// Aligned columns with a header line. Missing cells render empty.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let column_count = headers.len();
    let mut sanitized_rows = Vec::with_capacity(rows.len());
    let mut widths = headers
        .iter()
        .map(|header| sanitize_cell(header).chars().count())
        .collect::<Vec<_>>();

    for row in rows {
        let mut sanitized = Vec::with_capacity(column_count);
        for (idx, width) in widths.iter_mut().enumerate() {
            let value = row.get(idx).map(String::as_str).unwrap_or("");
            let cleaned = sanitize_cell(value);
            *width = (*width).max(cleaned.chars().count());
            sanitized.push(cleaned);
        }
        sanitized_rows.push(sanitized);
    }

    let mut lines = Vec::with_capacity(sanitized_rows.len() + 1);
    let header_cells = headers.iter().map(|h| sanitize_cell(h)).collect::<Vec<_>>();
    lines.push(format_line(&header_cells, &widths));
    for row in sanitized_rows {
        lines.push(format_line(&row, &widths));
    }
    lines.join("\n")
}

/// Table of records with a leading `#` column; columns are the union of fields
/// in first-seen order.
pub fn records_table(records: &[Record]) -> String {
    let mut fields: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !fields.iter().any(|f| f == key) {
                fields.push(key.to_string());
            }
        }
    }
    let mut headers = vec!["#".to_string()];
    headers.extend(fields.iter().cloned());
    let rows = records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let mut row = vec![(idx + 1).to_string()];
            row.extend(
                fields
                    .iter()
                    .map(|field| record.get(field).unwrap_or("").to_string()),
            );
            row
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

/// Indented `field: value` lines for one record.
pub fn render_record_fields(record: &Record) -> String {
    record
        .iter()
        .map(|(field, value)| format!("  {field}: {}", sanitize_cell(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered blocks, one per record, as shown by the shell's list view.
pub fn render_records(records: &[Record], source: &str) -> String {
    if records.is_empty() {
        return format!("No records in '{source}'.");
    }
    let mut out = format!("--- {} record(s) in '{source}' ---", records.len());
    for (idx, record) in records.iter().enumerate() {
        out.push_str(&format!("\nRecord {}:", idx + 1));
        if !record.is_empty() {
            out.push('\n');
            out.push_str(&render_record_fields(record));
        }
        out.push('\n');
        out.push_str(&"-".repeat(RULE_WIDTH));
    }
    out
}

fn sanitize_cell(value: &str) -> String {
    value.replace('\n', "\\n").replace('\r', "\\r")
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, width) in widths.iter().enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let cell = cells.get(idx).map(String::as_str).unwrap_or("");
        line.push_str(cell);
        let cell_len = cell.chars().count();
        if *width > cell_len {
            line.push_str(&" ".repeat(*width - cell_len));
        }
    }
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::{records_table, render_records};
    use crate::core::record::Record;

    #[test]
    fn table_aligns_union_of_fields() {
        let records = vec![
            Record::new().with("name", "Ana").with("age", "30"),
            Record::new().with("name", "Luisa").with("city", "Lima"),
        ];
        let table = records_table(&records);
        assert_eq!(
            table,
            "#  name   age  city\n1  Ana    30\n2  Luisa       Lima"
        );
    }

    #[test]
    fn empty_listing_names_source() {
        assert_eq!(render_records(&[], "data.json"), "No records in 'data.json'.");
    }

    #[test]
    fn blocks_are_numbered_from_one() {
        let records = vec![Record::new().with("id", "7"), Record::new().with("id", "a\nb")];
        let text = render_records(&records, "ids.csv");
        assert!(text.starts_with("--- 2 record(s) in 'ids.csv' ---"));
        assert!(text.contains("Record 1:\n  id: 7"));
        assert!(text.contains("Record 2:\n  id: a\\nb"));
    }
}
