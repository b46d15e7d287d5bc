//! CSV export of flattened rows and chart layouts.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::records::Row;
use crate::timeline::ChartLayout;

/// Header of the layout export.
pub const LAYOUT_COLUMNS: [&str; 7] = [
    "Key",
    "Label",
    "Team",
    "StartDate",
    "EndDate",
    "Sublane",
    "Row",
];

/// Render one JSON value as a single CSV cell.
///
/// Lists are joined with `", "`, objects become compact JSON and null is empty.
pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_cell)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Quote a field when it holds a delimiter, quote or line break.
fn escape(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}

fn write_record<W: Write, S: AsRef<str>>(out: &mut W, fields: &[S]) -> io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{line}")
}

pub fn write_rows_csv<W: Write>(mut out: W, columns: &[String], rows: &[Row]) -> io::Result<()> {
    write_record(&mut out, columns)?;
    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| row.get(c).map(value_to_cell).unwrap_or_default())
            .collect();
        write_record(&mut out, &cells)?;
    }
    out.flush()
}

pub fn write_layout_csv<W: Write>(mut out: W, layout: &ChartLayout) -> io::Result<()> {
    write_record(&mut out, &LAYOUT_COLUMNS[..])?;
    for bar in &layout.bars {
        write_record(
            &mut out,
            &[
                bar.id.clone(),
                bar.label.clone(),
                bar.group.clone(),
                bar.start.to_string(),
                bar.end.to_string(),
                bar.lane.to_string(),
                bar.row.to_string(),
            ][..],
        )?;
    }
    out.flush()
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

pub fn export_rows(path: &Path, columns: &[String], rows: &[Row]) -> Result<()> {
    write_rows_csv(create(path)?, columns, rows)
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub fn export_layout(path: &Path, layout: &ChartLayout) -> Result<()> {
    write_layout_csv(create(path)?, layout)
        .with_context(|| format!("Failed to write {}", path.display()))
}
