//! Record commands: `swimlane query` and `swimlane export-field-structure`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use swimlane::config::SwimlaneConfig;
use swimlane::export::{export_rows, value_to_cell};
use swimlane::records::structure::{load_definitions, write_structure};
use swimlane::records::{FieldMapping, SearchPage, field_structure, load_issues};

use super::super::OutputFormat;

pub fn cmd_query(
    project_dir: &Path,
    input: &[String],
    field_mapping: Option<&Path>,
    limit: Option<usize>,
    sprint: Option<&str>,
    format: OutputFormat,
    export: Option<&Path>,
) -> Result<()> {
    let config = SwimlaneConfig::new(project_dir.to_path_buf())?;
    let mapping_path = config.field_mapping_path(field_mapping);
    let mapping = FieldMapping::load(&mapping_path)?;
    tracing::debug!(
        mapping = %mapping_path.display(),
        columns = mapping.len(),
        "loaded field mapping"
    );

    let issues = load_issues(input, limit)?;
    let mut rows = mapping.parse_issues(&issues);
    if let Some(sprint) = sprint {
        rows = mapping.rows_in_sprint(rows, sprint)?;
    }
    let columns = mapping.columns();

    if let Some(path) = export {
        export_rows(path, &columns, &rows)?;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            println!("{}", style(columns.join("\t")).bold());
            for row in &rows {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| row.get(c).map(value_to_cell).unwrap_or_default())
                    .collect();
                println!("{}", cells.join("\t"));
            }
            println!();
            println!("{} issues", rows.len());
            if let Some(path) = export {
                println!("Exported {} rows to {}", rows.len(), path.display());
            }
        }
    }

    Ok(())
}

pub fn cmd_export_field_structure(
    input: &Path,
    fields: &Path,
    output: &Path,
    key: Option<&str>,
) -> Result<()> {
    let page = SearchPage::load(input)?;
    let issue = match key {
        Some(key) => page
            .issues
            .iter()
            .find(|issue| issue.get("key").and_then(|k| k.as_str()) == Some(key))
            .with_context(|| format!("Issue {} not found in {}", key, input.display()))?,
        None => page
            .issues
            .first()
            .with_context(|| format!("No issues in {}", input.display()))?,
    };

    let definitions = load_definitions(fields)?;
    let structure = field_structure(issue, &definitions);
    write_structure(&structure, output)?;

    let issue_key = issue.get("key").and_then(|k| k.as_str()).unwrap_or("issue");
    println!(
        "Wrote structure of {} fields from {} to {}",
        structure.len(),
        issue_key,
        output.display()
    );
    Ok(())
}
