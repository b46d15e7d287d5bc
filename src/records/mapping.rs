//! Configuration-driven flattening of raw issues into rows.
//!
//! A mapping file is a JSON object of output column -> field spec, kept in
//! file order:
//!
//! ```json
//! {
//!   "StartDate": "customfield_13135",
//!   "Team": "customfield_11400.name",
//!   "Sprint": { "path": "customfield_10002", "type": "list", "field": "name" }
//! }
//! ```
//!
//! Paths are dotted and resolved under the issue's `fields` object.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::MappingError;

/// Column holding the issue key, always first in a row.
pub const KEY_COLUMN: &str = "Key";

/// Column matched by sprint filters.
pub const SPRINT_COLUMN: &str = "Sprint";

/// One flattened issue: column -> value, in mapping order.
pub type Row = Map<String, Value>;

/// Mapping written by `config init`, using common tracker custom fields.
pub const STARTER_MAPPING: &str = r#"{
  "Summary": "summary",
  "Status": "status.name",
  "Assignee": "assignee.displayName",
  "StoryPoints": "customfield_10010",
  "StartDate": "customfield_13135",
  "TargetEnd": "customfield_13192",
  "Team": "customfield_11400.name",
  "Sprint": { "path": "customfield_10002", "type": "list", "field": "name" }
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Scalar,
    List,
}

/// How a single output column is extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    Scalar { path: String },
    List { path: String, field: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSpec {
    Path(String),
    Detailed {
        path: String,
        #[serde(default, rename = "type")]
        kind: FieldKind,
        #[serde(default)]
        field: Option<String>,
    },
}

impl FieldSpec {
    fn from_raw(column: &str, raw: Value) -> Result<Self, MappingError> {
        let raw: RawSpec =
            serde_json::from_value(raw).map_err(|e| MappingError::InvalidSpec {
                column: column.to_string(),
                message: e.to_string(),
            })?;
        match raw {
            RawSpec::Path(path) => Ok(FieldSpec::Scalar { path }),
            RawSpec::Detailed {
                path,
                kind: FieldKind::Scalar,
                ..
            } => Ok(FieldSpec::Scalar { path }),
            RawSpec::Detailed {
                path,
                kind: FieldKind::List,
                field: Some(field),
            } => Ok(FieldSpec::List { path, field }),
            RawSpec::Detailed {
                kind: FieldKind::List,
                field: None,
                ..
            } => Err(MappingError::InvalidSpec {
                column: column.to_string(),
                message: "list mapping requires 'field'".to_string(),
            }),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            FieldSpec::Scalar { path } | FieldSpec::List { path, .. } => path,
        }
    }

    fn extract(&self, fields: &Value) -> Value {
        match self {
            FieldSpec::Scalar { path } => extract_path(fields, path).cloned().unwrap_or(Value::Null),
            FieldSpec::List { path, field } => match extract_path(fields, path) {
                Some(Value::Array(items)) => Value::Array(
                    items
                        .iter()
                        .filter_map(|item| item.get(field.as_str()).cloned())
                        .collect(),
                ),
                Some(other) => other.clone(),
                None => Value::Null,
            },
        }
    }
}

/// Ordered column -> spec table loaded from a mapping file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    fields: Vec<(String, FieldSpec)>,
}

impl FieldMapping {
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let content = std::fs::read_to_string(path).map_err(|source| MappingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&content).map_err(|source| MappingError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, MappingError> {
        let Value::Object(map) = value else {
            return Err(MappingError::NotAnObject);
        };
        let fields = map
            .into_iter()
            .map(|(column, raw)| {
                let spec = FieldSpec::from_raw(&column, raw)?;
                Ok((column, spec))
            })
            .collect::<Result<Vec<_>, MappingError>>()?;
        Ok(Self { fields })
    }

    pub fn get(&self, column: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, spec)| spec)
    }

    /// Output columns, `Key` first.
    pub fn columns(&self) -> Vec<String> {
        std::iter::once(KEY_COLUMN.to_string())
            .chain(
                self.fields
                    .iter()
                    .map(|(c, _)| c.clone())
                    .filter(|c| c != KEY_COLUMN),
            )
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flatten one raw issue.
    pub fn parse_issue(&self, issue: &Value) -> Row {
        let mut row = Row::new();
        row.insert(
            KEY_COLUMN.to_string(),
            issue.get("key").cloned().unwrap_or(Value::Null),
        );
        let fields = issue.get("fields").unwrap_or(&Value::Null);
        for (column, spec) in &self.fields {
            row.insert(column.clone(), spec.extract(fields));
        }
        row
    }

    pub fn parse_issues(&self, issues: &[Value]) -> Vec<Row> {
        issues.iter().map(|issue| self.parse_issue(issue)).collect()
    }

    /// Keep the rows whose `Sprint` cell names `sprint`.
    ///
    /// Fails when the mapping has no `Sprint` column, since every row would
    /// then be dropped silently.
    pub fn rows_in_sprint(
        &self,
        rows: Vec<Row>,
        sprint: &str,
    ) -> Result<Vec<Row>, MappingError> {
        if self.get(SPRINT_COLUMN).is_none() {
            return Err(MappingError::MissingColumn {
                column: SPRINT_COLUMN.to_string(),
            });
        }
        let sprint = sprint.trim();
        Ok(rows
            .into_iter()
            .filter(|row| {
                row.get(SPRINT_COLUMN)
                    .is_some_and(|cell| names_sprint(cell, sprint))
            })
            .collect())
    }
}

/// A scalar cell equal to `sprint`, or a list cell containing it.
fn names_sprint(cell: &Value, sprint: &str) -> bool {
    match cell {
        Value::String(name) => name.trim() == sprint,
        Value::Array(names) => names.iter().any(|name| names_sprint(name, sprint)),
        _ => false,
    }
}

/// Follow a dotted path through nested objects.
pub fn extract_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(data, |current, part| current.as_object()?.get(part))
}
