//! Describe the field layout of a sample issue, for writing mapping files.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name assigned to fields the tracker did not describe.
pub const UNKNOWN_FIELD_NAME: &str = "(unknown)";

/// Tracker field definition, as listed by the field catalogue endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub schema: Option<FieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Resolved name and type per field id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    pub name: String,
    pub kind: String,
}

pub fn index_definitions(definitions: Vec<FieldDefinition>) -> HashMap<String, FieldMeta> {
    definitions
        .into_iter()
        .map(|def| {
            let name = def.name.unwrap_or_else(|| UNKNOWN_FIELD_NAME.to_string());
            let kind = def
                .schema
                .and_then(|s| s.kind)
                .unwrap_or_else(|| "unknown".to_string());
            (def.id, FieldMeta { name, kind })
        })
        .collect()
}

pub fn load_definitions(path: &Path) -> Result<HashMap<String, FieldMeta>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read field definitions: {}", path.display()))?;
    let definitions: Vec<FieldDefinition> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse field definitions: {}", path.display()))?;
    Ok(index_definitions(definitions))
}

/// One node of the described structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub children: Option<Vec<FieldNode>>,
}

/// JSON type label of a value.
pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::String(_) => "string",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Children of a value: object keys recurse, arrays use their first element.
fn describe(value: &Value) -> Option<Vec<FieldNode>> {
    match value {
        Value::Object(map) if !map.is_empty() => Some(
            map.iter()
                .map(|(key, child)| FieldNode {
                    id: key.clone(),
                    name: None,
                    kind: type_of(child).to_string(),
                    children: describe(child),
                })
                .collect(),
        ),
        Value::Array(items) => items.first().and_then(describe),
        _ => None,
    }
}

/// Describe every top-level field of `issue`, named via `definitions`.
pub fn field_structure(issue: &Value, definitions: &HashMap<String, FieldMeta>) -> Vec<FieldNode> {
    let Some(Value::Object(fields)) = issue.get("fields") else {
        return Vec::new();
    };
    fields
        .iter()
        .map(|(id, value)| {
            let meta = definitions.get(id);
            FieldNode {
                id: id.clone(),
                name: Some(
                    meta.map(|m| m.name.clone())
                        .unwrap_or_else(|| UNKNOWN_FIELD_NAME.to_string()),
                ),
                kind: meta
                    .map(|m| m.kind.clone())
                    .unwrap_or_else(|| type_of(value).to_string()),
                children: describe(value),
            }
        })
        .collect()
}

pub fn write_structure(structure: &[FieldNode], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(structure).context("Failed to serialize structure")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write structure file: {}", path.display()))?;
    Ok(())
}
