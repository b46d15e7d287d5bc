//! Raw tracker records: search pages, field mappings and structure export.

pub mod mapping;
pub mod pages;
pub mod structure;

pub use mapping::{
    FieldMapping, FieldSpec, KEY_COLUMN, Row, SPRINT_COLUMN, STARTER_MAPPING, extract_path,
};
pub use pages::{SearchPage, collect_issues, load_issues};
pub use structure::{FieldNode, field_structure};
