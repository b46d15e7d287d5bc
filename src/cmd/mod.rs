//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module   | Commands handled                          |
//! |----------|-------------------------------------------|
//! | `chart`  | `Chart`, `Assign`                         |
//! | `query`  | `Query`, `ExportFieldStructure`           |
//! | `config` | `Config`, `SetDefaultMapping`             |

pub mod chart;
pub mod config;
pub mod query;

pub use chart::{ChartArgs, cmd_assign, cmd_chart};
pub use config::{cmd_config, cmd_set_default_mapping};
pub use query::{cmd_export_field_structure, cmd_query};
