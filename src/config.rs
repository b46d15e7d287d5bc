//! Project configuration for swimlane.
//!
//! Settings live in `.swimlane/swimlane.toml` under the project directory:
//!
//! ```toml
//! [chart]
//! policy = "overlap-touch-adjacent"
//! end_convention = "inclusive"
//! unassigned_group = "Team Unassigned"
//! on_invalid_group = "skip"
//!
//! [fields]
//! id = "Key"
//! label = "Summary"
//! group = "Team"
//! start = "StartDate"
//! end = "TargetEnd"
//!
//! [mapping]
//! default = "mappings/sprint.json"
//! ```
//!
//! Values are layered file → environment → CLI flags. `SWIMLANE_POLICY` and
//! `SWIMLANE_FIELD_MAPPING` override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lanes::ConflictPolicy;
use crate::timeline::{EndConvention, InvalidGroupAction, ItemColumns, NormalizeOptions};

pub const CONFIG_DIR: &str = ".swimlane";
pub const CONFIG_FILE: &str = "swimlane.toml";

/// Mapping file used when nothing else names one.
pub const FALLBACK_MAPPING: &str = "field_mappings.json";

pub const POLICY_ENV: &str = "SWIMLANE_POLICY";
pub const FIELD_MAPPING_ENV: &str = "SWIMLANE_FIELD_MAPPING";

/// `[chart]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChartSection {
    /// Conflict policy identifier, parsed when the engine is built
    #[serde(default = "default_policy")]
    pub policy: String,
    #[serde(default)]
    pub end_convention: EndConvention,
    /// Group assigned to rows without one
    #[serde(default = "default_unassigned_group")]
    pub unassigned_group: String,
    #[serde(default)]
    pub on_invalid_group: InvalidGroupAction,
}

fn default_policy() -> String {
    ConflictPolicy::default().to_string()
}

fn default_unassigned_group() -> String {
    crate::timeline::normalize::DEFAULT_UNASSIGNED_GROUP.to_string()
}

impl Default for ChartSection {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            end_convention: EndConvention::default(),
            unassigned_group: default_unassigned_group(),
            on_invalid_group: InvalidGroupAction::default(),
        }
    }
}

/// `[mapping]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MappingSection {
    /// Default field-mapping file, relative to the project directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<PathBuf>,
}

/// The complete swimlane.toml structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SwimlaneToml {
    #[serde(default)]
    pub chart: ChartSection,
    /// Row columns read when building the timeline
    #[serde(default)]
    pub fields: ItemColumns,
    #[serde(default)]
    pub mapping: MappingSection,
}

impl SwimlaneToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse swimlane.toml")
    }

    /// Load `swimlane.toml` from `swimlane_dir`, or defaults if it is absent.
    pub fn load_or_default(swimlane_dir: &Path) -> Result<Self> {
        let config_path = swimlane_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize swimlane.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Policy identifier, with the environment overriding the file.
    pub fn policy_name(&self) -> String {
        std::env::var(POLICY_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.chart.policy.clone())
    }

    /// Default mapping file as configured, with the environment overriding
    /// the file.
    pub fn default_mapping(&self) -> Option<PathBuf> {
        std::env::var(FIELD_MAPPING_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| self.mapping.default.clone())
    }

    /// Validate the configuration against `project_dir` and return warnings.
    pub fn validate(&self, project_dir: &Path) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Err(err) = self.chart.policy.parse::<ConflictPolicy>() {
            warnings.push(format!("[chart] {}", err));
        }

        if self.chart.unassigned_group.trim().is_empty() {
            warnings.push("[chart] unassigned_group is empty".to_string());
        }

        let fields = &self.fields;
        for (name, value) in [
            ("id", &fields.id),
            ("label", &fields.label),
            ("group", &fields.group),
            ("start", &fields.start),
            ("end", &fields.end),
        ] {
            if value.trim().is_empty() {
                warnings.push(format!("[fields] {} column name is empty", name));
            }
        }

        if let Some(ref mapping) = self.mapping.default
            && !project_dir.join(mapping).exists()
        {
            warnings.push(format!(
                "Default mapping file '{}' not found",
                mapping.display()
            ));
        }

        warnings
    }
}

/// Unified configuration for a swimlane project.
///
/// It merges settings from:
/// 1. swimlane.toml
/// 2. Environment variables
/// 3. CLI arguments (passed to the accessors)
#[derive(Debug, Clone)]
pub struct SwimlaneConfig {
    pub project_dir: PathBuf,
    pub swimlane_dir: PathBuf,
    pub toml: SwimlaneToml,
}

impl SwimlaneConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let swimlane_dir = project_dir.join(CONFIG_DIR);
        let toml = SwimlaneToml::load_or_default(&swimlane_dir)?;

        Ok(Self {
            project_dir,
            swimlane_dir,
            toml,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.swimlane_dir.join(CONFIG_FILE)
    }

    /// Conflict policy (CLI → env → file).
    pub fn policy(&self, cli: Option<&str>) -> Result<ConflictPolicy> {
        let name = cli
            .map(str::to_string)
            .unwrap_or_else(|| self.toml.policy_name());
        Ok(name.parse()?)
    }

    /// Mapping file to load (CLI → env → file → `field_mappings.json`).
    ///
    /// A configured default that no longer exists falls back with a warning.
    pub fn field_mapping_path(&self, cli: Option<&Path>) -> PathBuf {
        if let Some(path) = cli {
            return self.resolve(path);
        }
        if let Some(path) = self.toml.default_mapping() {
            let resolved = self.resolve(&path);
            if resolved.exists() {
                return resolved;
            }
            tracing::warn!(
                mapping = %path.display(),
                "default mapping file not found, using {}",
                FALLBACK_MAPPING
            );
        }
        self.project_dir.join(FALLBACK_MAPPING)
    }

    /// Normalization settings, with an optional CLI end convention.
    pub fn normalize_options(&self, end_convention: Option<EndConvention>) -> NormalizeOptions {
        NormalizeOptions::default()
            .with_columns(self.toml.fields.clone())
            .with_unassigned_group(self.toml.chart.unassigned_group.clone())
            .with_end_convention(end_convention.unwrap_or(self.toml.chart.end_convention))
    }

    /// Invalid-group handling; `abort` forces abort.
    pub fn on_invalid_group(&self, abort: bool) -> InvalidGroupAction {
        if abort {
            InvalidGroupAction::Abort
        } else {
            self.toml.chart.on_invalid_group
        }
    }

    /// Point `[mapping].default` at `file`, or clear it with `"default"`.
    ///
    /// The file must exist relative to the project directory. Writes the
    /// config file, creating `.swimlane/` if needed.
    pub fn set_default_mapping(&mut self, file: &str) -> Result<()> {
        if file == "default" {
            self.toml.mapping.default = None;
        } else {
            let path = PathBuf::from(file);
            if !self.resolve(&path).exists() {
                anyhow::bail!("Mapping file '{}' not found", file);
            }
            self.toml.mapping.default = Some(path);
        }
        std::fs::create_dir_all(&self.swimlane_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.swimlane_dir.display()
            )
        })?;
        self.toml.save(&self.config_file())
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate(&self.project_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}
