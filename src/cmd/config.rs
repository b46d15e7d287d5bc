//! Configuration commands: `swimlane config` and `swimlane set-default-mapping`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use swimlane::config::{FALLBACK_MAPPING, SwimlaneConfig, SwimlaneToml};
use swimlane::records::STARTER_MAPPING;

use super::super::ConfigCommands;

fn print_toml(toml: &SwimlaneToml) {
    println!("[chart]");
    println!("  policy = \"{}\"", toml.chart.policy);
    println!("  end_convention = \"{}\"", toml.chart.end_convention);
    println!("  unassigned_group = \"{}\"", toml.chart.unassigned_group);
    println!("  on_invalid_group = \"{}\"", toml.chart.on_invalid_group);
    println!();
    println!("[fields]");
    println!("  id = \"{}\"", toml.fields.id);
    println!("  label = \"{}\"", toml.fields.label);
    println!("  group = \"{}\"", toml.fields.group);
    println!("  start = \"{}\"", toml.fields.start);
    println!("  end = \"{}\"", toml.fields.end);
    println!();
    if let Some(default) = &toml.mapping.default {
        println!("[mapping]");
        println!("  default = \"{}\"", default.display());
        println!();
    }
}

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let config = SwimlaneConfig::new(project_dir.to_path_buf())?;
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("{}", style("Swimlane Configuration").bold().cyan());
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No swimlane.toml found at {}", config_path.display());
                println!("Using default configuration:");
            }
            println!();
            print_toml(&config.toml);

            // Effective values include environment overrides.
            println!("Effective values (with env overrides):");
            println!("  policy = \"{}\"", config.toml.policy_name());
            println!(
                "  field_mapping = \"{}\"",
                config.field_mapping_path(None).display()
            );
            println!();

            if !config_path.exists() {
                println!("Run 'swimlane config init' to create a swimlane.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No swimlane.toml found. Using defaults (valid).");
                return Ok(());
            }

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("{}", style("Configuration warnings:").yellow());
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("swimlane.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&config.swimlane_dir).with_context(|| {
                format!(
                    "Failed to create config directory: {}",
                    config.swimlane_dir.display()
                )
            })?;
            SwimlaneToml::default().save(&config_path)?;
            println!("Created swimlane.toml at {}", config_path.display());

            let mapping_path = config.project_dir.join(FALLBACK_MAPPING);
            if !mapping_path.exists() {
                std::fs::write(&mapping_path, STARTER_MAPPING).with_context(|| {
                    format!("Failed to write mapping file: {}", mapping_path.display())
                })?;
                println!("Created {} at {}", FALLBACK_MAPPING, mapping_path.display());
            }

            println!();
            println!("You can now customize:");
            println!("  - [chart] policy, end_convention, unassigned_group, on_invalid_group");
            println!("  - [fields] row columns used for id, label, group, start and end");
            println!("  - {} for your tracker's custom field ids", FALLBACK_MAPPING);
            println!();
        }
    }

    Ok(())
}

pub fn cmd_set_default_mapping(project_dir: &Path, file: &str) -> Result<()> {
    let mut config = SwimlaneConfig::new(project_dir.to_path_buf())?;
    config.set_default_mapping(file)?;
    if file == "default" {
        println!("Default mapping reset to {}", FALLBACK_MAPPING);
    } else {
        println!("Default mapping set to {}", file);
    }
    Ok(())
}
