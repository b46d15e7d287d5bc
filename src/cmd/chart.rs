//! Swimlane layout commands: `swimlane chart` and `swimlane assign`.

use anyhow::{Context, Result};
use chrono::Local;
use console::style;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use swimlane::config::SwimlaneConfig;
use swimlane::export::export_layout;
use swimlane::lanes::{ConflictPolicy, Interval, LaneEngine, Placement};
use swimlane::records::{FieldMapping, load_issues};
use swimlane::timeline::{
    ChartLayout, EndConvention, InvalidGroupAction, SkippedRow, build_layout, normalize_rows,
    parse_date,
};

use super::super::OutputFormat;

pub struct ChartArgs {
    pub input: Vec<String>,
    pub field_mapping: Option<PathBuf>,
    pub policy: Option<String>,
    pub end_convention: Option<String>,
    pub limit: Option<usize>,
    pub sprint: Option<String>,
    pub abort_on_invalid: bool,
    pub today: Option<String>,
    pub format: OutputFormat,
    pub export: Option<PathBuf>,
}

#[derive(Serialize)]
struct ChartReport<'a> {
    policy: ConflictPolicy,
    #[serde(flatten)]
    layout: &'a ChartLayout,
    skipped_rows: &'a [SkippedRow],
}

pub fn cmd_chart(project_dir: &Path, args: ChartArgs) -> Result<()> {
    let config = SwimlaneConfig::new(project_dir.to_path_buf())?;

    // Reject bad options before touching any input.
    let policy = config.policy(args.policy.as_deref())?;
    let end_convention = args
        .end_convention
        .as_deref()
        .map(str::parse::<EndConvention>)
        .transpose()?;
    let today = match args.today.as_deref() {
        Some(text) => {
            Some(parse_date(text).with_context(|| format!("Invalid --today date '{}'", text))?)
        }
        None => Some(Local::now().date_naive()),
    };

    let on_invalid = config.on_invalid_group(args.abort_on_invalid);

    let mapping_path = config.field_mapping_path(args.field_mapping.as_deref());
    let mapping = FieldMapping::load(&mapping_path)?;
    let issues = load_issues(&args.input, args.limit)?;
    let mut rows = mapping.parse_issues(&issues);
    if let Some(sprint) = args.sprint.as_deref() {
        rows = mapping.rows_in_sprint(rows, sprint)?;
    }

    // Aborting means the engine must see the rows it would reject.
    let options = config
        .normalize_options(end_convention)
        .with_invalid_rows_kept(on_invalid == InvalidGroupAction::Abort);
    let normalized = normalize_rows(&rows, &options);

    let engine = LaneEngine::new(policy);
    let layout = build_layout(&normalized.items, &engine, on_invalid, today)?;

    if let Some(path) = &args.export {
        export_layout(path, &layout)?;
    }

    match args.format {
        OutputFormat::Json => {
            let report = ChartReport {
                policy,
                layout: &layout,
                skipped_rows: &normalized.skipped,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            print_layout(policy, &layout, &normalized.skipped);
            if let Some(path) = &args.export {
                println!("Exported {} bars to {}", layout.bars.len(), path.display());
            }
        }
    }

    Ok(())
}

fn lanes_label(count: usize) -> String {
    if count == 1 {
        "1 lane".to_string()
    } else {
        format!("{} lanes", count)
    }
}

fn print_layout(policy: ConflictPolicy, layout: &ChartLayout, skipped: &[SkippedRow]) {
    println!();
    println!(
        "{} {}",
        style("Swimlanes").bold().cyan(),
        style(format!("({})", policy)).dim()
    );

    if layout.is_empty() {
        println!();
        println!("No issues with valid start and end dates to chart.");
    }

    for band in &layout.groups {
        println!();
        println!(
            "{} {}",
            style(&band.group).bold(),
            style(format!("({})", lanes_label(band.lane_count))).dim()
        );
        for bar in layout.bars.iter().filter(|bar| bar.group == band.group) {
            println!(
                "  lane {:<2} {:<14} {} .. {}  {}",
                bar.lane, bar.id, bar.start, bar.end, bar.label
            );
        }
    }

    if let Some(axis) = &layout.axis {
        println!();
        println!("Axis: {} .. {}", axis.start, axis.end);
        if let Some(today) = axis.today {
            println!("Today: {}", today);
        }
    }

    for group in &layout.skipped_groups {
        println!();
        println!(
            "{} {}: {}",
            style("Skipped group").yellow(),
            group.group,
            group.error
        );
    }

    if !skipped.is_empty() {
        println!();
        println!(
            "{}",
            style(format!("Skipped {} rows:", skipped.len())).yellow()
        );
        for row in skipped {
            let name = row
                .id
                .clone()
                .unwrap_or_else(|| format!("row {}", row.index));
            println!("  - {}: {}", name, row.reason);
        }
    }
    println!();
}

#[derive(Serialize)]
struct AssignReport<'a> {
    policy: ConflictPolicy,
    lane_counts: BTreeMap<&'a str, usize>,
    placements: &'a [Placement],
}

pub fn cmd_assign(
    project_dir: &Path,
    input: &Path,
    policy: Option<&str>,
    full_scan: bool,
    format: OutputFormat,
) -> Result<()> {
    let config = SwimlaneConfig::new(project_dir.to_path_buf())?;
    let policy = config.policy(policy)?;

    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read intervals: {}", input.display()))?;
    let intervals: Vec<Interval> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse intervals: {}", input.display()))?;

    let assignment = LaneEngine::new(policy)
        .with_full_scan(full_scan)
        .assign(&intervals)?;

    match format {
        OutputFormat::Json => {
            let report = AssignReport {
                policy,
                lane_counts: assignment.groups().collect(),
                placements: assignment.placements(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!();
            for (group, count) in assignment.groups() {
                println!(
                    "{} {}",
                    style(group).bold(),
                    style(format!("({})", lanes_label(count))).dim()
                );
                for placement in assignment
                    .placements()
                    .iter()
                    .filter(|p| p.group == group)
                {
                    println!("  {:<14} lane {}", placement.id, placement.lane);
                }
            }
            println!();
        }
    }

    Ok(())
}
