use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "swimlane")]
#[command(version, about = "Team swimlane layouts for issue-tracker Gantt charts")]
pub struct Cli {
    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lay out saved search results as team swimlanes
    Chart {
        /// Search-result page files or globs, merged in order
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<String>,

        /// Field mapping file (defaults to the configured mapping)
        #[arg(long)]
        field_mapping: Option<PathBuf>,

        /// Conflict policy: overlap-only, overlap-or-touch, overlap-touch-adjacent
        #[arg(long)]
        policy: Option<String>,

        /// How end dates are read: inclusive or exclusive
        #[arg(long)]
        end_convention: Option<String>,

        /// Maximum number of issues to read
        #[arg(long)]
        limit: Option<usize>,

        /// Only chart issues in this sprint (needs a Sprint mapping column)
        #[arg(long)]
        sprint: Option<String>,

        /// Fail instead of skipping a group with invalid items
        #[arg(long)]
        abort_on_invalid: bool,

        /// Date of the "today" marker (defaults to the local date)
        #[arg(long)]
        today: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write the layout as CSV
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Assign lanes to a JSON list of intervals
    Assign {
        /// JSON array of {id, group, start, end}
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        policy: Option<String>,

        /// Check every lane occupant instead of the running end
        #[arg(long)]
        full_scan: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Flatten saved search results with a field mapping
    Query {
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<String>,

        #[arg(long)]
        field_mapping: Option<PathBuf>,

        #[arg(long)]
        limit: Option<usize>,

        /// Only keep issues in this sprint
        #[arg(long)]
        sprint: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write the rows as CSV
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Describe the field structure of a sample issue
    ExportFieldStructure {
        /// Search-result page holding the sample issue
        #[arg(short, long)]
        input: PathBuf,

        /// Tracker field definitions (JSON array)
        #[arg(long)]
        fields: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Issue key to describe (defaults to the first issue)
        #[arg(long)]
        key: Option<String>,
    },
    /// Set the default field mapping file, or "default" to reset it
    SetDefaultMapping {
        #[arg(short, long)]
        file: String,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default swimlane.toml and starter field mapping
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    // Variables already set in the environment win over .env.
    dotenvy::from_path(project_dir.join(".env")).ok();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Chart {
            input,
            field_mapping,
            policy,
            end_convention,
            limit,
            sprint,
            abort_on_invalid,
            today,
            format,
            export,
        } => cmd::cmd_chart(
            &project_dir,
            cmd::ChartArgs {
                input,
                field_mapping,
                policy,
                end_convention,
                limit,
                sprint,
                abort_on_invalid,
                today,
                format,
                export,
            },
        )?,
        Commands::Assign {
            input,
            policy,
            full_scan,
            format,
        } => cmd::cmd_assign(&project_dir, &input, policy.as_deref(), full_scan, format)?,
        Commands::Query {
            input,
            field_mapping,
            limit,
            sprint,
            format,
            export,
        } => cmd::cmd_query(
            &project_dir,
            &input,
            field_mapping.as_deref(),
            limit,
            sprint.as_deref(),
            format,
            export.as_deref(),
        )?,
        Commands::ExportFieldStructure {
            input,
            fields,
            output,
            key,
        } => cmd::cmd_export_field_structure(&input, &fields, &output, key.as_deref())?,
        Commands::SetDefaultMapping { file } => cmd::cmd_set_default_mapping(&project_dir, &file)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command)?,
    }

    Ok(())
}
