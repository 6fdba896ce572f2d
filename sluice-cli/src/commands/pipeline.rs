//! Pipeline command handlers
//!
//! Each invocation builds a pipeline browser, loads the list the way the
//! saved preferences describe it, selects the named pipelines and runs one
//! bulk command on the selection.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use colored::*;
use serde_json::Value as JsonValue;
use sluice_client::CollectorClient;
use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::domain::status::PipelineState;
use sluice_core::dto::pipeline::SortColumn;
use sluice_engine::{CommandOutcome, PipelineBrowser, QueryApplied};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::preferences::JsonFilePreferenceStore;
use crate::prompt::TerminalDialogs;
use crate::transport::HttpTransport;

/// Pipelines a command acts on
#[derive(Args, Debug)]
pub struct Selection {
    /// Pipeline names
    names: Vec<String>,

    /// Act on every loaded pipeline instead of named ones
    #[arg(long, conflicts_with = "names")]
    all_loaded: bool,

    /// Select the rows between each name and the nearest selected row above it
    #[arg(long)]
    extend: bool,
}

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// List pipelines
    List {
        /// Filter by name or title
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by label (e.g. system:runningPipelines)
        #[arg(short, long)]
        label: Option<String>,

        /// Sort column (name, title, last-modified, created, creator, status)
        #[arg(long)]
        sort: Option<SortColumn>,

        /// Sort ascending
        #[arg(long, requires = "sort")]
        asc: bool,

        /// Keep loading pages until every match is listed
        #[arg(short, long)]
        all: bool,
    },
    /// List system and custom labels
    Labels,
    /// Start pipelines
    Start {
        #[command(flatten)]
        selection: Selection,

        /// Runtime parameters as key=value pairs, for a single pipeline
        #[arg(short, long, value_parser = parse_key_val)]
        param: Vec<(String, String)>,
    },
    /// Stop pipelines
    Stop {
        #[command(flatten)]
        selection: Selection,

        /// Kill the pipelines instead of waiting for the current batch
        #[arg(long)]
        force: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete pipelines
    Delete {
        #[command(flatten)]
        selection: Selection,

        #[arg(short, long)]
        yes: bool,
    },
    /// Reset the origin offsets of pipelines
    ResetOffset {
        #[command(flatten)]
        selection: Selection,

        #[arg(short, long)]
        yes: bool,
    },
    /// Add labels to pipelines
    AddLabels {
        #[command(flatten)]
        selection: Selection,

        /// Labels to add (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        labels: Vec<String>,

        #[arg(short, long)]
        yes: bool,
    },
    /// Publish pipelines to the control hub
    Publish {
        #[command(flatten)]
        selection: Selection,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        #[arg(short, long)]
        yes: bool,
    },
    /// Duplicate a pipeline
    Duplicate {
        /// Pipeline name
        name: String,

        /// Title of the copies
        #[arg(short, long)]
        title: Option<String>,

        /// Number of copies
        #[arg(short, long, default_value = "1")]
        count: u32,

        #[arg(short, long)]
        yes: bool,
    },
    /// Export pipelines as JSON, or a zip for several
    Export {
        #[command(flatten)]
        selection: Selection,

        /// Bundle the stage library definitions the pipelines use
        #[arg(long)]
        include_definitions: bool,

        /// Directory to write the export to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Show sharing details of a pipeline
    Share {
        /// Pipeline name
        name: String,
    },
    /// Download pipelines from the control hub
    DownloadRemote,
    /// Switch between the table and the grid layout
    View {
        /// Use the grid layout
        #[arg(long, conflicts_with = "table")]
        grid: bool,

        /// Use the table layout
        #[arg(long)]
        table: bool,

        /// Toggle the name column
        #[arg(long)]
        toggle_name_column: bool,
    },
}

/// Parse a single key=value pair
fn parse_key_val(s: &str) -> Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Handle pipeline commands
///
/// Routes pipeline subcommands to their respective handlers.
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    match command {
        PipelineCommands::List {
            search,
            label,
            sort,
            asc,
            all,
        } => {
            let browser = open(config, TerminalDialogs::new(false), ".")?;
            list_pipelines(&browser, search, label, sort.map(|c| (c, !asc)), all).await
        }
        PipelineCommands::Labels => {
            let browser = open(config, TerminalDialogs::new(false), ".")?;
            list_labels(&browser).await
        }
        PipelineCommands::Start { selection, param } => {
            let browser = open(config, TerminalDialogs::new(true), ".")?;
            start_pipelines(&browser, &selection, param).await
        }
        PipelineCommands::Stop {
            selection,
            force,
            yes,
        } => {
            let browser = open(config, TerminalDialogs::new(yes), ".")?;
            stop_pipelines(&browser, &selection, force).await
        }
        PipelineCommands::Delete { selection, yes } => {
            let browser = open(config, TerminalDialogs::new(yes), ".")?;
            select(&browser, &selection).await?;
            report("Deleted", browser.delete_selected().await)
        }
        PipelineCommands::ResetOffset { selection, yes } => {
            let browser = open(config, TerminalDialogs::new(yes), ".")?;
            select(&browser, &selection).await?;
            report("Reset origin of", browser.reset_offset_selected().await)
        }
        PipelineCommands::AddLabels {
            selection,
            labels,
            yes,
        } => {
            let dialogs = TerminalDialogs::new(yes).with_labels(labels);
            let browser = open(config, dialogs, ".")?;
            select(&browser, &selection).await?;
            report("Labeled", browser.add_labels_selected().await)
        }
        PipelineCommands::Publish {
            selection,
            message,
            yes,
        } => {
            let dialogs = TerminalDialogs::new(yes).with_commit_message(message);
            let browser = open(config, dialogs, ".")?;
            select(&browser, &selection).await?;
            report("Published", browser.publish_selected().await)
        }
        PipelineCommands::Duplicate {
            name,
            title,
            count,
            yes,
        } => {
            let dialogs = TerminalDialogs::new(yes).with_copies(title, count);
            let browser = open(config, dialogs, ".")?;
            load_named(&browser, std::slice::from_ref(&name)).await?;
            report("Duplicated", browser.duplicate_pipeline(&name).await)
        }
        PipelineCommands::Export {
            selection,
            include_definitions,
            output,
        } => {
            let browser = open(config, TerminalDialogs::new(true), output)?;
            select(&browser, &selection).await?;
            report("Exported", browser.export_selected(include_definitions).await)
        }
        PipelineCommands::Share { name } => {
            let browser = open(config, TerminalDialogs::new(true), ".")?;
            load_named(&browser, std::slice::from_ref(&name)).await?;
            report("Shared", browser.share_pipeline(&name).await)
        }
        PipelineCommands::DownloadRemote => {
            let browser = open(config, TerminalDialogs::new(false), ".")?;
            browser.init().await;
            report("Downloaded", browser.download_remote().await)
        }
        PipelineCommands::View {
            grid,
            table,
            toggle_name_column,
        } => {
            let browser = open(config, TerminalDialogs::new(false), ".")?;
            set_view(&browser, grid, table, toggle_name_column).await;
            Ok(())
        }
    }
}

/// Build a browser over the collector
fn open(
    config: &Config,
    dialogs: TerminalDialogs,
    output_dir: impl Into<PathBuf>,
) -> Result<Arc<PipelineBrowser>> {
    let http = reqwest::Client::builder()
        .timeout(config.engine.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let client = CollectorClient::with_client(&config.collector_url, http);

    Ok(Arc::new(PipelineBrowser::new(
        config.engine.clone(),
        Arc::new(HttpTransport::new(client, output_dir)),
        Arc::new(dialogs),
        Arc::new(JsonFilePreferenceStore::new(&config.preferences_path)),
    )))
}

/// Loads the first page, failing when the collector cannot be reached
async fn load(browser: &PipelineBrowser) -> Result<()> {
    match browser.init().await {
        None => bail!("Could not reach the data collector"),
        Some(QueryApplied::Failed { message }) => bail!("Failed to list pipelines: {}", message),
        Some(_) => Ok(()),
    }
}

/// Loads pages until every named pipeline is in the list
async fn load_named(browser: &PipelineBrowser, names: &[String]) -> Result<()> {
    load(browser).await?;

    loop {
        let items = browser.items().await;
        let missing: Vec<&String> = names
            .iter()
            .filter(|name| !items.iter().any(|p| &p.name == *name))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        if !browser.show_load_more().await {
            let missing: Vec<&str> = missing.iter().map(|s| s.as_str()).collect();
            bail!("Pipeline(s) not found: {}", missing.join(", "));
        }

        load_next_page(browser, items.len()).await?;
    }
}

/// Loads one more page, failing when the list did not grow
async fn load_next_page(browser: &PipelineBrowser, loaded: usize) -> Result<()> {
    if let QueryApplied::Failed { message } = browser.load_more().await {
        bail!("Failed to list pipelines: {}", message);
    }
    if browser.items().await.len() <= loaded {
        bail!("The data collector returned no further pipelines");
    }
    Ok(())
}

/// Loads the list and selects the pipelines a command acts on
async fn select(browser: &PipelineBrowser, selection: &Selection) -> Result<()> {
    if selection.all_loaded {
        load(browser).await?;
        browser.select_all().await;
    } else {
        if selection.names.is_empty() {
            bail!("Name at least one pipeline, or pass --all-loaded");
        }
        load_named(browser, &selection.names).await?;
        for name in &selection.names {
            browser.select(name, selection.extend).await;
        }
    }

    let selected = browser.selected().await;
    tracing::debug!(count = selected.len(), "Selected pipelines");
    Ok(())
}

/// List pipelines
async fn list_pipelines(
    browser: &PipelineBrowser,
    search: Option<String>,
    label: Option<String>,
    sort: Option<(SortColumn, bool)>,
    all: bool,
) -> Result<()> {
    load(browser).await?;

    let mut applied = None;
    if let Some(term) = search {
        applied = Some(browser.search(&term).await);
    }
    if let Some(label) = label {
        applied = Some(browser.select_label(&label).await);
    }
    if let Some((column, reverse)) = sort {
        applied = Some(browser.set_sort(column, reverse).await);
    }
    if let Some(QueryApplied::Failed { message }) = applied {
        bail!("Failed to list pipelines: {}", message);
    }

    while all && browser.show_load_more().await {
        let loaded = browser.items().await.len();
        if let Err(e) = load_next_page(browser, loaded).await {
            tracing::warn!(error = %e, "Stopped loading pages");
            break;
        }
    }

    let items = browser.items().await;
    let state = browser.query_state().await;

    if items.is_empty() {
        println!("{}", "No pipelines found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "Showing {} of {} pipeline(s):",
            items.len(),
            state.total_count
        )
        .bold()
    );
    println!();

    let view = browser.view_settings();
    for pipeline in &items {
        let status = browser.status_of(&pipeline.name).await;
        if view.grid_view {
            print_pipeline_card(pipeline, status.as_ref(), view.show_name_column);
        } else {
            print_pipeline_row(pipeline, status.as_ref(), view.show_name_column);
        }
        for alert in browser.alert_messages(&pipeline.name).await {
            println!("      {} {}", "!".red().bold(), alert.red());
        }
    }

    if browser.show_load_more().await {
        println!();
        println!("{}", "More pipelines available; pass --all to list them.".dimmed());
    }

    Ok(())
}

/// List labels
async fn list_labels(browser: &PipelineBrowser) -> Result<()> {
    let labels = browser
        .load_labels()
        .await
        .context("Failed to load labels")?;

    println!("{}", "System labels:".bold());
    for label in &labels.system {
        println!("  {} {}", "▸".cyan(), label);
    }

    if !labels.custom.is_empty() {
        println!("{}", "Custom labels:".bold());
        for label in &labels.custom {
            println!("  {} {}", "▸".cyan(), label);
        }
    }

    Ok(())
}

/// Start pipelines
///
/// A single named pipeline is started with its runtime parameters; anything
/// else goes through the bulk start.
async fn start_pipelines(
    browser: &PipelineBrowser,
    selection: &Selection,
    params: Vec<(String, String)>,
) -> Result<()> {
    if let [name] = selection.names.as_slice() {
        load_named(browser, std::slice::from_ref(name)).await?;

        let parameters: HashMap<String, JsonValue> = params
            .into_iter()
            .map(|(k, v)| (k, JsonValue::String(v)))
            .collect();

        return report("Started", browser.start_pipeline(name, &parameters).await);
    }

    if !params.is_empty() {
        bail!("Runtime parameters apply to a single pipeline only");
    }

    select(browser, selection).await?;
    report("Started", browser.start_selected().await)
}

/// Stop pipelines
async fn stop_pipelines(browser: &PipelineBrowser, selection: &Selection, force: bool) -> Result<()> {
    if let [name] = selection.names.as_slice() {
        load_named(browser, std::slice::from_ref(name)).await?;
        return report("Stopped", browser.stop_pipeline(name, force).await);
    }

    select(browser, selection).await?;
    report("Stopped", browser.stop_selected(force).await)
}

async fn set_view(browser: &PipelineBrowser, grid: bool, table: bool, toggle_name_column: bool) {
    if grid || table {
        browser.set_grid_view(grid).await;
    }
    if toggle_name_column {
        browser.toggle_name_column().await;
    }

    let view = browser.view_settings();
    let layout = if view.grid_view { "grid" } else { "table" };
    let name_column = if view.show_name_column { "shown" } else { "hidden" };
    println!("  Layout:      {}", layout.cyan());
    println!("  Name column: {}", name_column.cyan());
}

/// Print the outcome of a command, failing on anything but success
fn report(verb: &str, outcome: CommandOutcome) -> Result<()> {
    match outcome {
        CommandOutcome::NothingSelected => bail!("No pipeline selected"),
        CommandOutcome::Cancelled => {
            println!("{}", "Cancelled.".yellow());
            Ok(())
        }
        CommandOutcome::Blocked { issues } => {
            print_errors(&issues);
            bail!("Operation not allowed for the selection")
        }
        CommandOutcome::Failed { error } => {
            print_errors(std::slice::from_ref(&error));
            bail!("Operation failed")
        }
        CommandOutcome::Succeeded(effects) => {
            println!(
                "{}",
                format!("✓ {} {} pipeline(s)", verb, effects.succeeded.len())
                    .green()
                    .bold()
            );
            for name in &effects.succeeded {
                println!("  {} {}", "▸".cyan(), name);
            }
            Ok(())
        }
        CommandOutcome::PartiallyFailed { effects, errors } => {
            println!(
                "{}",
                format!("✓ {} {} pipeline(s)", verb, effects.succeeded.len())
                    .green()
                    .bold()
            );
            print_errors(&errors);
            bail!("{} pipeline(s) failed", errors.len())
        }
    }
}

fn print_errors(errors: &[String]) {
    for error in errors {
        eprintln!("  {} {}", "✗".red().bold(), error.red());
    }
}

fn status_label(status: Option<&PipelineState>) -> ColoredString {
    match status {
        None => "-".dimmed(),
        Some(state) if state.status.is_error() => state.status.as_str().red(),
        Some(state) if state.status.is_active() => state.status.as_str().green(),
        Some(state) => state.status.as_str().normal(),
    }
}

/// Print a pipeline as a table row
fn print_pipeline_row(pipeline: &PipelineInfo, status: Option<&PipelineState>, show_name: bool) {
    let mut line = format!("  {} {:<40}", "▸".cyan(), pipeline.display_title().bold());
    if show_name {
        line.push_str(&format!(" {:<40}", pipeline.name.dimmed()));
    }
    line.push_str(&format!(" {:<16}", status_label(status)));
    line.push_str(&format!(
        " {}",
        pipeline
            .last_modified
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    ));
    if !pipeline.valid {
        line.push_str(&format!(" {}", "invalid".red()));
    }
    println!("{}", line);
}

/// Print a pipeline as a grid card
fn print_pipeline_card(pipeline: &PipelineInfo, status: Option<&PipelineState>, show_name: bool) {
    println!("  {} {}", "▸".cyan(), pipeline.display_title().bold());
    if show_name {
        println!("    Name:     {}", pipeline.name.dimmed());
    }
    println!("    Status:   {}", status_label(status));
    println!(
        "    Modified: {}",
        pipeline
            .last_modified
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    if let Some(creator) = &pipeline.creator {
        println!("    Creator:  {}", creator.dimmed());
    }
    if !pipeline.labels().is_empty() {
        println!("    Labels:   {}", pipeline.labels().join(", ").dimmed());
    }
    if !pipeline.valid {
        println!("    {}", "Invalid pipeline".red());
    }
    println!();
}
