//! Terminal dialogs
//!
//! Confirmations are read from stdin unless `--yes` was given. Values the
//! web UI would ask for in a form come from command-line flags instead.

use async_trait::async_trait;
use colored::*;
use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::dto::pipeline::DuplicateOptions;
use sluice_engine::{Confirmation, PipelineDialogs};
use std::io::{self, BufRead, Write};
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct TerminalDialogs {
    /// Skip confirmation prompts
    assume_yes: bool,
    /// Labels to add
    labels: Vec<String>,
    /// Commit message to publish with
    commit_message: Option<String>,
    /// Title of duplicated copies
    copy_title: Option<String>,
    /// Number of copies to create
    copy_count: u32,
}

impl TerminalDialogs {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            copy_count: 1,
            ..Self::default()
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_commit_message(mut self, message: Option<String>) -> Self {
        self.commit_message = message;
        self
    }

    pub fn with_copies(mut self, title: Option<String>, count: u32) -> Self {
        self.copy_title = title;
        self.copy_count = count;
        self
    }

    /// Asks a yes/no question, defaulting to no
    async fn ask(&self, question: String) -> bool {
        if self.assume_yes {
            return true;
        }

        let answer = tokio::task::spawn_blocking(move || {
            eprint!("{} {} ", question.yellow(), "[y/N]".dimmed());
            io::stderr().flush()?;

            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok::<_, io::Error>(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read confirmation");
                false
            }
            Err(e) => {
                warn!(error = %e, "Confirmation prompt panicked");
                false
            }
        }
    }

    async fn confirm<P>(&self, question: String, payload: P) -> Confirmation<P> {
        if self.ask(question).await {
            Confirmation::Confirmed(payload)
        } else {
            Confirmation::Cancelled
        }
    }
}

/// `"a"`, or `3 pipelines` for more than one
fn describe(targets: &[PipelineInfo]) -> String {
    match targets {
        [single] => format!("\"{}\"", single.display_title()),
        _ => format!("{} pipelines", targets.len()),
    }
}

#[async_trait]
impl PipelineDialogs for TerminalDialogs {
    async fn confirm_stop(&self, targets: &[PipelineInfo], force: bool) -> Confirmation<()> {
        let verb = if force { "Force stop" } else { "Stop" };
        self.confirm(format!("{} {}?", verb, describe(targets)), ())
            .await
    }

    async fn confirm_delete(&self, targets: &[PipelineInfo]) -> Confirmation<()> {
        self.confirm(format!("Delete {}?", describe(targets)), ()).await
    }

    async fn confirm_reset_offset(&self, targets: &[PipelineInfo]) -> Confirmation<()> {
        self.confirm(format!("Reset the origin of {}?", describe(targets)), ())
            .await
    }

    async fn confirm_add_labels(&self, targets: &[PipelineInfo]) -> Confirmation<Vec<String>> {
        if self.labels.is_empty() {
            eprintln!("{}", "No labels given.".yellow());
            return Confirmation::Cancelled;
        }

        let question = format!(
            "Add {} to {}?",
            self.labels.join(", ").cyan(),
            describe(targets)
        );
        self.confirm(question, self.labels.clone()).await
    }

    async fn confirm_publish(&self, targets: &[PipelineInfo]) -> Confirmation<String> {
        let message = self.commit_message.clone().unwrap_or_default();
        self.confirm(format!("Publish {}?", describe(targets)), message)
            .await
    }

    async fn confirm_duplicate(&self, pipeline: &PipelineInfo) -> Confirmation<DuplicateOptions> {
        let mut options = DuplicateOptions::single_copy_of(pipeline);
        if let Some(title) = &self.copy_title {
            options.title = title.clone();
        }
        options.count = self.copy_count.max(1);

        let question = format!(
            "Create {} copy(ies) of \"{}\" titled \"{}\"?",
            options.count,
            pipeline.display_title(),
            options.title
        );
        self.confirm(question, options).await
    }

    async fn share(&self, pipeline: &PipelineInfo) {
        println!(
            "{} Sharing settings of \"{}\" are managed on the control hub.",
            "▸".cyan(),
            pipeline.display_title()
        );
    }

    async fn download_remote(&self, existing_remote_ids: &[String]) -> Confirmation<()> {
        println!(
            "{} Remote download needs the control hub; {} pipeline(s) here are already remote.",
            "▸".cyan(),
            existing_remote_ids.len()
        );
        Confirmation::Cancelled
    }
}
