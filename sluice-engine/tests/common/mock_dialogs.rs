//! Dialogs that answer without an operator

use async_trait::async_trait;
use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::dto::pipeline::DuplicateOptions;
use sluice_engine::{Confirmation, PipelineDialogs};
use std::sync::Mutex;

/// Confirms or cancels every dialog, recording what was asked
#[allow(dead_code)]
pub struct ScriptedDialogs {
    confirm: bool,
    labels: Vec<String>,
    commit_message: String,
    prompts: Mutex<Vec<String>>,
    remote_ids: Mutex<Option<Vec<String>>>,
}

#[allow(dead_code)]
impl ScriptedDialogs {
    pub fn confirming() -> Self {
        Self::new(true)
    }

    pub fn cancelling() -> Self {
        Self::new(false)
    }

    fn new(confirm: bool) -> Self {
        Self {
            confirm,
            labels: vec!["prod".to_string()],
            commit_message: "nightly publish".to_string(),
            prompts: Mutex::new(Vec::new()),
            remote_ids: Mutex::new(None),
        }
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Dialogs opened so far, as `kind:name,name`
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Remote ids passed to the last download dialog
    pub fn remote_ids(&self) -> Option<Vec<String>> {
        self.remote_ids.lock().unwrap().clone()
    }

    fn ask<P>(&self, kind: &str, targets: &[PipelineInfo], payload: P) -> Confirmation<P> {
        let names: Vec<&str> = targets.iter().map(|p| p.name.as_str()).collect();
        self.prompts
            .lock()
            .unwrap()
            .push(format!("{}:{}", kind, names.join(",")));

        if self.confirm {
            Confirmation::Confirmed(payload)
        } else {
            Confirmation::Cancelled
        }
    }
}

#[async_trait]
impl PipelineDialogs for ScriptedDialogs {
    async fn confirm_stop(&self, targets: &[PipelineInfo], force: bool) -> Confirmation<()> {
        let kind = if force { "force-stop" } else { "stop" };
        self.ask(kind, targets, ())
    }

    async fn confirm_delete(&self, targets: &[PipelineInfo]) -> Confirmation<()> {
        self.ask("delete", targets, ())
    }

    async fn confirm_reset_offset(&self, targets: &[PipelineInfo]) -> Confirmation<()> {
        self.ask("reset-offset", targets, ())
    }

    async fn confirm_add_labels(&self, targets: &[PipelineInfo]) -> Confirmation<Vec<String>> {
        self.ask("add-labels", targets, self.labels.clone())
    }

    async fn confirm_publish(&self, targets: &[PipelineInfo]) -> Confirmation<String> {
        self.ask("publish", targets, self.commit_message.clone())
    }

    async fn confirm_duplicate(&self, pipeline: &PipelineInfo) -> Confirmation<DuplicateOptions> {
        self.ask(
            "duplicate",
            std::slice::from_ref(pipeline),
            DuplicateOptions::single_copy_of(pipeline),
        )
    }

    async fn share(&self, pipeline: &PipelineInfo) {
        self.prompts
            .lock()
            .unwrap()
            .push(format!("share:{}", pipeline.name));
    }

    async fn download_remote(&self, existing_remote_ids: &[String]) -> Confirmation<()> {
        *self.remote_ids.lock().unwrap() = Some(existing_remote_ids.to_vec());
        self.ask("download-remote", &[], ())
    }
}
