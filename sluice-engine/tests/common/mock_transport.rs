//! In-memory transport for deterministic engine tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sluice_core::domain::label::{ALL_PIPELINES, PipelineLabels, RUNNING_PIPELINES};
use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::domain::status::{PipelineState, PipelineStatus};
use sluice_core::dto::multi_status::MultiStatusResponse;
use sluice_core::dto::pipeline::{DuplicateOptions, ListPipelines, PipelinePage};
use sluice_engine::{PipelineTransport, TransportError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::oneshot;

/// A call received by the mock transport
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(ListPipelines),
    Count,
    Labels,
    Start(String),
    StartAll(Vec<String>),
    Stop(String, bool),
    StopAll(Vec<String>, bool),
    Delete(Vec<String>),
    ResetOffsets(Vec<String>),
    AddLabels(Vec<String>, Vec<String>),
    Publish(Vec<String>, String),
    Duplicate(String, DuplicateOptions),
    Export(String, bool),
    ExportAll(Vec<String>, bool),
}

impl Call {
    /// Calls that change something on the collector
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Call::List(_) | Call::Count | Call::Labels | Call::Export(..) | Call::ExportAll(..)
        )
    }
}

/// Collector backed by an ordered in-memory catalog
///
/// Every state change stamps a fresh timestamp from an internal clock, so
/// returned states always win the reconciler's timestamp check.
#[allow(dead_code)]
pub struct MockTransport {
    catalog: Mutex<Vec<(PipelineInfo, PipelineState)>>,
    custom_labels: Mutex<Vec<String>>,
    calls: Mutex<Vec<Call>>,
    gates: Mutex<VecDeque<oneshot::Receiver<PipelinePage>>>,
    failing: Mutex<HashSet<&'static str>>,
    rejections: Mutex<HashMap<String, String>>,
    clock: AtomicI64,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            catalog: Mutex::new(Vec::new()),
            custom_labels: Mutex::new(vec!["prod".to_string(), "staging".to_string()]),
            calls: Mutex::new(Vec::new()),
            gates: Mutex::new(VecDeque::new()),
            failing: Mutex::new(HashSet::new()),
            rejections: Mutex::new(HashMap::new()),
            clock: AtomicI64::new(1_000),
        }
    }

    /// A catalog of pipelines in the given states
    pub fn with_pipelines(entries: &[(&str, PipelineStatus)]) -> Self {
        let transport = Self::new();
        for (name, status) in entries {
            transport.add(PipelineInfo::new(*name), *status);
        }
        transport
    }

    /// A catalog of `count` stopped pipelines named `p000`, `p001`, ...
    pub fn with_stopped(count: usize) -> Self {
        let transport = Self::new();
        for i in 0..count {
            transport.add(PipelineInfo::new(format!("p{:03}", i)), PipelineStatus::Stopped);
        }
        transport
    }

    pub fn add(&self, info: PipelineInfo, status: PipelineStatus) {
        let state = PipelineState::new(info.name.clone(), status, self.tick());
        self.catalog.lock().unwrap().push((info, state));
    }

    /// Replaces the stored state of a pipeline
    pub fn set_state(&self, state: PipelineState) {
        let mut catalog = self.catalog.lock().unwrap();
        if let Some(entry) = catalog.iter_mut().find(|(info, _)| info.name == state.name) {
            entry.1 = state;
        }
    }

    pub fn set_custom_labels(&self, labels: &[&str]) {
        *self.custom_labels.lock().unwrap() = labels.iter().map(|l| l.to_string()).collect();
    }

    /// Makes every call of `operation` fail, e.g. "list" or "delete"
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    /// Makes multi-status operations report `message` for `name`
    pub fn reject(&self, name: &str, message: &str) {
        self.rejections
            .lock()
            .unwrap()
            .insert(name.to_string(), message.to_string());
    }

    /// Holds the next list call until the returned sender delivers a page
    ///
    /// Dropping the sender fails the call; keeping it alive without sending
    /// never completes it.
    pub fn gate_next_list(&self) -> oneshot::Sender<PipelinePage> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> Vec<ListPipelines> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::List(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.catalog
            .lock()
            .unwrap()
            .iter()
            .map(|(info, _)| info.name.clone())
            .collect()
    }

    pub fn labels_of(&self, name: &str) -> Vec<String> {
        self.catalog
            .lock()
            .unwrap()
            .iter()
            .find(|(info, _)| info.name == name)
            .map(|(info, _)| info.labels().to_vec())
            .unwrap_or_default()
    }

    /// The page the collector would return for `req`
    pub fn page_for(&self, req: &ListPipelines) -> PipelinePage {
        let catalog = self.catalog.lock().unwrap();
        let matching: Vec<&(PipelineInfo, PipelineState)> = catalog
            .iter()
            .filter(|(info, _)| info.matches_search(&req.filter_text))
            .filter(|(info, _)| label_matches(info, req.label.as_deref()))
            .collect();

        let total_count = matching.len();
        let (items, statuses) = matching
            .into_iter()
            .skip(req.offset)
            .take(req.len)
            .map(|(info, state)| (info.clone(), state.clone()))
            .unzip();

        PipelinePage {
            items,
            statuses,
            total_count,
        }
    }

    pub fn tick(&self) -> DateTime<Utc> {
        let millis = self.clock.fetch_add(1_000, Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, operation: &'static str) -> Result<(), TransportError> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(TransportError::failed(format!("{} failed: server error", operation)));
        }
        Ok(())
    }

    fn rejection(&self, name: &str) -> Option<String> {
        self.rejections.lock().unwrap().get(name).cloned()
    }

    fn transition(&self, name: &str, status: PipelineStatus) -> PipelineState {
        let state = PipelineState::new(name, status, self.tick());
        self.set_state(state.clone());
        state
    }

    fn transition_all(
        &self,
        names: &[String],
        status: PipelineStatus,
    ) -> MultiStatusResponse<PipelineState> {
        let mut response = MultiStatusResponse::default();
        for name in names {
            match self.rejection(name) {
                Some(message) => response.error_messages.push(message),
                None => response.success_entities.push(self.transition(name, status)),
            }
        }
        response
    }
}

fn label_matches(info: &PipelineInfo, label: Option<&str>) -> bool {
    match label {
        None => true,
        Some(label) if label.starts_with("system:") => true,
        Some(label) => info.labels().iter().any(|l| l == label),
    }
}

#[async_trait]
impl PipelineTransport for MockTransport {
    async fn list_pipelines(&self, req: &ListPipelines) -> Result<PipelinePage, TransportError> {
        self.record(Call::List(req.clone()));

        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            return gate
                .await
                .map_err(|_| TransportError::failed("list gate dropped"));
        }

        self.check("list")?;
        Ok(self.page_for(req))
    }

    async fn count_pipelines(&self) -> Result<usize, TransportError> {
        self.record(Call::Count);
        self.check("count")?;
        Ok(self.catalog.lock().unwrap().len())
    }

    async fn list_labels(&self) -> Result<PipelineLabels, TransportError> {
        self.record(Call::Labels);
        self.check("labels")?;
        Ok(PipelineLabels {
            system: vec![ALL_PIPELINES.to_string(), RUNNING_PIPELINES.to_string()],
            custom: self.custom_labels.lock().unwrap().clone(),
        })
    }

    async fn start_pipeline(
        &self,
        name: &str,
        _runtime_parameters: &HashMap<String, Value>,
    ) -> Result<PipelineState, TransportError> {
        self.record(Call::Start(name.to_string()));
        self.check("start")?;
        Ok(self.transition(name, PipelineStatus::Starting))
    }

    async fn start_pipelines(
        &self,
        names: &[String],
    ) -> Result<MultiStatusResponse<PipelineState>, TransportError> {
        self.record(Call::StartAll(names.to_vec()));
        self.check("start")?;
        Ok(self.transition_all(names, PipelineStatus::Starting))
    }

    async fn stop_pipeline(&self, name: &str, force: bool) -> Result<PipelineState, TransportError> {
        self.record(Call::Stop(name.to_string(), force));
        self.check("stop")?;
        Ok(self.transition(name, PipelineStatus::Stopped))
    }

    async fn stop_pipelines(
        &self,
        names: &[String],
        force: bool,
    ) -> Result<MultiStatusResponse<PipelineState>, TransportError> {
        self.record(Call::StopAll(names.to_vec(), force));
        self.check("stop")?;
        Ok(self.transition_all(names, PipelineStatus::Stopped))
    }

    async fn delete_pipelines(&self, names: &[String]) -> Result<(), TransportError> {
        self.record(Call::Delete(names.to_vec()));
        self.check("delete")?;
        self.catalog
            .lock()
            .unwrap()
            .retain(|(info, _)| !names.contains(&info.name));
        Ok(())
    }

    async fn reset_offsets(&self, names: &[String]) -> Result<(), TransportError> {
        self.record(Call::ResetOffsets(names.to_vec()));
        self.check("reset-offsets")
    }

    async fn add_labels(
        &self,
        labels: &[String],
        names: &[String],
    ) -> Result<MultiStatusResponse<String>, TransportError> {
        self.record(Call::AddLabels(labels.to_vec(), names.to_vec()));
        self.check("add-labels")?;

        let mut response = MultiStatusResponse::default();
        let mut catalog = self.catalog.lock().unwrap();
        for name in names {
            if let Some(message) = self.rejection(name) {
                response.error_messages.push(message);
                continue;
            }
            if let Some((info, _)) = catalog.iter_mut().find(|(info, _)| &info.name == name) {
                info.merge_labels(labels);
                response.success_entities.push(name.clone());
            }
        }
        Ok(response)
    }

    async fn publish_pipelines(
        &self,
        names: &[String],
        commit_message: &str,
    ) -> Result<(), TransportError> {
        self.record(Call::Publish(names.to_vec(), commit_message.to_string()));
        self.check("publish")
    }

    async fn duplicate_pipeline(
        &self,
        name: &str,
        options: &DuplicateOptions,
    ) -> Result<(), TransportError> {
        self.record(Call::Duplicate(name.to_string(), options.clone()));
        self.check("duplicate")?;
        for i in 0..options.count {
            let copy_name = if options.count == 1 {
                options.title.clone()
            } else {
                format!("{}{}", options.title, i + 1)
            };
            self.add(PipelineInfo::new(copy_name), PipelineStatus::Edited);
        }
        Ok(())
    }

    async fn export_pipeline(
        &self,
        name: &str,
        include_definitions: bool,
    ) -> Result<(), TransportError> {
        self.record(Call::Export(name.to_string(), include_definitions));
        self.check("export")
    }

    async fn export_pipelines(
        &self,
        names: &[String],
        include_definitions: bool,
    ) -> Result<(), TransportError> {
        self.record(Call::ExportAll(names.to_vec(), include_definitions));
        self.check("export")
    }
}
