//! Pipeline browser controller
//!
//! Wires the list query, the selection and the bulk dispatcher to the events
//! of a pipeline list view. A browser is shared behind an `Arc`; concurrent
//! calls interleave like UI event handlers.
//!
//! Lock order is list, then store. Neither lock is held across a transport
//! call.

use serde_json::Value;
use sluice_core::domain::label::{ALL_PIPELINES, PipelineLabels};
use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::domain::status::PipelineState;
use sluice_core::dto::pipeline::SortColumn;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dialogs::{Confirmation, PipelineDialogs};
use crate::dispatcher::{BulkCommandDispatcher, CommandOutcome};
use crate::preferences::{ListPreferences, PreferenceStore, ViewSettings};
use crate::query::{ListQueryEngine, ListQueryState, QueryApplied};
use crate::selection::SelectionModel;
use crate::store::StateStore;
use crate::transport::{PipelineTransport, bounded};
use crate::validator::{self, BulkAction, ValidationReport};

/// Prefix of the pipelines the control hub creates for its own jobs
const SYSTEM_PIPELINE_PREFIX: &str = "System Pipeline for Job";

/// List state guarded by one lock
#[derive(Debug)]
struct ListView {
    query: ListQueryEngine,
    selection: SelectionModel,
    /// Set once the initial count has come back
    loaded: bool,
    /// Number of pipelines on the collector, ignoring filters
    total_pipelines: usize,
}

pub struct PipelineBrowser {
    config: EngineConfig,
    transport: Arc<dyn PipelineTransport>,
    dialogs: Arc<dyn PipelineDialogs>,
    preferences: Arc<dyn PreferenceStore>,
    store: StateStore,
    dispatcher: BulkCommandDispatcher,
    list: Mutex<ListView>,
    view: watch::Sender<ViewSettings>,
    labels: watch::Sender<Option<PipelineLabels>>,
}

impl PipelineBrowser {
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn PipelineTransport>,
        dialogs: Arc<dyn PipelineDialogs>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self::with_store(config, transport, dialogs, preferences, StateStore::new())
    }

    /// Creates a browser over an existing application state
    ///
    /// Reads the saved preferences once on the calling thread; later reads
    /// and writes run on the blocking pool.
    pub fn with_store(
        config: EngineConfig,
        transport: Arc<dyn PipelineTransport>,
        dialogs: Arc<dyn PipelineDialogs>,
        preferences: Arc<dyn PreferenceStore>,
        store: StateStore,
    ) -> Self {
        let saved = load_preferences(preferences.as_ref());

        let mut query = ListQueryEngine::new(config.page_size);
        query.set_search_term(&saved.search_input);

        let dispatcher = BulkCommandDispatcher::new(
            transport.clone(),
            dialogs.clone(),
            store.clone(),
            config.request_timeout,
        );

        Self {
            list: Mutex::new(ListView {
                query,
                selection: SelectionModel::new(),
                loaded: false,
                total_pipelines: 0,
            }),
            view: watch::Sender::new(saved.view()),
            labels: watch::Sender::new(None),
            config,
            transport,
            dialogs,
            preferences,
            store,
            dispatcher,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    // =============================================================================
    // Loading
    // =============================================================================

    /// Loads labels and the pipeline count, restores saved preferences, and
    /// fetches the first page
    ///
    /// Returns `None` when the count could not be fetched.
    pub async fn init(&self) -> Option<QueryApplied> {
        let (_, count) = tokio::join!(
            self.load_labels(),
            bounded(self.config.request_timeout, self.transport.count_pipelines())
        );

        let count = match count {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to count pipelines");
                self.list.lock().await.loaded = true;
                return None;
            }
        };

        {
            let saved = self.saved_preferences().await;
            let mut list = self.list.lock().await;
            list.loaded = true;
            list.total_pipelines = count;

            if count < self.config.preference_restore_limit {
                if let Some(column) = saved.sort_column {
                    list.query.set_sort(column, saved.sort_reverse);
                }
            } else {
                debug!(count, "Skipping saved sort order on a large catalog");
            }
        }

        info!(count, "Pipeline browser initialized");
        Some(self.query(0).await)
    }

    /// Fetches the labels and resolves the label to filter by
    ///
    /// On failure the list falls back to all pipelines.
    pub async fn load_labels(&self) -> Option<PipelineLabels> {
        let saved = self.saved_preferences().await;

        match bounded(self.config.request_timeout, self.transport.list_labels()).await {
            Ok(labels) => {
                let label = labels.resolve(saved.selected_label.as_deref());
                self.list.lock().await.query.set_label(Some(label));
                self.labels.send_replace(Some(labels.clone()));
                Some(labels)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load labels");
                self.list
                    .lock()
                    .await
                    .query
                    .set_label(Some(ALL_PIPELINES.to_string()));
                None
            }
        }
    }

    /// Fetches the page at `offset` and applies it
    ///
    /// Offset zero replaces the list, the status map and the selection.
    pub async fn query(&self, offset: usize) -> QueryApplied {
        let ticket = {
            let mut list = self.list.lock().await;
            if offset == 0 {
                list.selection.unselect_all();
            }
            list.query.begin(offset)
        };

        let result = bounded(
            self.config.request_timeout,
            self.transport.list_pipelines(ticket.request()),
        )
        .await;

        let mut list = self.list.lock().await;
        let applied = list.query.complete(ticket, result);

        match &applied {
            QueryApplied::Replaced { statuses } => {
                let statuses = statuses.clone();
                self.store
                    .update(|state| {
                        state.statuses.clear();
                        state.statuses.merge_all(statuses);
                    })
                    .await;
            }
            QueryApplied::Appended { statuses } => {
                let statuses = statuses.clone();
                self.store
                    .update(|state| state.statuses.merge_all(statuses))
                    .await;
            }
            QueryApplied::Failed { message } => {
                warn!(error = %message, "Failed to list pipelines");
                self.store.set_errors(vec![message.clone()]).await;
            }
            QueryApplied::Stale => {}
        }

        applied
    }

    /// Fetches the next page
    ///
    /// Does nothing while a query is in flight or when every match is loaded.
    pub async fn load_more(&self) -> QueryApplied {
        let offset = {
            let list = self.list.lock().await;
            if !list.query.show_load_more() {
                debug!("No further page to load");
                return QueryApplied::Stale;
            }
            list.query.state().offset
        };
        self.query(offset).await
    }

    /// Reloads the first page, dropping the selection
    pub async fn refresh(&self) -> QueryApplied {
        self.query(0).await
    }

    // =============================================================================
    // Filters
    // =============================================================================

    pub async fn search(&self, term: &str) -> QueryApplied {
        self.list.lock().await.query.set_search_term(term);
        let term = term.trim().to_string();
        self.persist(move |prefs| prefs.search_input = term).await;
        self.query(0).await
    }

    pub async fn select_label(&self, label: &str) -> QueryApplied {
        self.list
            .lock()
            .await
            .query
            .set_label(Some(label.to_string()));
        let label = label.to_string();
        self.persist(move |prefs| prefs.selected_label = Some(label))
            .await;
        self.query(0).await
    }

    /// Applies a column header click and reloads
    pub async fn sort_by(&self, column: SortColumn) -> QueryApplied {
        let (column, reverse) = {
            let mut list = self.list.lock().await;
            list.query.click_sort_header(column);
            (list.query.state().sort_column, list.query.state().sort_reverse)
        };
        self.save_sort(column, reverse).await;
        self.query(0).await
    }

    pub async fn set_sort(&self, column: SortColumn, reverse: bool) -> QueryApplied {
        self.list.lock().await.query.set_sort(column, reverse);
        self.save_sort(column, reverse).await;
        self.query(0).await
    }

    async fn save_sort(&self, column: SortColumn, reverse: bool) {
        self.persist(move |prefs| {
            prefs.sort_column = Some(column);
            prefs.sort_reverse = reverse;
        })
        .await;
    }

    // =============================================================================
    // Selection
    // =============================================================================

    pub async fn toggle(&self, name: &str) -> bool {
        self.list.lock().await.selection.toggle(name)
    }

    pub async fn select(&self, name: &str, extend_from_shift: bool) {
        let mut list = self.list.lock().await;
        let ListView {
            query, selection, ..
        } = &mut *list;
        selection.select(name, extend_from_shift, query.visible_names().as_slice());
    }

    pub async fn unselect(&self, name: &str) {
        self.list.lock().await.selection.unselect(name);
    }

    /// Selects every loaded pipeline
    pub async fn select_all(&self) {
        let mut list = self.list.lock().await;
        let ListView {
            query, selection, ..
        } = &mut *list;
        selection.select_all(query.visible_names());
    }

    pub async fn unselect_all(&self) {
        self.list.lock().await.selection.unselect_all();
    }

    pub async fn selected(&self) -> Vec<String> {
        self.list.lock().await.selection.selected().to_vec()
    }

    pub async fn all_selected(&self) -> bool {
        self.list.lock().await.selection.all_selected()
    }

    // =============================================================================
    // Snapshots
    // =============================================================================

    pub async fn items(&self) -> Vec<PipelineInfo> {
        self.list.lock().await.query.items().to_vec()
    }

    pub async fn query_state(&self) -> ListQueryState {
        self.list.lock().await.query.state().clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.list.lock().await.loaded
    }

    pub async fn is_fetching(&self) -> bool {
        self.list.lock().await.query.is_fetching()
    }

    pub async fn show_load_more(&self) -> bool {
        self.list.lock().await.query.show_load_more()
    }

    pub async fn total_pipelines(&self) -> usize {
        self.list.lock().await.total_pipelines
    }

    pub async fn errors(&self) -> Vec<String> {
        self.store.errors().await
    }

    pub async fn status_of(&self, name: &str) -> Option<PipelineState> {
        self.store.status_of(name).await
    }

    pub async fn alert_messages(&self, name: &str) -> Vec<String> {
        self.store.read(|state| state.alerts.messages(name)).await
    }

    /// Pipelines the control hub runs for its own jobs
    pub async fn is_system_pipeline(&self, name: &str) -> bool {
        if !name.starts_with(SYSTEM_PIPELINE_PREFIX) {
            return false;
        }
        self.store
            .read(|state| state.statuses.get(name).is_some_and(PipelineState::is_remote))
            .await
    }

    // =============================================================================
    // View Settings
    // =============================================================================

    pub fn subscribe_view(&self) -> watch::Receiver<ViewSettings> {
        self.view.subscribe()
    }

    /// Observes label loads; `None` until the first successful load
    pub fn subscribe_labels(&self) -> watch::Receiver<Option<PipelineLabels>> {
        self.labels.subscribe()
    }

    pub fn view_settings(&self) -> ViewSettings {
        *self.view.borrow()
    }

    pub async fn set_grid_view(&self, grid_view: bool) {
        self.view.send_modify(|view| view.grid_view = grid_view);
        self.persist(move |prefs| prefs.grid_view = grid_view).await;
    }

    pub async fn toggle_name_column(&self) -> bool {
        let mut shown = false;
        self.view.send_modify(|view| {
            view.show_name_column = !view.show_name_column;
            shown = view.show_name_column;
        });
        self.persist(move |prefs| prefs.show_name_column = shown)
            .await;
        shown
    }

    // =============================================================================
    // Commands
    // =============================================================================

    /// Validates the selection for `action` and dispatches it
    pub async fn run(&self, action: BulkAction) -> CommandOutcome {
        let report = {
            let list = self.list.lock().await;
            let selected = list.selection.selected();

            if action.is_single_target() {
                list.selection
                    .first()
                    .and_then(|name| list.query.find(name))
                    .cloned()
                    .map(ValidationReport::single)
                    .unwrap_or_default()
            } else {
                self.store
                    .read(|state| {
                        validator::validate(action, selected, list.query.items(), &state.statuses)
                    })
                    .await
            }
        };

        let outcome = self.dispatcher.execute(action, report).await;
        self.apply_effects(&outcome).await;
        outcome
    }

    pub async fn start_selected(&self) -> CommandOutcome {
        self.run(BulkAction::Start).await
    }

    pub async fn stop_selected(&self, force: bool) -> CommandOutcome {
        self.run(BulkAction::Stop { force }).await
    }

    pub async fn delete_selected(&self) -> CommandOutcome {
        self.run(BulkAction::Delete).await
    }

    pub async fn reset_offset_selected(&self) -> CommandOutcome {
        self.run(BulkAction::ResetOffset).await
    }

    pub async fn add_labels_selected(&self) -> CommandOutcome {
        self.run(BulkAction::AddLabels).await
    }

    pub async fn publish_selected(&self) -> CommandOutcome {
        self.run(BulkAction::Publish).await
    }

    pub async fn duplicate_selected(&self) -> CommandOutcome {
        self.run(BulkAction::Duplicate).await
    }

    pub async fn share_selected(&self) -> CommandOutcome {
        self.run(BulkAction::Share).await
    }

    pub async fn export_selected(&self, include_definitions: bool) -> CommandOutcome {
        self.run(BulkAction::Export {
            include_definitions,
        })
        .await
    }

    /// Runs `action` on one loaded pipeline, ignoring the selection
    pub async fn run_on(&self, name: &str, action: BulkAction) -> CommandOutcome {
        let report = {
            let list = self.list.lock().await;
            self.store
                .read(|state| validator::validate(action, &[name], list.query.items(), &state.statuses))
                .await
        };

        let outcome = self.dispatcher.execute(action, report).await;
        self.apply_effects(&outcome).await;
        outcome
    }

    pub async fn start_pipeline(
        &self,
        name: &str,
        runtime_parameters: &HashMap<String, Value>,
    ) -> CommandOutcome {
        let Some(pipeline) = self.find(name).await else {
            return CommandOutcome::NothingSelected;
        };
        self.dispatcher.start_one(&pipeline, runtime_parameters).await
    }

    pub async fn stop_pipeline(&self, name: &str, force: bool) -> CommandOutcome {
        let Some(pipeline) = self.find(name).await else {
            return CommandOutcome::NothingSelected;
        };
        self.dispatcher.stop_one(&pipeline, force).await
    }

    pub async fn delete_pipeline(&self, name: &str) -> CommandOutcome {
        self.run_on(name, BulkAction::Delete).await
    }

    pub async fn export_pipeline(&self, name: &str, include_definitions: bool) -> CommandOutcome {
        self.run_on(
            name,
            BulkAction::Export {
                include_definitions,
            },
        )
        .await
    }

    pub async fn duplicate_pipeline(&self, name: &str) -> CommandOutcome {
        self.run_on(name, BulkAction::Duplicate).await
    }

    pub async fn share_pipeline(&self, name: &str) -> CommandOutcome {
        self.run_on(name, BulkAction::Share).await
    }

    /// Offers to download pipelines from the control hub and reloads the list
    /// when the operator confirms
    pub async fn download_remote(&self) -> CommandOutcome {
        let existing: Vec<String> = {
            let list = self.list.lock().await;
            list.query
                .items()
                .iter()
                .filter_map(|p| p.remote_pipeline_id().map(str::to_string))
                .collect()
        };

        match self.dialogs.download_remote(&existing).await {
            Confirmation::Confirmed(()) => {
                self.refresh().await;
                CommandOutcome::Succeeded(Default::default())
            }
            Confirmation::Cancelled => CommandOutcome::Cancelled,
        }
    }

    async fn find(&self, name: &str) -> Option<PipelineInfo> {
        self.list.lock().await.query.find(name).cloned()
    }

    async fn apply_effects(&self, outcome: &CommandOutcome) {
        let Some(effects) = outcome.effects() else {
            return;
        };

        if !effects.labels_added.is_empty() {
            self.list
                .lock()
                .await
                .query
                .merge_labels(&effects.succeeded, &effects.labels_added);
        }

        if effects.refresh {
            self.refresh().await;
        }
    }

    /// Reads the preference blob on the blocking pool
    async fn saved_preferences(&self) -> ListPreferences {
        let store = self.preferences.clone();
        tokio::task::spawn_blocking(move || load_preferences(store.as_ref()))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Preference load task failed, using defaults");
                ListPreferences::default()
            })
    }

    /// Load-modify-save of the preference blob on the blocking pool; failures
    /// are logged only
    async fn persist(&self, change: impl FnOnce(&mut ListPreferences) + Send + 'static) {
        let store = self.preferences.clone();
        let saved = tokio::task::spawn_blocking(move || {
            let mut prefs = load_preferences(store.as_ref());
            change(&mut prefs);
            store.save(&prefs)
        })
        .await;

        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to save list preferences"),
            Err(e) => warn!(error = %e, "Preference save task failed"),
        }
    }
}

fn load_preferences(store: &dyn PreferenceStore) -> ListPreferences {
    store.load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load list preferences, using defaults");
        ListPreferences::default()
    })
}
