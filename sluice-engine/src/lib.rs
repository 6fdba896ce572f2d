//! Sluice Engine
//!
//! Client-side list and status synchronization for the pipeline browser.
//!
//! The engine keeps a cached, paginated view of pipelines and their runtime
//! states, merges status updates that arrive out of order, tracks the
//! operator's selection, and gates bulk operations behind per-pipeline state
//! checks before dispatching them.
//!
//! Architecture:
//! - `status`: timestamp-guarded status reconciliation
//! - `selection`: toggle, range-extend and select-all semantics
//! - `query`: pagination, filters, sort, and the generation guard
//! - `validator`: per-action pre-flight rules
//! - `dispatcher`: confirm, execute, reconcile
//! - `browser`: the controller wiring all of the above to UI events
//!
//! The network and the dialogs are collaborators behind the
//! [`PipelineTransport`] and [`PipelineDialogs`] traits.

pub mod alerts;
pub mod browser;
pub mod config;
pub mod dialogs;
pub mod dispatcher;
pub mod error;
pub mod preferences;
pub mod query;
pub mod selection;
pub mod status;
pub mod store;
pub mod transport;
pub mod validator;

pub use browser::PipelineBrowser;
pub use config::EngineConfig;
pub use dialogs::{Confirmation, PipelineDialogs};
pub use dispatcher::{BulkCommandDispatcher, BulkPhase, CommandEffects, CommandOutcome};
pub use error::{ConfigError, PreferenceError, TransportError};
pub use preferences::{ListPreferences, MemoryPreferenceStore, PreferenceStore, ViewSettings};
pub use query::{ListQueryEngine, ListQueryState, QueryApplied, QueryTicket};
pub use selection::SelectionModel;
pub use status::{MergeOutcome, StatusReconciler};
pub use store::{AppState, StateStore};
pub use transport::PipelineTransport;
pub use validator::{BulkAction, ValidationReport};
