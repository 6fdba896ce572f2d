//! Shared helpers for the engine integration tests
//!
//! - Fixtures (pipelines, states, browsers)
//! - An in-memory transport with scripted failures and gated list responses
//! - Dialogs that confirm or cancel on demand

pub mod fixtures;
pub mod mock_dialogs;
pub mod mock_transport;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_dialogs::*;
#[allow(unused_imports)]
pub use mock_transport::*;
