//! Core domain types
//!
//! This module contains the entities the pipeline browser caches and reasons
//! about. They mirror what the data collector reports and are shared between
//! the HTTP client (which decodes them) and the engine (which reconciles them).

pub mod alert;
pub mod label;
pub mod pipeline;
pub mod status;
