//! Data Transfer Objects for the data collector API
//!
//! This module contains the request and response shapes exchanged with the
//! data collector. The HTTP client serializes them, the engine consumes them.

pub mod multi_status;
pub mod pipeline;
