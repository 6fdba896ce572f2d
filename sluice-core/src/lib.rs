//! Sluice Core
//!
//! Core types shared by the Sluice pipeline browser.
//!
//! This crate contains:
//! - Domain types: pipelines, runtime states, alerts and labels as the
//!   data collector reports them
//! - DTOs: request and response shapes exchanged with the data collector API

pub mod domain;
pub mod dto;
