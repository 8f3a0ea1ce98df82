//! Application-level orchestration.
//!
//! This module owns the generation lifecycle and the history cache, plus the
//! controller that serves UI commands against both. UI/CLI layers call into
//! this module to keep responsibilities separated.

mod controller;
pub(crate) mod generation;
pub(crate) mod history;

pub(crate) use controller::run_controller;
pub(crate) use generation::{RequestOrchestrator, Settlement};
pub(crate) use history::HistorySynchronizer;
