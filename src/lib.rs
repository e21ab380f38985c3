//! Hybrid energy plant configuration, model registry, and techno-economic evaluation.

pub mod config;
pub mod inflation;
pub mod io;
pub mod logging;
/// Performance, cost, and finance models that run in-process.
pub mod models;
pub mod pipeline;
pub mod registry;
