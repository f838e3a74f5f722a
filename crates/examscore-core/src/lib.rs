//! examscore-core: scoring, aggregation, and contest ranking.
//!
//! This crate takes already-fetched question definitions and response or
//! attempt records and turns them into evaluated responses, grouped
//! statistics, participant summaries, and ranked leaderboards. The engine
//! modules perform no I/O; `dataset` and `report` hold the file helpers.

pub mod aggregation;
pub mod config;
pub mod dataset;
pub mod dedup;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod ranking;
pub mod report;
