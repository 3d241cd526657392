//! reviews-etl library interface
//!
//! Stages in pipeline order: collector → normalizer → sentiment → themes →
//! persister → visualizer. Each stage reads one CSV artifact and writes the
//! next; [`pipeline::Pipeline`] runs them all in order.

pub mod collector;
pub mod normalizer;
pub mod persister;
pub mod pipeline;
pub mod sentiment;
pub mod themes;
pub mod visualizer;

pub use pipeline::{Pipeline, PipelineReport, StageOutcome};
