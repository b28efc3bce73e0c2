//! Attack tree builder
//!
//! Aggregates the monetary impact and occurrence probability of a two-level
//! catalog of security threats and draws the result as an SVG attack tree.

pub mod aggregator;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod formatter;
pub mod graph;
pub mod layout;
pub mod models;
pub mod pipeline;
pub mod renderer;

pub use errors::{AttackTreeError, AttackTreeResult};
pub use pipeline::{AttackTreePipeline, RunReport};
