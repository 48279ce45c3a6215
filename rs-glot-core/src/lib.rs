//! Pseudo-word generation over weighted cyclic graphs.
//!
//! This crate provides:
//! - A weighted, possibly cyclic, finite-state graph of word fragments
//! - Word generation by random walks with soft length bounds
//! - Word validation that agrees with the generator
//! - A compact textual transition-table format and binary snapshots
//!
//! Randomness comes from an injectable [`random::RandomSource`], so seeded
//! runs are reproducible.

/// Error types shared by the crate.
pub mod error;

/// Line-based file reading/writing and path helpers.
pub mod io;

/// Language graph engine.
pub mod model;

/// Uniform integer sources.
pub mod random;

pub use error::{LanguageError, LanguageResult};
pub use model::generation_input::{Generation, GenerationInput, StopBias};
pub use model::graph::LanguageGraph;
pub use model::node::{GraphNode, NodeId};
pub use model::weighted_set::WeightedCumulativeSet;
pub use random::{RandomSource, SeededSource};
