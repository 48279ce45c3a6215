//! Top-level module for the language graph engine.
//!
//! This module provides:
//! - Weighted cumulative sampling (`WeightedCumulativeSet`)
//! - Automaton states with random walks and acceptance (`GraphNode`)
//! - The node arena with generation and validation (`LanguageGraph`)
//! - Generation parameters and results (`GenerationInput`, `Generation`)
//! - The textual transition-table format

/// Node arena: word generation, validation, persistence.
pub mod graph;

/// Generation parameters (`GenerationInput`, `StopBias`) and results (`Generation`).
pub mod generation_input;

/// Automaton states: fragment/link selection, random walk and acceptance.
pub mod node;

/// Transition-table import and export for `LanguageGraph`.
pub mod transition_table;

/// Running-sum weighted sampling shared by fragments and links.
pub mod weighted_set;
