//! Word n-gram models: counting, pruning, persistence and prediction.
//!
//! - Fixed-order frequency tables (`NGramModel`)
//! - Single-pass multi-order training from corpora (`ModelTrainer`)
//! - Per-order frequency pruning (`pruner`)
//! - JSON / binary persistence (`codec`)
//! - Cascading next-word prediction (`PredictionEngine`)

/// Fixed-order n-gram frequency table (`n >= 1`).
///
/// Handles observation counting, context lookup,
/// pruning, and model merging.
pub mod ngram_model;

/// Next-word counts of a single context.
///
/// This module is not exposed publicly.
mod state;

/// Sliding-window training of several orders at once, from tokens,
/// text, files or a whole corpus directory.
pub mod trainer;

/// Per-order minimum-count pruning.
pub mod pruner;

/// Interchange record, JSON and `postcard` encodings, model file naming.
pub mod codec;

/// Model set, asynchronous loading, and cascading prediction.
pub mod engine;

pub use engine::{LoadReport, ModelSet, PredictionEngine};
pub use ngram_model::NGramModel;
pub use trainer::{ModelTrainer, TrainReport};
