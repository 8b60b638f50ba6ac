//! Word-level n-gram language models for next-word prediction.
//!
//! This crate provides the whole model pipeline:
//! - Tokenizing raw corpus text into lowercase words
//! - Training several n-gram orders in one pass over a corpus
//! - Pruning rare observations to bound model size
//! - Persisting models as JSON or compact binary
//! - Predicting the next word, falling back from high to low orders
//!
//! The editor or tool driving predictions owns a [`model::PredictionEngine`]
//! and passes it where needed; there is no global model state.

/// N-gram models, training, pruning, persistence and prediction.
pub mod model;

/// Corpus text normalization.
pub mod tokenizer;

/// Build and engine configuration.
pub mod config;

/// Error types.
pub mod error;

/// I/O utilities (directory listing, path helpers).
pub mod io;
