use std::path::PathBuf;

/// Errors raised by the counting structures themselves.
///
/// All of these are programmer errors: they are surfaced immediately
/// and never retried.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
	/// A context did not hold exactly `n - 1` tokens.
	#[error("context has {actual} tokens, model expects {expected}")]
	InvalidContextLength {
		/// Context length required by the model (`n - 1`).
		expected: usize,
		/// Context length supplied by the caller.
		actual: usize,
	},

	/// Models are order 1 or higher.
	#[error("invalid model order {0}, must be >= 1")]
	InvalidOrder(usize),

	/// A token was empty or contained whitespace.
	#[error("invalid token {0:?}")]
	InvalidToken(String),

	/// Two models of different orders were combined.
	#[error("order mismatch: expected {expected}, got {actual}")]
	OrderMismatch {
		/// Order of the receiving model.
		expected: usize,
		/// Order of the other model.
		actual: usize,
	},

	/// A model set contained two models of the same order.
	#[error("duplicate model of order {0}")]
	DuplicateOrder(usize),
}

/// Errors raised while encoding or decoding a persisted model.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
	/// The record violates the model schema.
	#[error("malformed model format: {0}")]
	MalformedModelFormat(String),

	#[error("model file i/o error: {0}")]
	Io(#[from] std::io::Error),

	#[error("model json error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("model binary error: {0}")]
	Binary(#[from] postcard::Error),
}

/// Errors raised while reading corpus text.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
	/// One corpus file could not be read. The batch continues.
	#[error("failed to read corpus file {}: {source}", path.display())]
	CorpusReadFailure {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The corpus directory itself could not be listed. The batch aborts.
	#[error("corpus directory {} is unreadable: {source}", path.display())]
	UnreadableCorpus {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid config: {0}")]
	Invalid(String),
}
