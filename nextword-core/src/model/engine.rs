use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::codec::{self, ModelFormat, model_path};
use super::ngram_model::NGramModel;
use crate::config::EngineConfig;
use crate::error::{CodecError, ConfigError, ModelError};
use crate::tokenizer::normalize_token;

/// A set of models of distinct orders, highest order first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSet {
	models: Vec<NGramModel>,
}

impl ModelSet {
	/// Builds a set from models of distinct orders, in any order.
	///
	/// # Errors
	/// Returns [`ModelError::DuplicateOrder`] if two models share an order.
	pub fn new(mut models: Vec<NGramModel>) -> Result<Self, ModelError> {
		models.sort_by(|a, b| b.order().cmp(&a.order()));
		if let Some(pair) = models.windows(2).find(|pair| pair[0].order() == pair[1].order()) {
			return Err(ModelError::DuplicateOrder(pair[0].order()));
		}
		Ok(Self { models })
	}

	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}

	/// Orders held, highest first.
	pub fn orders(&self) -> Vec<usize> {
		self.models.iter().map(NGramModel::order).collect()
	}

	pub fn model(&self, n: usize) -> Option<&NGramModel> {
		self.models.iter().find(|m| m.order() == n)
	}

	fn model_mut(&mut self, n: usize) -> Option<&mut NGramModel> {
		self.models.iter_mut().find(|m| m.order() == n)
	}

	/// Predicts the word following `recent` (already normalized).
	///
	/// Orders are tried from highest to lowest. An order is skipped when
	/// there is not enough history for its context or when the context was
	/// never seen; the first order with candidates wins.
	pub fn predict(&self, recent: &[String]) -> Option<String> {
		for model in &self.models {
			let needed = model.context_len();
			if recent.len() < needed {
				log::trace!("{}-gram skipped: {} of {needed} context words", model.order(), recent.len());
				continue;
			}

			let context = &recent[recent.len() - needed..];
			match model.best_word(context) {
				Ok(Some((word, count))) => {
					log::debug!("{}-gram {context:?} -> {word:?} ({count} times)", model.order());
					return Some(word.to_owned());
				}
				Ok(None) => log::trace!("{}-gram {context:?} unseen", model.order()),
				Err(e) => log::warn!("{}-gram lookup failed: {e}", model.order()),
			}
		}
		None
	}
}

/// Result of one [`PredictionEngine::load_models`] call.
#[derive(Debug, Default)]
pub struct LoadReport {
	/// Orders now available, highest first.
	pub loaded: Vec<usize>,

	/// Orders that could not be loaded, with the reason.
	pub failed: Vec<(usize, PathBuf, CodecError)>,

	/// A newer load or install replaced this one; its models were discarded.
	pub superseded: bool,
}

/// Answers "what word comes next" from a cascade of n-gram models.
///
/// # Readiness
/// The engine starts empty. [`Self::are_models_loaded`] is `true` exactly
/// when the installed set holds at least one model, and every prediction
/// made while it is `false` returns `None`.
///
/// # Concurrency
/// The model set is swapped in whole under a write lock, so a prediction
/// sees either the previous set or the new one, never a partial load.
/// Predictions share a read lock; live training takes the write lock.
#[derive(Debug)]
pub struct PredictionEngine {
	config: EngineConfig,

	/// `None` until a load installs at least one model.
	models: RwLock<Option<ModelSet>>,

	/// Bumped by every load and install; a load only installs its result
	/// if no newer one started meanwhile.
	generation: AtomicU64,
}

impl PredictionEngine {
	/// Creates an engine with nothing loaded.
	///
	/// # Errors
	/// Returns [`ConfigError::Invalid`] if the configured orders are invalid.
	pub fn new(mut config: EngineConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		config.orders.sort_unstable_by(|a, b| b.cmp(a));
		Ok(Self {
			config,
			models: RwLock::new(None),
			generation: AtomicU64::new(0),
		})
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Loads one model file per configured order from the model directory.
	///
	/// The load is registered when this is called, not when the future is
	/// first polled: a later `load_models` or `install` supersedes it.
	///
	/// Files are read concurrently. A missing or malformed file only makes
	/// its own order unavailable; it is logged and listed in the report.
	/// The loaded orders then replace the current set in one swap, unless
	/// the load was superseded, in which case its result is discarded.
	pub fn load_models(&self) -> impl Future<Output = LoadReport> + '_ {
		let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		self.load_with_ticket(ticket)
	}

	async fn load_with_ticket(&self, ticket: u64) -> LoadReport {
		let dir = &self.config.model_dir;
		let format = self.config.format;

		log::info!("Loading {:?}-gram models from {}", self.config.orders, dir.display());

		let loads = self.config.orders.iter().map(|&n| {
			let path = model_path(dir, n, format);
			async move {
				let result = load_model_file(&path, n, format).await;
				(n, path, result)
			}
		});
		let results = futures::future::join_all(loads).await;

		let mut report = LoadReport::default();
		let mut models = Vec::with_capacity(results.len());
		for (n, path, result) in results {
			match result {
				Ok(model) => {
					log::info!("Loaded {}: {} contexts", path.display(), model.size());
					models.push(model);
				}
				Err(e) => {
					log::warn!("{}-gram model unavailable ({}): {e}", n, path.display());
					report.failed.push((n, path, e));
				}
			}
		}

		// Orders are unique by config validation.
		let set = match ModelSet::new(models) {
			Ok(set) => set,
			Err(e) => {
				log::error!("Discarding load: {e}");
				ModelSet::default()
			}
		};

		let mut guard = self.write();
		if self.generation.load(Ordering::SeqCst) != ticket {
			log::info!("Load superseded by a newer one, discarding");
			report.superseded = true;
			return report;
		}
		report.loaded = set.orders();
		*guard = (!set.is_empty()).then_some(set);
		drop(guard);

		if report.loaded.is_empty() {
			log::warn!("No model could be loaded, predictions are disabled");
		}
		report
	}

	/// Replaces the current models with an in-memory set.
	///
	/// Supersedes any load still in flight. An empty set unloads.
	pub fn install(&self, set: ModelSet) {
		let mut guard = self.write();
		self.generation.fetch_add(1, Ordering::SeqCst);
		*guard = (!set.is_empty()).then_some(set);
	}

	/// Drops every model; the engine is not ready afterwards.
	pub fn unload(&self) {
		self.install(ModelSet::default());
	}

	/// `true` once at least one order is available.
	pub fn are_models_loaded(&self) -> bool {
		self.read().is_some()
	}

	/// Orders currently available, highest first.
	pub fn loaded_orders(&self) -> Vec<usize> {
		self.read().as_ref().map(ModelSet::orders).unwrap_or_default()
	}

	/// Predicts the word following `recent_tokens`.
	///
	/// Each token is trimmed and lowercased; tokens left empty are dropped.
	/// Returns `None` if no model is loaded, or if no order has seen the
	/// relevant context.
	pub fn predict_next_word<S: AsRef<str>>(&self, recent_tokens: &[S]) -> Option<String> {
		let recent: Vec<String> = recent_tokens
			.iter()
			.filter_map(|token| normalize_token(token.as_ref()))
			.collect();

		self.read().as_ref()?.predict(&recent)
	}

	/// Records that `next_word` was typed right after `context_word`.
	///
	/// Returns `Ok(false)` when live training is disabled or no bigram
	/// model is loaded; predictions are unaffected either way.
	///
	/// # Errors
	/// Returns [`ModelError::InvalidToken`] if a word is blank or holds
	/// whitespace.
	pub fn train_on_new_word(&self, context_word: &str, next_word: &str) -> Result<bool, ModelError> {
		self.train_sequence(&[context_word], next_word)
	}

	/// Records that `next_word` followed `context`, in the model of order
	/// `context.len() + 1`.
	///
	/// Returns `Ok(false)` when live training is disabled or that order is
	/// not loaded.
	///
	/// # Errors
	/// Returns [`ModelError::InvalidToken`] if a word is blank or holds
	/// whitespace.
	pub fn train_sequence<S: AsRef<str>>(&self, context: &[S], next_word: &str) -> Result<bool, ModelError> {
		if !self.config.live_training {
			return Ok(false);
		}

		let context = context
			.iter()
			.map(|word| normalize_token(word.as_ref()).ok_or_else(|| ModelError::InvalidToken(word.as_ref().to_owned())))
			.collect::<Result<Vec<_>, _>>()?;
		let next_word = normalize_token(next_word).ok_or_else(|| ModelError::InvalidToken(next_word.to_owned()))?;

		let mut guard = self.write();
		let Some(model) = guard.as_mut().and_then(|set| set.model_mut(context.len() + 1)) else {
			return Ok(false);
		};
		model.add_sequence(&context, &next_word)?;
		Ok(true)
	}

	/// Clone of the current models, e.g. to persist live-trained counts.
	pub fn snapshot(&self) -> Option<ModelSet> {
		self.read().as_ref().cloned()
	}

	fn read(&self) -> RwLockReadGuard<'_, Option<ModelSet>> {
		self.models.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, Option<ModelSet>> {
		self.models.write().unwrap_or_else(PoisonError::into_inner)
	}
}

/// Reads and decodes one model file, checking it holds the expected order.
async fn load_model_file(path: &Path, n: usize, format: ModelFormat) -> Result<NGramModel, CodecError> {
	let bytes = tokio::fs::read(path).await?;
	let model = codec::from_bytes(&bytes, format)?;
	if model.order() != n {
		return Err(CodecError::MalformedModelFormat(format!(
			"expected a {n}-gram model, file holds order {}",
			model.order()
		)));
	}
	Ok(model)
}
