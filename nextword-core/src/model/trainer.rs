use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use super::ngram_model::NGramModel;
use crate::error::{CorpusError, ModelError};
use crate::io::{list_files, read_text};
use crate::tokenizer::Tokenizer;

/// Number of `n`-word windows in a sequence of `len` tokens.
fn window_count(len: usize, n: usize) -> usize {
	(len + 1).saturating_sub(n)
}

/// Outcome of a directory training run.
#[derive(Debug, Default)]
pub struct TrainReport {
	/// Files that were read and counted.
	pub files: Vec<PathBuf>,
	/// Total number of tokens counted across those files.
	pub tokens: usize,
	/// Files that could not be read. They contributed nothing.
	pub failures: Vec<CorpusError>,
}

/// Builds one `NGramModel` per order from tokenized text.
///
/// Every order is fed from the same token stream in a single pass: one
/// sliding index, and at each step every order whose window fits
/// records `tokens[i + 1 - n .. i] -> tokens[i]`.
///
/// Counting is commutative, so corpora can be fed in any order, or
/// trained separately and merged, with identical results.
#[derive(Debug, Clone)]
pub struct ModelTrainer {
	/// Models sorted from highest to lowest order.
	models: Vec<NGramModel>,
}

impl ModelTrainer {
	/// Creates a trainer with an empty model for each order.
	///
	/// # Errors
	/// - [`ModelError::InvalidOrder`] for an order of 0
	/// - [`ModelError::DuplicateOrder`] if an order is listed twice
	pub fn new(orders: &[usize]) -> Result<Self, ModelError> {
		let mut seen = BTreeSet::new();
		let mut models = Vec::with_capacity(orders.len());
		for &n in orders {
			if !seen.insert(n) {
				return Err(ModelError::DuplicateOrder(n));
			}
			models.push(NGramModel::new(n)?);
		}
		models.sort_by(|a, b| b.order().cmp(&a.order()));
		Ok(Self { models })
	}

	/// Orders trained, highest first.
	pub fn orders(&self) -> Vec<usize> {
		self.models.iter().map(NGramModel::order).collect()
	}

	pub fn models(&self) -> &[NGramModel] {
		&self.models
	}

	pub fn models_mut(&mut self) -> &mut [NGramModel] {
		&mut self.models
	}

	pub fn into_models(self) -> Vec<NGramModel> {
		self.models
	}

	/// Model of order `n`, if trained.
	pub fn model(&self, n: usize) -> Option<&NGramModel> {
		self.models.iter().find(|m| m.order() == n)
	}

	/// A trainer with the same orders and no counts.
	fn empty_like(&self) -> Self {
		let models = self
			.models
			.iter()
			.filter_map(|m| NGramModel::new(m.order()).ok())
			.collect();
		Self { models }
	}

	/// Counts every window of every order in `tokens`.
	///
	/// Returns the number of windows recorded, summed over all orders.
	pub fn train_tokens(&mut self, tokens: &[String]) -> usize {
		let mut windows = 0;
		for i in 0..tokens.len() {
			for model in &mut self.models {
				let n = model.order();
				if i + 1 >= n {
					model.add_window(&tokens[i + 1 - n..i], &tokens[i]);
					windows += 1;
				}
			}
		}
		debug_assert_eq!(
			windows,
			self.models.iter().map(|m| window_count(tokens.len(), m.order())).sum::<usize>()
		);
		windows
	}

	/// Tokenizes and counts `text`. Returns the number of tokens.
	pub fn train_text(&mut self, tokenizer: &Tokenizer, text: &str) -> usize {
		let tokens = tokenizer.tokenize(text);
		self.train_tokens(&tokens);
		tokens.len()
	}

	/// Reads, tokenizes and counts one corpus file. Returns the number of tokens.
	///
	/// # Errors
	/// Returns [`CorpusError::CorpusReadFailure`] if the file cannot be read
	/// as UTF-8 text. Nothing is counted in that case.
	pub fn train_file<P: AsRef<Path>>(&mut self, tokenizer: &Tokenizer, path: P) -> Result<usize, CorpusError> {
		let path = path.as_ref();
		log::info!("Processing: {}", display_name(path));

		let text = read_text(path).map_err(|source| CorpusError::CorpusReadFailure {
			path: path.to_path_buf(),
			source,
		})?;
		let tokens = self.train_text(tokenizer, &text);

		log::info!("  {tokens} words found");
		Ok(tokens)
	}

	/// Trains on every `*.{extension}` file directly inside `dir`.
	///
	/// Files are split into one chunk per CPU; each chunk is counted into a
	/// partial trainer on its own thread, and the partials are merged.
	///
	/// # Errors
	/// Returns [`CorpusError::UnreadableCorpus`] if `dir` cannot be listed.
	/// Unreadable files do not fail the call: they are logged and listed in
	/// [`TrainReport::failures`].
	pub fn train_directory<P: AsRef<Path>>(
		&mut self,
		tokenizer: &Tokenizer,
		dir: P,
		extension: &str,
	) -> Result<TrainReport, CorpusError> {
		let dir = dir.as_ref();
		let files = list_files(dir, extension).map_err(|source| CorpusError::UnreadableCorpus {
			path: dir.to_path_buf(),
			source,
		})?;

		log::info!("Found {} files to process", files.len());

		let mut report = TrainReport::default();
		if files.is_empty() {
			return Ok(report);
		}

		let workers = num_cpus::get().max(1);
		let chunk_size = files.len().div_ceil(workers);

		let partials: Vec<(Vec<PathBuf>, thread::Result<(Self, TrainReport)>)> = thread::scope(|scope| {
			let handles: Vec<_> = files
				.chunks(chunk_size)
				.map(|chunk| {
					let mut partial = self.empty_like();
					let handle = scope.spawn(move || {
						let mut partial_report = TrainReport::default();
						for path in chunk {
							match partial.train_file(tokenizer, path) {
								Ok(tokens) => {
									partial_report.tokens += tokens;
									partial_report.files.push(path.clone());
								}
								Err(e) => partial_report.failures.push(e),
							}
						}
						(partial, partial_report)
					});
					(chunk.to_vec(), handle)
				})
				.collect();

			handles
				.into_iter()
				.map(|(chunk, handle)| (chunk, handle.join()))
				.collect()
		});

		for (chunk, outcome) in partials {
			match outcome {
				Ok((partial, partial_report)) => {
					self.absorb(partial);
					report.files.extend(partial_report.files);
					report.tokens += partial_report.tokens;
					report.failures.extend(partial_report.failures);
				}
				Err(_) => {
					log::error!("Training worker panicked, {} files skipped", chunk.len());
					report.failures.extend(chunk.into_iter().map(|path| CorpusError::CorpusReadFailure {
						path,
						source: io::Error::other("training worker panicked"),
					}));
				}
			}
		}

		for failure in &report.failures {
			log::warn!("{failure}");
		}
		report.files.sort();

		Ok(report)
	}

	/// Merges another trainer's counts into this one, order by order.
	///
	/// Orders missing from `self` are added.
	///
	/// # Errors
	/// Propagates [`ModelError::OrderMismatch`] from the model merge.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		for model in &other.models {
			if let Some(existing) = self.models.iter_mut().find(|m| m.order() == model.order()) {
				existing.merge(model)?;
			} else {
				self.models.push(model.clone());
				self.models.sort_by(|a, b| b.order().cmp(&a.order()));
			}
		}
		Ok(())
	}

	/// Moves the counts of a partial built by [`Self::empty_like`] into `self`.
	fn absorb(&mut self, partial: Self) {
		for (model, partial_model) in self.models.iter_mut().zip(partial.models) {
			model.absorb(partial_model);
		}
	}
}

fn display_name(path: &Path) -> String {
	path.file_name()
		.map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}
