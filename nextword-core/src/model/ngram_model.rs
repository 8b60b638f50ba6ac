use std::collections::HashMap;

use super::state::State;
use crate::error::ModelError;

/// Frequency table of word n-grams.
///
/// The `NGramModel` maps every context of `n - 1` words to the words
/// observed right after it, with their counts.
///
/// # Responsibilities
/// - Count (context, next word) observations, from bulk training or live typing
/// - Answer which words followed a context, and how often
/// - Prune rare observations
/// - Merge with another model of the same order `n`
///
/// # Invariants
/// - `n` is always >= 1, and never changes
/// - Every context key holds exactly `n - 1` words
/// - Every stored state is non-empty and all its counts are >= 1
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NGramModel {
	/// The order of the model (number of words in the n-gram)
	n: usize,

	/// Mapping from a context (length n-1) to its next-word counts
	states: HashMap<Vec<String>, State>,
}

impl NGramModel {
	/// Creates a new, empty n-gram model of order `n`.
	///
	/// # Errors
	/// Returns [`ModelError::InvalidOrder`] if `n < 1`.
	pub fn new(n: usize) -> Result<Self, ModelError> {
		if n < 1 {
			return Err(ModelError::InvalidOrder(n));
		}
		Ok(Self { n, states: HashMap::new() })
	}

	/// The order `n` of this model.
	pub fn order(&self) -> usize {
		self.n
	}

	/// Number of words in a context (`n - 1`).
	pub fn context_len(&self) -> usize {
		self.n - 1
	}

	/// Number of distinct contexts currently stored.
	pub fn size(&self) -> usize {
		self.states.len()
	}

	/// Same as [`Self::size`].
	pub fn len(&self) -> usize {
		self.size()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Number of distinct (context, word) pairs.
	pub fn entry_count(&self) -> usize {
		self.states.values().map(State::len).sum()
	}

	/// Sum of every count in the table.
	pub fn total_count(&self) -> usize {
		self.states
			.values()
			.flat_map(|state| state.transitions().values())
			.sum()
	}

	/// Records one observation of `next_word` following `context`.
	///
	/// # Errors
	/// - [`ModelError::InvalidContextLength`] if `context.len() != n - 1`
	/// - [`ModelError::InvalidToken`] if any word is empty or holds whitespace
	pub fn add_sequence<S: AsRef<str>>(&mut self, context: &[S], next_word: &str) -> Result<(), ModelError> {
		self.check_context_len(context.len())?;
		for word in context.iter().map(AsRef::as_ref).chain(std::iter::once(next_word)) {
			check_token(word)?;
		}

		let key: Vec<String> = context.iter().map(|w| w.as_ref().to_owned()).collect();
		self.add_count(key, next_word, 1);
		Ok(())
	}

	/// Returns every word seen after `context`, with its count.
	///
	/// Returns `Ok(None)` if the context has never been observed.
	///
	/// # Errors
	/// Returns [`ModelError::InvalidContextLength`] if `context.len() != n - 1`.
	pub fn get_possible_words<S: AsRef<str>>(
		&self,
		context: &[S],
	) -> Result<Option<&HashMap<String, usize>>, ModelError> {
		Ok(self.state(context)?.map(State::transitions))
	}

	/// Returns the most frequent word after `context` and its count.
	///
	/// Equal counts resolve to the lexicographically smallest word.
	///
	/// # Errors
	/// Returns [`ModelError::InvalidContextLength`] if `context.len() != n - 1`.
	pub fn best_word<S: AsRef<str>>(&self, context: &[S]) -> Result<Option<(&str, usize)>, ModelError> {
		Ok(self.state(context)?.and_then(State::best))
	}

	/// Removes every (context, word) entry seen fewer than `min_count` times,
	/// then every context left without words.
	///
	/// Returns the number of (context, word) entries removed.
	pub fn prune(&mut self, min_count: usize) -> usize {
		let mut removed = 0;
		self.states.retain(|_, state| {
			removed += state.prune(min_count);
			!state.is_empty()
		});
		removed
	}

	/// Merges another n-gram model into this one.
	///
	/// # Notes
	/// - Both models must have the same order `n`.
	/// - Counts for matching (context, word) pairs are summed.
	///
	/// # Errors
	/// Returns [`ModelError::OrderMismatch`] if the orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.n != other.n {
			return Err(ModelError::OrderMismatch { expected: self.n, actual: other.n });
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state);
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}

		Ok(())
	}

	/// Moves another model's counts into this one.
	///
	/// Callers guarantee both models have the same order.
	pub(crate) fn absorb(&mut self, other: Self) {
		debug_assert_eq!(self.n, other.n);
		if self.states.is_empty() {
			self.states = other.states;
			return;
		}
		for (key, state) in other.states {
			match self.states.get_mut(&key) {
				Some(existing) => existing.merge(&state),
				None => {
					self.states.insert(key, state);
				}
			}
		}
	}

	/// Iterates over every `(context, word, count)` triple, in no particular order.
	pub fn entries(&self) -> impl Iterator<Item = (&[String], &str, usize)> {
		self.states.iter().flat_map(|(context, state)| {
			state
				.transitions()
				.iter()
				.map(move |(word, count)| (context.as_slice(), word.as_str(), *count))
		})
	}

	/// Contexts with their states, for the codec.
	pub(crate) fn states(&self) -> impl Iterator<Item = (&Vec<String>, &State)> {
		self.states.iter()
	}

	/// Adds `count` observations without validating the words.
	///
	/// Callers guarantee `context.len() == n - 1` and well-formed words
	/// (tokenizer output, or words the codec already checked).
	pub(crate) fn add_count(&mut self, context: Vec<String>, next_word: &str, count: usize) {
		debug_assert_eq!(context.len(), self.n - 1);
		if count == 0 {
			return;
		}
		self.states.entry(context).or_default().add_count(next_word, count);
	}

	/// Checked variant of [`Self::add_count`] for counts read from storage.
	///
	/// Returns `None` if the summed count would overflow; the stored count
	/// is left unchanged.
	pub(crate) fn try_add_count(&mut self, context: Vec<String>, next_word: &str, count: usize) -> Option<()> {
		debug_assert_eq!(context.len(), self.n - 1);
		if count == 0 {
			return Some(());
		}
		self.states.entry(context).or_default().try_add_count(next_word, count)
	}

	/// Borrowed-context variant of [`Self::add_count`] that only allocates
	/// the key for a context seen for the first time.
	pub(crate) fn add_window(&mut self, context: &[String], next_word: &str) {
		debug_assert_eq!(context.len(), self.n - 1);
		match self.states.get_mut(context) {
			Some(state) => state.add_transition(next_word),
			None => {
				let mut state = State::default();
				state.add_transition(next_word);
				self.states.insert(context.to_vec(), state);
			}
		}
	}

	fn state<S: AsRef<str>>(&self, context: &[S]) -> Result<Option<&State>, ModelError> {
		self.check_context_len(context.len())?;
		let key: Vec<String> = context.iter().map(|w| w.as_ref().to_owned()).collect();
		Ok(self.states.get(&key))
	}

	fn check_context_len(&self, actual: usize) -> Result<(), ModelError> {
		let expected = self.n - 1;
		if actual != expected {
			return Err(ModelError::InvalidContextLength { expected, actual });
		}
		Ok(())
	}
}

/// A word is storable if it is non-empty and has no whitespace.
pub(crate) fn check_token(word: &str) -> Result<(), ModelError> {
	if word.is_empty() || word.chars().any(char::is_whitespace) {
		return Err(ModelError::InvalidToken(word.to_owned()));
	}
	Ok(())
}
