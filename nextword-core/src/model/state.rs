use std::cmp::Ordering;
use std::collections::HashMap;

/// Next-word counts observed after one context.
///
/// A `State` is one row of an n-gram table: for a fixed context it maps
/// every word seen next to how many times it was seen.
///
/// ## Invariants
/// - Every count is strictly positive (entries are removed, never zeroed)
/// - Counts only ever grow through `add_transition` / `merge`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct State {
	/// Example: { "fox" => 3, "dog" => 1 }
	transitions: HashMap<String, usize>,
}

impl State {
	/// Records one more occurrence of `next_word`.
	pub fn add_transition(&mut self, next_word: &str) {
		self.add_count(next_word, 1);
	}

	/// Adds `count` occurrences of `next_word`. A zero count is ignored.
	pub fn add_count(&mut self, next_word: &str, count: usize) {
		if count == 0 {
			return;
		}
		match self.transitions.get_mut(next_word) {
			Some(existing) => *existing += count,
			None => {
				self.transitions.insert(next_word.to_owned(), count);
			}
		}
	}

	/// Like [`Self::add_count`], but returns `None` instead of overflowing.
	pub fn try_add_count(&mut self, next_word: &str, count: usize) -> Option<()> {
		if count == 0 {
			return Some(());
		}
		match self.transitions.get_mut(next_word) {
			Some(existing) => *existing = existing.checked_add(count)?,
			None => {
				self.transitions.insert(next_word.to_owned(), count);
			}
		}
		Some(())
	}

	pub fn transitions(&self) -> &HashMap<String, usize> {
		&self.transitions
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	/// Returns the most frequent next word.
	///
	/// Ties go to the lexicographically smallest word, so the answer never
	/// depends on hash-map iteration order.
	///
	/// Returns `None` if the state has no transitions.
	pub fn best(&self) -> Option<(&str, usize)> {
		self.transitions
			.iter()
			.min_by(|(a_word, a_count), (b_word, b_count)| rank(a_word, **a_count, b_word, **b_count))
			.map(|(word, count)| (word.as_str(), *count))
	}

	/// Drops every transition seen fewer than `min_count` times.
	///
	/// Returns the number of transitions removed.
	pub fn prune(&mut self, min_count: usize) -> usize {
		let before = self.transitions.len();
		self.transitions.retain(|_, count| *count >= min_count);
		before - self.transitions.len()
	}

	/// Sums another state's counts into this one.
	pub fn merge(&mut self, other: &Self) {
		for (next_word, count) in &other.transitions {
			self.add_count(next_word, *count);
		}
	}

	/// Transitions ordered by count descending, then word ascending.
	pub fn ranked(&self) -> Vec<(&str, usize)> {
		let mut ranked: Vec<(&str, usize)> = self
			.transitions
			.iter()
			.map(|(word, count)| (word.as_str(), *count))
			.collect();
		ranked.sort_by(|(a_word, a_count), (b_word, b_count)| rank(a_word, *a_count, b_word, *b_count));
		ranked
	}
}

/// Higher count first, then smaller word first.
fn rank(a_word: &str, a_count: usize, b_word: &str, b_count: usize) -> Ordering {
	b_count.cmp(&a_count).then_with(|| a_word.cmp(b_word))
}
