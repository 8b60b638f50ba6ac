use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ngram_model::NGramModel;

/// Minimum counts kept per model order.
///
/// Low orders have few contexts with large counts and take a high
/// threshold; high orders keep rare phrase completions with a low one.
/// Orders without an entry are left untouched.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct PruneThresholds(BTreeMap<usize, usize>);

impl Default for PruneThresholds {
	fn default() -> Self {
		Self(BTreeMap::from([(4, 2), (3, 2), (2, 3), (1, 5)]))
	}
}

impl PruneThresholds {
	/// No pruning for any order.
	pub fn none() -> Self {
		Self(BTreeMap::new())
	}

	/// Sets the minimum count for `order`.
	pub fn set(&mut self, order: usize, min_count: usize) {
		self.0.insert(order, min_count);
	}

	pub fn get(&self, order: usize) -> Option<usize> {
		self.0.get(&order).copied()
	}

	pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
		self.0.iter().map(|(order, min)| (*order, *min))
	}
}

impl FromIterator<(usize, usize)> for PruneThresholds {
	fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// What pruning did to one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
	pub order: usize,
	pub min_count: usize,
	pub contexts_before: usize,
	pub contexts_after: usize,
	pub entries_removed: usize,
}

/// Prunes every model that has a threshold configured.
///
/// Returns one report per pruned model, in the order given.
pub fn prune_all(models: &mut [NGramModel], thresholds: &PruneThresholds) -> Vec<PruneReport> {
	models
		.iter_mut()
		.filter_map(|model| {
			let min_count = thresholds.get(model.order())?;
			let contexts_before = model.size();
			let entries_removed = model.prune(min_count);
			let report = PruneReport {
				order: model.order(),
				min_count,
				contexts_before,
				contexts_after: model.size(),
				entries_removed,
			};
			log::info!(
				"{}-gram: pruned below {} ({} -> {} contexts, {} entries removed)",
				report.order,
				report.min_count,
				report.contexts_before,
				report.contexts_after,
				report.entries_removed
			);
			Some(report)
		})
		.collect()
}
