//! Configuration for the offline build and the prediction engine.
//!
//! Both configs are plain JSON files in which every field is optional.
//! A missing file means "all defaults".

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::codec::ModelFormat;
use crate::model::pruner::PruneThresholds;
use crate::tokenizer::GUTENBERG_MARKERS;

/// Settings of the offline model build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
	/// Orders to train, e.g. `[4, 3, 2, 1]`.
	pub orders: Vec<usize>,

	/// Minimum count kept per order.
	pub prune: PruneThresholds,

	/// Extension of corpus files, without the dot.
	pub extension: String,

	/// Output format of the model files.
	pub format: ModelFormat,

	/// Boilerplate patterns removed from corpus text before tokenizing.
	pub markers: Vec<String>,
}

impl Default for BuildConfig {
	fn default() -> Self {
		Self {
			orders: default_orders(),
			prune: PruneThresholds::default(),
			extension: "txt".to_owned(),
			format: ModelFormat::Json,
			markers: GUTENBERG_MARKERS.iter().map(|m| (*m).to_owned()).collect(),
		}
	}
}

impl BuildConfig {
	/// Load config from file, or defaults if the file does not exist.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let config: Self = load_json(path)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_orders(&self.orders)?;
		if self.extension.is_empty() || self.extension.starts_with('.') {
			return Err(ConfigError::Invalid(format!(
				"corpus extension must be given without a dot, got {:?}",
				self.extension
			)));
		}
		Ok(())
	}
}

/// Settings of the prediction engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
	/// Directory holding one model file per order.
	pub model_dir: PathBuf,

	/// Orders to load, tried from highest to lowest when predicting.
	pub orders: Vec<usize>,

	/// Format of the model files.
	pub format: ModelFormat,

	/// Whether `train_on_new_word` updates the loaded models.
	pub live_training: bool,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			model_dir: PathBuf::from("models"),
			orders: default_orders(),
			format: ModelFormat::Json,
			live_training: true,
		}
	}
}

impl EngineConfig {
	/// Load config from file, or defaults if the file does not exist.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let config: Self = load_json(path)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_orders(&self.orders)
	}
}

fn default_orders() -> Vec<usize> {
	vec![4, 3, 2, 1]
}

fn validate_orders(orders: &[usize]) -> Result<(), ConfigError> {
	if orders.is_empty() {
		return Err(ConfigError::Invalid("at least one order is required".to_owned()));
	}
	let mut seen = BTreeSet::new();
	for &n in orders {
		if n == 0 {
			return Err(ConfigError::Invalid("order 0 is not a valid n-gram order".to_owned()));
		}
		if !seen.insert(n) {
			return Err(ConfigError::Invalid(format!("order {n} is listed twice")));
		}
	}
	Ok(())
}

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
	if !path.exists() {
		log::debug!("config {} not found, using defaults", path.display());
		return Ok(T::default());
	}
	let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
		path: path.to_path_buf(),
		source,
	})?;
	serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
		path: path.to_path_buf(),
		source,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn missing_file_gives_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let config = BuildConfig::load(&dir.path().join("build.json")).unwrap();
		assert_eq!(config, BuildConfig::default());
		assert_eq!(config.prune.get(1), Some(5));

		let engine = EngineConfig::load(&dir.path().join("engine.json")).unwrap();
		assert_eq!(engine, EngineConfig::default());
	}

	#[test]
	fn partial_file_keeps_other_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("build.json");
		std::fs::write(&path, r#"{"orders":[3,2],"prune":{"3":4},"format":"postcard"}"#).unwrap();

		let config = BuildConfig::load(&path).unwrap();
		assert_eq!(config.orders, [3, 2]);
		assert_eq!(config.prune.get(3), Some(4));
		assert_eq!(config.prune.get(2), None);
		assert_eq!(config.format, ModelFormat::Postcard);
		assert_eq!(config.extension, "txt");
		assert_eq!(config.markers.len(), 2);
	}

	#[test]
	fn engine_config_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("engine.json");
		std::fs::write(&path, r#"{"model_dir":"data/processed","live_training":false}"#).unwrap();

		let config = EngineConfig::load(&path).unwrap();
		assert_eq!(config.model_dir, PathBuf::from("data/processed"));
		assert!(!config.live_training);
		assert_eq!(config.orders, [4, 3, 2, 1]);
	}

	#[test]
	fn unparsable_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("build.json");
		std::fs::write(&path, "{ not json").unwrap();
		assert!(matches!(BuildConfig::load(&path), Err(ConfigError::Parse { .. })));
	}

	#[rstest]
	#[case(vec![])]
	#[case(vec![0])]
	#[case(vec![2, 1, 2])]
	fn bad_orders_are_rejected(#[case] orders: Vec<usize>) {
		let config = EngineConfig { orders, ..EngineConfig::default() };
		assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
	}

	#[test]
	fn dotted_extension_is_rejected() {
		let config = BuildConfig { extension: ".txt".to_owned(), ..BuildConfig::default() };
		assert!(config.validate().is_err());
	}
}
