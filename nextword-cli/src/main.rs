//! Line-oriented next-word prediction.
//!
//! Loads the models, then reads text from stdin line by line and prints
//! the predicted next word for each line, or `-` when there is none.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use nextword_core::config::EngineConfig;
use nextword_core::io::normalize_folder;
use nextword_core::model::PredictionEngine;
use nextword_core::model::codec::{ModelFormat, model_path, write_model};
use nextword_core::tokenizer::tokenize;

#[derive(Debug, Parser)]
#[command(name = "nextword", about = "Predict the next word of each line read on stdin", version)]
struct Cli {
	/// Directory holding the model files.
	#[arg(short, long, value_name = "DIR")]
	models: Option<PathBuf>,

	/// JSON engine config. Flags override its values; without a file,
	/// live training is off unless `--learn` is given.
	#[arg(long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Model file format: json or postcard.
	#[arg(long)]
	format: Option<ModelFormat>,

	/// Train the models on every adjacent word pair read.
	#[arg(long)]
	learn: bool,

	/// Write the models back to the model directory at exit.
	#[arg(long)]
	save: bool,
}

impl Cli {
	fn engine_config(&self) -> Result<EngineConfig, Box<dyn Error>> {
		let mut config = match &self.config {
			Some(path) => EngineConfig::load(path)?,
			None => EngineConfig { live_training: false, ..EngineConfig::default() },
		};
		if let Some(models) = &self.models {
			config.model_dir = normalize_folder(models);
		}
		if let Some(format) = self.format {
			config.format = format;
		}
		if self.learn {
			config.live_training = true;
		}
		Ok(config)
	}
}

/// Persists every loaded model, including live-trained counts.
fn save_models(engine: &PredictionEngine) -> Result<(), Box<dyn Error>> {
	let Some(set) = engine.snapshot() else {
		return Ok(());
	};
	let config = engine.config();
	for n in set.orders() {
		if let Some(model) = set.model(n) {
			let path = model_path(&config.model_dir, n, config.format);
			write_model(&path, model, config.format)?;
			log::info!("Saved {}", path.display());
		}
	}
	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let cli = Cli::parse();
	let engine = PredictionEngine::new(cli.engine_config()?)?;

	let report = engine.load_models().await;
	if !engine.are_models_loaded() {
		return Err(format!(
			"no model could be loaded from {} ({} orders failed)",
			engine.config().model_dir.display(),
			report.failed.len()
		)
		.into());
	}
	log::info!("Ready with {:?}-gram models", engine.loaded_orders());

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	while let Some(line) = lines.next_line().await? {
		let words = tokenize(&line);
		let prediction = engine.predict_next_word(&words);
		println!("{}", prediction.as_deref().unwrap_or("-"));

		if engine.config().live_training {
			for pair in words.windows(2) {
				if let Err(e) = engine.train_on_new_word(&pair[0], &pair[1]) {
					log::warn!("Skipping live training of {:?}: {e}", pair);
				}
			}
		}
	}

	if cli.save {
		save_models(&engine)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flags_override_config() {
		let cli = Cli::parse_from(["nextword", "--models", "data/processed", "--format", "postcard", "--learn"]);
		let config = cli.engine_config().unwrap();
		assert_eq!(config.model_dir, PathBuf::from("data/processed"));
		assert_eq!(config.format, ModelFormat::Postcard);
		assert!(config.live_training);
		assert_eq!(config.orders, [4, 3, 2, 1]);
	}

	#[test]
	fn live_training_is_off_by_default() {
		let cli = Cli::parse_from(["nextword"]);
		assert!(!cli.engine_config().unwrap().live_training);
	}

	#[test]
	fn config_file_can_enable_live_training() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("engine.json");
		std::fs::write(&path, r#"{"live_training":true}"#).unwrap();

		let cli = Cli::parse_from(["nextword", "--config", path.to_str().unwrap()]);
		assert!(cli.engine_config().unwrap().live_training);
	}

	#[test]
	fn learn_flag_overrides_disabled_config() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("engine.json");
		std::fs::write(&path, r#"{"live_training":false}"#).unwrap();

		let cli = Cli::parse_from(["nextword", "--config", path.to_str().unwrap()]);
		assert!(!cli.engine_config().unwrap().live_training);

		let cli = Cli::parse_from(["nextword", "--config", path.to_str().unwrap(), "--learn"]);
		assert!(cli.engine_config().unwrap().live_training);
	}
}
