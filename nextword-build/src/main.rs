//! Offline model build: corpus directory in, one pruned model file per order out.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use nextword_core::config::BuildConfig;
use nextword_core::io::normalize_folder;
use nextword_core::model::ModelTrainer;
use nextword_core::model::codec::{ModelFormat, model_path, write_model};
use nextword_core::model::pruner::{PruneThresholds, prune_all};
use nextword_core::tokenizer::Tokenizer;

#[derive(Debug, Parser)]
#[command(
	name = "nextword-build",
	about = "Train pruned n-gram models from a directory of corpus files",
	version
)]
struct Cli {
	/// Directory of corpus text files.
	corpus_dir: PathBuf,

	/// Directory the model files are written to.
	#[arg(short, long, default_value = "models")]
	output: PathBuf,

	/// JSON build config. Flags below override its values.
	#[arg(long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Order to train (repeatable). Replaces the configured orders.
	#[arg(long = "order", value_name = "N")]
	orders: Vec<usize>,

	/// Minimum count kept for an order (repeatable).
	#[arg(long, value_name = "ORDER=MIN", value_parser = parse_threshold)]
	prune: Vec<(usize, usize)>,

	/// Keep every observation.
	#[arg(long, conflicts_with = "prune")]
	no_prune: bool,

	/// Output format: json or postcard.
	#[arg(long)]
	format: Option<ModelFormat>,

	/// Extension of corpus files, without the dot.
	#[arg(long)]
	extension: Option<String>,
}

impl Cli {
	/// Config file values, overridden by flags.
	fn build_config(&self) -> Result<BuildConfig, Box<dyn Error>> {
		let mut config = match &self.config {
			Some(path) => BuildConfig::load(path)?,
			None => BuildConfig::default(),
		};

		if !self.orders.is_empty() {
			config.orders = self.orders.clone();
		}
		if self.no_prune {
			config.prune = PruneThresholds::none();
		}
		for &(order, min_count) in &self.prune {
			config.prune.set(order, min_count);
		}
		if let Some(format) = self.format {
			config.format = format;
		}
		if let Some(extension) = &self.extension {
			config.extension = extension.clone();
		}

		config.validate()?;
		Ok(config)
	}
}

/// Parses `ORDER=MIN`, e.g. `3=2`.
fn parse_threshold(s: &str) -> Result<(usize, usize), String> {
	let (order, min_count) = s
		.split_once('=')
		.ok_or_else(|| format!("expected ORDER=MIN, got '{s}'"))?;
	let order = order
		.trim()
		.parse()
		.map_err(|_| format!("invalid order '{order}'"))?;
	let min_count = min_count
		.trim()
		.parse()
		.map_err(|_| format!("invalid minimum count '{min_count}'"))?;
	Ok((order, min_count))
}

fn log_sizes(trainer: &ModelTrainer) {
	for model in trainer.models() {
		log::info!("{}-gram contexts: {}", model.order(), model.size());
	}
}

fn main() -> Result<(), Box<dyn Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let cli = Cli::parse();
	let config = cli.build_config()?;
	let tokenizer = Tokenizer::new(&config.markers)?;
	let mut trainer = ModelTrainer::new(&config.orders)?;

	let corpus = normalize_folder(&cli.corpus_dir);
	let report = trainer.train_directory(&tokenizer, &corpus, &config.extension)?;
	if !report.failures.is_empty() {
		log::warn!(
			"{} of {} files could not be read",
			report.failures.len(),
			report.failures.len() + report.files.len()
		);
	}
	if report.files.is_empty() {
		return Err(format!("no .{} corpus file could be read in {}", config.extension, corpus.display()).into());
	}

	log::info!("--- Model Statistics ---");
	log::info!("{} words in {} files", report.tokens, report.files.len());
	log_sizes(&trainer);

	log::info!("--- Pruning rare n-grams ---");
	prune_all(trainer.models_mut(), &config.prune);
	log_sizes(&trainer);

	log::info!("--- Saving models ---");
	let output = normalize_folder(&cli.output);
	for model in trainer.models() {
		let path = model_path(&output, model.order(), config.format);
		write_model(&path, model, config.format)?;
		log::info!("Saved {}", path.display());
	}

	log::info!("All models built successfully");
	Ok(())
}
