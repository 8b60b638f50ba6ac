//! Corpus directory → training → pruning → model files → async load → prediction.

use std::fs;

use nextword_core::config::{BuildConfig, EngineConfig};
use nextword_core::model::codec::{model_path, read_model, write_model};
use nextword_core::model::pruner::{PruneThresholds, prune_all};
use nextword_core::model::{ModelTrainer, PredictionEngine};
use nextword_core::tokenizer::Tokenizer;

const BOOK_ONE: &str = "\
*** START OF THE PROJECT GUTENBERG EBOOK ONE ***
The quick brown fox jumps over the lazy dog.
The quick brown fox runs away.
*** END OF THE PROJECT GUTENBERG EBOOK ONE ***";

const BOOK_TWO: &str = "\
The quick brown fox was never seen again, said the lazy dog.
Over the hills the quick red fox ran.";

#[tokio::test]
async fn built_models_serve_predictions() {
	let corpus = tempfile::tempdir().unwrap();
	let models = tempfile::tempdir().unwrap();
	fs::write(corpus.path().join("one.txt"), BOOK_ONE).unwrap();
	fs::write(corpus.path().join("two.txt"), BOOK_TWO).unwrap();

	let build = BuildConfig::default();
	let tokenizer = Tokenizer::new(&build.markers).unwrap();
	let mut trainer = ModelTrainer::new(&build.orders).unwrap();
	let report = trainer
		.train_directory(&tokenizer, corpus.path(), &build.extension)
		.unwrap();
	assert_eq!(report.files.len(), 2);
	assert!(report.failures.is_empty());

	let mut thresholds = PruneThresholds::none();
	thresholds.set(4, 2);
	thresholds.set(3, 2);
	thresholds.set(2, 2);
	thresholds.set(1, 3);
	let mut trained = trainer.into_models();
	let reports = prune_all(&mut trained, &thresholds);
	assert_eq!(reports.len(), 4);

	for model in &trained {
		let path = model_path(models.path(), model.order(), build.format);
		write_model(&path, model, build.format).unwrap();
		assert_eq!(&read_model(&path).unwrap(), model);
	}

	let engine = PredictionEngine::new(EngineConfig {
		model_dir: models.path().to_path_buf(),
		..EngineConfig::default()
	})
	.unwrap();
	assert!(!engine.are_models_loaded());
	assert_eq!(engine.predict_next_word(&["the", "quick"]), None);

	let load = engine.load_models().await;
	assert_eq!(load.loaded, [4, 3, 2, 1]);
	assert!(engine.are_models_loaded());

	// "the quick brown" is seen three times, so the 4-gram answers.
	assert_eq!(engine.predict_next_word(&["The", "quick", "brown"]).as_deref(), Some("fox"));
	// "quick" alone goes to the bigram: brown (3) beats red (1, pruned anyway).
	assert_eq!(engine.predict_next_word(&["quick"]).as_deref(), Some("brown"));
	// Unseen context: the unigram answers with the most frequent word.
	assert_eq!(engine.predict_next_word(&["zebra", "crossing"]).as_deref(), Some("the"));
}

#[test]
fn unreadable_corpus_directory_fails() {
	let dir = tempfile::tempdir().unwrap();
	let mut trainer = ModelTrainer::new(&[2, 1]).unwrap();
	assert!(trainer
		.train_directory(&Tokenizer::default(), dir.path().join("missing"), "txt")
		.is_err());
}
