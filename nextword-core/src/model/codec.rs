use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ngram_model::{NGramModel, check_token};
use crate::error::CodecError;
use crate::io::build_output_path;

/// Joins context words into a single key. Words never hold whitespace.
pub const CONTEXT_DELIMITER: char = ' ';

/// Persisted form of one model.
///
/// ```json
/// { "n": 2, "nGrams": [ { "context": "the", "words": [["cat", 3], ["dog", 1]] } ] }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModelRecord {
	/// Model order.
	pub n: usize,

	/// One entry per context, sorted by context key.
	#[serde(rename = "nGrams")]
	pub n_grams: Vec<ContextRecord>,
}

/// One context and the words that followed it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContextRecord {
	/// Context words joined by [`CONTEXT_DELIMITER`]; empty for unigrams.
	pub context: String,

	/// `(word, count)` pairs, most frequent first.
	pub words: Vec<(String, usize)>,
}

/// Container format of a model file.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
	/// Interchange JSON, readable by any consumer.
	#[default]
	Json,
	/// Compact binary (`postcard`) encoding of the same record.
	Postcard,
}

impl ModelFormat {
	pub fn extension(self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Postcard => "bin",
		}
	}

	/// Guesses the format from a file extension. Anything but `bin` is JSON.
	pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
		match path.as_ref().extension().and_then(|e| e.to_str()) {
			Some("bin") => Self::Postcard,
			_ => Self::Json,
		}
	}
}

impl FromStr for ModelFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"json" => Ok(Self::Json),
			"postcard" | "bin" => Ok(Self::Postcard),
			other => Err(format!("unknown model format '{other}', expected 'json' or 'postcard'")),
		}
	}
}

impl fmt::Display for ModelFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Json => f.write_str("json"),
			Self::Postcard => f.write_str("postcard"),
		}
	}
}

/// File stem for a model of order `n`: `unigram-model`, `bigram-model`, ...
pub fn model_file_stem(n: usize) -> String {
	match n {
		1 => "unigram-model".to_owned(),
		2 => "bigram-model".to_owned(),
		3 => "trigram-model".to_owned(),
		4 => "fourgram-model".to_owned(),
		n => format!("{n}gram-model"),
	}
}

/// Path of the model file of order `n` inside `dir`.
pub fn model_path<P: AsRef<Path>>(dir: P, n: usize, format: ModelFormat) -> PathBuf {
	build_output_path(dir, &model_file_stem(n), format.extension())
}

/// Converts a model into its persisted record.
///
/// The output is deterministic: contexts are sorted by key and words by
/// count descending, then word ascending.
pub fn encode(model: &NGramModel) -> ModelRecord {
	let mut n_grams: Vec<ContextRecord> = model
		.states()
		.map(|(context, state)| ContextRecord {
			context: join_context(context),
			words: state
				.ranked()
				.into_iter()
				.map(|(word, count)| (word.to_owned(), count))
				.collect(),
		})
		.collect();
	n_grams.sort_by(|a, b| a.context.cmp(&b.context));

	ModelRecord { n: model.order(), n_grams }
}

/// Rebuilds a model from its persisted record.
///
/// Repeated context keys are summed, like repeated observations.
///
/// # Errors
/// Returns [`CodecError::MalformedModelFormat`] if `n` is 0, a context
/// key does not hold `n - 1` words, a word is empty or holds whitespace,
/// a count is 0, summed counts overflow, or a context has no words.
pub fn decode(record: ModelRecord) -> Result<NGramModel, CodecError> {
	let mut model = NGramModel::new(record.n)
		.map_err(|_| malformed(format!("'n' must be a positive integer, got {}", record.n)))?;

	for entry in record.n_grams {
		let context = split_context(&entry.context, model.context_len())?;
		if entry.words.is_empty() {
			return Err(malformed(format!("context {:?} has no words", entry.context)));
		}
		for (word, count) in &entry.words {
			check_token(word).map_err(|e| malformed(format!("context {:?}: {e}", entry.context)))?;
			if *count == 0 {
				return Err(malformed(format!("context {:?}: word {word:?} has count 0", entry.context)));
			}
			model
				.try_add_count(context.clone(), word, *count)
				.ok_or_else(|| malformed(format!("context {:?}: count of {word:?} overflows", entry.context)))?;
		}
	}

	Ok(model)
}

/// Serializes a model in the given format.
pub fn to_bytes(model: &NGramModel, format: ModelFormat) -> Result<Vec<u8>, CodecError> {
	let record = encode(model);
	let bytes = match format {
		ModelFormat::Json => serde_json::to_vec(&record)?,
		ModelFormat::Postcard => postcard::to_stdvec(&record)?,
	};
	Ok(bytes)
}

/// Deserializes a model from bytes in the given format.
///
/// # Errors
/// Any schema violation, including missing fields, wrong value types or
/// truncated input, is reported as [`CodecError::MalformedModelFormat`].
pub fn from_bytes(bytes: &[u8], format: ModelFormat) -> Result<NGramModel, CodecError> {
	let record: ModelRecord = match format {
		ModelFormat::Json => serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?,
		ModelFormat::Postcard => postcard::from_bytes(bytes).map_err(|e| malformed(e.to_string()))?,
	};
	decode(record)
}

/// Writes a model to `path`, creating parent directories.
pub fn write_model<P: AsRef<Path>>(path: P, model: &NGramModel, format: ModelFormat) -> Result<(), CodecError> {
	let path = path.as_ref();
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, to_bytes(model, format)?)?;
	Ok(())
}

/// Reads a model from `path`; the format follows the file extension.
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<NGramModel, CodecError> {
	let path = path.as_ref();
	let bytes = std::fs::read(path)?;
	from_bytes(&bytes, ModelFormat::from_path(path))
}

fn join_context(context: &[String]) -> String {
	context.join(&CONTEXT_DELIMITER.to_string())
}

fn split_context(key: &str, expected: usize) -> Result<Vec<String>, CodecError> {
	let words: Vec<String> = if key.is_empty() {
		Vec::new()
	} else {
		key.split(CONTEXT_DELIMITER).map(str::to_owned).collect()
	};

	if words.len() != expected {
		return Err(malformed(format!(
			"context {key:?} has {} words, expected {expected}",
			words.len()
		)));
	}
	for word in &words {
		check_token(word).map_err(|e| malformed(format!("context {key:?}: {e}")))?;
	}
	Ok(words)
}

fn malformed(reason: String) -> CodecError {
	CodecError::MalformedModelFormat(reason)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::trainer::ModelTrainer;
	use crate::tokenizer::Tokenizer;
	use rstest::rstest;

	const TEXT: &str = "It was the best of times, it was the worst of times, \
		it was the age of wisdom, it was the age of foolishness.";

	fn trained() -> Vec<NGramModel> {
		let mut trainer = ModelTrainer::new(&[4, 3, 2, 1]).unwrap();
		trainer.train_text(&Tokenizer::default(), TEXT);
		trainer.into_models()
	}

	fn assert_malformed(result: Result<NGramModel, CodecError>) {
		match result {
			Err(CodecError::MalformedModelFormat(_)) => {}
			other => panic!("expected MalformedModelFormat, got {other:?}"),
		}
	}

	#[rstest]
	#[case(ModelFormat::Json)]
	#[case(ModelFormat::Postcard)]
	fn round_trip_preserves_every_triple(#[case] format: ModelFormat) {
		for model in trained() {
			let bytes = to_bytes(&model, format).unwrap();
			let decoded = from_bytes(&bytes, format).unwrap();
			assert_eq!(decoded, model, "order {}", model.order());
		}
	}

	#[test]
	fn record_round_trip_after_pruning() {
		for mut model in trained() {
			model.prune(2);
			assert_eq!(decode(encode(&model)).unwrap(), model);
		}
	}

	#[test]
	fn encode_is_sorted_and_uses_interchange_names() {
		let mut model = NGramModel::new(2).unwrap();
		for (context, word) in [("b", "x"), ("a", "z"), ("a", "y"), ("a", "z")] {
			model.add_sequence(&[context], word).unwrap();
		}

		let json = String::from_utf8(to_bytes(&model, ModelFormat::Json).unwrap()).unwrap();
		assert_eq!(
			json,
			r#"{"n":2,"nGrams":[{"context":"a","words":[["z",2],["y",1]]},{"context":"b","words":[["x",1]]}]}"#
		);
	}

	#[test]
	fn multi_word_context_and_unigram_keys() {
		let mut trigram = NGramModel::new(3).unwrap();
		trigram.add_sequence(&["the", "quick"], "fox").unwrap();
		assert_eq!(encode(&trigram).n_grams[0].context, "the quick");

		let mut unigram = NGramModel::new(1).unwrap();
		unigram.add_sequence::<&str>(&[], "x").unwrap();
		assert_eq!(encode(&unigram).n_grams[0].context, "");
	}

	#[test]
	fn decode_sums_repeated_contexts() {
		let json = r#"{"n":2,"nGrams":[
			{"context":"a","words":[["b",2]]},
			{"context":"a","words":[["b",1],["c",4]]}
		]}"#;
		let model = from_bytes(json.as_bytes(), ModelFormat::Json).unwrap();
		let words = model.get_possible_words(&["a"]).unwrap().unwrap();
		assert_eq!((words["b"], words["c"]), (3, 4));
	}

	#[rstest]
	#[case::missing_n(r#"{"nGrams":[]}"#)]
	#[case::missing_ngrams(r#"{"n":2}"#)]
	#[case::zero_order(r#"{"n":0,"nGrams":[]}"#)]
	#[case::negative_order(r#"{"n":-1,"nGrams":[]}"#)]
	#[case::fractional_order(r#"{"n":1.5,"nGrams":[]}"#)]
	#[case::string_order(r#"{"n":"2","nGrams":[]}"#)]
	#[case::missing_words(r#"{"n":2,"nGrams":[{"context":"a"}]}"#)]
	#[case::short_context(r#"{"n":3,"nGrams":[{"context":"a","words":[["b",1]]}]}"#)]
	#[case::long_context(r#"{"n":2,"nGrams":[{"context":"a b","words":[["c",1]]}]}"#)]
	#[case::unigram_with_context(r#"{"n":1,"nGrams":[{"context":"a","words":[["b",1]]}]}"#)]
	#[case::doubled_delimiter(r#"{"n":3,"nGrams":[{"context":"a  b","words":[["c",1]]}]}"#)]
	#[case::zero_count(r#"{"n":2,"nGrams":[{"context":"a","words":[["b",0]]}]}"#)]
	#[case::negative_count(r#"{"n":2,"nGrams":[{"context":"a","words":[["b",-3]]}]}"#)]
	#[case::empty_word(r#"{"n":2,"nGrams":[{"context":"a","words":[["",1]]}]}"#)]
	#[case::spaced_word(r#"{"n":2,"nGrams":[{"context":"a","words":[["b c",1]]}]}"#)]
	#[case::no_words(r#"{"n":2,"nGrams":[{"context":"a","words":[]}]}"#)]
	#[case::count_overflow(r#"{"n":1,"nGrams":[{"context":"","words":[["a",18446744073709551615],["a",1]]}]}"#)]
	#[case::context_overflow(r#"{"n":2,"nGrams":[
		{"context":"a","words":[["b",18446744073709551615]]},
		{"context":"a","words":[["b",1]]}
	]}"#)]
	#[case::not_json("not a model")]
	#[case::truncated(r#"{"n":2,"nGr"#)]
	fn malformed_json_is_rejected(#[case] json: &str) {
		assert_malformed(from_bytes(json.as_bytes(), ModelFormat::Json));
	}

	#[test]
	fn truncated_binary_is_rejected() {
		let model = trained().remove(2);
		let bytes = to_bytes(&model, ModelFormat::Postcard).unwrap();
		assert_malformed(from_bytes(&bytes[..bytes.len() / 2], ModelFormat::Postcard));
	}

	#[test]
	fn file_helpers_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		for model in trained() {
			for format in [ModelFormat::Json, ModelFormat::Postcard] {
				let path = model_path(dir.path().join("out"), model.order(), format);
				write_model(&path, &model, format).unwrap();
				assert_eq!(read_model(&path).unwrap(), model);
			}
		}
	}

	#[test]
	fn read_missing_file_is_io_error() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(read_model(dir.path().join("nope.json")), Err(CodecError::Io(_))));
	}

	#[rstest]
	#[case(1, ModelFormat::Json, "unigram-model.json")]
	#[case(2, ModelFormat::Json, "bigram-model.json")]
	#[case(3, ModelFormat::Postcard, "trigram-model.bin")]
	#[case(4, ModelFormat::Json, "fourgram-model.json")]
	#[case(5, ModelFormat::Postcard, "5gram-model.bin")]
	fn model_paths_follow_naming_scheme(#[case] n: usize, #[case] format: ModelFormat, #[case] name: &str) {
		assert_eq!(model_path("models", n, format), Path::new("models").join(name));
		assert_eq!(ModelFormat::from_path(name), format);
	}

	#[rstest]
	#[case("json", Ok(ModelFormat::Json))]
	#[case("JSON", Ok(ModelFormat::Json))]
	#[case("postcard", Ok(ModelFormat::Postcard))]
	#[case("bin", Ok(ModelFormat::Postcard))]
	fn format_parses(#[case] input: &str, #[case] expected: Result<ModelFormat, String>) {
		assert_eq!(input.parse::<ModelFormat>(), expected);
	}

	#[test]
	fn unknown_format_is_rejected() {
		assert!("yaml".parse::<ModelFormat>().is_err());
	}
}
