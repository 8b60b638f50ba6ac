use std::sync::LazyLock;

use regex::Regex;

/// Default boilerplate markers: the Project Gutenberg start/end banners.
pub const GUTENBERG_MARKERS: [&str; 2] = [
	r"(?i)\*\*\* START OF .+ \*\*\*",
	r"(?i)\*\*\* END OF .+ \*\*\*",
];

/// Anything that is not a word character, whitespace or an apostrophe.
#[allow(clippy::expect_used)] // Constant pattern.
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s']").expect("valid non-word pattern"));

static DEFAULT_TOKENIZER: LazyLock<Tokenizer> = LazyLock::new(Tokenizer::default);

/// Turns raw corpus text into lowercase word tokens.
///
/// The tokenizer is stateless once built: the same input always yields
/// the same tokens. It never fails, unusual input just produces fewer
/// tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
	/// Boilerplate patterns removed before splitting.
	markers: Vec<Regex>,
}

impl Default for Tokenizer {
	#[allow(clippy::expect_used)] // Constant patterns.
	fn default() -> Self {
		Self::new(GUTENBERG_MARKERS).expect("valid gutenberg markers")
	}
}

impl Tokenizer {
	/// Builds a tokenizer that strips every match of `markers` first.
	///
	/// # Errors
	/// Returns the regex error of the first pattern that fails to compile.
	pub fn new<I, S>(markers: I) -> Result<Self, regex::Error>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let markers = markers
			.into_iter()
			.map(|pattern| Regex::new(pattern.as_ref()))
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self { markers })
	}

	/// Splits `text` into tokens.
	///
	/// - Removes boilerplate markers
	/// - Lowercases
	/// - Replaces punctuation (everything but letters, digits, `_`,
	///   whitespace and `'`) with a space
	/// - Splits on whitespace, dropping empty pieces
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let mut text = text.to_owned();
		for marker in &self.markers {
			text = marker.replace_all(&text, "").into_owned();
		}

		let text = text.to_lowercase();
		let spaced = NON_WORD.replace_all(&text, " ");
		spaced.split_whitespace().map(str::to_owned).collect()
	}
}

/// Tokenizes `text` with the default (Gutenberg-aware) tokenizer.
pub fn tokenize(text: &str) -> Vec<String> {
	DEFAULT_TOKENIZER.tokenize(text)
}

/// Normalizes a single already-split word the way prediction input is
/// normalized: trimmed and lowercased. Returns `None` if nothing is left.
pub fn normalize_token(word: &str) -> Option<String> {
	let word = word.trim();
	if word.is_empty() {
		None
	} else {
		Some(word.to_lowercase())
	}
}
