use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a whole text file into memory.
///
/// Invalid UTF-8 is an error, not a lossy conversion: a corpus file that
/// is not text is reported and skipped by the trainer.
pub(crate) fn read_text<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	fs::read_to_string(filename)
}

/// Builds `<dir>/<stem>.<extension>`.
///
/// Example:
/// `data/processed` + `"bigram-model"` + `"json"` → `data/processed/bigram-model.json`
pub(crate) fn build_output_path<P: AsRef<Path>>(dir: P, stem: &str, extension: &str) -> PathBuf {
	let mut output = PathBuf::from(dir.as_ref());
	output.push(stem);
	output.set_extension(extension);
	output
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder<P: AsRef<Path>>(input: P) -> PathBuf {
	let input = input.as_ref();
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

/// Lists all files with a given extension directly inside `dir`.
///
/// Returns full paths sorted by name. Subdirectories are ignored.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(OsStr::new(extension)) {
			files.push(path);
		}
	}

	files.sort();
	Ok(files)
}
