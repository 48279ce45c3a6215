use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::LanguageResult;

/// Reads a text file and returns all its lines.
///
/// - Splits on `\n` / `\r\n`
/// - A missing or unreadable file gives an empty list, so "missing" and
///   "empty" look the same to callers
pub fn read_lines<P: AsRef<Path>>(filename: P) -> Vec<String> {
	let filename = filename.as_ref();
	let mut contents = String::new();
	match File::open(filename).and_then(|mut file| file.read_to_string(&mut contents)) {
		Ok(_) => contents.lines().map(str::to_owned).collect(),
		Err(e) => {
			debug!("could not read {}: {e}", filename.display());
			Vec::new()
		}
	}
}

/// Writes each line followed by `\n`, replacing the file.
///
/// # Errors
/// Returns the I/O error if the file cannot be created or written. The file
/// may be partially written in that case.
pub fn write_lines<P, S>(filename: P, lines: &[S]) -> LanguageResult<()>
where
	P: AsRef<Path>,
	S: AsRef<str>,
{
	let mut writer = BufWriter::new(File::create(filename)?);
	for line in lines {
		writer.write_all(line.as_ref().as_bytes())?;
		writer.write_all(b"\n")?;
	}
	writer.flush()?;
	Ok(())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/futhark.csv` + `"bin"` → `data/futhark.bin`
pub(crate) fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/futhark.csv"` → `"futhark"`
/// - `"futhark.csv"` → `"futhark"`
pub(crate) fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// True if `derived` exists and was modified no earlier than `source`.
///
/// A derived file whose source is gone is still considered fresh.
pub(crate) fn is_fresh(derived: &Path, source: &Path) -> bool {
	let Ok(derived) = fs::metadata(derived).and_then(|m| m.modified()) else {
		return false;
	};
	match fs::metadata(source).and_then(|m| m.modified()) {
		Ok(source) => derived >= source,
		Err(_) => true,
	}
}
