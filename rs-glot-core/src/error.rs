use thiserror::Error;

/// Result type alias for language graph operations.
pub type LanguageResult<T> = Result<T, LanguageError>;

/// Errors surfaced by the language engine.
///
/// Malformed transition-table rows and non-positive weights are not errors:
/// they are skipped silently so partially broken tables still load.
#[derive(Debug, Error)]
pub enum LanguageError {
	/// A random draw was requested over an empty range.
	///
	/// This is a contract violation from the caller (for example sampling an
	/// empty weighted set), not bad input.
	#[error("invalid bounds for min/max: [{min}, {max}]")]
	InvalidRange { min: usize, max: usize },

	/// The graph was mutated after the last `prepare()`.
	#[error("language graph changed since the last prepare()")]
	Unprepared,

	/// I/O error (table or snapshot files).
	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),

	/// Binary snapshot encoding/decoding error.
	#[error("snapshot error: {0}")]
	Snapshot(#[from] postcard::Error),
}
