use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{LanguageError, LanguageResult};

/// Uniform integer source used by every sampling decision of the engine.
///
/// Implementations must return a value in `[min, max]` (both inclusive) and
/// must fail with [`LanguageError::InvalidRange`] when `max < min`.
///
/// A source is owned by a single caller at a time. Threads that generate
/// concurrently each hold their own source.
pub trait RandomSource {
	fn int_in_range(&mut self, min: usize, max: usize) -> LanguageResult<usize>;
}

/// Default `RandomSource` backed by a seedable `StdRng`.
///
/// Use [`SeededSource::from_seed`] for reproducible runs and
/// [`SeededSource::from_os_rng`] otherwise.
#[derive(Debug, Clone)]
pub struct SeededSource {
	rng: StdRng,
}

impl SeededSource {
	/// Creates a deterministic source: the same seed yields the same draws.
	pub fn from_seed(seed: u64) -> Self {
		Self { rng: StdRng::seed_from_u64(seed) }
	}

	/// Creates a source seeded from the operating system.
	pub fn from_os_rng() -> Self {
		Self { rng: StdRng::from_os_rng() }
	}

	/// Re-seeds the source in place.
	pub fn set_seed(&mut self, seed: u64) {
		self.rng = StdRng::seed_from_u64(seed);
	}
}

impl Default for SeededSource {
	fn default() -> Self {
		Self::from_os_rng()
	}
}

impl RandomSource for SeededSource {
	fn int_in_range(&mut self, min: usize, max: usize) -> LanguageResult<usize> {
		if max < min {
			return Err(LanguageError::InvalidRange { min, max });
		}
		Ok(self.rng.random_range(min..=max))
	}
}
