use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LanguageResult;
use crate::random::RandomSource;

/// Weighted sampling structure keyed by cumulative weight.
///
/// Each inserted item is stored at the running total reached after adding its
/// weight. Drawing a uniform value `r` in `[0, total - 1]` and taking the item
/// at the smallest key strictly greater than `r` selects items proportionally
/// to their weights.
///
/// Example: inserting `a(2)`, `b(1)`, `c(3)` stores `{2: a, 3: b, 6: c}`.
/// Draws `0..=1` give `a`, `2` gives `b`, `3..=5` give `c`.
///
/// ## Invariants
/// - Keys are strictly increasing in insertion order
/// - The largest key equals `total` (or the set is empty and `total == 0`)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WeightedCumulativeSet<T> {
	/// Items indexed by the running total reached when they were inserted.
	entries: BTreeMap<usize, T>,
	/// Sum of all accepted weights.
	total: usize,
}

impl<T> Default for WeightedCumulativeSet<T> {
	fn default() -> Self {
		Self { entries: BTreeMap::new(), total: 0 }
	}
}

impl<T> WeightedCumulativeSet<T> {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `item` with the given weight.
	///
	/// Returns `false` and leaves the set untouched when `weight <= 0` or
	/// when the running total would overflow.
	pub fn insert(&mut self, item: T, weight: i64) -> bool {
		let weight = match usize::try_from(weight) {
			Ok(w) if w > 0 => w,
			_ => return false,
		};
		let Some(total) = self.total.checked_add(weight) else {
			return false;
		};
		self.total = total;
		self.entries.insert(total, item);
		true
	}

	/// Sum of all weights (0 when empty).
	pub fn total_weight(&self) -> usize {
		self.total
	}

	/// Number of stored items (an item inserted twice counts twice).
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns the item at the smallest cumulative key strictly greater than `draw`.
	///
	/// `None` when the set is empty or `draw >= total_weight()`.
	pub fn sample(&self, draw: usize) -> Option<&T> {
		let floor = draw.checked_add(1)?;
		self.entries.range(floor..).next().map(|(_, item)| item)
	}

	/// Draws a uniform value from `random` and samples with it.
	///
	/// Returns `Ok(None)` on an empty set without consuming a draw.
	pub fn draw<R: RandomSource + ?Sized>(&self, random: &mut R) -> LanguageResult<Option<&T>> {
		if self.entries.is_empty() {
			return Ok(None);
		}
		let draw = random.int_in_range(0, self.total - 1)?;
		Ok(self.sample(draw))
	}

	/// Item stored at exactly this cumulative key.
	pub fn get(&self, key: usize) -> Option<&T> {
		self.entries.get(&key)
	}

	/// Iterates over `(cumulative_key, item)` in ascending key order.
	pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
		self.entries.iter().map(|(key, item)| (*key, item))
	}

	/// Iterates over `(item, weight)` in insertion order.
	///
	/// Weights are recovered as deltas between consecutive keys, so inserting
	/// them again in order rebuilds identical keys.
	pub fn weighted(&self) -> impl Iterator<Item = (&T, usize)> {
		let mut previous = 0;
		self.entries.iter().map(move |(key, item)| {
			let weight = key - previous;
			previous = *key;
			(item, weight)
		})
	}

	/// Iterates over items in insertion order.
	pub fn values(&self) -> impl Iterator<Item = &T> {
		self.entries.values()
	}
}
