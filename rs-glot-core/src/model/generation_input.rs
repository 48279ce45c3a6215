use serde::{Deserialize, Serialize};

/// Default number of retry rounds used by word generation.
pub const DEFAULT_MAX_TRIES: usize = 10;

/// Default cap on links followed by a single walk.
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Which node's fan-out feeds the random stop test of a walk.
///
/// Once a walk has reached `min_length` on a terminating node, it may stop with
/// probability `1 / (links + 2)`. `links` is the number of outgoing links of
/// either the node the walk started on or the node being visited.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopBias {
	/// Fan-out of the node the walk started on.
	#[default]
	Origin,
	/// Fan-out of the node currently visited.
	Current,
}

/// Parameters of a word generation request.
///
/// `min_length` and `max_length` are soft: a walk cannot take the biased stop
/// below `min_length`, and the stop probability grows as the word approaches
/// `max_length`. Nodes without outgoing links still end a walk immediately.
///
/// # Invariants
/// - `max_tries` bounds the number of batches, so generation always terminates
/// - A walk longer than `max_steps` links is discarded
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GenerationInput {
	/// Number of distinct words wanted.
	pub count: usize,

	/// Length (in characters) below which the biased stop never fires.
	pub min_length: usize,

	/// Length (in characters) around which stopping becomes very likely.
	pub max_length: usize,

	/// Number of batches attempted before giving up on `count`.
	#[serde(default = "default_max_tries")]
	pub max_tries: usize,

	/// Maximum number of links a single walk may follow.
	#[serde(default = "default_max_steps")]
	pub max_steps: usize,

	/// Link count used by the biased stop test.
	#[serde(default)]
	pub stop_bias: StopBias,
}

fn default_max_tries() -> usize {
	DEFAULT_MAX_TRIES
}

fn default_max_steps() -> usize {
	DEFAULT_MAX_STEPS
}

impl GenerationInput {
	/// Creates an input with default retry, step cap and stop bias.
	pub fn new(count: usize, min_length: usize, max_length: usize) -> Self {
		Self {
			count,
			min_length,
			max_length,
			max_tries: DEFAULT_MAX_TRIES,
			max_steps: DEFAULT_MAX_STEPS,
			stop_bias: StopBias::default(),
		}
	}

	/// Same request for a different number of words.
	pub fn with_count(&self, count: usize) -> Self {
		Self { count, ..self.clone() }
	}
}

/// Outcome of a generation request.
///
/// Generation works in bounded rounds and may return fewer words than
/// requested. The words are distinct and in discovery order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Generation {
	pub words: Vec<String>,
	pub requested: usize,
}

impl Generation {
	/// Number of words actually produced.
	pub fn len(&self) -> usize {
		self.words.len()
	}

	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}

	/// True when `requested` words were produced.
	pub fn is_complete(&self) -> bool {
		self.words.len() >= self.requested
	}

	/// How many words are missing from the request.
	pub fn shortfall(&self) -> usize {
		self.requested.saturating_sub(self.words.len())
	}

	pub fn into_words(self) -> Vec<String> {
		self.words
	}
}
