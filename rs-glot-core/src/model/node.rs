use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, trace};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::generation_input::{GenerationInput, StopBias};
use super::graph::LanguageGraph;
use super::weighted_set::WeightedCumulativeSet;
use crate::error::LanguageResult;
use crate::random::RandomSource;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").expect("valid word pattern"));

/// Stable identifier of a node inside its `LanguageGraph`.
///
/// Displayed as `N<id>`, the form used by transition tables.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "N{}", self.0)
	}
}

/// One state of the language automaton.
///
/// A node emits one of its weighted fragments when visited, then follows one
/// of its weighted links. Links are stored as `NodeId`s and resolved through
/// the owning graph, so self-loops and cycles need no shared ownership.
///
/// ## Invariants
/// - Fragments are non-empty runs of word characters
/// - Every fragment and link weight is >= 1
/// - A node without outgoing links is always terminating
#[derive(Serialize, Deserialize, Debug)]
pub struct GraphNode {
	id: NodeId,
	/// Strings this node may emit, weighted.
	fragments: WeightedCumulativeSet<String>,
	/// Outgoing links, weighted.
	links: WeightedCumulativeSet<NodeId>,
	initializing: bool,
	terminating: bool,
	/// Number of walks started from this node. Not part of the node identity.
	#[serde(skip)]
	runs: AtomicUsize,
}

impl GraphNode {
	/// Creates a node emitting each of `fragments` with weight 1.
	pub(crate) fn new<I, S>(id: NodeId, fragments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut node = Self {
			id,
			fragments: WeightedCumulativeSet::new(),
			links: WeightedCumulativeSet::new(),
			initializing: false,
			terminating: false,
			runs: AtomicUsize::new(0),
		};
		for fragment in fragments {
			node.add_fragment(fragment, 1);
		}
		node
	}

	pub fn id(&self) -> NodeId {
		self.id
	}

	pub fn fragments(&self) -> &WeightedCumulativeSet<String> {
		&self.fragments
	}

	pub fn links(&self) -> &WeightedCumulativeSet<NodeId> {
		&self.links
	}

	pub fn is_initializing(&self) -> bool {
		self.initializing
	}

	/// Whether a word may end on this node.
	///
	/// True when flagged terminating or when the node has no outgoing links.
	pub fn is_terminating(&self) -> bool {
		self.terminating || self.links.is_empty()
	}

	/// Number of walks started from this node so far.
	pub fn runs(&self) -> usize {
		self.runs.load(Ordering::Relaxed)
	}

	/// Adds a fragment. Fragments that are not made of word characters, and
	/// weights <= 0, are ignored.
	pub(crate) fn add_fragment<S: Into<String>>(&mut self, fragment: S, weight: i64) -> bool {
		let fragment = fragment.into();
		if !WORD.is_match(&fragment) {
			return false;
		}
		self.fragments.insert(fragment, weight)
	}

	/// Adds an outgoing link. Weights <= 0 are ignored.
	pub(crate) fn add_link(&mut self, target: NodeId, weight: i64) -> bool {
		self.links.insert(target, weight)
	}

	pub(crate) fn set_properties(&mut self, initializing: bool, terminating: bool) {
		self.initializing = initializing;
		self.terminating = terminating;
	}

	pub(crate) fn set_initializing(&mut self, initializing: bool) {
		self.initializing = initializing;
	}

	pub(crate) fn set_terminating(&mut self, terminating: bool) {
		self.terminating = terminating;
	}

	/// Picks the fragment emitted on this visit.
	///
	/// Returns `None` when the node has no fragments; the visit then adds
	/// nothing to the word.
	pub fn emit_fragment<R: RandomSource + ?Sized>(&self, random: &mut R) -> LanguageResult<Option<&str>> {
		Ok(self.fragments.draw(random)?.map(String::as_str))
	}

	/// Picks the next node to visit. `None` when the node has no links.
	pub fn choose_next_link<R: RandomSource + ?Sized>(&self, random: &mut R) -> LanguageResult<Option<NodeId>> {
		Ok(self.links.draw(random)?.copied())
	}

	/// Local stop test: no way out, or a terminating node winning a
	/// `1 / (links + 2)` draw.
	pub fn terminates_now<R: RandomSource + ?Sized>(&self, random: &mut R) -> LanguageResult<bool> {
		if self.links.is_empty() {
			return Ok(true);
		}
		Ok(self.terminating && random.int_in_range(0, self.links.len() + 1)? == 0)
	}

	/// Generates one word by a random walk starting on this node.
	///
	/// The walk emits this node's fragment, then keeps following weighted links
	/// until a stop test fires. Once the word holds at least `min_length`
	/// characters on a terminating node, the walk stops if either
	/// - a draw in `[0, 1 + max_length - length]` is 0, or
	/// - a draw in `[0, links + 1]` is 0 (see [`StopBias`]).
	///
	/// The local stop test of the visited node is applied after every step.
	///
	/// Returns `Ok(None)` when the walk exceeds `max_steps` links or reaches an
	/// id unknown to `graph`; nothing partial is ever returned.
	pub fn run<R: RandomSource + ?Sized>(
		&self,
		graph: &LanguageGraph,
		input: &GenerationInput,
		random: &mut R,
	) -> LanguageResult<Option<String>> {
		let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
		let mut current = self;
		let mut word = String::new();
		if let Some(fragment) = current.emit_fragment(random)? {
			word.push_str(fragment);
		}
		trace!("{run}: ({}){word}", self.id.0);

		let mut steps = 0;
		let mut stop = current.terminates_now(random)?;
		while !stop {
			let Some(next_id) = current.choose_next_link(random)? else {
				break;
			};
			let Some(next) = graph.node(next_id) else {
				debug!("walk from {} reached unknown node {next_id}", self.id);
				return Ok(None);
			};
			steps += 1;
			if steps > input.max_steps {
				debug!("walk from {} exceeded {} steps, discarded", self.id, input.max_steps);
				return Ok(None);
			}

			current = next;
			match current.emit_fragment(random)? {
				Some(fragment) => {
					trace!(" + ({}):{fragment}", current.id.0);
					word.push_str(fragment);
				}
				None => trace!(" + ({}) no fragment", current.id.0),
			}

			let length = word.chars().count();
			let fan_out = match input.stop_bias {
				StopBias::Origin => self.links.len(),
				StopBias::Current => current.links.len(),
			};
			stop = current.terminating
				&& length >= input.min_length
				&& (random.int_in_range(0, input.max_length.saturating_add(1).saturating_sub(length))? == 0
					|| random.int_in_range(0, fan_out + 1)? == 0);
			if !stop {
				stop = current.terminates_now(random)?;
			}
		}

		trace!(" = {word}");
		Ok(Some(word))
	}

	/// Checks whether a walk starting on this node could produce `word`.
	///
	/// Explores `(node, remaining suffix)` states depth-first: a node consumes
	/// one of its fragments as a prefix (or nothing if it has none), and the
	/// word is accepted once a terminating node leaves an empty remainder.
	/// Each state is explored at most once, which also cuts cycles through
	/// fragment-less nodes. Deterministic: no randomness is involved.
	pub fn can_make_word(&self, graph: &LanguageGraph, word: &str) -> bool {
		let mut visited: HashSet<(NodeId, usize)> = HashSet::new();
		visited.insert((self.id, word.len()));
		let mut pending = vec![(self, word)];

		while let Some((node, rest)) = pending.pop() {
			let remainders = node.remainders(rest);
			if node.is_terminating() && remainders.iter().any(|r| r.is_empty()) {
				return true;
			}
			for remainder in remainders {
				for target in node.links.values() {
					// Remainders are suffixes of `word`: the length identifies them.
					if !visited.insert((*target, remainder.len())) {
						continue;
					}
					if let Some(next) = graph.node(*target) {
						pending.push((next, remainder));
					}
				}
			}
		}
		false
	}

	/// Distinct suffixes of `word` left after emitting one of this node's fragments.
	fn remainders<'w>(&self, word: &'w str) -> Vec<&'w str> {
		if self.fragments.is_empty() {
			return vec![word];
		}
		let mut remainders: Vec<&str> = self
			.fragments
			.values()
			.filter_map(|fragment| word.strip_prefix(fragment.as_str()))
			.collect();
		remainders.sort_unstable_by_key(|r| r.len());
		remainders.dedup();
		remainders
	}
}

/// Structural equality: id, flags and every cumulative key with its fragment
/// or linked node id. The run counter is ignored.
impl PartialEq for GraphNode {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
			&& self.initializing == other.initializing
			&& self.is_terminating() == other.is_terminating()
			&& self.fragments == other.fragments
			&& self.links == other.links
	}
}

impl Eq for GraphNode {}
