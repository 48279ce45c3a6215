use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::generation_input::{Generation, GenerationInput};
use super::node::{GraphNode, NodeId};
use crate::error::{LanguageError, LanguageResult};
use crate::io::{build_output_path, get_filename, is_fresh, read_lines, write_lines};
use crate::random::{RandomSource, SeededSource};

/// A generated language: the arena of nodes plus the cached start states.
///
/// # Responsibilities
/// - Own every node; nodes are addressed by `NodeId` and never removed
/// - Generate distinct words by random walks from initializer nodes
/// - Validate words against the same automaton
/// - Load/save transition tables and binary snapshots
///
/// # Invariants
/// - Every link target is a node of this graph
/// - After `prepare()`, `initializers` lists exactly the initializing nodes,
///   in ascending id order, until the next mutation
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct LanguageGraph {
	/// Display name (file stem when loaded from disk). Not part of identity.
	name: String,
	nodes: BTreeMap<NodeId, GraphNode>,
	#[serde(skip)]
	initializers: Vec<NodeId>,
	/// False whenever the graph changed since the last `prepare()`.
	#[serde(skip)]
	prepared: bool,
}

impl LanguageGraph {
	/// Creates an empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty graph with a display name.
	pub fn with_name(name: &str) -> Self {
		Self { name: name.to_owned(), ..Self::default() }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn set_name(&mut self, name: &str) {
		self.name = name.to_owned();
	}

	/// Creates a node with the next free id, emitting each fragment with weight 1.
	pub fn create_node<I, S>(&mut self, fragments: I) -> NodeId
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let id = self.next_free_id();
		self.nodes.insert(id, GraphNode::new(id, fragments));
		self.prepared = false;
		id
	}

	/// One past the highest id, or the lowest unused id once `usize::MAX` is taken.
	fn next_free_id(&self) -> NodeId {
		match self.nodes.keys().next_back() {
			None => NodeId(0),
			Some(last) => match last.0.checked_add(1) {
				Some(next) => NodeId(next),
				None => (0..)
					.map(NodeId)
					.zip(self.nodes.keys())
					.find(|(candidate, used)| candidate != *used)
					.map_or(NodeId(self.nodes.len()), |(candidate, _)| candidate),
			},
		}
	}

	/// Returns the node with this id, creating an empty one if needed.
	pub(crate) fn get_or_create_node(&mut self, id: NodeId) -> &mut GraphNode {
		self.prepared = false;
		self.nodes.entry(id).or_insert_with(|| GraphNode::new(id, Vec::<String>::new()))
	}

	fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
		let node = self.nodes.get_mut(&id)?;
		self.prepared = false;
		Some(node)
	}

	pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
		self.nodes.get(&id)
	}

	/// Iterates over nodes in ascending id order.
	pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
		self.nodes.values()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Adds a weighted fragment to node `id`.
	///
	/// Returns `false` if the node does not exist, the fragment is not a run of
	/// word characters or the weight is <= 0.
	pub fn add_fragment(&mut self, id: NodeId, fragment: &str, weight: i64) -> bool {
		self.node_mut(id).is_some_and(|node| node.add_fragment(fragment, weight))
	}

	/// Adds a weighted link `from -> to`. The target is created if unknown.
	///
	/// Returns `false` if `from` does not exist or the weight is <= 0.
	pub fn add_link(&mut self, from: NodeId, to: NodeId, weight: i64) -> bool {
		if !self.nodes.contains_key(&from) || weight <= 0 {
			return false;
		}
		self.get_or_create_node(to);
		self.node_mut(from).is_some_and(|node| node.add_link(to, weight))
	}

	/// Sets both flags of node `id`. Returns `false` if the node does not exist.
	pub fn set_properties(&mut self, id: NodeId, initializing: bool, terminating: bool) -> bool {
		match self.node_mut(id) {
			Some(node) => {
				node.set_properties(initializing, terminating);
				true
			}
			None => false,
		}
	}

	/// Rebuilds the initializer cache. Required after any mutation before
	/// generating or validating.
	pub fn prepare(&mut self) {
		self.initializers = self
			.nodes
			.values()
			.filter(|node| node.is_initializing())
			.map(GraphNode::id)
			.collect();
		self.prepared = true;
	}

	pub fn is_prepared(&self) -> bool {
		self.prepared
	}

	/// Initializer ids in ascending order.
	///
	/// # Errors
	/// [`LanguageError::Unprepared`] if the graph changed since `prepare()`.
	pub fn initializers(&self) -> LanguageResult<&[NodeId]> {
		if !self.prepared {
			return Err(LanguageError::Unprepared);
		}
		Ok(&self.initializers)
	}

	/// Generates up to `input.count` distinct words with an OS-seeded source.
	pub fn generate_words(&self, input: &GenerationInput) -> LanguageResult<Generation> {
		self.generate_words_with(input, &mut SeededSource::from_os_rng())
	}

	/// Generates up to `input.count` distinct words.
	///
	/// # Behavior
	/// - Runs at most `input.max_tries` rounds
	/// - Each round starts `count - found / 2` walks, each from an initializer
	///   picked uniformly
	/// - Duplicates and discarded walks are absorbed silently
	///
	/// The result may hold fewer words than requested; see
	/// [`Generation::shortfall`]. A graph without initializers yields nothing.
	///
	/// # Errors
	/// [`LanguageError::Unprepared`] if the graph changed since `prepare()`.
	pub fn generate_words_with<R: RandomSource + ?Sized>(
		&self,
		input: &GenerationInput,
		random: &mut R,
	) -> LanguageResult<Generation> {
		let initializers = self.initializers()?;
		let mut generation = Generation { words: Vec::new(), requested: input.count };
		if initializers.is_empty() {
			warn!("language '{}' has no initializer node", self.name);
			return Ok(generation);
		}

		let mut found: HashSet<String> = HashSet::new();
		let mut tries = 0;
		while found.len() < input.count && tries < input.max_tries {
			tries += 1;
			let batch = input.count - found.len() / 2;
			debug!("round {tries}: {batch} walks, {} words so far", found.len());
			for _ in 0..batch {
				let start = initializers[random.int_in_range(0, initializers.len() - 1)?];
				let Some(node) = self.node(start) else {
					continue;
				};
				if let Some(word) = node.run(self, input, random)? {
					if found.insert(word.clone()) {
						generation.words.push(word);
					}
				}
			}
		}

		generation.words.truncate(input.count);
		Ok(generation)
	}

	/// Generates words on every CPU core.
	///
	/// Each worker walks the shared graph with its own source seeded with
	/// `seed + worker index`, so a given seed and core count reproduce the
	/// same words. Results are merged in worker order, deduplicated and
	/// truncated to `input.count`.
	///
	/// # Errors
	/// [`LanguageError::Unprepared`] if the graph changed since `prepare()`.
	pub fn generate_words_parallel(&self, input: &GenerationInput, seed: u64) -> LanguageResult<Generation> {
		self.initializers()?;
		let workers = num_cpus::get().clamp(1, input.count.max(1));
		let share = input.count.div_ceil(workers);

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for worker in 0..workers {
				let tx = tx.clone();
				let part = input.with_count(share);
				scope.spawn(move || {
					let mut random = SeededSource::from_seed(seed.wrapping_add(worker as u64));
					let partial = self.generate_words_with(&part, &mut random);
					let _ = tx.send((worker, partial));
				});
			}
		});
		drop(tx);

		let mut partials: Vec<_> = rx.iter().collect();
		partials.sort_by_key(|(worker, _)| *worker);

		let mut generation = Generation { words: Vec::new(), requested: input.count };
		let mut found: HashSet<String> = HashSet::new();
		for (_, partial) in partials {
			for word in partial?.words {
				if found.insert(word.clone()) {
					generation.words.push(word);
				}
			}
		}
		generation.words.truncate(input.count);
		Ok(generation)
	}

	/// True if some initializer can produce `word`. Deterministic.
	///
	/// # Errors
	/// [`LanguageError::Unprepared`] if the graph changed since `prepare()`.
	pub fn is_valid_word(&self, word: &str) -> LanguageResult<bool> {
		Ok(self
			.initializers()?
			.iter()
			.filter_map(|id| self.node(*id))
			.any(|node| node.can_make_word(self, word)))
	}

	/// Reads a transition table from `path`.
	///
	/// A missing or unreadable file gives an empty (prepared) graph. The graph
	/// is named after the file stem.
	pub fn load<P: AsRef<Path>>(path: P) -> Self {
		let path = path.as_ref();
		let mut graph = Self::from_transition_table(read_lines(path));
		graph.name = get_filename(path).unwrap_or_default();
		graph
	}

	/// Writes the transition table to `path`, one row per line.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> LanguageResult<()> {
		let path = path.as_ref();
		write_lines(path, &self.to_transition_table()).inspect_err(|e| {
			warn!("could not write transition table {}: {e}", path.display());
		})
	}

	/// Loads a transition table, going through its binary snapshot.
	///
	/// `data/futhark.csv` is cached as `data/futhark.bin`. The snapshot is used
	/// when it is at least as recent as the table; otherwise the table is
	/// parsed and the snapshot rewritten (best effort).
	///
	/// # Errors
	/// Returns an error if `path` has no file name or a snapshot fails to decode.
	pub fn open<P: AsRef<Path>>(path: P) -> LanguageResult<Self> {
		let path = path.as_ref();
		let snapshot = build_output_path(path, "bin")?;
		let mut graph = if is_fresh(&snapshot, path) {
			debug!("loading snapshot {}", snapshot.display());
			Self::load_snapshot(&snapshot)?
		} else {
			debug!("no fresh snapshot for {}, parsing table", path.display());
			let graph = Self::load(path);
			if let Err(e) = graph.save_snapshot(&snapshot) {
				warn!("could not write snapshot {}: {e}", snapshot.display());
			}
			graph
		};
		graph.name = get_filename(path)?;
		Ok(graph)
	}

	/// Serializes the graph with `postcard`.
	pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> LanguageResult<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes)?;
		Ok(())
	}

	/// Restores a graph written by [`LanguageGraph::save_snapshot`], prepared.
	pub fn load_snapshot<P: AsRef<Path>>(path: P) -> LanguageResult<Self> {
		let bytes = std::fs::read(path)?;
		let mut graph: Self = postcard::from_bytes(&bytes)?;
		graph.prepare();
		Ok(graph)
	}
}

/// Two graphs are equal when they hold the same node ids and every pair of
/// nodes is equal (flags, ids, cumulative keys with their fragments and link
/// targets). Names, run counters and cache state are ignored.
impl PartialEq for LanguageGraph {
	fn eq(&self, other: &Self) -> bool {
		self.nodes == other.nodes
	}
}

impl Eq for LanguageGraph {}
