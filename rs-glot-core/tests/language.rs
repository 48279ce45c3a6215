//! End-to-end behaviour of language graphs: generation, validation and
//! transition-table persistence.

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rs_glot_core::{
	GenerationInput, LanguageGraph, NodeId, SeededSource, StopBias, WeightedCumulativeSet,
};

// ============================================================================
// Sample languages
// ============================================================================

fn patriot() -> LanguageGraph {
	let mut graph = LanguageGraph::new();
	let node = graph.create_node(["la", "li", "lu", "le", "lo"]);
	graph.set_properties(node, true, true);
	graph.add_link(node, node, 1);
	graph.prepare();
	graph
}

fn gibberish() -> LanguageGraph {
	let mut graph = LanguageGraph::with_name("gibberish");
	let mut vowels: Vec<String> = ["a", "i", "u", "o"].map(String::from).to_vec();
	let mut consonants: Vec<String> =
		["b", "d", "g", "k", "m", "r", "s", "t", "p"].map(String::from).to_vec();

	let vowel = graph.create_node(vowels.clone());
	graph.add_fragment(vowel, "e", 3);
	vowels.push("e".to_owned());

	consonants.extend(["l", "n"].map(String::from));
	let double_consonant = graph.create_node(consonants.iter().map(|c| format!("{c}{c}")));

	consonants.extend(["y", "v"].map(String::from));
	let combination = graph.create_node(consonants.iter().flat_map(|i| {
		consonants.iter().filter(move |j| *j != i).map(move |j| format!("{i}{j}"))
	}));
	let single_consonant = graph.create_node(consonants.clone());

	let syllabic = graph.create_node(
		consonants.iter().flat_map(|c| vowels.iter().map(move |v| format!("{c}{v}"))),
	);
	for c in ["l", "n"] {
		for v in &vowels {
			graph.add_fragment(syllabic, &format!("{c}{v}"), 2);
		}
	}
	for v in &vowels {
		graph.add_fragment(syllabic, &format!("y{v}"), 1);
	}

	let double_vowel =
		graph.create_node(vowels.iter().flat_map(|i| vowels.iter().map(move |j| format!("{i}{j}"))));
	let cha = graph.create_node(["ch", "sh", "sch"]);

	graph.set_properties(vowel, true, false);
	graph.set_properties(double_vowel, true, false);
	graph.set_properties(cha, true, true);
	graph.set_properties(double_consonant, false, false);
	graph.set_properties(combination, false, false);
	graph.set_properties(single_consonant, true, true);
	graph.set_properties(syllabic, true, true);

	graph.add_link(vowel, syllabic, 5);
	graph.add_link(vowel, double_consonant, 5);
	graph.add_link(vowel, cha, 1);
	graph.add_link(vowel, single_consonant, 4);
	graph.add_link(vowel, combination, 3);

	graph.add_link(double_vowel, single_consonant, 1);

	graph.add_link(cha, vowel, 2);
	graph.add_link(cha, double_vowel, 1);

	graph.add_link(single_consonant, vowel, 2);
	graph.add_link(single_consonant, double_vowel, 1);

	graph.add_link(combination, vowel, 1);
	graph.add_link(combination, double_vowel, 1);
	graph.add_link(double_consonant, vowel, 1);

	graph.add_link(syllabic, double_consonant, 2);
	graph.add_link(syllabic, single_consonant, 2);
	graph.add_link(syllabic, syllabic, 5);
	graph.add_link(syllabic, cha, 1);

	graph.prepare();
	graph
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn patriot_accepts_its_syllables_only() {
	let graph = patriot();
	assert!(graph.is_valid_word("lalilulelo").unwrap());
	assert!(!graph.is_valid_word("patriots").unwrap());

	let generation = graph
		.generate_words_with(&GenerationInput::new(100, 1, 15), &mut SeededSource::from_seed(1))
		.unwrap();
	assert!(!generation.is_empty());
	for word in &generation.words {
		assert!(graph.is_valid_word(word).unwrap(), "{word}");
	}
}

#[test]
fn silent_node_produces_the_empty_word() {
	let mut graph = LanguageGraph::new();
	let node = graph.create_node(Vec::<String>::new());
	graph.set_properties(node, true, false);
	graph.prepare();

	let generation = graph.generate_words(&GenerationInput::new(1, 2, 9)).unwrap();
	assert_eq!(generation.words, vec![String::new()]);
	assert!(generation.is_complete());
	assert!(graph.is_valid_word("").unwrap());
	assert!(!graph.is_valid_word("a").unwrap());
}

#[test]
fn patriot_round_trips_through_rows() {
	let graph = patriot();
	let restored = LanguageGraph::from_transition_table(graph.to_transition_table());
	assert_eq!(restored, graph);
	assert!(restored.is_valid_word("lalilulelo").unwrap());
}

// ============================================================================
// Larger language
// ============================================================================

#[test]
fn gibberish_generates_distinct_valid_words() {
	let graph = gibberish();
	let generation = graph
		.generate_words_with(&GenerationInput::new(500, 2, 7), &mut SeededSource::from_seed(2024))
		.unwrap();
	assert!(generation.len() > 100, "only {} words", generation.len());
	assert!(generation.len() <= 500);

	let distinct: HashSet<&String> = generation.words.iter().collect();
	assert_eq!(distinct.len(), generation.len());
	for word in &generation.words {
		assert!(graph.is_valid_word(word).unwrap(), "{word}");
	}
}

#[test]
fn gibberish_validates_known_words() {
	let graph = gibberish();
	assert!(graph.is_valid_word("loyal").unwrap());
	assert!(graph.is_valid_word("murder").unwrap());
	assert!(!graph.is_valid_word("aaaa").unwrap());
	assert!(!graph.is_valid_word("xyz").unwrap());
}

#[test]
fn validation_is_deterministic() {
	let graph = gibberish();
	for word in ["loyal", "murder", "aaaa", "schoo", ""] {
		let first = graph.is_valid_word(word).unwrap();
		for _ in 0..3 {
			assert_eq!(graph.is_valid_word(word).unwrap(), first);
		}
	}
}

#[test]
fn current_stop_bias_keeps_words_valid() {
	let graph = gibberish();
	let mut input = GenerationInput::new(200, 2, 7);
	input.stop_bias = StopBias::Current;
	let generation = graph.generate_words_with(&input, &mut SeededSource::from_seed(8)).unwrap();
	assert!(!generation.is_empty());
	for word in &generation.words {
		assert!(graph.is_valid_word(word).unwrap(), "{word}");
	}
}

#[test]
fn small_language_underdelivers_without_error() {
	// Only "a" and "b" can ever be produced.
	let graph = LanguageGraph::from_transition_table(["S ; _ ; N0", "N0 ; a | b ; O"]);
	let generation = graph
		.generate_words_with(&GenerationInput::new(10, 1, 3), &mut SeededSource::from_seed(4))
		.unwrap();
	let mut words = generation.words.clone();
	words.sort();
	assert_eq!(words, vec!["a", "b"]);
	assert_eq!(generation.shortfall(), 8);
	assert!(!generation.is_complete());
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn gibberish_round_trips_through_a_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("gibberish.csv");
	let graph = gibberish();

	graph.save(&path).unwrap();
	let restored = LanguageGraph::load(&path);
	assert_eq!(restored, graph);
	assert_eq!(restored.name(), "gibberish");
	assert_eq!(restored.initializers().unwrap(), graph.initializers().unwrap());
}

#[test]
fn missing_table_loads_as_empty_graph() {
	let dir = tempfile::tempdir().unwrap();
	let graph = LanguageGraph::load(dir.path().join("missing.csv"));
	assert!(graph.is_empty());
	assert!(graph.generate_words(&GenerationInput::new(3, 1, 4)).unwrap().is_empty());
}

#[test]
fn open_writes_and_reuses_the_snapshot() {
	let dir = tempfile::tempdir().unwrap();
	let table = dir.path().join("gibberish.csv");
	let snapshot = dir.path().join("gibberish.bin");
	let graph = gibberish();
	graph.save(&table).unwrap();

	let first = LanguageGraph::open(&table).unwrap();
	assert!(snapshot.exists());
	assert_eq!(first, graph);

	let second = LanguageGraph::open(&table).unwrap();
	assert_eq!(second, graph);
	assert_eq!(second.name(), "gibberish");
	assert!(second.is_prepared());
	assert!(second.is_valid_word("murder").unwrap());
}

#[test]
fn snapshot_round_trip_keeps_structure() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("patriot.bin");
	let graph = patriot();
	graph.save_snapshot(&path).unwrap();
	let restored = LanguageGraph::load_snapshot(&path).unwrap();
	assert_eq!(restored, graph);
	assert_eq!(restored.initializers().unwrap(), &[NodeId(0)]);
}

#[test]
fn corrupt_snapshot_is_an_error() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("broken.bin");
	std::fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
	assert!(LanguageGraph::load_snapshot(&path).is_err());
}

// ============================================================================
// Properties
// ============================================================================

type NodeSpec = (Vec<(String, i64)>, Vec<(usize, i64)>, bool, bool);

fn node_spec() -> impl Strategy<Value = NodeSpec> {
	(
		prop::collection::vec(("[a-c -]{0,3}", 1i64..4), 0..4),
		prop::collection::vec((0usize..5, 1i64..4), 0..3),
		any::<bool>(),
		any::<bool>(),
	)
}

fn build(specs: &[NodeSpec]) -> LanguageGraph {
	let mut graph = LanguageGraph::new();
	let ids: Vec<NodeId> = specs.iter().map(|_| graph.create_node(Vec::<String>::new())).collect();
	for (index, (fragments, links, initializing, terminating)) in specs.iter().enumerate() {
		let id = ids[index];
		for (fragment, weight) in fragments {
			graph.add_fragment(id, fragment, *weight);
		}
		for (target, weight) in links {
			graph.add_link(id, ids[target % ids.len()], *weight);
		}
		graph.set_properties(id, *initializing || index == 0, *terminating);
	}
	graph.prepare();
	graph
}

proptest! {
	#![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

	#[test]
	fn generated_words_are_always_accepted(
		specs in prop::collection::vec(node_spec(), 1..5),
		seed in any::<u64>(),
		min_length in 0usize..4,
		extra in 0usize..5,
		current in any::<bool>(),
	) {
		let graph = build(&specs);
		let mut input = GenerationInput::new(6, min_length, min_length + extra);
		input.max_tries = 3;
		input.max_steps = 200;
		if current {
			input.stop_bias = StopBias::Current;
		}
		let generation = graph.generate_words_with(&input, &mut SeededSource::from_seed(seed)).unwrap();
		prop_assert!(generation.len() <= 6);
		let distinct: HashSet<&String> = generation.words.iter().collect();
		prop_assert_eq!(distinct.len(), generation.len());
		for word in &generation.words {
			prop_assert!(graph.is_valid_word(word).unwrap(), "rejected {:?}", word);
		}
	}

	#[test]
	fn export_import_is_identity(specs in prop::collection::vec(node_spec(), 1..6)) {
		let graph = build(&specs);
		let restored = LanguageGraph::from_transition_table(graph.to_transition_table());
		prop_assert_eq!(restored.to_transition_table(), graph.to_transition_table());
		prop_assert!(restored == graph);
	}

	#[test]
	fn total_weight_grows_by_positive_weights_only(weights in prop::collection::vec(-3i64..6, 0..20)) {
		let mut set = WeightedCumulativeSet::new();
		for (index, weight) in weights.iter().enumerate() {
			let before = set.total_weight();
			let accepted = set.insert(index, *weight);
			prop_assert_eq!(accepted, *weight > 0);
			let expected = if *weight > 0 { before + *weight as usize } else { before };
			prop_assert_eq!(set.total_weight(), expected);
		}
	}

	#[test]
	fn every_item_is_reachable_and_draws_stay_inside(weights in prop::collection::vec(1i64..6, 1..12)) {
		let mut set = WeightedCumulativeSet::new();
		for (index, weight) in weights.iter().enumerate() {
			set.insert(index, *weight);
		}
		let mut reached = HashSet::new();
		for draw in 0..set.total_weight() {
			let item = set.sample(draw);
			prop_assert!(item.is_some());
			reached.insert(*item.unwrap());
		}
		prop_assert_eq!(reached.len(), weights.len());
		prop_assert!(set.sample(set.total_weight()).is_none());
	}
}
