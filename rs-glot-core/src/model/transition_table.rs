//! Textual transition tables.
//!
//! One row per line, three `;`-separated fields:
//!
//! ```text
//! S ; _ ; N0 | N3
//! N0 ; la | li(2) ; N0(3) | N1 | O
//! N1 ; ka ; O
//! ```
//!
//! - `S` rows list initializer nodes; the middle field is unused.
//! - `N<id>` rows list weighted fragments, then weighted links. `O` marks the
//!   node as terminating; a node without links is terminating anyway.
//! - Missing weights default to 1. Whitespace around separators is ignored.
//! - Rows and items that do not match are skipped without error.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::graph::LanguageGraph;
use super::node::{GraphNode, NodeId};

static ROW: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*(?P<kind>[SN])(?P<id>\d+)?\s*;\s*(?P<fragments>[^;]*?)\s*;\s*(?P<links>[^;]*?)\s*$")
		.expect("valid row pattern")
});

static LINK: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(?P<kind>[ON])(?P<id>\d+)?(?:\((?P<weight>\d+)\))?$").expect("valid link pattern"));

static FRAGMENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(?P<value>\w+)(?:\((?P<weight>\d+)\))?$").expect("valid fragment pattern"));

/// One parsed item of a link field.
#[derive(Debug, PartialEq, Eq)]
enum LinkItem {
	Terminal,
	Node { id: NodeId, weight: i64 },
}

/// Splits a `|`-delimited field into trimmed, non-empty items.
fn items(field: &str) -> impl Iterator<Item = &str> {
	field.split('|').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_weight(weight: Option<regex::Match<'_>>) -> Option<i64> {
	match weight {
		Some(weight) => weight.as_str().parse().ok(),
		None => Some(1),
	}
}

fn parse_fragment(item: &str) -> Option<(&str, i64)> {
	let captures = FRAGMENT.captures(item)?;
	let value = captures.name("value")?.as_str();
	Some((value, parse_weight(captures.name("weight"))?))
}

fn parse_link(item: &str) -> Option<LinkItem> {
	let captures = LINK.captures(item)?;
	if &captures["kind"] == "O" {
		return Some(LinkItem::Terminal);
	}
	let id = captures.name("id")?.as_str().parse().ok()?;
	let weight = parse_weight(captures.name("weight"))?;
	Some(LinkItem::Node { id: NodeId(id), weight })
}

impl LanguageGraph {
	/// Builds a prepared graph from transition-table rows.
	pub fn from_transition_table<I, S>(rows: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut graph = Self::new();
		for row in rows {
			graph.apply_row(row.as_ref());
		}
		graph.prepare();
		graph
	}

	/// Applies one transition-table row to the graph.
	///
	/// Node rows add to whatever the node already holds, so a node may be
	/// spread over several rows. Returns `false` when the row is skipped.
	pub fn apply_row(&mut self, row: &str) -> bool {
		if row.trim().is_empty() {
			return false;
		}
		let Some(captures) = ROW.captures(row) else {
			debug!("skipping malformed row: {row}");
			return false;
		};

		match &captures["kind"] {
			"S" => {
				self.apply_initializers(&captures["links"]);
				true
			}
			_ => {
				let Some(id) = captures.name("id").and_then(|id| id.as_str().parse().ok()) else {
					debug!("skipping node row without id: {row}");
					return false;
				};
				self.apply_node(NodeId(id), &captures["fragments"], &captures["links"]);
				true
			}
		}
	}

	fn apply_initializers(&mut self, links: &str) {
		for item in items(links) {
			if let Some(LinkItem::Node { id, .. }) = parse_link(item) {
				self.get_or_create_node(id).set_initializing(true);
			}
		}
	}

	fn apply_node(&mut self, id: NodeId, fragments: &str, links: &str) {
		let mut terminal = false;
		let mut targets = Vec::new();
		for item in items(links) {
			match parse_link(item) {
				Some(LinkItem::Terminal) => terminal = true,
				Some(LinkItem::Node { id: target, weight }) if weight > 0 => targets.push((target, weight)),
				Some(LinkItem::Node { .. }) => (),
				None => debug!("skipping malformed link '{item}' of {id}"),
			}
		}
		for (target, _) in &targets {
			self.get_or_create_node(*target);
		}

		let node = self.get_or_create_node(id);
		for item in items(fragments) {
			match parse_fragment(item) {
				Some((value, weight)) => {
					node.add_fragment(value, weight);
				}
				None => debug!("skipping malformed fragment '{item}' of {id}"),
			}
		}
		for (target, weight) in targets {
			node.add_link(target, weight);
		}
		let terminating = terminal || node.is_terminating();
		node.set_terminating(terminating);
	}

	/// Exports the graph as transition-table rows.
	///
	/// The first row lists initializers, then one row per node in ascending id
	/// order. Weights are written as deltas of the cumulative keys, so reading
	/// the rows back rebuilds identical keys. Every terminating node carries `O`.
	pub fn to_transition_table(&self) -> Vec<String> {
		let mut rows = Vec::with_capacity(self.len() + 1);
		let initializers: Vec<String> = self
			.nodes()
			.filter(|node| node.is_initializing())
			.map(|node| node.id().to_string())
			.collect();
		rows.push(format!("S ; _ ; {}", initializers.join(" | ")));
		rows.extend(self.nodes().map(node_row));
		rows
	}
}

fn node_row(node: &GraphNode) -> String {
	let fragments: Vec<String> = node
		.fragments()
		.weighted()
		.map(|(fragment, weight)| format!("{fragment}({weight})"))
		.collect();
	let mut links: Vec<String> = node
		.links()
		.weighted()
		.map(|(target, weight)| format!("{target}({weight})"))
		.collect();
	if node.is_terminating() {
		links.push("O".to_owned());
	}
	format!("{} ; {} ; {}", node.id(), fragments.join(" | "), links.join(" | "))
}
