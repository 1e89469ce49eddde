//! Test utilities for loading sample trees from JSON fixtures
//!
//! A fixture spells out a tree node by node, colors included, so tests can
//! start from an exact shape instead of whatever an insertion order produces.
//! The loader links nodes as written and does not rebalance or validate;
//! call [`GenericTree::assert_invariants`](crate::GenericTree::assert_invariants)
//! on the result when the fixture is meant to be valid.
//!
//! ```json
//! {
//!   "root": {
//!     "key": "0005", "value": 5, "color": "black",
//!     "left":  { "key": "0003", "value": 3, "color": "red" },
//!     "right": { "key": "0008", "value": 8, "color": "red" }
//!   }
//! }
//! ```
use std::path::Path;

use serde::Deserialize;

use crate::node::{Link, NodeId, Side};
use crate::{Color, Tree};

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum FixtureColor {
	Red,
	Black,
}

impl From<FixtureColor> for Color {
	fn from(color: FixtureColor) -> Self {
		match color {
			FixtureColor::Red => Color::Red,
			FixtureColor::Black => Color::Black,
		}
	}
}

#[derive(Deserialize, Debug)]
struct TreeNode {
	key: String,
	value: u64,
	color: FixtureColor,
	#[serde(default)]
	left: Option<Box<TreeNode>>,
	#[serde(default)]
	right: Option<Box<TreeNode>>,
}

#[derive(Deserialize, Debug)]
struct SampleTree {
	root: Option<TreeNode>,
}

fn translate_node(tree: &mut Tree<String, u64>, tree_node: TreeNode, parent: Link) -> NodeId {
	let TreeNode {
		key,
		value,
		color,
		left,
		right,
	} = tree_node;

	let id = tree.allocate_node(key, value, parent).expect("fixture node allocation failed");
	tree.arena.set_color(id, color.into());
	tree.len += 1;

	for (side, child) in [(Side::Left, left), (Side::Right, right)] {
		if let Some(child) = child {
			let child_id = translate_node(tree, *child, Some(id));
			tree.arena.set_child(id, side, Some(child_id));
		}
	}
	id
}

/// Builds a tree from a JSON fixture string.
pub fn tree_from_json(json: &str) -> Tree<String, u64> {
	let json_tree: SampleTree = serde_json::from_str(json).expect("invalid fixture json");
	let mut tree = Tree::new();
	if let Some(root) = json_tree.root {
		let root = translate_node(&mut tree, root, None);
		tree.root = Some(root);
	}
	tree
}

/// Builds a tree from a JSON fixture file.
pub fn sample_tree<P: AsRef<Path>>(path: P) -> Tree<String, u64> {
	let json = std::fs::read_to_string(path).expect("failed to find file");
	tree_from_json(&json)
}
