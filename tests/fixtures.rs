//! # Fixture-Based Tests for the Redtree Red-Black Tree
//!
//! This module loads exact tree shapes, colors included, from the JSON files
//! in `tests/fixtures/` and checks how the tree behaves from those starting
//! points. Some fixtures are deliberately broken; those tests check that the
//! invariant checker rejects them with the right diagnostic.

use redtree::util::sample_tree;
use redtree::{Color, Tree};

fn fixture(name: &str) -> Tree<String, u64> {
	sample_tree(format!("{}/tests/fixtures/{}.json", env!("CARGO_MANIFEST_DIR"), name))
}

fn keys(tree: &Tree<String, u64>) -> Vec<&str> {
	tree.iter().map(|(k, _)| k.as_str()).collect()
}

fn color_of(tree: &Tree<String, u64>, key: &str) -> Color {
	tree.color_at(tree.find(key).expect("key present")).expect("live handle")
}

// ===========================================================================
// sample.json
// ===========================================================================

/// sample.json holds eight keys in a tree of height 4:
/// - Black root "0005"
/// - Black "0002" with red leaves "0001" and "0003"
/// - Red "0008" with black "0007" and black "0010", which has red "0012"
#[test]
fn sample_tree_is_valid() {
	let tree = fixture("sample");
	tree.assert_invariants();

	assert_eq!(tree.len(), 8);
	assert_eq!(tree.height(), 4);
	assert_eq!(tree.black_height(), 2);
	assert_eq!(keys(&tree), ["0001", "0002", "0003", "0005", "0007", "0008", "0010", "0012"]);
}

#[test]
fn sample_tree_lookup() {
	let tree = fixture("sample");

	assert_eq!(tree.get("0002"), Some(&2));
	assert_eq!(tree.get("0008"), Some(&8));
	assert_eq!(tree.get("0012"), Some(&12));

	assert_eq!(tree.get("0004"), None);
	assert_eq!(tree.get("0013"), None);
}

#[test]
fn sample_tree_iteration() {
	let tree = fixture("sample");

	let mut iter = tree.raw_iter();
	iter.seek("0004");
	assert_eq!(iter.next().map(|(k, v)| (k.as_str(), *v)), Some(("0005", 5)));
	assert_eq!(iter.next().map(|(k, v)| (k.as_str(), *v)), Some(("0007", 7)));

	iter.seek_for_prev("0004");
	assert_eq!(iter.prev().map(|(k, _)| k.as_str()), Some("0003"));

	let reversed: Vec<&str> = tree.iter().rev().map(|(k, _)| k.as_str()).collect();
	assert_eq!(reversed, ["0012", "0010", "0008", "0007", "0005", "0003", "0002", "0001"]);
}

#[test]
fn sample_tree_insert_under_black_parent() {
	let mut tree = fixture("sample");

	// "0006" hangs red under black "0007": no fixup needed.
	assert!(tree.insert("0006".to_string(), 6).unwrap().1);
	tree.assert_invariants();
	assert_eq!(color_of(&tree, "0006"), Color::Red);
	assert_eq!(color_of(&tree, "0007"), Color::Black);
	assert_eq!(tree.height(), 4);
}

#[test]
fn sample_tree_insert_with_red_uncle() {
	let mut tree = fixture("sample");

	// "0004" lands under red "0003" whose sibling "0001" is red too.
	assert!(tree.insert("0004".to_string(), 4).unwrap().1);
	tree.assert_invariants();
	assert_eq!(color_of(&tree, "0001"), Color::Black);
	assert_eq!(color_of(&tree, "0003"), Color::Black);
	assert_eq!(color_of(&tree, "0004"), Color::Red);
}

#[test]
fn sample_tree_insert_with_black_uncle() {
	let mut tree = fixture("sample");

	// "0013" lands under red "0012" whose uncle position is empty.
	assert!(tree.insert("0013".to_string(), 13).unwrap().1);
	tree.assert_invariants();
	assert_eq!(color_of(&tree, "0012"), Color::Black);
	assert_eq!(color_of(&tree, "0010"), Color::Red);
	assert_eq!(color_of(&tree, "0013"), Color::Red);
}

#[test]
fn sample_tree_remove_each_key() {
	let original = fixture("sample");
	let all: Vec<String> = original.iter().map(|(k, _)| k.clone()).collect();

	for key in &all {
		let mut tree = fixture("sample");
		assert!(tree.remove(key.as_str()).is_some(), "removing {}", key);
		tree.assert_invariants();
		assert_eq!(tree.len(), 7);
		assert!(!tree.contains_key(key.as_str()));
	}
}

#[test]
fn sample_tree_remove_red_internal_node() {
	let mut tree = fixture("sample");

	// "0008" has two children; its successor "0010" takes its place and color.
	let successor = tree.find("0010").unwrap();
	assert_eq!(tree.remove("0008"), Some(8));
	tree.assert_invariants();

	assert_eq!(tree.key_value_at(successor).map(|(k, _)| k.as_str()), Some("0010"));
	assert_eq!(tree.color_at(successor), Some(Color::Red));
}

#[test]
fn sample_tree_clone_keeps_colors() {
	let tree = fixture("sample");
	let copy = tree.clone();
	copy.assert_invariants();

	for (key, _) in &tree {
		assert_eq!(color_of(&copy, key), color_of(&tree, key), "color of {}", key);
	}
}

// ===========================================================================
// all_black.json
// ===========================================================================

#[test]
fn all_black_remove_leaf_propagates_to_root() {
	let mut tree = fixture("all_black");
	tree.assert_invariants();
	assert_eq!(tree.black_height(), 3);

	// No red node anywhere: the deficit climbs to the root and the tree
	// loses one level of black height.
	assert_eq!(tree.remove("0001"), Some(1));
	tree.assert_invariants();
	assert_eq!(tree.black_height(), 2);
	assert_eq!(color_of(&tree, "0006"), Color::Red);
	assert_eq!(color_of(&tree, "0003"), Color::Red);
}

#[test]
fn all_black_drain_in_order() {
	let mut tree = fixture("all_black");
	while let Some((key, _)) = tree.pop_first() {
		assert!(!tree.contains_key(key.as_str()));
		tree.assert_invariants();
	}
	assert!(tree.is_empty());
}

// ===========================================================================
// Broken Fixtures
// ===========================================================================

#[test]
#[should_panic(expected = "has a red child")]
fn red_red_is_rejected() {
	fixture("red_red").assert_invariants();
}

#[test]
#[should_panic(expected = "Black height mismatch")]
fn black_height_mismatch_is_rejected() {
	fixture("black_height_mismatch").assert_invariants();
}

#[test]
#[should_panic(expected = "is red")]
fn red_root_is_rejected() {
	fixture("red_root").assert_invariants();
}

#[test]
#[should_panic(expected = "not less than ancestor bound")]
fn misordered_keys_are_rejected() {
	fixture("misordered").assert_invariants();
}
