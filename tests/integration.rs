//! # Integration Tests for Redtree
//!
//! End-to-end tests through the public API: the raw tree, the map and set
//! facades, custom comparators, and the iterator family.

use redtree::compare::{self, Reverse};
use redtree::{GenericTree, OrderedMap, OrderedSet, Tree};

// ===========================================================================
// Tree API Tests
// ===========================================================================

#[test]
fn string_keys_with_borrowed_lookup() {
	let mut tree: Tree<String, u64> = Tree::new();
	for (i, word) in ["pear", "apple", "fig", "banana"].iter().enumerate() {
		tree.insert(word.to_string(), i as u64).unwrap();
	}

	assert_eq!(tree.get("fig"), Some(&2));
	assert_eq!(tree.get_key_value("apple"), Some((&"apple".to_string(), &1)));
	assert!(!tree.contains_key("grape"));
	assert_eq!(tree.first_key_value().map(|(k, _)| k.as_str()), Some("apple"));
	assert_eq!(tree.last_key_value().map(|(k, _)| k.as_str()), Some("pear"));
	tree.assert_invariants();
}

#[test]
fn handle_navigation() {
	let mut tree: Tree<i32, char> = Tree::new();
	for (k, c) in [(3, 'c'), (1, 'a'), (2, 'b')] {
		tree.insert(k, c).unwrap();
	}

	let mut handle = tree.first().unwrap();
	let mut seen = vec![*tree.key_value_at(handle).unwrap().1];
	while let Some(next) = tree.successor(handle) {
		seen.push(*tree.key_value_at(next).unwrap().1);
		handle = next;
	}
	assert_eq!(seen, ['a', 'b', 'c']);
	assert_eq!(Some(handle), tree.last());
	assert_eq!(tree.successor(handle), None);
	assert_eq!(tree.predecessor(tree.first().unwrap()), None);

	*tree.value_at_mut(handle).unwrap() = 'z';
	assert_eq!(tree.get(&3), Some(&'z'));
}

#[test]
fn cursor_from_lower_bound_scans_forward() {
	let mut tree: Tree<i32, ()> = Tree::new();
	for k in (0..100).step_by(10) {
		tree.insert(k, ()).unwrap();
	}

	let mut cursor = tree.lower_bound(&35);
	let mut found = Vec::new();
	while let Some(k) = cursor.key() {
		found.push(*k);
		cursor.move_next();
	}
	assert_eq!(found, [40, 50, 60, 70, 80, 90]);
	assert_eq!(cursor, tree.end());
}

#[test]
fn raw_iter_reverse_scan() {
	let mut tree: Tree<i32, i32> = Tree::new();
	for k in 0..20 {
		tree.insert(k, k * k).unwrap();
	}

	let mut iter = tree.raw_iter();
	iter.seek_for_prev(&12);
	let mut found = Vec::new();
	while let Some((k, _)) = iter.prev() {
		found.push(*k);
		if found.len() == 3 {
			break;
		}
	}
	assert_eq!(found, [12, 11, 10]);
}

#[test]
fn raw_iter_mut_drains_matching_prefix() {
	let mut tree: Tree<String, u32> = Tree::new();
	for key in ["user:1", "user:2", "user:3", "video:1", "video:2"] {
		tree.insert(key.to_string(), 0).unwrap();
	}

	let mut iter = tree.raw_iter_mut();
	iter.seek("user:");
	let mut doomed = Vec::new();
	while let Some((k, _)) = iter.next() {
		if !k.starts_with("user:") {
			break;
		}
		doomed.push(k.clone());
	}
	for key in &doomed {
		iter.remove(key.as_str());
	}
	drop(iter);

	tree.assert_invariants();
	let keys: Vec<&str> = tree.iter().map(|(k, _)| k.as_str()).collect();
	assert_eq!(keys, ["video:1", "video:2"]);
}

#[test]
fn into_iter_by_value_and_by_reference() {
	let mut tree: Tree<i32, String> = Tree::new();
	for k in [2, 1, 3] {
		tree.insert(k, k.to_string()).unwrap();
	}

	let mut total = 0;
	for (k, _) in &tree {
		total += k;
	}
	assert_eq!(total, 6);

	let owned: Vec<String> = tree.into_iter().map(|(_, v)| v).collect();
	assert_eq!(owned, ["1", "2", "3"]);
}

#[test]
fn into_iter_from_both_ends() {
	let mut tree: Tree<i32, i32> = Tree::new();
	for k in 0..5 {
		tree.insert(k, k).unwrap();
	}
	let mut iter = tree.into_iter();
	assert_eq!(iter.len(), 5);
	assert_eq!(iter.next_back(), Some((4, 4)));
	assert_eq!(iter.next(), Some((0, 0)));
	assert_eq!(iter.len(), 3);
}

// ===========================================================================
// Comparator Tests
// ===========================================================================

#[test]
fn reverse_tree_bounds() {
	let mut tree: GenericTree<i32, (), Reverse> = GenericTree::with_comparator(Reverse);
	for k in [1, 5, 3, 9, 7] {
		tree.insert(k, ()).unwrap();
	}
	tree.assert_invariants();

	// Under reverse order "not before 6" means 6 or smaller.
	assert_eq!(tree.lower_bound(&6).key(), Some(&5));
	assert_eq!(tree.upper_bound(&5).key(), Some(&3));
	let keys: Vec<i32> = tree.range(8..=2).map(|(k, _)| *k).collect();
	assert_eq!(keys, [7, 5, 3]);
}

#[test]
fn closure_comparator_by_length() {
	let by_len = compare::from_fn(|a: &&str, b: &&str| a.len() < b.len());
	let mut tree: GenericTree<&str, (), _> = GenericTree::with_comparator(by_len);

	assert!(tree.insert("ccc", ()).unwrap().1);
	assert!(tree.insert("a", ()).unwrap().1);
	assert!(tree.insert("bb", ()).unwrap().1);
	// Same length means the same key.
	assert!(!tree.insert("zz", ()).unwrap().1);

	tree.assert_invariants();
	let keys: Vec<&str> = tree.iter().map(|(k, _)| *k).collect();
	assert_eq!(keys, ["a", "bb", "ccc"]);
	assert!(tree.contains_key(&"xy"));
}

#[test]
fn projection_comparator_orders_records() {
	#[derive(Debug, Clone, PartialEq)]
	struct Job {
		priority: u8,
		name: &'static str,
	}

	let by_priority = compare::by_key(|job: &Job| job.priority);
	let mut queue: OrderedSet<Job, _> = OrderedSet::with_comparator(by_priority);
	queue
		.insert(Job {
			priority: 3,
			name: "deploy",
		})
		.unwrap();
	queue
		.insert(Job {
			priority: 1,
			name: "lint",
		})
		.unwrap();
	queue
		.insert(Job {
			priority: 2,
			name: "test",
		})
		.unwrap();

	let names: Vec<&str> = queue.iter().map(|job| job.name).collect();
	assert_eq!(names, ["lint", "test", "deploy"]);
	assert_eq!(queue.pop_first().map(|job| job.name), Some("lint"));
}

// ===========================================================================
// OrderedMap Tests
// ===========================================================================

#[test]
fn map_insert_does_not_overwrite() {
	let mut map = OrderedMap::new();
	assert!(map.insert("k", 1).unwrap().1);
	assert!(!map.insert("k", 2).unwrap().1);
	assert_eq!(map["k"], 1);

	*map.get_mut("k").unwrap() = 2;
	assert_eq!(map.get("k"), Some(&2));
}

#[test]
fn map_get_or_insert_with_counts_words() {
	let text = "the quick brown fox jumps over the lazy dog the end";
	let mut counts: OrderedMap<&str, usize> = OrderedMap::new();
	for word in text.split_whitespace() {
		*counts.get_or_insert_with(word, || 0).unwrap() += 1;
	}

	assert_eq!(counts.get("the"), Some(&3));
	assert_eq!(counts.get("fox"), Some(&1));
	assert_eq!(counts.len(), 9);
	assert_eq!(counts.keys().next(), Some(&"brown"));
	counts.as_tree().assert_invariants();
}

#[test]
fn map_remove_range_and_retain() {
	let mut map: OrderedMap<i32, i32> = (0..50).map(|k| (k, k * 2)).collect();

	assert_eq!(map.remove_range(10..20), 10);
	map.retain(|k, _| k % 2 == 0);

	let keys: Vec<i32> = map.keys().copied().collect();
	let expected: Vec<i32> = (0..10).chain(20..50).filter(|k| k % 2 == 0).collect();
	assert_eq!(keys, expected);
	map.as_tree().assert_invariants();
}

#[test]
fn map_equal_range_and_count() {
	let map = OrderedMap::from([(1, "a"), (3, "c"), (5, "e")]);

	assert_eq!(map.count(&3), 1);
	assert_eq!(map.count(&4), 0);

	let (lo, hi) = map.equal_range(&3);
	assert_eq!(lo.key_value(), Some((&3, &"c")));
	assert_eq!(hi.key_value(), Some((&5, &"e")));

	let (lo, hi) = map.equal_range(&4);
	assert_eq!(lo, hi);
}

#[test]
fn map_comparisons_are_lexicographic() {
	let a = OrderedMap::from([(1, 1), (2, 2)]);
	let b = OrderedMap::from([(1, 1), (2, 3)]);
	let c = OrderedMap::from([(1, 1)]);

	assert!(a < b);
	assert!(c < a);
	assert_eq!(a, a.clone());
	assert_ne!(a, b);
	assert_eq!(format!("{:?}", c), "{1: 1}");
}

#[test]
fn map_extend_keeps_existing_values() {
	let mut map = OrderedMap::from([(1, "one")]);
	map.extend([(1, "uno"), (2, "dos")]);
	assert_eq!(map[&1], "one");
	assert_eq!(map[&2], "dos");
}

#[test]
#[should_panic(expected = "key not found")]
fn map_index_missing_panics() {
	let map: OrderedMap<i32, i32> = OrderedMap::new();
	let _ = map[&1];
}

#[test]
fn map_into_tree_round_trip() {
	let map = OrderedMap::from([(2, 'b'), (1, 'a')]);
	let tree = map.into_tree();
	assert_eq!(tree.len(), 2);
	assert_eq!(tree.first_key_value(), Some((&1, &'a')));
}

#[test]
fn map_remove_at_handle() {
	let mut map: OrderedMap<i32, String> = (1..=8).map(|k| (k, k.to_string())).collect();
	let three = map.find(&3).unwrap();
	let seven = map.find(&7).unwrap();

	assert_eq!(map.remove_at(three), Some((3, "3".to_string())));
	assert_eq!(map.remove_at(three), None);
	assert_eq!(map.key_value_at(three), None);
	assert_eq!(map.value_at_mut(three), None);

	let (nine, inserted) = map.insert(9, "9".to_string()).unwrap();
	assert!(inserted);
	map.value_at_mut(nine).unwrap().push('!');
	assert_eq!(map.key_value_at(nine), Some((&9, &"9!".to_string())));
	assert_eq!(map.remove_at(nine), Some((9, "9!".to_string())));

	// Handles to surviving entries are unaffected.
	assert_eq!(map.key_value_at(seven), Some((&7, &"7".to_string())));
	assert_eq!(map.len(), 7);
	assert!(!map.contains_key(&3));
	map.as_tree().assert_invariants();
}

// ===========================================================================
// OrderedSet Tests
// ===========================================================================

#[test]
fn set_basics() {
	let mut set = OrderedSet::from([5, 1, 4, 1, 3]);
	assert_eq!(set.len(), 4);
	assert!(set.contains(&4));
	assert!(!set.insert(5).unwrap());
	assert!(set.remove(&4));
	assert!(!set.remove(&4));
	assert_eq!(set.take(&3), Some(3));
	assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 5]);
	set.as_tree().assert_invariants();
}

#[test]
fn set_ranges_and_bounds() {
	let set: OrderedSet<i32> = (0..20).map(|k| k * 5).collect();
	let mid: Vec<i32> = set.range(12..=40).copied().collect();
	assert_eq!(mid, [15, 20, 25, 30, 35, 40]);

	assert_eq!(set.lower_bound(&12).key(), Some(&15));
	assert_eq!(set.upper_bound(&15).key(), Some(&20));
	assert!(set.upper_bound(&95).is_end());
	assert_eq!(set.first(), Some(&0));
	assert_eq!(set.last(), Some(&95));
}

#[test]
fn set_reverse_comparator_and_eq() {
	let mut desc: OrderedSet<i32, Reverse> = OrderedSet::with_comparator(Reverse);
	desc.extend([1, 3, 2]);
	assert_eq!(desc.iter().copied().collect::<Vec<_>>(), [3, 2, 1]);
	assert_eq!(desc.pop_last(), Some(1));

	let a = OrderedSet::from(["x", "y"]);
	let b: OrderedSet<&str> = ["y", "x"].into_iter().collect();
	assert_eq!(a, b);
	assert_eq!(format!("{:?}", a), r#"{"x", "y"}"#);
}

#[test]
fn set_into_iter_and_retain() {
	let mut set: OrderedSet<u32> = (1..=10).collect();
	set.retain(|v| v % 3 != 0);
	set.remove_range(..3);
	let rest: Vec<u32> = set.into_iter().collect();
	assert_eq!(rest, [4, 5, 7, 8, 10]);
}

#[test]
fn set_remove_at_handle() {
	let mut set: OrderedSet<i32> = (0..10).collect();
	let (handle, inserted) = set.insert_handle(42).unwrap();
	assert!(inserted);
	let four = set.find(&4).unwrap();

	assert_eq!(set.get_at(handle), Some(&42));
	assert_eq!(set.remove_at(handle), Some(42));
	assert_eq!(set.remove_at(handle), None);
	assert_eq!(set.get_at(handle), None);

	assert_eq!(set.remove_at(four), Some(4));
	assert!(!set.contains(&4));
	assert_eq!(set.len(), 9);
	set.as_tree().assert_invariants();
}
