//! Unit tests for UniqueMap.

use multitree::{TreeError, UniqueMap};
use rstest::{fixture, rstest};

#[fixture]
fn fruits() -> UniqueMap<&'static str, u32> {
    [("pear", 3), ("apple", 5), ("quince", 1), ("fig", 8)]
        .into_iter()
        .collect()
}

// =============================================================================
// Insert Tests
// =============================================================================

#[rstest]
fn test_insert_existing_key_overwrites_value() {
    let mut map = UniqueMap::new();
    assert_eq!(map.insert(3, "x"), None);
    assert_eq!(map.insert(3, "y"), Some("x"));

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&3), Some(&"y"));
    assert_eq!(map.value_of(&3), Ok(&"y"));
}

#[rstest]
fn test_insert_keeps_keys_sorted(fruits: UniqueMap<&'static str, u32>) {
    let keys: Vec<&str> = fruits.keys().copied().collect();
    assert_eq!(keys, vec!["apple", "fig", "pear", "quince"]);
    assert!(fruits.as_tree().is_well_formed());
}

#[rstest]
fn test_overwrite_keeps_entry_position(mut fruits: UniqueMap<&'static str, u32>) {
    let position = fruits.find("fig");
    fruits.insert("fig", 80);
    assert_eq!(fruits.find("fig"), position);
    assert_eq!(fruits.entry(position), Ok((&"fig", &80)));
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[rstest]
#[case("apple", Ok(&5))]
#[case("quince", Ok(&1))]
#[case("banana", Err(TreeError::NotFound))]
fn test_value_of(
    fruits: UniqueMap<&'static str, u32>,
    #[case] key: &str,
    #[case] expected: Result<&u32, TreeError>,
) {
    assert_eq!(fruits.value_of(key), expected);
}

#[rstest]
fn test_value_of_does_not_insert(fruits: UniqueMap<&'static str, u32>) {
    let _ = fruits.value_of("banana");
    assert_eq!(fruits.len(), 4);
    assert!(!fruits.contains_key("banana"));
}

#[rstest]
fn test_get_or_insert_default_inserts_once() {
    let mut counts: UniqueMap<String, usize> = UniqueMap::new();
    for word in "the cat saw the other cat and the dog".split_whitespace() {
        *counts.get_or_insert_default(word.to_string()) += 1;
    }

    assert_eq!(counts.len(), 6);
    assert_eq!(counts.get("the"), Some(&3));
    assert_eq!(counts.get("cat"), Some(&2));
    assert_eq!(counts.get("dog"), Some(&1));
}

#[rstest]
fn test_get_mut_updates_in_place(mut fruits: UniqueMap<&'static str, u32>) {
    if let Some(count) = fruits.get_mut("pear") {
        *count += 10;
    }
    assert_eq!(fruits.get("pear"), Some(&13));
}

// =============================================================================
// Erase Tests
// =============================================================================

#[rstest]
fn test_erase_returns_value(mut fruits: UniqueMap<&'static str, u32>) {
    assert_eq!(fruits.erase("pear"), Ok(3));
    assert_eq!(fruits.erase("pear"), Err(TreeError::NotFound));
    assert_eq!(fruits.len(), 3);
    assert!(fruits.as_tree().is_well_formed());
}

#[rstest]
fn test_erase_then_reinsert(mut fruits: UniqueMap<&'static str, u32>) {
    fruits.erase("apple").unwrap();
    assert_eq!(fruits.insert("apple", 7), None);
    assert_eq!(fruits.get("apple"), Some(&7));
}

// =============================================================================
// Traversal Tests
// =============================================================================

#[rstest]
fn test_position_walk(fruits: UniqueMap<&'static str, u32>) {
    let mut position = fruits.begin();
    let mut walked = Vec::new();
    while position != fruits.end() {
        let (key, value) = fruits.entry(position).unwrap();
        walked.push((*key, *value));
        position = fruits.next_position(position).unwrap();
    }
    assert_eq!(
        walked,
        vec![("apple", 5), ("fig", 8), ("pear", 3), ("quince", 1)]
    );
}

#[rstest]
fn test_cursor_moves_both_ways(fruits: UniqueMap<&'static str, u32>) {
    let mut cursor = fruits.cursor(fruits.find("fig"));
    cursor.move_next().unwrap();
    assert_eq!(cursor.key(), Ok(&"pear"));
    cursor.move_prev().unwrap();
    cursor.move_prev().unwrap();
    assert_eq!(cursor.key(), Ok(&"apple"));
}

#[rstest]
fn test_iter_mut_updates_values(mut fruits: UniqueMap<&'static str, u32>) {
    for (_, value) in fruits.iter_mut() {
        *value *= 2;
    }
    let values: Vec<u32> = fruits.values().copied().collect();
    assert_eq!(values, vec![10, 16, 6, 2]);
}

#[rstest]
fn test_clone_is_independent(fruits: UniqueMap<&'static str, u32>) {
    let mut copy = fruits.clone();
    copy.insert("apple", 0);
    copy.erase("fig").unwrap();

    assert_eq!(fruits.get("apple"), Some(&5));
    assert!(fruits.contains_key("fig"));
    assert_ne!(copy, fruits);
}

#[rstest]
fn test_clear_then_reuse(mut fruits: UniqueMap<&'static str, u32>) {
    fruits.clear();
    assert!(fruits.is_empty());
    fruits.insert("kiwi", 2);
    assert_eq!(format!("{fruits}"), "{kiwi: 2}");
}
