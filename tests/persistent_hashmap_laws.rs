//! Property-based tests for PersistentHashMap.
//!
//! This module checks PersistentHashMap against `std::collections::HashMap`
//! as a model, and verifies that old versions survive every update.

use proptest::prelude::*;
use std::collections::HashMap;
use taskdex::persistent::PersistentHashMap;

// =============================================================================
// Strategy for generating test data
// =============================================================================

fn arbitrary_key() -> impl Strategy<Value = String> {
    "[a-z]{1,10}".prop_map(|s| s)
}

fn arbitrary_value() -> impl Strategy<Value = i32> {
    any::<i32>()
}

fn arbitrary_entries() -> impl Strategy<Value = Vec<(String, i32)>> {
    prop::collection::vec((arbitrary_key(), arbitrary_value()), 0..80)
}

#[derive(Debug, Clone)]
enum Operation {
    Insert(String, i32),
    Remove(String),
}

fn arbitrary_operations() -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(
        prop_oneof![
            (arbitrary_key(), arbitrary_value()).prop_map(|(key, value)| Operation::Insert(key, value)),
            arbitrary_key().prop_map(Operation::Remove),
        ],
        0..120,
    )
}

// =============================================================================
// Get-Insert Law: map.insert(k, v).get(&k) == Some(&v)
// =============================================================================

proptest! {
    #[test]
    fn prop_get_insert_law(
        entries in arbitrary_entries(),
        key in arbitrary_key(),
        value in arbitrary_value()
    ) {
        let map: PersistentHashMap<String, i32> = entries.into_iter().collect();
        let inserted = map.insert(key.clone(), value);
        prop_assert_eq!(inserted.get(&key), Some(&value));
    }
}

// =============================================================================
// Get-Remove Law: map.remove(&k).get(&k) == None
// =============================================================================

proptest! {
    #[test]
    fn prop_get_remove_law(entries in arbitrary_entries(), key in arbitrary_key()) {
        let map: PersistentHashMap<String, i32> = entries.into_iter().collect();
        let removed = map.remove(&key);
        prop_assert_eq!(removed.get(&key), None);
        prop_assert_eq!(removed.len(), map.len() - usize::from(map.contains_key(&key)));
    }
}

// =============================================================================
// Absent-Remove Law: removing an absent key returns the same version
// =============================================================================

proptest! {
    #[test]
    fn prop_remove_absent_is_identity_law(entries in arbitrary_entries(), key in arbitrary_key()) {
        let map: PersistentHashMap<String, i32> = entries.into_iter().collect();
        prop_assume!(!map.contains_key(&key));
        prop_assert!(map.remove(&key).ptr_eq(&map));
    }
}

// =============================================================================
// Model Law: any operation sequence agrees with HashMap
// =============================================================================

proptest! {
    #[test]
    fn prop_agrees_with_model(operations in arbitrary_operations()) {
        let mut model: HashMap<String, i32> = HashMap::new();
        let mut map: PersistentHashMap<String, i32> = PersistentHashMap::new();

        for operation in operations {
            match operation {
                Operation::Insert(key, value) => {
                    model.insert(key.clone(), value);
                    map = map.insert(key, value);
                }
                Operation::Remove(key) => {
                    model.remove(&key);
                    map = map.remove(&key);
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        prop_assert_eq!(map.iter().count(), model.len());
        for (key, value) in &model {
            prop_assert_eq!(map.get(key), Some(value));
        }
        for (key, value) in &map {
            prop_assert_eq!(model.get(key), Some(value));
        }
    }
}

// =============================================================================
// Persistence Law: updates never change the source version
// =============================================================================

proptest! {
    #[test]
    fn prop_source_survives_updates(
        entries in arbitrary_entries(),
        operations in arbitrary_operations()
    ) {
        let original: PersistentHashMap<String, i32> = entries.into_iter().collect();
        let snapshot: HashMap<String, i32> =
            original.iter().map(|(key, value)| (key.clone(), *value)).collect();

        let _derived = operations.into_iter().fold(original.clone(), |map, operation| match operation {
            Operation::Insert(key, value) => map.insert(key, value),
            Operation::Remove(key) => map.remove(&key),
        });

        prop_assert_eq!(original.len(), snapshot.len());
        for (key, value) in &snapshot {
            prop_assert_eq!(original.get(key), Some(value));
        }
    }
}
