//! Property-based tests for container registration
//!
//! These tests use proptest to generate random identifiers and values and
//! verify invariants that should hold for every container.

use keyed_di::{value, CacheAdapter, Container, ContainerBuilder, MemoryCache, Value, DEFAULT_CACHE_KEY};
use proptest::prelude::*;
use std::sync::Arc;

fn data_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        "[a-z0-9 ]{0,12}".prop_map(Value::Str),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.]{0,15}"
}

// Property: set followed by delete always leaves the identifier unset
proptest! {
    #[test]
    fn set_then_delete_leaves_nothing(id in identifier(), v in data_value(), as_definition in any::<bool>()) {
        let container = Container::new();
        if as_definition {
            container.set(&id, value(v, true)).unwrap();
        } else {
            container.set(&id, v).unwrap();
        }
        container.delete(&id).unwrap();
        prop_assert!(!container.has(&id).unwrap());
    }
}

// Property: the last value set under an identifier wins
proptest! {
    #[test]
    fn last_set_wins(id in identifier(), values in prop::collection::vec(data_value(), 1..6)) {
        let container = Container::new();
        for v in &values {
            container.set(&id, v.clone()).unwrap();
        }
        prop_assert_eq!(container.get(&id).unwrap(), values.last().cloned().unwrap());
    }
}

// Property: has() agrees with whether get() finds something
proptest! {
    #[test]
    fn has_mirrors_get(present in prop::collection::btree_set(identifier(), 0..6), probe in identifier()) {
        let container = Container::new();
        for id in &present {
            container.set(id, 1).unwrap();
        }
        let has = container.has(&probe).unwrap();
        let found = container.get(&probe);
        prop_assert_eq!(has, found.is_ok());
        if !has {
            prop_assert!(found.unwrap_err().is_not_found());
        }
    }
}

// Property: the cached snapshot always reflects the persistable values
proptest! {
    #[test]
    fn snapshot_tracks_values(
        entries in prop::collection::btree_map(identifier().prop_filter("self id", |id| id != "container"), data_value(), 0..6)
    ) {
        let cache = Arc::new(MemoryCache::new());
        let container = ContainerBuilder::new().cache(cache.clone()).build().unwrap();
        for (id, v) in &entries {
            container.set(id, v.clone()).unwrap();
        }

        let snapshot = cache.get(DEFAULT_CACHE_KEY, serde_json::json!(null)).unwrap();
        let persisted = snapshot.as_object().unwrap();
        prop_assert_eq!(persisted.len(), entries.len());

        let reloaded = ContainerBuilder::new().cache(cache).build().unwrap();
        for (id, v) in &entries {
            prop_assert_eq!(&reloaded.get(id).unwrap(), v);
        }
    }
}
