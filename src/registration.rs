//! Per-container storage of resolved values and pending definitions.

#[cfg(feature = "diagnostics")]
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::definition::Definition;
use crate::value::Value;

/// A resolved registry slot.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Value(Value),
    /// The container's own handle, materialized on read
    Itself,
}

/// What a lookup in one container's own storage found.
pub(crate) enum Lookup {
    Value(Value),
    Itself,
    Pending(Arc<Definition>),
    Missing,
}

/// Registry of one container.
///
/// An identifier lives in at most one of `values` and `definitions`.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    values: HashMap<String, Slot>,
    definitions: HashMap<String, Arc<Definition>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id) || self.definitions.contains_key(id)
    }

    pub(crate) fn lookup(&self, id: &str) -> Lookup {
        if let Some(slot) = self.values.get(id) {
            return match slot {
                Slot::Value(value) => Lookup::Value(value.clone()),
                Slot::Itself => Lookup::Itself,
            };
        }
        match self.definitions.get(id) {
            Some(definition) => Lookup::Pending(Arc::clone(definition)),
            None => Lookup::Missing,
        }
    }

    pub(crate) fn insert_value(&mut self, id: String, value: Value) {
        self.definitions.remove(&id);
        self.values.insert(id, Slot::Value(value));
    }

    pub(crate) fn insert_definition(&mut self, id: String, definition: Definition) {
        self.values.remove(&id);
        self.definitions.insert(id, Arc::new(definition));
    }

    pub(crate) fn insert_self(&mut self, id: String) {
        self.definitions.remove(&id);
        self.values.insert(id, Slot::Itself);
    }

    /// Removes `id` from both maps. Returns whether anything was removed.
    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let value = self.values.remove(id).is_some();
        let definition = self.definitions.remove(id).is_some();
        value || definition
    }

    /// Replaces the pending `definition` for `id` with its built slot.
    ///
    /// Does nothing if the definition was replaced or removed while it was
    /// building. Returns whether the slot was stored.
    pub(crate) fn resolve(&mut self, id: &str, definition: &Arc<Definition>, slot: Slot) -> bool {
        match self.definitions.get(id) {
            Some(installed) if Arc::ptr_eq(installed, definition) => {
                self.definitions.remove(id);
                self.values.insert(id.to_string(), slot);
                true
            }
            _ => false,
        }
    }

    /// Persistable values, without the self entry.
    pub(crate) fn snapshot(&self) -> serde_json::Map<String, serde_json::Value> {
        self.values
            .iter()
            .filter_map(|(id, slot)| match slot {
                Slot::Value(value) => value.to_json().map(|json| (id.clone(), json)),
                Slot::Itself => None,
            })
            .collect()
    }

    /// All identifiers, sorted.
    pub(crate) fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.values.keys().chain(self.definitions.keys()).cloned().collect();
        ids.sort();
        ids
    }

    pub(crate) fn is_self(&self, id: &str) -> bool {
        matches!(self.values.get(id), Some(Slot::Itself))
    }

    /// Per-identifier state for debug dumps.
    #[cfg(feature = "diagnostics")]
    pub(crate) fn describe(&self) -> BTreeMap<String, String> {
        let values = self.values.iter().map(|(id, slot)| {
            let state = match slot {
                Slot::Value(value) => format!("resolved {}", value.kind_name()),
                Slot::Itself => "self".to_string(),
            };
            (id.clone(), state)
        });
        let definitions = self.definitions.iter().map(|(id, definition)| {
            let mode = if definition.is_registered() { "registered" } else { "transient" };
            (id.clone(), format!("pending {:?} ({mode})", definition.kind()))
        });
        values.chain(definitions).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_map_per_id() {
        let mut registry = Registry::new();
        registry.insert_definition("a".into(), Definition::value(1, true));
        registry.insert_value("a".into(), Value::from(2));
        assert_eq!(registry.ids(), ["a"]);
        assert!(matches!(registry.lookup("a"), Lookup::Value(v) if v == 2));

        registry.insert_definition("a".into(), Definition::value(3, true));
        assert_eq!(registry.ids(), ["a"]);
        assert!(matches!(registry.lookup("a"), Lookup::Pending(_)));
    }

    #[test]
    fn resolve_requires_the_same_definition() {
        let mut registry = Registry::new();
        registry.insert_definition("a".into(), Definition::value(1, true));
        let Lookup::Pending(first) = registry.lookup("a") else {
            panic!("expected a pending definition");
        };

        registry.insert_definition("a".into(), Definition::value(2, true));
        assert!(!registry.resolve("a", &first, Slot::Value(Value::from(1))));
        assert!(matches!(registry.lookup("a"), Lookup::Pending(_)));

        let Lookup::Pending(second) = registry.lookup("a") else {
            panic!("expected a pending definition");
        };
        assert!(registry.resolve("a", &second, Slot::Value(Value::from(2))));
        assert!(matches!(registry.lookup("a"), Lookup::Value(v) if v == 2));
    }

    #[test]
    fn snapshot_skips_self_and_handles() {
        let mut registry = Registry::new();
        registry.insert_self("container".into());
        assert!(registry.is_self("container"));
        registry.insert_value("port".into(), Value::from(80));
        registry.insert_value("fn".into(), Value::Callable(crate::Callable::new(|_| Ok(Value::Null))));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["port"], serde_json::json!(80));
    }

    #[test]
    fn remove_reports_presence() {
        let mut registry = Registry::new();
        registry.insert_value("a".into(), Value::Null);
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert!(!registry.contains("a"));
    }
}
