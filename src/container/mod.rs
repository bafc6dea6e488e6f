//! The container: lookups, lazy builds and cache mirroring.
//!
//! A [`Container`] resolves identifiers from its own registry first. Pending
//! definitions are built on demand, resolving their references through the
//! container's delegate (or the container itself when it has none).
//! Containers with children form a composite: identifiers the container does
//! not know are looked up in its children, in order.

mod composite;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::RwLock;

use crate::cache::CacheAdapter;
use crate::definition::{Definition, Entity};
use crate::entry::check_id;
use crate::error::{DiError, DiResult};
use crate::internal::with_circular_catch;
use crate::observer::Observers;
use crate::registration::{Lookup, Registry, Slot};
use crate::traits::Resolver;
use crate::value::Value;

/// Identifier under which a container registers itself unless configured
/// otherwise.
pub const DEFAULT_SELF_ID: &str = "container";

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// String-keyed dependency injection container.
///
/// `Container` is a cheap handle: clones share the same registry, and
/// [`ptr_eq`](Container::ptr_eq) tells handles of the same container apart
/// from handles of different ones.
///
/// # Examples
///
/// ```
/// use keyed_di::{entry, object_of, BoxError, Construct, Container, Instance, Value};
///
/// struct Database {
///     dsn: String,
/// }
///
/// impl Instance for Database {}
///
/// impl Construct for Database {
///     fn construct(args: Vec<Value>) -> Result<Self, BoxError> {
///         let dsn = args.first().and_then(Value::as_str).ok_or("dsn expected")?;
///         Ok(Database { dsn: dsn.to_string() })
///     }
/// }
///
/// let container = Container::new();
/// container.set("dsn", "postgres://localhost/app").unwrap();
/// container.set("db", object_of::<Database>(vec![entry("dsn").into()], true)).unwrap();
///
/// let first = container.get("db").unwrap();
/// let second = container.get("db").unwrap();
/// assert_eq!(first, second); // registered: built once
///
/// let dsn = first.as_object().unwrap().with(|db: &Database| db.dsn.clone());
/// assert_eq!(dsn.as_deref(), Some("postgres://localhost/app"));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    uid: u64,
    self_id: RwLock<String>,
    registry: RwLock<Registry>,
    children: RwLock<Vec<Container>>,
    delegate: RwLock<Option<Weak<ContainerInner>>>,
    cache: Option<CacheBinding>,
    observers: Observers,
}

/// A cache adapter and the key the snapshot is stored under.
pub(crate) struct CacheBinding {
    pub(crate) adapter: Arc<dyn CacheAdapter>,
    pub(crate) key: String,
}

impl Container {
    /// Creates an empty container with the default self identifier, no
    /// cache and no observers.
    pub fn new() -> Self {
        Self::bare(DEFAULT_SELF_ID.to_string(), None, Observers::new())
    }

    /// Container holding only its self entry.
    pub(crate) fn bare(self_id: String, cache: Option<CacheBinding>, observers: Observers) -> Self {
        let mut registry = Registry::new();
        registry.insert_self(self_id.clone());
        Self {
            inner: Arc::new(ContainerInner {
                uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
                self_id: RwLock::new(self_id),
                registry: RwLock::new(registry),
                children: RwLock::new(Vec::new()),
                delegate: RwLock::new(None),
                cache,
                observers,
            }),
        }
    }

    pub(crate) fn uid(&self) -> u64 {
        self.inner.uid
    }

    /// Returns the value for `id`.
    ///
    /// The container's own entries always win. Otherwise the first child that
    /// has `id` answers, using its own lookup rules.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `id` is empty
    /// * `NotFound` - neither this container nor any child has `id`
    /// * `Runtime` - the definition registered under `id` failed to build;
    ///   the cause is kept as the error source
    /// * `Circular` / `DepthExceeded` - the build re-entered itself
    pub fn get(&self, id: &str) -> DiResult<Value> {
        check_id(id)?;
        tracing::trace!(container = self.uid(), id, "get");

        if self.inner.registry.read().contains(id) {
            return self.self_get(id);
        }
        for child in self.children() {
            if child.has(id)? {
                return child.get(id);
            }
        }
        Err(DiError::not_found(id))
    }

    /// Whether `get(id)` would find an entry. Never builds anything.
    pub fn has(&self, id: &str) -> DiResult<bool> {
        check_id(id)?;
        if self.inner.registry.read().contains(id) {
            return Ok(true);
        }
        for child in self.children() {
            if child.has(id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Stores a value or a definition under `id`, replacing whatever was
    /// there.
    ///
    /// ```
    /// use keyed_di::{value, Container};
    ///
    /// let container = Container::new();
    /// container.set("name", "app")?.set("lazy", value(1, false))?;
    /// assert!(container.has("lazy")?);
    /// # Ok::<(), keyed_di::DiError>(())
    /// ```
    pub fn set(&self, id: &str, entity: impl Into<Entity>) -> DiResult<&Self> {
        check_id(id)?;
        self.insert_entity(id, entity.into());
        self.sync_cache();
        Ok(self)
    }

    /// Removes `id` from this container. Deleting a missing id is not an
    /// error.
    pub fn delete(&self, id: &str) -> DiResult<&Self> {
        check_id(id)?;
        let removed = self.inner.registry.write().remove(id);
        if removed {
            tracing::debug!(container = self.uid(), id, "entry deleted");
        }
        self.sync_cache();
        Ok(self)
    }

    /// Identifier under which the container resolves to itself.
    pub fn self_id(&self) -> String {
        self.inner.self_id.read().clone()
    }

    /// Moves the self entry to `id`.
    ///
    /// ```
    /// use keyed_di::Container;
    ///
    /// let container = Container::new();
    /// container.set_self_id("di")?;
    /// assert!(!container.has("container")?);
    /// assert!(container.get("di")?.as_container().unwrap().ptr_eq(&container));
    /// # Ok::<(), keyed_di::DiError>(())
    /// ```
    pub fn set_self_id(&self, id: &str) -> DiResult<&Self> {
        check_id(id)?;
        {
            let mut self_id = self.inner.self_id.write();
            let mut registry = self.inner.registry.write();
            if registry.is_self(&self_id) {
                registry.remove(&self_id);
            }
            registry.insert_self(id.to_string());
            *self_id = id.to_string();
        }
        self.sync_cache();
        Ok(self)
    }

    /// Removes the persisted snapshot from the cache.
    ///
    /// Returns `Ok(false)` when the container has no cache.
    ///
    /// # Errors
    ///
    /// `Runtime` if the adapter reports that the delete failed.
    pub fn clear_cache(&self) -> DiResult<bool> {
        let Some(cache) = &self.inner.cache else {
            return Ok(false);
        };
        if !cache.adapter.delete(&cache.key) {
            return Err(DiError::runtime(
                "clearing the container cache",
                format!("cache adapter could not delete `{}`", cache.key),
            ));
        }
        tracing::debug!(container = self.uid(), key = %cache.key, "cache cleared");
        Ok(true)
    }

    /// Key the snapshot is stored under, if the container has a cache.
    pub fn cache_key(&self) -> Option<&str> {
        self.inner.cache.as_ref().map(|cache| cache.key.as_str())
    }

    /// Identifiers of this container's own entries, sorted. Children are not
    /// included.
    pub fn ids(&self) -> Vec<String> {
        self.inner.registry.read().ids()
    }

    /// Whether both handles refer to the same container.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Human-readable dump of the container's state.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(out, "Container #{} (self id `{}`)", self.uid(), self.self_id());
        match self.delegate() {
            Some(delegate) => {
                let _ = writeln!(out, "  delegate: #{}", delegate.uid());
            }
            None => out.push_str("  delegate: self\n"),
        }
        let children: Vec<String> = self.children().iter().map(|c| format!("#{}", c.uid())).collect();
        let _ = writeln!(out, "  children: [{}]", children.join(", "));
        if let Some(key) = self.cache_key() {
            let _ = writeln!(out, "  cache key: {key}");
        }
        out.push_str("  entries:\n");
        for (id, state) in self.inner.registry.read().describe() {
            let _ = writeln!(out, "    {id}: {state}");
        }
        out
    }

    pub(crate) fn insert_entity(&self, id: &str, entity: Entity) {
        let mut registry = self.inner.registry.write();
        match entity {
            Entity::Value(value) => {
                tracing::debug!(container = self.uid(), id, kind = %value.kind_name(), "value set");
                registry.insert_value(id.to_string(), value);
            }
            Entity::Definition(definition) => {
                tracing::debug!(container = self.uid(), id, kind = ?definition.kind(), "definition set");
                registry.insert_definition(id.to_string(), definition);
            }
        }
    }

    /// Looks `id` up in this container only, building it if it is pending.
    fn self_get(&self, id: &str) -> DiResult<Value> {
        let lookup = self.inner.registry.read().lookup(id);
        match lookup {
            Lookup::Value(value) => Ok(value),
            Lookup::Itself => Ok(Value::Container(self.clone())),
            Lookup::Pending(definition) => self.build(id, definition),
            Lookup::Missing => Err(DiError::not_found(id)),
        }
    }

    fn build(&self, id: &str, definition: Arc<Definition>) -> DiResult<Value> {
        let resolver = self.delegate().unwrap_or_else(|| self.clone());
        let observers = &self.inner.observers;
        if observers.has_observers() {
            observers.resolving(id);
        }
        tracing::debug!(container = self.uid(), id, kind = ?definition.kind(), "building definition");

        let started = Instant::now();
        match with_circular_catch(self.uid(), id, || definition.build(&resolver)) {
            Ok(value) => {
                if observers.has_observers() {
                    observers.resolved(id, started.elapsed());
                }
                if definition.is_registered() {
                    self.store_built(id, &definition, value.clone());
                }
                Ok(value)
            }
            Err(err) => {
                if observers.has_observers() {
                    observers.build_failed(id, &err);
                }
                if err.is_chain_error() {
                    return Err(err);
                }
                Err(DiError::runtime(format!("error resolving `{id}`"), err))
            }
        }
    }

    fn store_built(&self, id: &str, definition: &Arc<Definition>, value: Value) {
        // A registry never holds a strong handle to a container
        let slot = match value {
            Value::Container(handle) if handle.ptr_eq(self) => Slot::Itself,
            Value::Container(_) => {
                tracing::debug!(container = self.uid(), id, "container handle not cached");
                return;
            }
            value => Slot::Value(value),
        };
        let stored = self.inner.registry.write().resolve(id, definition, slot);
        if stored {
            tracing::debug!(container = self.uid(), id, "cached built value");
            self.sync_cache();
        } else {
            tracing::debug!(container = self.uid(), id, "definition replaced while building, not cached");
        }
    }

    /// Merges the cached snapshot into the registry.
    pub(crate) fn load_snapshot(&self) -> DiResult<()> {
        let Some(cache) = &self.inner.cache else {
            return Ok(());
        };
        let stored = cache
            .adapter
            .get(&cache.key, serde_json::Value::Object(serde_json::Map::new()))
            .map_err(|e| DiError::runtime(format!("reading cache key `{}`", cache.key), e))?;
        let serde_json::Value::Object(entries) = stored else {
            return Err(DiError::unexpected_value(format!(
                "cache key `{}` must hold a JSON object",
                cache.key
            )));
        };

        let self_id = self.self_id();
        let mut registry = self.inner.registry.write();
        let mut loaded = 0usize;
        for (id, json) in entries {
            if id.is_empty() || id == self_id {
                continue;
            }
            registry.insert_value(id, Value::from(json));
            loaded += 1;
        }
        tracing::debug!(container = self.uid(), key = %cache.key, loaded, "snapshot loaded");
        Ok(())
    }

    /// Rewrites the cached snapshot from the registry.
    pub(crate) fn sync_cache(&self) {
        let Some(cache) = &self.inner.cache else {
            return;
        };
        let snapshot = self.inner.registry.read().snapshot();
        if !cache.adapter.set(&cache.key, serde_json::Value::Object(snapshot)) {
            tracing::warn!(container = self.uid(), key = %cache.key, "failed to write container snapshot");
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("uid", &self.uid())
            .field("self_id", &*self.inner.self_id.read())
            .field("children", &self.child_count())
            .finish()
    }
}

impl Resolver for Container {
    fn get(&self, id: &str) -> DiResult<Value> {
        Container::get(self, id)
    }

    fn has(&self, id: &str) -> DiResult<bool> {
        Container::has(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Callable;
    use std::sync::atomic::AtomicUsize;

    fn counting_factory(counter: Arc<AtomicUsize>, registered: bool) -> Definition {
        Definition::factory(
            Callable::new(move |_| Ok(Value::from(counter.fetch_add(1, Ordering::SeqCst) as i64))),
            vec![],
            registered,
        )
    }

    #[test]
    fn registered_definitions_build_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let container = Container::new();
        container.set("n", counting_factory(counter.clone(), true)).unwrap();

        assert_eq!(container.get("n").unwrap(), 0);
        assert_eq!(container.get("n").unwrap(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregistered_definitions_build_every_time() {
        let counter = Arc::new(AtomicUsize::new(0));
        let container = Container::new();
        container.set("n", counting_factory(counter.clone(), false)).unwrap();

        assert_eq!(container.get("n").unwrap(), 0);
        assert_eq!(container.get("n").unwrap(), 1);
        assert!(container.has("n").unwrap());
    }

    #[test]
    fn empty_ids_are_invalid() {
        let container = Container::new();
        assert!(matches!(container.get(""), Err(DiError::InvalidArgument(_))));
        assert!(matches!(container.has(""), Err(DiError::InvalidArgument(_))));
        assert!(matches!(container.set("", 1), Err(DiError::InvalidArgument(_))));
        assert!(matches!(container.delete(""), Err(DiError::InvalidArgument(_))));
        assert!(matches!(container.set_self_id(""), Err(DiError::InvalidArgument(_))));
    }

    #[test]
    fn self_entry_resolves_to_the_container() {
        let container = Container::new();
        let me = container.get(DEFAULT_SELF_ID).unwrap();
        assert!(me.as_container().unwrap().ptr_eq(&container));
        assert_eq!(container.ids(), [DEFAULT_SELF_ID]);
    }

    #[test]
    fn missing_dependencies_are_not_reported_as_missing_entries() {
        let container = Container::new();
        container
            .set("a", Definition::factory(Callable::new(|_| Ok(Value::Null)), vec![crate::entry("b").into()], true))
            .unwrap();

        let err = container.get("a").unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "error resolving `a`: Entry not found: b");
        assert!(err.root_cause().is_not_found());
    }

    #[test]
    fn clear_cache_without_cache_is_false() {
        assert!(!Container::new().clear_cache().unwrap());
        assert!(Container::new().cache_key().is_none());
    }

    #[test]
    fn handles_compare_by_identity() {
        let a = Container::new();
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&Container::new()));
    }
}
