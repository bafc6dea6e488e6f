//! Seeded container construction.

use std::sync::Arc;

use crate::cache::{CacheAdapter, DEFAULT_CACHE_KEY};
use crate::container::{CacheBinding, Container, DEFAULT_SELF_ID};
use crate::definition::Entity;
use crate::entry::check_id;
use crate::error::{DiError, DiResult};
use crate::observer::{ContainerObserver, Observers};

/// Collects the initial state of a container.
///
/// The container is assembled in a fixed order: its self entry, the seeded
/// entries, the cached snapshot (whose values replace seeded entries with the
/// same identifier), the children, and finally the delegate.
///
/// # Examples
///
/// ```
/// use keyed_di::{value, Container, ContainerBuilder, MemoryCache};
/// use std::sync::Arc;
///
/// let shared = Container::new();
/// shared.set("region", "eu-west-1")?;
///
/// let container = ContainerBuilder::new()
///     .self_id("di")
///     .set("name", "billing")
///     .set("retries", value(3, true))
///     .child(shared)
///     .cache(Arc::new(MemoryCache::new()))
///     .build()?;
///
/// assert_eq!(container.get("region")?, "eu-west-1");
/// assert_eq!(container.cache_key(), Some("container.registry"));
/// # Ok::<(), keyed_di::DiError>(())
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    self_id: Option<String>,
    entries: Vec<(String, Entity)>,
    children: Vec<Container>,
    delegate: Option<Container>,
    cache: Option<Arc<dyn CacheAdapter>>,
    cache_key: Option<String>,
    observers: Observers,
}

impl ContainerBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier the container resolves to itself under.
    pub fn self_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.self_id = Some(id.into());
        self
    }

    /// Seeds a value or a definition. Later seeds for the same identifier
    /// win.
    pub fn set(&mut self, id: impl Into<String>, entity: impl Into<Entity>) -> &mut Self {
        self.entries.push((id.into(), entity.into()));
        self
    }

    /// Adds a child, consulted in the order children were added.
    pub fn child(&mut self, child: Container) -> &mut Self {
        self.children.push(child);
        self
    }

    pub fn delegate(&mut self, delegate: Container) -> &mut Self {
        self.delegate = Some(delegate);
        self
    }

    /// Mirrors resolved values into `adapter`.
    pub fn cache(&mut self, adapter: Arc<dyn CacheAdapter>) -> &mut Self {
        self.cache = Some(adapter);
        self
    }

    /// Key of the snapshot in the cache; defaults to
    /// [`DEFAULT_CACHE_KEY`].
    pub fn cache_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Registers an observer for definition builds.
    pub fn observer(&mut self, observer: Arc<dyn ContainerObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Builds the container.
    ///
    /// The builder is left untouched and can build further containers; they
    /// share seeded objects and the cache adapter, but not resolved state.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - empty self id, seeded id or cache key, or a
    ///   child/delegate link that would make the composite cyclic
    /// * `Runtime` - the cache adapter failed to return the snapshot
    /// * `UnexpectedValue` - the snapshot is not a JSON object
    pub fn build(&self) -> DiResult<Container> {
        let self_id = self.self_id.clone().unwrap_or_else(|| DEFAULT_SELF_ID.to_string());
        check_id(&self_id)?;

        let cache = match &self.cache {
            Some(adapter) => {
                let key = self.cache_key.clone().unwrap_or_else(|| DEFAULT_CACHE_KEY.to_string());
                if key.is_empty() {
                    return Err(DiError::invalid_argument("cache key must be a non-empty string"));
                }
                Some(CacheBinding {
                    adapter: Arc::clone(adapter),
                    key,
                })
            }
            None => None,
        };

        let container = Container::bare(self_id, cache, self.observers.clone());
        for (id, entity) in &self.entries {
            check_id(id)?;
            container.insert_entity(id, entity.clone());
        }
        container.load_snapshot()?;
        for child in &self.children {
            container.add_child(child)?;
        }
        if let Some(delegate) = &self.delegate {
            container.set_delegate(delegate)?;
        }
        container.sync_cache();

        tracing::debug!(container = container.uid(), entries = self.entries.len(), "container built");
        Ok(container)
    }
}
