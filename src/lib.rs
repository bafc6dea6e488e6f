//! # keyed-di
//!
//! String-keyed dependency injection: a runtime registry resolving identifiers
//! to values, lazily instantiating objects from declarative definitions and
//! wiring constructor, method and property dependencies.
//!
//! ## Features
//!
//! - **Lazy definitions**: objects, factories and values built on first lookup
//! - **Registered or transient**: cache the first build, or rebuild every time
//! - **Entry references**: parameters that point at other entries, resolved recursively
//! - **Instance actions**: method calls and property sets applied after construction
//! - **Composite containers**: children consulted in order, self always first
//! - **Delegate lookup**: definitions resolve their dependencies through a delegate
//! - **Circular dependency detection**: cycles fail with the full path
//! - **Cache mirroring**: resolved data values persisted through a cache adapter
//!
//! ## Quick Start
//!
//! ```rust
//! use keyed_di::{entry, factory, object_of, BoxError, Callable, Construct, Container, Instance, Value};
//!
//! struct Mailer {
//!     host: String,
//!     sent: usize,
//! }
//!
//! impl Instance for Mailer {
//!     fn has_method(&self, name: &str) -> bool {
//!         name == "warm_up"
//!     }
//!
//!     fn call_method(&mut self, _name: &str, _args: Vec<Value>) -> Result<Value, BoxError> {
//!         self.sent = 0;
//!         Ok(Value::Null)
//!     }
//! }
//!
//! impl Construct for Mailer {
//!     fn construct(args: Vec<Value>) -> Result<Self, BoxError> {
//!         let host = args.first().and_then(Value::as_str).ok_or("host expected")?;
//!         Ok(Mailer { host: host.to_string(), sent: 1 })
//!     }
//! }
//!
//! let container = Container::new();
//! container.set("smtp.host", "mail.local")?;
//! container.set(
//!     "mailer",
//!     object_of::<Mailer>(vec![entry("smtp.host").into()], true).method("warm_up", vec![]),
//! )?;
//! container.set(
//!     "banner",
//!     factory(Callable::new(|args| Ok(format!("via {}", args[0].as_str().unwrap_or("?")).into())),
//!             vec![entry("smtp.host").into()],
//!             false),
//! )?;
//!
//! let mailer = container.get("mailer")?;
//! let (host, sent) = mailer.as_object().unwrap().with(|m: &Mailer| (m.host.clone(), m.sent)).unwrap();
//! assert_eq!((host.as_str(), sent), ("mail.local", 0));
//! assert_eq!(container.get("banner")?, "via mail.local");
//! # Ok::<(), keyed_di::DiError>(())
//! ```
//!
//! ## Composite Containers
//!
//! ```rust
//! use keyed_di::{entry, factory, Callable, Container, Value};
//!
//! let app = Container::new();
//! let plugin = Container::new();
//! app.set("greeting", "hello")?;
//! plugin.set("shout", factory(
//!     Callable::new(|args| Ok(Value::from(args[0].as_str().unwrap_or("").to_uppercase()))),
//!     vec![entry("greeting").into()],
//!     true,
//! ))?;
//!
//! // the plugin resolves `greeting` through its delegate, the app
//! app.add_child(&plugin)?;
//! assert_eq!(app.get("shout")?, "HELLO");
//! # Ok::<(), keyed_di::DiError>(())
//! ```

// Module declarations
pub mod builder;
pub mod cache;
pub mod classes;
pub mod config;
pub mod container;
pub mod definition;
pub mod entry;
pub mod error;
pub mod instance;
pub mod observer;
pub mod param;
pub mod traits;
pub mod value;

// Internal modules
mod internal;
mod registration;

// Re-exports
pub use builder::ContainerBuilder;
pub use cache::{CacheAdapter, JsonFileCache, MemoryCache, DEFAULT_CACHE_KEY};
pub use classes::{class_exists, register_class, register_class_as, register_constructor, Constructor};
pub use config::{ActionConfig, ContainerConfig, EntryConfig};
pub use container::{Container, DEFAULT_SELF_ID};
pub use definition::{Definition, DefinitionKind, Entity, InstanceAction};
pub use entry::{entry, Entry};
pub use error::{BoxError, DiError, DiResult};
pub use instance::{AsAny, Construct, Instance};
pub use observer::{ContainerObserver, LoggingObserver, MetricsObserver};
pub use param::{Invocable, Param};
pub use traits::Resolver;
pub use value::{Callable, Object, Value};

/// Object definition for the class registered under `class`.
///
/// # Errors
///
/// `Configuration` if no class is registered under that name.
pub fn object(class: &str, parameters: Vec<Param>, registered: bool) -> DiResult<Definition> {
    Definition::object(class, parameters, registered)
}

/// Object definition for `T`, registering the class if needed.
pub fn object_of<T: Construct>(parameters: Vec<Param>, registered: bool) -> Definition {
    Definition::object_of::<T>(parameters, registered)
}

/// Factory definition calling `invocable` with the resolved `parameters`.
pub fn factory(invocable: impl Into<Invocable>, parameters: Vec<Param>, registered: bool) -> Definition {
    Definition::factory(invocable, parameters, registered)
}

/// Value definition.
///
/// Registering a value through a definition defers instance actions until the
/// first lookup; plain values can be passed to [`Container::set`] directly.
pub fn value(value: impl Into<Value>, registered: bool) -> Definition {
    Definition::value(value, registered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_the_expected_kinds() {
        assert_eq!(value(1, true).kind(), DefinitionKind::Value);
        assert_eq!(factory(entry("f"), vec![], false).kind(), DefinitionKind::Factory);
        assert!(!factory(entry("f"), vec![], false).is_registered());
        assert!(matches!(object("lib.tests.Unknown", vec![], true), Err(DiError::Configuration(_))));
    }

    #[test]
    fn containers_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Container>();
        assert_send_sync::<Value>();
        assert_send_sync::<Definition>();
    }
}
