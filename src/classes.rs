//! Process-wide class table.
//!
//! Object definitions name the class they instantiate. The table maps those
//! names to constructors so a definition can be validated when it is created
//! and instantiated later from resolved arguments.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::BoxError;
use crate::instance::Construct;
use crate::value::{Object, Value};

/// Type-erased constructor stored in the class table.
pub type Constructor = Arc<dyn Fn(Vec<Value>) -> Result<Object, BoxError> + Send + Sync>;

static CLASSES: Lazy<RwLock<HashMap<String, Constructor>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers `T` under its Rust type name and returns that name.
///
/// ```rust
/// use keyed_di::{class_exists, register_class, BoxError, Construct, Instance, Value};
///
/// struct Clock;
/// impl Instance for Clock {}
/// impl Construct for Clock {
///     fn construct(_args: Vec<Value>) -> Result<Self, BoxError> {
///         Ok(Clock)
///     }
/// }
///
/// let name = register_class::<Clock>();
/// assert!(class_exists(name));
/// ```
pub fn register_class<T: Construct>() -> &'static str {
    let name = std::any::type_name::<T>();
    register_class_as::<T>(name);
    name
}

/// Registers `T` under an explicit alias, such as a short name used in
/// configuration files.
pub fn register_class_as<T: Construct>(name: impl Into<String>) {
    register_constructor(name, |args| T::construct(args).map(Object::new));
}

/// Registers a free-standing constructor closure under `name`.
///
/// A later registration under the same name replaces the earlier one.
pub fn register_constructor<F>(name: impl Into<String>, constructor: F)
where
    F: Fn(Vec<Value>) -> Result<Object, BoxError> + Send + Sync + 'static,
{
    let name = name.into();
    tracing::debug!(class = %name, "registering class");
    CLASSES.write().insert(name, Arc::new(constructor));
}

/// Whether a constructor is registered under `name`.
pub fn class_exists(name: &str) -> bool {
    CLASSES.read().contains_key(name)
}

pub(crate) fn constructor(name: &str) -> Option<Constructor> {
    CLASSES.read().get(name).cloned()
}
