//! Definition parameters and factory callables.

use std::collections::BTreeMap;

use crate::container::Container;
use crate::entry::Entry;
use crate::error::{BoxError, DiError, DiResult};
use crate::traits::Resolver;
use crate::value::{Callable, Object, Value};

/// A constructor, factory or method argument.
///
/// Parameters are resolved by structural recursion when a definition builds:
/// references are looked up through the resolver, sequences and mappings are
/// resolved element by element, and literals pass through unchanged.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{entry, Container, Param, Value};
///
/// let container = Container::new();
/// container.set("host", "db.local").unwrap();
///
/// let param = Param::from(vec![Param::from(entry("host")), Param::from(5432)]);
/// let resolved = param.resolve(&container).unwrap();
/// assert_eq!(resolved, Value::List(vec!["db.local".into(), 5432.into()]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Passed through as is
    Literal(Value),
    /// Replaced by the resolved entry
    Reference(Entry),
    /// Resolved to a `Value::List`
    Sequence(Vec<Param>),
    /// Resolved to a `Value::Map`
    Mapping(BTreeMap<String, Param>),
}

impl Param {
    /// Resolves this parameter, looking references up through `resolver`.
    pub fn resolve(&self, resolver: &dyn Resolver) -> DiResult<Value> {
        match self {
            Param::Literal(value) => Ok(value.clone()),
            Param::Reference(entry) => resolver.get(entry.id()),
            Param::Sequence(items) => resolve_all(items, resolver).map(Value::List),
            Param::Mapping(map) => map
                .iter()
                .map(|(key, param)| param.resolve(resolver).map(|value| (key.clone(), value)))
                .collect::<DiResult<BTreeMap<_, _>>>()
                .map(Value::Map),
        }
    }

    /// Entries referenced anywhere inside this parameter, in order.
    pub fn references(&self) -> Vec<&Entry> {
        let mut found = Vec::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, found: &mut Vec<&'a Entry>) {
        match self {
            Param::Literal(_) => {}
            Param::Reference(entry) => found.push(entry),
            Param::Sequence(items) => items.iter().for_each(|p| p.collect_references(found)),
            Param::Mapping(map) => map.values().for_each(|p| p.collect_references(found)),
        }
    }
}

/// Resolves a parameter list in order, stopping at the first failure.
pub(crate) fn resolve_all(params: &[Param], resolver: &dyn Resolver) -> DiResult<Vec<Value>> {
    params.iter().map(|param| param.resolve(resolver)).collect()
}

macro_rules! literal_param {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Param::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_param!(bool, i32, i64, u32, f64, &str, String, Object, Callable, Container);

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Param::Literal(value)
    }
}

impl From<Entry> for Param {
    fn from(entry: Entry) -> Self {
        Param::Reference(entry)
    }
}

impl From<Vec<Param>> for Param {
    fn from(items: Vec<Param>) -> Self {
        Param::Sequence(items)
    }
}

impl From<BTreeMap<String, Param>> for Param {
    fn from(map: BTreeMap<String, Param>) -> Self {
        Param::Mapping(map)
    }
}

/// What a factory definition calls.
#[derive(Debug, Clone)]
pub enum Invocable {
    /// A function value
    Function(Callable),
    /// A container entry that must resolve to a `Value::Callable`
    Entry(Entry),
    /// A method of a resolved object
    Method { target: Param, name: String },
}

impl Invocable {
    /// Calls `name` on whatever `target` resolves to.
    ///
    /// ```rust
    /// use keyed_di::{entry, factory, Invocable};
    ///
    /// let definition = factory(Invocable::method(entry("pool"), "acquire"), vec![], false);
    /// assert!(!definition.is_registered());
    /// ```
    pub fn method(target: impl Into<Param>, name: impl Into<String>) -> Self {
        Invocable::Method {
            target: target.into(),
            name: name.into(),
        }
    }

    /// Resolves the invocable to something that can be called.
    pub(crate) fn bind(&self, resolver: &dyn Resolver) -> DiResult<Bound> {
        match self {
            Invocable::Function(callable) => Ok(Bound::Function(callable.clone())),
            Invocable::Entry(entry) => match resolver.get(entry.id())? {
                Value::Callable(callable) => Ok(Bound::Function(callable)),
                other => Err(DiError::configuration(format!(
                    "factory entry `{entry}` must hold a callable, found {}",
                    other.kind_name()
                ))),
            },
            Invocable::Method { target, name } => match target.resolve(resolver)? {
                Value::Object(object) if object.has_method(name) => Ok(Bound::Method(object, name.clone())),
                Value::Object(object) => Err(DiError::configuration(format!(
                    "factory method `{name}` does not exist on {}",
                    object.class_name()
                ))),
                other => Err(DiError::configuration(format!(
                    "factory method `{name}` needs an object target, found {}",
                    other.kind_name()
                ))),
            },
        }
    }
}

impl From<Callable> for Invocable {
    fn from(callable: Callable) -> Self {
        Invocable::Function(callable)
    }
}

impl From<Entry> for Invocable {
    fn from(entry: Entry) -> Self {
        Invocable::Entry(entry)
    }
}

/// An invocable with its target resolved.
pub(crate) enum Bound {
    Function(Callable),
    Method(Object, String),
}

impl Bound {
    pub(crate) fn call(&self, args: Vec<Value>) -> Result<Value, BoxError> {
        match self {
            Bound::Function(callable) => callable.call(args),
            Bound::Method(object, name) => object.call_method(name, args),
        }
    }
}
