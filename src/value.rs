//! Dynamic values stored in and returned by containers.

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::container::Container;
use crate::error::BoxError;
use crate::instance::{AsAny, Instance};

/// A container entry's value.
///
/// Data variants (`Null` through `Map`) behave like JSON values. `Object`,
/// `Callable` and `Container` are shared handles: cloning them shares the
/// underlying instance, and equality is identity.
///
/// # Examples
///
/// ```rust
/// use keyed_di::Value;
///
/// let port = Value::from(8080);
/// assert_eq!(port.as_int(), Some(8080));
///
/// let hosts: Value = vec![Value::from("a"), Value::from("b")].into();
/// assert_eq!(hosts.as_list().map(|l| l.len()), Some(2));
/// assert!(!hosts.is_object());
/// ```
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// An object built by a definition (or registered directly)
    Object(Object),
    /// A function value, usable as a factory through an entry reference
    Callable(Callable),
    /// A container handle; this is what a container's self entry resolves to
    Container(Container),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether instance actions apply to this value.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and integers widened to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Callable(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Value::Container(container) => Some(container),
            _ => None,
        }
    }

    /// Short description of the variant, for error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Object(object) => format!("object of class {}", object.class_name()),
            Value::Callable(_) => "callable".to_string(),
            Value::Container(_) => "container".to_string(),
        }
    }

    /// Converts a data value to JSON.
    ///
    /// Returns `None` for handles (objects, callables, containers), for
    /// collections containing them, and for non-finite floats.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as Json;

        Some(match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => Json::Number(serde_json::Number::from_f64(*f)?),
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect::<Option<_>>()?),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect::<Option<_>>()?,
            ),
            Value::Object(_) | Value::Callable(_) | Value::Container(_) => return None,
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Object(object) => fmt::Debug::fmt(object, f),
            Value::Callable(callable) => fmt::Debug::fmt(callable, f),
            Value::Container(container) => fmt::Debug::fmt(container, f),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            (Value::Container(a), Value::Container(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

impl PartialEq<i32> for Value {
    fn eq(&self, other: &i32) -> bool {
        self.as_int() == Some(i64::from(*other))
    }
}

/// Integers that fit an `i64` become `Int`. Larger unsigned integers are
/// widened to `Float` and may lose precision.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from! {
    () => |_v| Value::Null,
    bool => |v| Value::Bool(v),
    i32 => |v| Value::Int(v.into()),
    i64 => |v| Value::Int(v),
    u32 => |v| Value::Int(v.into()),
    f64 => |v| Value::Float(v),
    &str => |v| Value::Str(v.to_string()),
    String => |v| Value::Str(v),
    Vec<Value> => |v| Value::List(v),
    BTreeMap<String, Value> => |v| Value::Map(v),
    Object => |v| Value::Object(v),
    Callable => |v| Value::Callable(v),
    Container => |v| Value::Container(v),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::List(iter.into_iter().collect())
    }
}

/// Shared handle to an object built by the container.
///
/// The instance lives behind a lock so instance actions can mutate it in
/// place; every clone of the handle sees the same instance.
#[derive(Clone)]
pub struct Object {
    class: &'static str,
    cell: Arc<Mutex<dyn Instance>>,
}

impl Object {
    /// Wraps `instance` in a new shared handle.
    pub fn new<T: Instance>(instance: T) -> Self {
        Self {
            class: type_name::<T>(),
            cell: Arc::new(Mutex::new(instance)),
        }
    }

    /// Rust type name of the wrapped instance.
    pub fn class_name(&self) -> &'static str {
        self.class
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::as_ptr(&self.cell) as *const () == Arc::as_ptr(&other.cell) as *const ()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.cell.lock().has_method(name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.cell.lock().has_property(name)
    }

    /// Calls `name` on the instance. The lock is held for the duration of
    /// the call, so the method must not reach back into this same object.
    pub fn call_method(&self, name: &str, args: Vec<Value>) -> Result<Value, BoxError> {
        self.cell.lock().call_method(name, args)
    }

    pub fn set_property(&self, name: &str, value: Value) -> Result<(), BoxError> {
        self.cell.lock().set_property(name, value)
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.cell.lock().property(name)
    }

    /// Whether the wrapped instance is a `T`.
    pub fn is<T: Instance>(&self) -> bool {
        let guard = self.cell.lock();
        let instance: &dyn Instance = &*guard;
        AsAny::as_any(instance).is::<T>()
    }

    /// Runs `f` with a shared borrow of the instance if it is a `T`.
    pub fn with<T: Instance, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.cell.lock();
        let instance: &dyn Instance = &*guard;
        AsAny::as_any(instance).downcast_ref::<T>().map(f)
    }

    /// Runs `f` with an exclusive borrow of the instance if it is a `T`.
    pub fn with_mut<T: Instance, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.cell.lock();
        let instance: &mut dyn Instance = &mut *guard;
        AsAny::as_any_mut(instance).downcast_mut::<T>().map(f)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({} @ {:p})", self.class, Arc::as_ptr(&self.cell) as *const ())
    }
}

type CallableFn = dyn Fn(Vec<Value>) -> Result<Value, BoxError> + Send + Sync;

/// Shared function value.
///
/// Used directly as a factory definition's callable, or stored as a container
/// entry and referenced from factories by [`Entry`](crate::Entry).
///
/// ```rust
/// use keyed_di::{Callable, Value};
///
/// let add = Callable::new(|args| {
///     let sum: i64 = args.iter().filter_map(Value::as_int).sum();
///     Ok(Value::from(sum))
/// });
/// assert_eq!(add.call(vec![1.into(), 2.into()]).unwrap(), 3);
/// ```
#[derive(Clone)]
pub struct Callable(Arc<CallableFn>);

impl Callable {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value, BoxError> {
        (self.0)(args)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Counter {
        hits: i64,
    }

    impl Instance for Counter {
        fn has_method(&self, name: &str) -> bool {
            name == "hit"
        }

        fn call_method(&mut self, _name: &str, _args: Vec<Value>) -> Result<Value, BoxError> {
            self.hits += 1;
            Ok(Value::from(self.hits))
        }
    }

    #[test]
    fn object_clones_share_identity() {
        let a = Object::new(Counter::default());
        let b = a.clone();
        b.call_method("hit", vec![]).unwrap();

        assert!(a.ptr_eq(&b));
        assert_eq!(a.with(|c: &Counter| c.hits), Some(1));
        assert!(!a.ptr_eq(&Object::new(Counter::default())));
    }

    #[test]
    fn downcast_to_the_wrong_type_is_none() {
        struct Other;
        impl Instance for Other {}

        let object = Object::new(Counter::default());
        assert!(object.is::<Counter>());
        assert!(!object.is::<Other>());
        assert!(object.with(|_: &Other| ()).is_none());
    }

    #[test]
    fn objects_compare_by_identity_in_values() {
        let object = Object::new(Counter::default());
        assert_eq!(Value::from(object.clone()), Value::from(object));
        assert_ne!(Value::from(Object::new(Counter::default())), Value::from(Object::new(Counter::default())));
    }

    #[test]
    fn data_values_round_trip_through_json() {
        let json = json!({"name": "db", "ports": [5432, 5433], "ratio": 0.5, "tls": true, "extra": null});
        let value = Value::from(json.clone());
        assert_eq!(value.to_json(), Some(json));
    }

    #[test]
    fn integers_beyond_i64_widen_to_float() {
        assert_eq!(Value::from(json!(i64::MAX)), Value::Int(i64::MAX));
        let widened = Value::from(json!(u64::MAX));
        assert_eq!(widened.as_int(), None);
        assert_eq!(widened.as_float(), Some(u64::MAX as f64));
    }

    #[test]
    fn handles_are_not_persistable() {
        let nested = Value::List(vec![Value::from(1), Value::from(Object::new(Counter::default()))]);
        assert!(nested.to_json().is_none());
        assert!(Value::Float(f64::NAN).to_json().is_none());
    }

    #[test]
    fn option_converts_to_null() {
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(Some("x")), "x");
    }
}
