//! Runtime member access for objects built by the container.
//!
//! Definitions apply post-construction steps by *name* ("call `connect`",
//! "set `port`"), and object definitions construct types by *class name*.
//! Rust has no runtime reflection, so types opt in by implementing
//! [`Instance`] (named member access) and [`Construct`] (construction from
//! resolved arguments).

use std::any::Any;

use crate::error::BoxError;
use crate::value::Value;

/// Upcast helper so `dyn Instance` can be downcast to its concrete type.
///
/// Implemented for every `'static` type; there is no need to implement it by
/// hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An object the container can call methods on and set properties of.
///
/// Every member is optional: the defaults describe an object with no
/// callable methods and no settable properties. The `has_*` probes must agree
/// with what the corresponding mutators accept, because instance actions
/// check them before resolving their own parameters.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{BoxError, Instance, Object, Value};
///
/// #[derive(Default)]
/// struct Mailer {
///     host: String,
///     port: i64,
/// }
///
/// impl Instance for Mailer {
///     fn has_method(&self, name: &str) -> bool {
///         name == "set_host"
///     }
///
///     fn call_method(&mut self, name: &str, args: Vec<Value>) -> Result<Value, BoxError> {
///         match name {
///             "set_host" => {
///                 self.host = args.first().and_then(Value::as_str).ok_or("host expected")?.to_string();
///                 Ok(Value::Null)
///             }
///             _ => Err(format!("no method {name}").into()),
///         }
///     }
///
///     fn has_property(&self, name: &str) -> bool {
///         name == "port"
///     }
///
///     fn set_property(&mut self, name: &str, value: Value) -> Result<(), BoxError> {
///         match name {
///             "port" => {
///                 self.port = value.as_int().ok_or("port must be an integer")?;
///                 Ok(())
///             }
///             _ => Err(format!("no property {name}").into()),
///         }
///     }
/// }
///
/// let mailer = Object::new(Mailer::default());
/// mailer.call_method("set_host", vec!["smtp.local".into()]).unwrap();
/// mailer.set_property("port", 25.into()).unwrap();
/// assert_eq!(mailer.with(|m: &Mailer| (m.host.clone(), m.port)), Some(("smtp.local".into(), 25)));
/// ```
pub trait Instance: AsAny + Send {
    /// Whether `name` is a callable method of this object.
    fn has_method(&self, name: &str) -> bool {
        let _ = name;
        false
    }

    /// Invokes the method `name` with already-resolved arguments.
    fn call_method(&mut self, name: &str, args: Vec<Value>) -> Result<Value, BoxError> {
        let _ = args;
        Err(format!("method `{name}` is not callable").into())
    }

    /// Whether `name` is a settable property of this object.
    fn has_property(&self, name: &str) -> bool {
        let _ = name;
        false
    }

    /// Assigns an already-resolved value to the property `name`.
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), BoxError> {
        let _ = value;
        Err(format!("property `{name}` is not settable").into())
    }

    /// Reads the property `name`, if the object exposes it.
    fn property(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }
}

/// A type object definitions can instantiate from resolved arguments.
///
/// Register implementors in the class table with
/// [`register_class`](crate::register_class) (or use
/// [`object_of`](crate::object_of), which registers on demand).
pub trait Construct: Instance + Sized {
    /// Builds an instance from the resolved constructor arguments.
    fn construct(args: Vec<Value>) -> Result<Self, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;
    impl Instance for Inert {}

    #[test]
    fn defaults_expose_nothing() {
        let mut inert = Inert;
        assert!(!inert.has_method("run"));
        assert!(!inert.has_property("name"));
        assert!(inert.property("name").is_none());
        assert!(inert.call_method("run", vec![]).is_err());
        assert!(inert.set_property("name", Value::Null).is_err());
    }

    #[test]
    fn downcasts_through_the_trait_object() {
        let boxed: Box<dyn Instance> = Box::new(Inert);
        let instance: &dyn Instance = &*boxed;
        assert!(AsAny::as_any(instance).is::<Inert>());
    }
}
