//! Resolver trait used while building definitions.

use crate::error::{DiError, DiResult};
use crate::value::{Object, Value};

/// Object-safe lookup interface.
///
/// Definitions resolve their [`Entry`](crate::Entry) parameters through a
/// `&dyn Resolver`. [`Container`](crate::Container) is the implementation used
/// at runtime; tests and embedders may supply their own to build definitions
/// against a fixed set of entries.
///
/// # Examples
///
/// ```
/// use keyed_di::{Container, Resolver, Value};
///
/// let container = Container::new();
/// container.set("retries", 3).unwrap();
///
/// fn retries(resolver: &dyn Resolver) -> keyed_di::DiResult<i64> {
///     Ok(resolver.get("retries")?.as_int().unwrap_or(1))
/// }
///
/// assert_eq!(retries(&container).unwrap(), 3);
/// assert_eq!(container.get_optional("timeout").unwrap(), None);
/// ```
pub trait Resolver {
    /// Returns the value for `id`.
    ///
    /// # Errors
    ///
    /// * `NotFound` - nothing answers for `id`
    /// * `InvalidArgument` - `id` is empty
    /// * any build failure of the definition registered under `id`
    fn get(&self, id: &str) -> DiResult<Value>;

    /// Whether `get(id)` can return a value, without building anything.
    fn has(&self, id: &str) -> DiResult<bool>;

    /// Resolves `id`, mapping `NotFound` to `None`.
    ///
    /// Only a missing `id` itself is treated as absent: if `id` exists but one
    /// of its dependencies is missing, the error is returned.
    fn get_optional(&self, id: &str) -> DiResult<Option<Value>> {
        match self.get(id) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolves `id` and requires the result to be an object.
    fn get_object(&self, id: &str) -> DiResult<Object> {
        match self.get(id)? {
            Value::Object(object) => Ok(object),
            other => Err(DiError::unexpected_value(format!(
                "entry `{}` is {}, not an object",
                id,
                other.kind_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed(HashMap<&'static str, Value>);

    impl Resolver for Fixed {
        fn get(&self, id: &str) -> DiResult<Value> {
            self.0.get(id).cloned().ok_or_else(|| DiError::not_found(id))
        }

        fn has(&self, id: &str) -> DiResult<bool> {
            Ok(self.0.contains_key(id))
        }
    }

    fn fixed() -> Fixed {
        Fixed(HashMap::from([("n", Value::from(1)), ("broken", Value::Null)]))
    }

    #[test]
    fn optional_maps_not_found_only() {
        let resolver = fixed();
        assert_eq!(resolver.get_optional("n").unwrap(), Some(Value::from(1)));
        assert_eq!(resolver.get_optional("missing").unwrap(), None);
    }

    #[test]
    fn get_object_rejects_data() {
        let err = fixed().get_object("n").unwrap_err();
        assert!(matches!(err, DiError::UnexpectedValue(_)));
    }
}
