//! Error types for the dependency injection container.

use thiserror::Error;

/// Boxed error used for failures raised by user code (constructors, factory
/// callables, instance methods, cache adapters).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Represents the various error conditions that can occur while registering
/// entries, building definitions, or looking identifiers up in a container.
/// `NotFound` is always distinct from the other variants so callers can tell
/// "doesn't exist" apart from "exists but failed to build".
///
/// # Examples
///
/// ```rust
/// use keyed_di::{Container, DiError};
///
/// let container = Container::new();
/// match container.get("mailer") {
///     Err(DiError::NotFound(id)) => assert_eq!(id, "mailer"),
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use keyed_di::DiError;
///
/// let circular = DiError::Circular(vec!["a".into(), "b".into(), "a".into()]);
/// assert_eq!(circular.to_string(), "Circular dependency: a -> b -> a");
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// Identifier unresolvable anywhere in the container chain
    #[error("Entry not found: {0}")]
    NotFound(String),
    /// Caller input violated a precondition (empty identifier, empty cache key, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A definition references something structurally invalid
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A build step failed while executing; always carries the cause
    #[error("{context}: {source}")]
    Runtime {
        context: String,
        #[source]
        source: BoxError,
    },
    /// A value from an external source had the wrong shape
    #[error("Unexpected value: {0}")]
    UnexpectedValue(String),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
}

impl DiError {
    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn runtime(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Runtime {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn unexpected_value(message: impl Into<String>) -> Self {
        Self::UnexpectedValue(message.into())
    }

    /// Returns `true` if this error reports a missing identifier.
    ///
    /// Only the top-level error is inspected: a definition that failed because
    /// one of *its* dependencies is missing reports `Runtime`, not `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::NotFound(_))
    }

    /// Walks `Runtime` wrappers down to the innermost `DiError`.
    ///
    /// Causes raised by user code that are not `DiError`s stop the walk at the
    /// `Runtime` error carrying them.
    ///
    /// ```rust
    /// use keyed_di::{Container, entry, factory, Callable, Value};
    ///
    /// let container = Container::new();
    /// container
    ///     .set("greeter", factory(Callable::new(|_| Ok(Value::Null)), vec![entry("missing").into()], true))
    ///     .unwrap();
    ///
    /// let err = container.get("greeter").unwrap_err();
    /// assert!(!err.is_not_found());
    /// assert!(err.root_cause().is_not_found());
    /// ```
    pub fn root_cause(&self) -> &DiError {
        let mut current = self;
        while let DiError::Runtime { source, .. } = current {
            match source.downcast_ref::<DiError>() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    /// Errors that already describe the whole resolution chain and are passed
    /// through the container boundary without another wrapper.
    pub(crate) fn is_chain_error(&self) -> bool {
        matches!(self, DiError::Circular(_) | DiError::DepthExceeded(_))
    }
}

/// Result type for DI operations
///
/// A convenience type alias for `Result<T, DiError>` used throughout keyed-di.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{DiResult, DiError};
///
/// fn lookup() -> DiResult<u32> {
///     Err(DiError::NotFound("port".into()))
/// }
///
/// assert!(lookup().unwrap_err().is_not_found());
/// ```
pub type DiResult<T> = Result<T, DiError>;
