//! Observers for definition builds.
//!
//! Observers are notified synchronously around every definition build a
//! container performs (cached values and plain value entries are not
//! reported). Keep implementations lightweight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;

/// Observer trait for container build events.
///
/// # Examples
///
/// ```
/// use keyed_di::{factory, Callable, ContainerBuilder, ContainerObserver, DiError, Value};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl ContainerObserver for Recorder {
///     fn resolving(&self, id: &str) {
///         self.0.lock().unwrap().push(format!("start {id}"));
///     }
///
///     fn resolved(&self, id: &str, _duration: Duration) {
///         self.0.lock().unwrap().push(format!("done {id}"));
///     }
///
///     fn build_failed(&self, id: &str, _error: &DiError) {
///         self.0.lock().unwrap().push(format!("failed {id}"));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let container = ContainerBuilder::new()
///     .set("answer", factory(Callable::new(|_| Ok(Value::from(42))), vec![], true))
///     .observer(recorder.clone())
///     .build()
///     .unwrap();
///
/// container.get("answer").unwrap();
/// container.get("answer").unwrap(); // cached, not reported
/// assert_eq!(*recorder.0.lock().unwrap(), ["start answer", "done answer"]);
/// ```
pub trait ContainerObserver: Send + Sync {
    /// Called before a definition is built.
    fn resolving(&self, id: &str);

    /// Called after a definition built successfully.
    fn resolved(&self, id: &str, duration: Duration);

    /// Called when a definition failed to build. `error` is the unwrapped
    /// cause, before the container adds its own context.
    fn build_failed(&self, id: &str, error: &DiError);
}

/// Registered observers of one container.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ContainerObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn ContainerObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, id: &str) {
        for observer in &self.observers {
            observer.resolving(id);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, id: &str, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(id, duration);
        }
    }

    #[inline]
    pub(crate) fn build_failed(&self, id: &str, error: &DiError) {
        for observer in &self.observers {
            observer.build_failed(id, error);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Starts and completions are emitted at `DEBUG`, failures at `WARN`. The
/// crate never installs a subscriber; that is up to the application.
///
/// ```
/// use keyed_di::{ContainerBuilder, LoggingObserver};
/// use std::sync::Arc;
///
/// let container = ContainerBuilder::new()
///     .observer(Arc::new(LoggingObserver::with_prefix("[app]")))
///     .build()
///     .unwrap();
/// # let _ = container;
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a logging observer with the default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "[keyed-di]".to_string(),
        }
    }

    /// Creates a logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerObserver for LoggingObserver {
    fn resolving(&self, id: &str) {
        tracing::debug!(prefix = %self.prefix, id, "building definition");
    }

    fn resolved(&self, id: &str, duration: Duration) {
        tracing::debug!(prefix = %self.prefix, id, ?duration, "definition built");
    }

    fn build_failed(&self, id: &str, error: &DiError) {
        tracing::warn!(prefix = %self.prefix, id, %error, "definition failed to build");
    }
}

/// Observer counting builds, failures and total build time.
#[derive(Default)]
pub struct MetricsObserver {
    builds: AtomicU64,
    failures: AtomicU64,
    total_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful builds observed.
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    /// Number of failed builds observed.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn total_build_time(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }

    /// Mean duration of successful builds.
    pub fn average_build_time(&self) -> Option<Duration> {
        let count = self.build_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed) / count))
    }

    pub fn reset(&self) {
        self.builds.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.total_nanos.store(0, Ordering::Relaxed);
    }
}

impl ContainerObserver for MetricsObserver {
    fn resolving(&self, _id: &str) {}

    fn resolved(&self, _id: &str, duration: Duration) {
        self.builds.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn build_failed(&self, _id: &str, _error: &DiError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_observer_counts() {
        let observer = MetricsObserver::new();
        assert!(observer.average_build_time().is_none());

        observer.resolved("a", Duration::from_millis(10));
        observer.resolved("b", Duration::from_millis(20));
        observer.build_failed("c", &DiError::not_found("d"));

        assert_eq!(observer.build_count(), 2);
        assert_eq!(observer.failure_count(), 1);
        assert_eq!(observer.average_build_time(), Some(Duration::from_millis(15)));

        observer.reset();
        assert_eq!(observer.build_count(), 0);
        assert_eq!(observer.total_build_time(), Duration::ZERO);
    }

    #[test]
    fn observers_fan_out() {
        let metrics = Arc::new(MetricsObserver::new());
        let mut observers = Observers::new();
        assert!(!observers.has_observers());

        observers.add(metrics.clone());
        observers.add(Arc::new(LoggingObserver::new()));
        assert!(observers.has_observers());

        observers.resolving("a");
        observers.resolved("a", Duration::from_millis(1));
        observers.build_failed("b", &DiError::not_found("b"));
        assert_eq!(metrics.build_count(), 1);
        assert_eq!(metrics.failure_count(), 1);
    }
}
