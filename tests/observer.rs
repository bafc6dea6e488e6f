use keyed_di::{
    entry, factory, value, Callable, ContainerBuilder, ContainerObserver, DiError, MetricsObserver, Value,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ContainerObserver for Recorder {
    fn resolving(&self, id: &str) {
        self.events.lock().unwrap().push(format!("resolving {id}"));
    }

    fn resolved(&self, id: &str, _duration: Duration) {
        self.events.lock().unwrap().push(format!("resolved {id}"));
    }

    fn build_failed(&self, id: &str, error: &DiError) {
        self.events.lock().unwrap().push(format!("failed {id}: {error}"));
    }
}

fn identity() -> Callable {
    Callable::new(|args| Ok(args.into_iter().next().unwrap_or_default()))
}

#[test]
fn test_nested_builds_are_reported_innermost_last() {
    let recorder = Arc::new(Recorder::default());
    let container = ContainerBuilder::new()
        .set("base", value(1, true))
        .set("top", factory(identity(), vec![entry("base").into()], true))
        .observer(recorder.clone())
        .build()
        .unwrap();

    assert_eq!(container.get("top").unwrap(), 1);
    assert_eq!(
        recorder.events(),
        ["resolving top", "resolving base", "resolved base", "resolved top"]
    );
}

#[test]
fn test_cached_and_plain_values_are_not_reported() {
    let recorder = Arc::new(Recorder::default());
    let container = ContainerBuilder::new()
        .set("plain", 5)
        .set("lazy", value("x", true))
        .observer(recorder.clone())
        .build()
        .unwrap();

    container.get("plain").unwrap();
    container.get("lazy").unwrap();
    container.get("lazy").unwrap();
    container.get("container").unwrap();
    assert_eq!(recorder.events(), ["resolving lazy", "resolved lazy"]);
}

#[test]
fn test_failures_are_reported_with_the_unwrapped_cause() {
    let recorder = Arc::new(Recorder::default());
    let container = ContainerBuilder::new()
        .set("broken", factory(identity(), vec![entry("missing").into()], false))
        .observer(recorder.clone())
        .build()
        .unwrap();

    assert!(container.get("broken").is_err());
    assert_eq!(
        recorder.events(),
        ["resolving broken", "failed broken: Entry not found: missing"]
    );
}

#[test]
fn test_metrics_observer_counts_builds() {
    let metrics = Arc::new(MetricsObserver::new());
    let container = ContainerBuilder::new()
        .set("transient", factory(Callable::new(|_| Ok(Value::Null)), vec![], false))
        .set("failing", factory(Callable::new(|_| Err("nope".into())), vec![], false))
        .observer(metrics.clone())
        .build()
        .unwrap();

    for _ in 0..3 {
        container.get("transient").unwrap();
    }
    assert!(container.get("failing").is_err());

    assert_eq!(metrics.build_count(), 3);
    assert_eq!(metrics.failure_count(), 1);
    assert!(metrics.average_build_time().is_some());
}

#[test]
fn test_multiple_observers_all_see_events() {
    let first = Arc::new(MetricsObserver::new());
    let second = Arc::new(MetricsObserver::new());
    let container = ContainerBuilder::new()
        .set("answer", value(42, false))
        .observer(first.clone())
        .observer(second.clone())
        .build()
        .unwrap();

    container.get("answer").unwrap();
    assert_eq!(first.build_count(), 1);
    assert_eq!(second.build_count(), 1);
}
