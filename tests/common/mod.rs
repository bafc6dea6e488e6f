//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;

use keyed_di::{BoxError, Construct, Instance, Value};

/// Records everything the container does to it.
#[derive(Debug, Default)]
pub struct Service {
    pub args: Vec<Value>,
    pub calls: Vec<(String, Vec<Value>)>,
    pub props: BTreeMap<String, Value>,
}

impl Instance for Service {
    fn has_method(&self, name: &str) -> bool {
        matches!(name, "configure" | "attach" | "explode")
    }

    fn call_method(&mut self, name: &str, args: Vec<Value>) -> Result<Value, BoxError> {
        if name == "explode" {
            return Err("exploded".into());
        }
        self.calls.push((name.to_string(), args));
        Ok(Value::from(self.calls.len() as i64))
    }

    fn has_property(&self, name: &str) -> bool {
        matches!(name, "name" | "peer" | "options")
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), BoxError> {
        self.props.insert(name.to_string(), value);
        Ok(())
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.props.get(name).cloned()
    }
}

impl Construct for Service {
    fn construct(args: Vec<Value>) -> Result<Self, BoxError> {
        Ok(Service {
            args,
            ..Service::default()
        })
    }
}

/// Constructor arguments of a built `Service`.
pub fn args_of(value: &Value) -> Vec<Value> {
    value
        .as_object()
        .and_then(|object| object.with(|s: &Service| s.args.clone()))
        .expect("value is not a Service")
}

/// Method calls recorded by a built `Service`.
pub fn calls_of(value: &Value) -> Vec<(String, Vec<Value>)> {
    value
        .as_object()
        .and_then(|object| object.with(|s: &Service| s.calls.clone()))
        .expect("value is not a Service")
}
