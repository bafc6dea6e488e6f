//! Post-construction steps applied to built objects.

use crate::error::{DiError, DiResult};
use crate::param::{resolve_all, Param};
use crate::traits::Resolver;
use crate::value::Object;

/// A step applied to an object after its definition constructed it.
///
/// Actions run in the order they were added to the definition. The target
/// member is checked before any parameter is resolved, so a misspelled member
/// fails with `Configuration` without touching the rest of the container.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceAction {
    /// Call `name` with the resolved parameters
    CallMethod { name: String, parameters: Vec<Param> },
    /// Assign the resolved value to the property `name`
    SetProperty { name: String, value: Param },
}

impl InstanceAction {
    pub fn call_method(name: impl Into<String>, parameters: Vec<Param>) -> Self {
        InstanceAction::CallMethod {
            name: name.into(),
            parameters,
        }
    }

    pub fn set_property(name: impl Into<String>, value: impl Into<Param>) -> Self {
        InstanceAction::SetProperty {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Name of the targeted method or property.
    pub fn name(&self) -> &str {
        match self {
            InstanceAction::CallMethod { name, .. } | InstanceAction::SetProperty { name, .. } => name,
        }
    }

    /// Applies the action to `object` in place.
    pub fn apply(&self, object: &Object, resolver: &dyn Resolver) -> DiResult<()> {
        match self {
            InstanceAction::CallMethod { name, parameters } => {
                if !object.has_method(name) {
                    return Err(DiError::configuration(format!(
                        "method `{}` does not exist on {}",
                        name,
                        object.class_name()
                    )));
                }
                let args = resolve_all(parameters, resolver)?;
                object
                    .call_method(name, args)
                    .map(drop)
                    .map_err(|e| DiError::runtime(format!("calling `{name}`"), e))
            }
            InstanceAction::SetProperty { name, value } => {
                if !object.has_property(name) {
                    return Err(DiError::configuration(format!(
                        "property `{}` does not exist on {}",
                        name,
                        object.class_name()
                    )));
                }
                let value = value.resolve(resolver)?;
                object
                    .set_property(name, value)
                    .map_err(|e| DiError::runtime(format!("setting `{name}`"), e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::entry;
    use crate::error::BoxError;
    use crate::instance::Instance;
    use crate::value::Value;
    use crate::Container;

    #[derive(Default)]
    struct Greeter {
        greeting: String,
        calls: usize,
    }

    impl Instance for Greeter {
        fn has_method(&self, name: &str) -> bool {
            matches!(name, "greet" | "fail")
        }

        fn call_method(&mut self, name: &str, _args: Vec<Value>) -> Result<Value, BoxError> {
            match name {
                "greet" => {
                    self.calls += 1;
                    Ok(Value::Null)
                }
                _ => Err("refused".into()),
            }
        }

        fn has_property(&self, name: &str) -> bool {
            name == "greeting"
        }

        fn set_property(&mut self, _name: &str, value: Value) -> Result<(), BoxError> {
            self.greeting = value.as_str().ok_or("string expected")?.to_string();
            Ok(())
        }
    }

    #[test]
    fn property_is_set_from_reference() {
        let container = Container::new();
        container.set("greeting", "hi").unwrap();
        let object = Object::new(Greeter::default());

        InstanceAction::set_property("greeting", entry("greeting"))
            .apply(&object, &container)
            .unwrap();

        assert_eq!(object.with(|g: &Greeter| g.greeting.clone()).unwrap(), "hi");
    }

    #[test]
    fn unknown_members_fail_before_resolving() {
        let container = Container::new();
        let object = Object::new(Greeter::default());

        // `missing` would be NotFound if it were resolved
        let err = InstanceAction::call_method("wave", vec![entry("missing").into()])
            .apply(&object, &container)
            .unwrap_err();
        assert!(matches!(err, DiError::Configuration(_)));

        let err = InstanceAction::set_property("volume", entry("missing"))
            .apply(&object, &container)
            .unwrap_err();
        assert!(matches!(err, DiError::Configuration(_)));
    }

    #[test]
    fn implementation_failures_are_runtime() {
        let container = Container::new();
        let object = Object::new(Greeter::default());

        let err = InstanceAction::call_method("fail", vec![]).apply(&object, &container).unwrap_err();
        assert!(matches!(err, DiError::Runtime { .. }));

        let err = InstanceAction::set_property("greeting", 5).apply(&object, &container).unwrap_err();
        assert!(matches!(err, DiError::Runtime { .. }));
    }
}
