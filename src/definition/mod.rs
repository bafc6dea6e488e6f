//! Lazy recipes for container entries.
//!
//! A [`Definition`] describes how to produce a value on demand: instantiate a
//! class, call a factory, or return a literal. Objects produced by any recipe
//! then go through the definition's [`InstanceAction`]s.

mod action;

pub use action::InstanceAction;

use std::fmt;
use std::sync::Arc;

use crate::classes::{self, Constructor};
use crate::container::Container;
use crate::entry::Entry;
use crate::error::{DiError, DiResult};
use crate::instance::Construct;
use crate::param::{resolve_all, Invocable, Param};
use crate::traits::Resolver;
use crate::value::{Callable, Object, Value};

/// How a definition produces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Object,
    Factory,
    Value,
}

#[derive(Clone)]
enum Recipe {
    Object {
        class: String,
        constructor: Constructor,
        parameters: Vec<Param>,
    },
    Factory {
        invocable: Invocable,
        parameters: Vec<Param>,
    },
    Value(Value),
}

impl fmt::Debug for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipe::Object { class, parameters, .. } => f
                .debug_struct("Object")
                .field("class", class)
                .field("parameters", parameters)
                .finish(),
            Recipe::Factory { invocable, parameters } => f
                .debug_struct("Factory")
                .field("invocable", invocable)
                .field("parameters", parameters)
                .finish(),
            Recipe::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// A lazily built container entry.
///
/// Registered definitions are built once and the result replaces the
/// definition in the container; unregistered definitions build a fresh value
/// on every lookup.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{entry, factory, Callable, Container, Value};
///
/// let container = Container::new();
/// container.set("name", "world").unwrap();
///
/// let greet = Callable::new(|args| {
///     let name = args[0].as_str().unwrap_or("nobody");
///     Ok(Value::from(format!("hello, {name}")))
/// });
/// container.set("greeting", factory(greet, vec![entry("name").into()], true)).unwrap();
///
/// assert_eq!(container.get("greeting").unwrap(), "hello, world");
/// ```
#[derive(Debug, Clone)]
pub struct Definition {
    recipe: Recipe,
    registered: bool,
    actions: Vec<InstanceAction>,
}

impl Definition {
    fn with_recipe(recipe: Recipe, registered: bool) -> Self {
        Self {
            recipe,
            registered,
            actions: Vec::new(),
        }
    }

    /// Definition instantiating the class registered under `class`.
    ///
    /// # Errors
    ///
    /// `Configuration` if no class is registered under that name.
    pub fn object(class: &str, parameters: Vec<Param>, registered: bool) -> DiResult<Self> {
        let constructor = classes::constructor(class)
            .ok_or_else(|| DiError::configuration(format!("class `{class}` does not exist")))?;
        Ok(Self::with_recipe(
            Recipe::Object {
                class: class.to_string(),
                constructor,
                parameters,
            },
            registered,
        ))
    }

    /// Definition instantiating `T`, registering it in the class table first.
    pub fn object_of<T: Construct>(parameters: Vec<Param>, registered: bool) -> Self {
        let class = classes::register_class::<T>();
        let constructor: Constructor = Arc::new(|args| T::construct(args).map(Object::new));
        Self::with_recipe(
            Recipe::Object {
                class: class.to_string(),
                constructor,
                parameters,
            },
            registered,
        )
    }

    /// Definition calling `invocable` with the resolved `parameters`.
    pub fn factory(invocable: impl Into<Invocable>, parameters: Vec<Param>, registered: bool) -> Self {
        Self::with_recipe(
            Recipe::Factory {
                invocable: invocable.into(),
                parameters,
            },
            registered,
        )
    }

    /// Definition returning `value` as is.
    pub fn value(value: impl Into<Value>, registered: bool) -> Self {
        Self::with_recipe(Recipe::Value(value.into()), registered)
    }

    /// Adds a method call to run after construction.
    pub fn method(mut self, name: impl Into<String>, parameters: Vec<Param>) -> Self {
        self.actions.push(InstanceAction::call_method(name, parameters));
        self
    }

    /// Adds a property assignment to run after construction.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Param>) -> Self {
        self.actions.push(InstanceAction::set_property(name, value));
        self
    }

    /// Adds an already-built action.
    pub fn action(mut self, action: InstanceAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Whether the first built value is cached by the container.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn kind(&self) -> DefinitionKind {
        match self.recipe {
            Recipe::Object { .. } => DefinitionKind::Object,
            Recipe::Factory { .. } => DefinitionKind::Factory,
            Recipe::Value(_) => DefinitionKind::Value,
        }
    }

    /// Class name of an object definition.
    pub fn class_name(&self) -> Option<&str> {
        match &self.recipe {
            Recipe::Object { class, .. } => Some(class),
            _ => None,
        }
    }

    pub fn actions(&self) -> &[InstanceAction] {
        &self.actions
    }

    /// Constructor or factory parameters; empty for value definitions.
    pub fn parameters(&self) -> &[Param] {
        match &self.recipe {
            Recipe::Object { parameters, .. } | Recipe::Factory { parameters, .. } => parameters,
            Recipe::Value(_) => &[],
        }
    }

    /// Entries this definition refers to, across parameters, factory target
    /// and actions.
    pub fn dependencies(&self) -> Vec<&Entry> {
        let mut deps: Vec<&Entry> = self.parameters().iter().flat_map(Param::references).collect();
        if let Recipe::Factory { invocable, .. } = &self.recipe {
            match invocable {
                Invocable::Entry(entry) => deps.push(entry),
                Invocable::Method { target, .. } => deps.extend(target.references()),
                Invocable::Function(_) => {}
            }
        }
        for action in &self.actions {
            match action {
                InstanceAction::CallMethod { parameters, .. } => {
                    deps.extend(parameters.iter().flat_map(Param::references))
                }
                InstanceAction::SetProperty { value, .. } => deps.extend(value.references()),
            }
        }
        deps
    }

    /// Builds the value, resolving references through `resolver`.
    ///
    /// Non-object results are returned as soon as the recipe produces them;
    /// objects go through every instance action first, in order.
    pub fn build(&self, resolver: &dyn Resolver) -> DiResult<Value> {
        let built = match &self.recipe {
            Recipe::Object {
                class,
                constructor,
                parameters,
            } => {
                let args = resolve_all(parameters, resolver)?;
                let object = constructor(args).map_err(|e| DiError::runtime(format!("constructing {class}"), e))?;
                Value::Object(object)
            }
            Recipe::Factory { invocable, parameters } => {
                let bound = invocable.bind(resolver)?;
                let args = resolve_all(parameters, resolver)?;
                bound
                    .call(args)
                    .map_err(|e| DiError::runtime("factory invocation failed", e))?
            }
            Recipe::Value(value) => value.clone(),
        };

        let Value::Object(object) = &built else {
            return Ok(built);
        };
        for action in &self.actions {
            action.apply(object, resolver)?;
        }
        Ok(built)
    }
}

/// Anything that can be stored in a container: a value or a definition.
#[derive(Debug, Clone)]
pub enum Entity {
    Value(Value),
    Definition(Definition),
}

impl From<Definition> for Entity {
    fn from(definition: Definition) -> Self {
        Entity::Definition(definition)
    }
}

impl From<Value> for Entity {
    fn from(value: Value) -> Self {
        Entity::Value(value)
    }
}

macro_rules! value_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Entity {
                fn from(value: $ty) -> Self {
                    Entity::Value(Value::from(value))
                }
            }
        )*
    };
}

value_entity!(bool, i32, i64, u32, f64, &str, String, Vec<Value>, Object, Callable, Container);
