//! Declarative container configuration.
//!
//! A [`ContainerConfig`] describes the initial entries of a container in JSON
//! (or YAML, with the `yaml` feature):
//!
//! ```json
//! {
//!   "self_id": "di",
//!   "values": { "dsn": "postgres://localhost/app" },
//!   "definitions": {
//!     "db": {
//!       "type": "object",
//!       "class": "Database",
//!       "parameters": [{ "$entry": "dsn" }],
//!       "actions": [{ "method": "connect" }, { "property": "pool_size", "value": 4 }]
//!     },
//!     "limits": { "type": "value", "value": [1, 2, 3], "registered": false }
//!   }
//! }
//! ```
//!
//! Inside parameters and action values, `{"$entry": "id"}` is a reference to
//! another entry, arrays are sequences and other objects are mappings. Classes
//! are looked up in the class table, so they must be registered before the
//! configuration is turned into a builder.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::builder::ContainerBuilder;
use crate::container::Container;
use crate::definition::{Definition, InstanceAction};
use crate::entry::Entry;
use crate::error::{DiError, DiResult};
use crate::param::Param;
use crate::value::Value;

/// Key marking an entry reference inside configuration parameters.
pub const ENTRY_MARKER: &str = "$entry";

fn registered_default() -> bool {
    true
}

/// Initial contents of a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    /// Values set eagerly
    #[serde(default)]
    pub values: BTreeMap<String, JsonValue>,
    /// Definitions built on first lookup
    #[serde(default)]
    pub definitions: BTreeMap<String, EntryConfig>,
}

/// A configured definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryConfig {
    Value {
        #[serde(default)]
        value: JsonValue,
        #[serde(default = "registered_default")]
        registered: bool,
        #[serde(default)]
        actions: Vec<ActionConfig>,
    },
    Object {
        class: String,
        #[serde(default)]
        parameters: Vec<JsonValue>,
        #[serde(default = "registered_default")]
        registered: bool,
        #[serde(default)]
        actions: Vec<ActionConfig>,
    },
}

/// A configured instance action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionConfig {
    Method {
        method: String,
        #[serde(default)]
        parameters: Vec<JsonValue>,
    },
    Property {
        property: String,
        value: JsonValue,
    },
}

impl ContainerConfig {
    /// Parses a JSON document.
    ///
    /// ```
    /// use keyed_di::ContainerConfig;
    ///
    /// let config = ContainerConfig::from_json_str(r#"{"values": {"port": 8080}}"#)?;
    /// let container = config.build()?;
    /// assert_eq!(container.get("port")?, 8080);
    /// # Ok::<(), keyed_di::DiError>(())
    /// ```
    pub fn from_json_str(text: &str) -> DiResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| DiError::invalid_argument(format!("invalid container configuration: {e}")))
    }

    /// Parses a YAML document.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(text: &str) -> DiResult<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| DiError::invalid_argument(format!("invalid container configuration: {e}")))
    }

    /// Reads a configuration file, choosing the format by extension.
    pub fn from_path(path: impl AsRef<Path>) -> DiResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| DiError::runtime(format!("reading {}", path.display()), e))?;
        tracing::debug!(path = %path.display(), "loading container configuration");

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            #[cfg(feature = "yaml")]
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            _ => Err(DiError::invalid_argument(format!(
                "unsupported configuration format: {}",
                path.display()
            ))),
        }
    }

    /// Converts the configuration into a builder, validating every class.
    ///
    /// # Errors
    ///
    /// `Configuration` if an object definition names an unregistered class.
    pub fn into_builder(self) -> DiResult<ContainerBuilder> {
        let mut builder = ContainerBuilder::new();
        if let Some(self_id) = self.self_id {
            builder.self_id(self_id);
        }
        if let Some(cache_key) = self.cache_key {
            builder.cache_key(cache_key);
        }
        for (id, json) in self.values {
            builder.set(id, Value::from(json));
        }
        for (id, entry) in self.definitions {
            let definition = entry
                .to_definition()
                .map_err(|e| DiError::configuration(format!("definition `{id}`: {e}")))?;
            builder.set(id, definition);
        }
        Ok(builder)
    }

    /// Shorthand for `into_builder()?.build()`.
    pub fn build(self) -> DiResult<Container> {
        self.into_builder()?.build()
    }
}

impl EntryConfig {
    pub fn to_definition(&self) -> DiResult<Definition> {
        let (definition, actions) = match self {
            EntryConfig::Value {
                value,
                registered,
                actions,
            } => (Definition::value(Value::from(value.clone()), *registered), actions),
            EntryConfig::Object {
                class,
                parameters,
                registered,
                actions,
            } => (
                Definition::object(class, parameters.iter().map(param_from_json).collect(), *registered)?,
                actions,
            ),
        };
        Ok(actions
            .iter()
            .fold(definition, |definition, action| definition.action(action.to_action())))
    }
}

impl ActionConfig {
    pub fn to_action(&self) -> InstanceAction {
        match self {
            ActionConfig::Method { method, parameters } => {
                InstanceAction::call_method(method.clone(), parameters.iter().map(param_from_json).collect())
            }
            ActionConfig::Property { property, value } => {
                InstanceAction::set_property(property.clone(), param_from_json(value))
            }
        }
    }
}

/// Interprets a configuration value as a parameter.
pub fn param_from_json(json: &JsonValue) -> Param {
    match json {
        JsonValue::Object(map) => {
            if let (1, Some(JsonValue::String(id))) = (map.len(), map.get(ENTRY_MARKER)) {
                return Param::Reference(Entry::new(id.clone()));
            }
            Param::Mapping(map.iter().map(|(k, v)| (k.clone(), param_from_json(v))).collect())
        }
        JsonValue::Array(items) => Param::Sequence(items.iter().map(param_from_json).collect()),
        other => Param::Literal(Value::from(other.clone())),
    }
}
