//! Model factory registry for configuration-driven node setup.
//!
//! The registry maps a model type name to a factory, so a config file can
//! describe nodes without code changes.
//!
//! # Example
//!
//! ```
//! use axisim::registry::ModelRegistry;
//! use axisim::models::EchoPipeline;
//! use std::collections::HashMap;
//!
//! let mut registry = ModelRegistry::new();
//! registry.register("Echo", |naming, _attrs| Ok(Box::new(EchoPipeline::new(naming, 1))));
//!
//! let model = registry
//!     .create("Echo", &Default::default(), &HashMap::new())
//!     .unwrap();
//! assert!(model.has_signal("out_V_TDATA"));
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::error::{SimError, SimResult};
use crate::model::HardwareModel;
use crate::models::{EchoPipeline, JoinModel, StuckModel};
use crate::stream::SignalNaming;

/// Type alias for model factory functions.
pub type ModelFactory = Arc<
    dyn Fn(&SignalNaming, &HashMap<String, String>) -> SimResult<Box<dyn HardwareModel>>
        + Send
        + Sync,
>;

/// A registry for hardware model factories.
#[derive(Default)]
pub struct ModelRegistry {
    factories: HashMap<String, ModelFactory>,
}

impl ModelRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model factory with the given name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&SignalNaming, &HashMap<String, String>) -> SimResult<Box<dyn HardwareModel>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Creates a model instance by type name.
    ///
    /// # Errors
    ///
    /// A validation error if the type is not registered, or whatever the
    /// factory reports for bad attributes.
    pub fn create(
        &self,
        type_name: &str,
        naming: &SignalNaming,
        attrs: &HashMap<String, String>,
    ) -> SimResult<Box<dyn HardwareModel>> {
        let factory = self.factories.get(type_name).ok_or_else(|| {
            SimError::Config(ConfigError::Validation(format!(
                "Unknown model type: {}",
                type_name
            )))
        })?;
        factory(naming, attrs)
    }

    /// Returns true if a type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns an iterator over registered type names.
    pub fn type_names(&self) -> impl Iterator<Item = &String> {
        self.factories.keys()
    }

    /// Unregisters a model type.
    pub fn unregister(&mut self, type_name: &str) -> bool {
        self.factories.remove(type_name).is_some()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("registered_types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Parses an optional attribute, falling back to `default` when absent.
pub fn parse_attr<T: FromStr>(
    attrs: &HashMap<String, String>,
    key: &str,
    default: T,
) -> SimResult<T> {
    match attrs.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            SimError::Config(ConfigError::Validation(format!(
                "Invalid value for attribute {}: {:?}",
                key, raw
            )))
        }),
    }
}

/// Creates a default registry with the built-in models.
///
/// Includes:
/// - `Echo` - EchoPipeline (`latency`, `ii`, `capacity`, `input`, `output`)
/// - `Join` - JoinModel (`inputs` as a comma list, `output`)
/// - `Stuck` - StuckModel (`accept_inputs`)
pub fn create_default_registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();

    registry.register("Echo", |naming, attrs| {
        let latency = parse_attr(attrs, "latency", 1)?;
        let input = attrs.get("input").map(String::as_str).unwrap_or("in0");
        let output = attrs.get("output").map(String::as_str).unwrap_or("out");
        let mut model = EchoPipeline::with_streams(naming, input, output, latency)
            .with_initiation_interval(parse_attr(attrs, "ii", 1)?);
        if attrs.contains_key("capacity") {
            model = model.with_capacity(parse_attr(attrs, "capacity", 1)?);
        }
        Ok(Box::new(model) as Box<dyn HardwareModel>)
    });

    registry.register("Join", |naming, attrs| {
        let inputs: Vec<&str> = attrs
            .get("inputs")
            .map(|list| list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_else(|| vec!["in0", "in1"]);
        let output = attrs.get("output").map(String::as_str).unwrap_or("out");
        Ok(Box::new(JoinModel::new(naming, &inputs, output)) as Box<dyn HardwareModel>)
    });

    registry.register("Stuck", |naming, attrs| {
        let model = StuckModel::new(naming);
        let model = if parse_attr(attrs, "accept_inputs", true)? {
            model
        } else {
            model.refusing_inputs()
        };
        Ok(Box::new(model) as Box<dyn HardwareModel>)
    });

    registry
}
