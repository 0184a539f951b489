//! A named-port signal store shared by the built-in models.

use indexmap::IndexMap;

use crate::error::{SimError, SimResult};
use crate::stream::{SignalNaming, StreamSignal};
use crate::types::SignalValue;

/// Holds the current level of every declared port of a model.
///
/// Reads and writes of undeclared ports fail with
/// [`SimError::UnknownSignal`], which is how the built-in models enforce
/// that stream signal names resolve to real ports.
#[derive(Clone, Debug, Default)]
pub struct SignalBank {
    values: IndexMap<String, SignalValue>,
}

impl SignalBank {
    /// Creates an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a port, initialized to zero.
    pub fn declare(&mut self, name: impl Into<String>) {
        self.values.entry(name.into()).or_insert(0);
    }

    /// Declares the `TDATA`/`TVALID`/`TREADY` ports of a stream.
    pub fn declare_stream(&mut self, naming: &SignalNaming, stream: &str) {
        for signal in StreamSignal::ALL {
            self.declare(naming.signal_name(stream, signal));
        }
    }

    /// Returns the current level of a port.
    pub fn get(&self, name: &str) -> SimResult<SignalValue> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownSignal(name.to_string()))
    }

    /// Drives a port.
    pub fn set(&mut self, name: &str, value: SignalValue) -> SimResult<()> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(SimError::UnknownSignal(name.to_string())),
        }
    }

    /// Returns true if the port was declared.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns true if the port is declared and driven to `1`.
    pub fn is_high(&self, name: &str) -> bool {
        self.values.get(name).copied() == Some(1)
    }

    /// Drives every port back to zero.
    pub fn clear(&mut self) {
        for value in self.values.values_mut() {
            *value = 0;
        }
    }

    /// Returns the declared port names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Returns the number of declared ports.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no port was declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
