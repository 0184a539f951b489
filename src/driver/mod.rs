//! Driving hardware models through the valid/ready stream handshake.
//!
//! The [`HandshakeDriver`] services any number of input and output streams
//! of a [`HardwareModel`](crate::model::HardwareModel) in lock-step, one
//! clock cycle at a time, until a target number of output values has been
//! captured. The [`LivenessWatchdog`] turns a stalled run into a
//! [`SimError::LivenessTimeout`](crate::error::SimError::LivenessTimeout)
//! instead of a hang.
//!
//! # Cycle Order
//!
//! Every cycle runs the same strictly ordered steps:
//!
//! 1. Inputs with pending values assert valid and present the front value;
//!    exhausted inputs drive valid and data to zero.
//! 2. Every output asserts ready (the driver never throttles outputs).
//! 3. The optional [`CycleHook`](crate::monitor::CycleHook) observes the model.
//! 4. Inputs with valid and ready high pop their front value.
//! 5. Outputs with valid and ready high capture the current data.
//! 6. The clock advances by one edge and the cycle counter increments.

pub mod handshake;
pub mod liveness;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::stream::SignalNaming;
use crate::types::Cycle;

pub use handshake::HandshakeDriver;
pub use liveness::LivenessWatchdog;

/// Liveness threshold used when none is configured.
pub const DEFAULT_LIVENESS_THRESHOLD: Cycle = 10_000;

/// Per-run settings of the handshake driver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Consecutive cycles without output progress before aborting
    pub liveness_threshold: Cycle,
    /// How stream ids map onto model signal names
    pub naming: SignalNaming,
    /// Write a VCD waveform of the run to this path
    #[serde(default)]
    pub trace_path: Option<PathBuf>,
}

impl DriverConfig {
    /// Creates a configuration with the given liveness threshold.
    pub fn new(liveness_threshold: Cycle) -> Self {
        Self {
            liveness_threshold,
            ..Self::default()
        }
    }

    /// Sets the signal naming scheme.
    pub fn with_naming(mut self, naming: SignalNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Enables VCD tracing to `path`.
    pub fn with_trace(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_path = Some(path.into());
        self
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            liveness_threshold: DEFAULT_LIVENESS_THRESHOLD,
            naming: SignalNaming::default(),
            trace_path: None,
        }
    }
}
