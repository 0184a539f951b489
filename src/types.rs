//! Core type definitions for the co-simulation driver.
//!
//! This module defines the fundamental types shared by the driver, the
//! transaction monitor and the characteristic-function deriver.

use serde::{Deserialize, Serialize};

/// Simulated clock cycle index (or a count of cycles).
///
/// All traces, curves and liveness counters are expressed in cycles of the
/// single clock that drives the hardware model.
pub type Cycle = u64;

/// Value carried on a signal.
///
/// Control signals (`TVALID`, `TREADY`) only ever hold `0` or `1`; data
/// signals carry the packed word presented on `TDATA`.
pub type SignalValue = u64;

/// Logical identifier of a stream, e.g. `"in0"` or `"out"`.
pub type StreamId = String;

/// Direction of a stream as seen from the hardware model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Driver produces, model consumes (`s_axis` on the model).
    Input,
    /// Model produces, driver consumes (`m_axis` on the model).
    Output,
}

impl Direction {
    /// Returns a short lowercase label for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}
