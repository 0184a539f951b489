//! Stream ports: the data/valid/ready signal triple behind a logical stream.
//!
//! Every logical stream (`"in0"`, `"out"`, ...) maps onto three model
//! signals named `{stream_id}{separator}{TDATA|TVALID|TREADY}`. With the
//! default separator `_V_` the data signal of stream `out` is
//! `out_V_TDATA`.
//!
//! # Example
//!
//! ```
//! use axisim::stream::{SignalNaming, StreamPort};
//! use axisim::types::Direction;
//!
//! let naming = SignalNaming::default();
//! let port = StreamPort::new("in0", Direction::Input, &naming);
//! assert_eq!(port.data, "in0_V_TDATA");
//! assert_eq!(port.valid, "in0_V_TVALID");
//! assert_eq!(port.ready, "in0_V_TREADY");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::io::IoDict;
use crate::model::HardwareModel;
use crate::types::{Direction, StreamId};

/// Default separator between a stream id and its signal suffix.
pub const DEFAULT_SEPARATOR: &str = "_V_";

/// One of the three handshake signals of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamSignal {
    Data,
    Valid,
    Ready,
}

impl StreamSignal {
    /// All three signals, in declaration order.
    pub const ALL: [StreamSignal; 3] = [StreamSignal::Data, StreamSignal::Valid, StreamSignal::Ready];

    /// The AXI-Stream suffix for this signal.
    pub fn suffix(&self) -> &'static str {
        match self {
            StreamSignal::Data => "TDATA",
            StreamSignal::Valid => "TVALID",
            StreamSignal::Ready => "TREADY",
        }
    }
}

/// Builds signal names from stream ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalNaming {
    /// Token placed between the stream id and the signal suffix
    pub separator: String,
}

impl SignalNaming {
    /// Creates a naming scheme with a custom separator.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Returns the full signal name for `signal` on `stream`.
    pub fn signal_name(&self, stream: &str, signal: StreamSignal) -> String {
        format!("{}{}{}", stream, self.separator, signal.suffix())
    }
}

impl Default for SignalNaming {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

/// A logical stream and the resolved names of its three signals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamPort {
    /// Logical stream id
    pub id: StreamId,
    /// Input or output, from the model's point of view
    pub direction: Direction,
    /// `TDATA` signal name
    pub data: String,
    /// `TVALID` signal name
    pub valid: String,
    /// `TREADY` signal name
    pub ready: String,
}

impl StreamPort {
    /// Resolves the signal names of `id` using `naming`.
    pub fn new(id: impl Into<StreamId>, direction: Direction, naming: &SignalNaming) -> Self {
        let id = id.into();
        Self {
            data: naming.signal_name(&id, StreamSignal::Data),
            valid: naming.signal_name(&id, StreamSignal::Valid),
            ready: naming.signal_name(&id, StreamSignal::Ready),
            id,
            direction,
        }
    }

    /// Returns the signal name for one of the three handshake signals.
    pub fn signal(&self, signal: StreamSignal) -> &str {
        match signal {
            StreamSignal::Data => &self.data,
            StreamSignal::Valid => &self.valid,
            StreamSignal::Ready => &self.ready,
        }
    }

    /// Returns true if valid and ready are both `1` right now.
    pub fn is_transfer(&self, model: &dyn HardwareModel) -> SimResult<bool> {
        Ok(model.read(&self.valid)? == 1 && model.read(&self.ready)? == 1)
    }

    /// Fails if any of the three signals is missing from `model`.
    pub fn validate(&self, model: &dyn HardwareModel) -> SimResult<()> {
        for signal in StreamSignal::ALL {
            let name = self.signal(signal);
            if !model.has_signal(name) {
                return Err(SimError::UnknownSignal(name.to_string()));
            }
        }
        Ok(())
    }
}

/// The input and output streams serviced by one driver run.
#[derive(Clone, Debug, Default)]
pub struct StreamSet {
    /// Streams the driver feeds, in insertion order
    pub inputs: Vec<StreamPort>,
    /// Streams the driver collects, in insertion order
    pub outputs: Vec<StreamPort>,
}

impl StreamSet {
    /// Builds one port per stream key of `io`.
    pub fn from_io(io: &IoDict, naming: &SignalNaming) -> Self {
        Self {
            inputs: io
                .inputs
                .keys()
                .map(|id| StreamPort::new(id.clone(), Direction::Input, naming))
                .collect(),
            outputs: io
                .outputs
                .keys()
                .map(|id| StreamPort::new(id.clone(), Direction::Output, naming))
                .collect(),
        }
    }

    /// Iterates over all ports, inputs first.
    pub fn iter(&self) -> impl Iterator<Item = &StreamPort> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Returns the total number of streams.
    pub fn len(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    /// Returns true if the set contains no stream.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    /// Fails on the first stream whose signals are missing from `model`.
    pub fn validate(&self, model: &dyn HardwareModel) -> SimResult<()> {
        self.iter().try_for_each(|port| port.validate(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EchoPipeline;

    #[test]
    fn test_custom_separator() {
        let naming = SignalNaming::new("_");
        assert_eq!(naming.signal_name("out", StreamSignal::Ready), "out_TREADY");
    }

    #[test]
    fn test_stream_set_from_io() {
        let io = IoDict::new()
            .with_input("in0", vec![1, 2])
            .with_input("in1", vec![3])
            .with_output("out");
        let set = StreamSet::from_io(&io, &SignalNaming::default());

        assert_eq!(set.len(), 3);
        assert_eq!(set.inputs[1].id, "in1");
        assert_eq!(set.outputs[0].direction, Direction::Output);
        assert_eq!(set.iter().count(), 3);
    }

    #[test]
    fn test_validate_against_model() {
        let naming = SignalNaming::default();
        let model = EchoPipeline::new(&naming, 1);

        let good = StreamPort::new("in0", Direction::Input, &naming);
        assert!(good.validate(&model).is_ok());

        let bad = StreamPort::new("in7", Direction::Input, &naming);
        match bad.validate(&model) {
            Err(SimError::UnknownSignal(name)) => assert_eq!(name, "in7_V_TDATA"),
            other => panic!("expected UnknownSignal, got {:?}", other),
        }
    }
}
