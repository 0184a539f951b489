//! The `IoDict`: per-stream stimulus and captured results of one run.

use std::collections::VecDeque;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::types::{SignalValue, StreamId};

/// Maps each stream id to its pending (inputs) or captured (outputs) values.
///
/// The driver mutates an `IoDict` in place: an input sequence shrinks from
/// the front on every accepted transfer and an output sequence grows at the
/// back on every captured transfer. Stream order is insertion order and is
/// the order streams are serviced and reported in.
///
/// # Example
///
/// ```
/// use axisim::io::IoDict;
///
/// let io = IoDict::new()
///     .with_input("in0", vec![0; 4])
///     .with_output("out");
/// assert_eq!(io.pending_inputs(), 4);
/// assert_eq!(io.total_outputs(), 0);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoDict {
    /// Values still to be offered, per input stream
    #[serde(default)]
    pub inputs: IndexMap<StreamId, VecDeque<SignalValue>>,
    /// Values captured so far, per output stream
    #[serde(default)]
    pub outputs: IndexMap<StreamId, Vec<SignalValue>>,
}

impl IoDict {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input stream with the values to offer.
    pub fn with_input(
        mut self,
        id: impl Into<StreamId>,
        values: impl IntoIterator<Item = SignalValue>,
    ) -> Self {
        self.inputs.insert(id.into(), values.into_iter().collect());
        self
    }

    /// Adds an (initially empty) output stream.
    pub fn with_output(mut self, id: impl Into<StreamId>) -> Self {
        self.outputs.insert(id.into(), Vec::new());
        self
    }

    /// Returns the pending values of an input stream.
    pub fn input(&self, id: &str) -> Option<&VecDeque<SignalValue>> {
        self.inputs.get(id)
    }

    /// Returns the captured values of an output stream.
    pub fn output(&self, id: &str) -> Option<&[SignalValue]> {
        self.outputs.get(id).map(|v| v.as_slice())
    }

    /// Total number of values still to be offered across all inputs.
    pub fn pending_inputs(&self) -> usize {
        self.inputs.values().map(|v| v.len()).sum()
    }

    /// Total number of values captured across all outputs.
    pub fn total_outputs(&self) -> usize {
        self.outputs.values().map(|v| v.len()).sum()
    }

    /// Removes and returns the captured values of an output stream.
    pub fn take_output(&mut self, id: &str) -> Option<Vec<SignalValue>> {
        self.outputs.get_mut(id).map(std::mem::take)
    }

    /// Like [`take_output`](Self::take_output), but a missing stream is an error.
    pub fn take_captured(&mut self, id: &str) -> SimResult<Vec<SignalValue>> {
        self.take_output(id)
            .ok_or_else(|| SimError::UnknownStream(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let io = IoDict::new()
            .with_input("in1", vec![1])
            .with_input("in0", vec![2])
            .with_input("weights", vec![3]);
        let keys: Vec<&String> = io.inputs.keys().collect();
        assert_eq!(keys, vec!["in1", "in0", "weights"]);
    }

    #[test]
    fn test_take_output() {
        let mut io = IoDict::new().with_output("out");
        io.outputs.get_mut("out").unwrap().extend([7, 8]);
        assert_eq!(io.total_outputs(), 2);

        assert_eq!(io.take_output("out"), Some(vec![7, 8]));
        assert_eq!(io.total_outputs(), 0);
        assert_eq!(io.take_output("missing"), None);
    }

    #[test]
    fn test_take_captured_unknown_stream() {
        let mut io = IoDict::new().with_output("out");
        io.outputs.get_mut("out").unwrap().push(5);

        assert_eq!(io.take_captured("out").unwrap(), vec![5]);
        assert!(matches!(
            io.take_captured("out1"),
            Err(SimError::UnknownStream(id)) if id == "out1"
        ));
    }

    #[test]
    fn test_yaml_stimulus() {
        let yaml = r#"
inputs:
  in0: [1, 2, 3]
outputs:
  out: []
"#;
        let io: IoDict = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(io.input("in0").unwrap().len(), 3);
        assert_eq!(io.output("out"), Some(&[][..]));
    }
}
