//! Per-cycle observers invoked by the driver before every clock edge.
//!
//! A [`CycleHook`] sees the model after the driver has set up the cycle's
//! valid/ready levels and before the edge that would consume them. Hooks only
//! get shared access to the model, so they cannot change the outcome of a
//! handshake.
//!
//! The [`TransactionMonitor`] is the hook used for characterization: it
//! appends a `1` to a stream's trace whenever valid and ready are both high,
//! and a `0` otherwise.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::io::IoDict;
use crate::model::HardwareModel;
use crate::stream::{SignalNaming, StreamPort};
use crate::types::{Cycle, Direction, StreamId};

/// Observer called once per simulated cycle, before the clock edge.
pub trait CycleHook {
    /// Inspects the model during cycle `cycle`.
    fn before_edge(&mut self, cycle: Cycle, model: &dyn HardwareModel) -> SimResult<()>;
}

impl<F> CycleHook for F
where
    F: FnMut(Cycle, &dyn HardwareModel) -> SimResult<()>,
{
    fn before_edge(&mut self, cycle: Cycle, model: &dyn HardwareModel) -> SimResult<()> {
        self(cycle, model)
    }
}

/// Selects which streams a monitor tracks by substring match on the id.
///
/// The defaults (`"in"` for inputs, `"out"` for outputs) keep auxiliary
/// streams such as weight streams out of the characterization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFilter {
    /// Substring an input stream id must contain
    pub input: String,
    /// Substring an output stream id must contain
    pub output: String,
}

impl StreamFilter {
    /// Creates a filter with custom patterns.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Returns true if a stream with this id and direction is tracked.
    pub fn matches(&self, id: &str, direction: Direction) -> bool {
        match direction {
            Direction::Input => id.contains(self.input.as_str()),
            Direction::Output => id.contains(self.output.as_str()),
        }
    }
}

impl Default for StreamFilter {
    fn default() -> Self {
        Self::new("in", "out")
    }
}

/// Per-cycle 0/1 transfer flags of one stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTrace {
    flags: Vec<u8>,
}

impl TransactionTrace {
    /// Creates an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one cycle.
    pub fn push(&mut self, transfer: bool) {
        self.flags.push(transfer as u8);
    }

    /// Number of recorded cycles.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Returns true if no cycle was recorded.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Number of cycles with a transfer.
    pub fn transactions(&self) -> u64 {
        self.flags.iter().map(|&f| f as u64).sum()
    }

    /// The raw flags.
    pub fn flags(&self) -> &[u8] {
        &self.flags
    }
}

impl From<Vec<u8>> for TransactionTrace {
    fn from(flags: Vec<u8>) -> Self {
        Self {
            flags: flags.into_iter().map(|f| (f != 0) as u8).collect(),
        }
    }
}

/// Records which tracked streams completed a handshake in each cycle.
///
/// # Example
///
/// ```
/// use axisim::io::IoDict;
/// use axisim::monitor::{StreamFilter, TransactionMonitor};
/// use axisim::stream::SignalNaming;
///
/// let io = IoDict::new()
///     .with_input("in0", vec![0; 4])
///     .with_input("weights", vec![0; 4])
///     .with_output("out");
/// let monitor = TransactionMonitor::new(&io, &SignalNaming::default(), &StreamFilter::default());
///
/// // the weight stream is not part of the characterization
/// assert_eq!(monitor.input_ids().collect::<Vec<_>>(), vec!["in0"]);
/// ```
#[derive(Debug, Default)]
pub struct TransactionMonitor {
    inputs: IndexMap<StreamId, (StreamPort, TransactionTrace)>,
    outputs: IndexMap<StreamId, (StreamPort, TransactionTrace)>,
}

impl TransactionMonitor {
    /// Tracks every stream of `io` accepted by `filter`.
    pub fn new(io: &IoDict, naming: &SignalNaming, filter: &StreamFilter) -> Self {
        let track = |id: &StreamId, direction: Direction| {
            (
                id.clone(),
                (StreamPort::new(id.clone(), direction, naming), TransactionTrace::new()),
            )
        };
        Self {
            inputs: io
                .inputs
                .keys()
                .filter(|id| filter.matches(id, Direction::Input))
                .map(|id| track(id, Direction::Input))
                .collect(),
            outputs: io
                .outputs
                .keys()
                .filter(|id| filter.matches(id, Direction::Output))
                .map(|id| track(id, Direction::Output))
                .collect(),
        }
    }

    /// Ids of the tracked input streams, in insertion order.
    pub fn input_ids(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(|k| k.as_str())
    }

    /// Ids of the tracked output streams, in insertion order.
    pub fn output_ids(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(|k| k.as_str())
    }

    /// Returns the trace recorded so far for a stream.
    pub fn trace(&self, id: &str) -> Option<&TransactionTrace> {
        self.inputs
            .get(id)
            .or_else(|| self.outputs.get(id))
            .map(|(_, trace)| trace)
    }

    /// Consumes the monitor, returning the input and output traces.
    pub fn into_traces(
        self,
    ) -> (
        IndexMap<StreamId, TransactionTrace>,
        IndexMap<StreamId, TransactionTrace>,
    ) {
        let strip = |map: IndexMap<StreamId, (StreamPort, TransactionTrace)>| {
            map.into_iter().map(|(id, (_, trace))| (id, trace)).collect()
        };
        (strip(self.inputs), strip(self.outputs))
    }
}

impl CycleHook for TransactionMonitor {
    fn before_edge(&mut self, _cycle: Cycle, model: &dyn HardwareModel) -> SimResult<()> {
        for (port, trace) in self.inputs.values_mut().chain(self.outputs.values_mut()) {
            trace.push(port.is_transfer(model)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EchoPipeline;

    #[test]
    fn test_filter_defaults() {
        let filter = StreamFilter::default();
        assert!(filter.matches("in0", Direction::Input));
        assert!(!filter.matches("weights", Direction::Input));
        assert!(filter.matches("out", Direction::Output));
        assert!(!filter.matches("in0", Direction::Output));
    }

    #[test]
    fn test_monitor_records_transfers() {
        let naming = SignalNaming::default();
        let mut model = EchoPipeline::new(&naming, 1);
        let io = IoDict::new().with_input("in0", vec![1]).with_output("out");
        let mut monitor = TransactionMonitor::new(&io, &naming, &StreamFilter::default());

        model.write("in0_V_TVALID", 1).unwrap();
        monitor.before_edge(0, &model).unwrap();
        model.write("in0_V_TVALID", 0).unwrap();
        monitor.before_edge(1, &model).unwrap();

        assert_eq!(monitor.trace("in0").unwrap().flags(), &[1, 0]);
        assert_eq!(monitor.trace("out").unwrap().flags(), &[0, 0]);

        let (inputs, outputs) = monitor.into_traces();
        assert_eq!(inputs["in0"].transactions(), 1);
        assert_eq!(outputs["out"].len(), 2);
    }

    #[test]
    fn test_closure_hook() {
        let naming = SignalNaming::default();
        let model = EchoPipeline::new(&naming, 1);
        let mut seen = Vec::new();
        {
            let mut hook = |cycle: Cycle, _model: &dyn HardwareModel| -> SimResult<()> {
                seen.push(cycle);
                Ok(())
            };
            hook.before_edge(3, &model).unwrap();
        }
        assert_eq!(seen, vec![3]);
    }

    #[test]
    fn test_trace_from_flags() {
        let trace = TransactionTrace::from(vec![0, 2, 1]);
        assert_eq!(trace.flags(), &[0, 1, 1]);
        assert_eq!(trace.transactions(), 2);
    }
}
