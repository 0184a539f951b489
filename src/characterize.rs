//! Characteristic-function derivation.
//!
//! A node's characteristic function describes its steady-state I/O cadence:
//! for every tracked stream, the cumulative number of handshake transfers as
//! a function of the cycle index, over two concatenated periods. Downstream
//! buffer-sizing analysis reads these curves to size the FIFOs between nodes.
//!
//! # Algorithm
//!
//! 1. Check that a model is attached and that no characterization exists.
//! 2. Estimate the minimum cycle count and reject periods below it.
//! 3. Run the handshake driver with a [`TransactionMonitor`] attached and
//!    the liveness threshold set to the period.
//! 4. Right-pad every trace with idle cycles up to exactly one period.
//! 5. Accumulate each padded trace over two periods:
//!    `curve[0] = trace[0]`, `curve[t] = curve[t-1] + trace[t mod period]`.
//!
//! # Example
//!
//! ```
//! use axisim::characterize::accumulate;
//!
//! let curve = accumulate(&[1, 1, 0, 0]);
//! assert_eq!(curve, vec![1, 2, 2, 2, 3, 4, 4, 4]);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::driver::{DriverConfig, HandshakeDriver};
use crate::error::{SimError, SimResult};
use crate::io::IoDict;
use crate::monitor::{StreamFilter, TransactionMonitor, TransactionTrace};
use crate::node::StreamNode;
use crate::stats::CharacterizationReport;
use crate::stream::StreamSet;
use crate::types::{Cycle, StreamId};

/// Input stream fed by the default stimulus.
pub const DEFAULT_INPUT_STREAM: &str = "in0";
/// Output stream collected by the default stimulus.
pub const DEFAULT_OUTPUT_STREAM: &str = "out";

/// Right-pads a trace with zero flags up to `period` entries.
///
/// Returns the padded flags and the number of flags added. A trace longer
/// than `period` is truncated and reports no padding.
pub fn pad_trace(trace: &TransactionTrace, period: usize) -> (Vec<u8>, Cycle) {
    let mut flags = trace.flags().to_vec();
    let padding = period.saturating_sub(flags.len());
    flags.resize(period, 0);
    (flags, padding as Cycle)
}

/// Accumulates a one-period trace over two periods.
pub fn accumulate(trace: &[u8]) -> Vec<Cycle> {
    let period = trace.len();
    let mut curve = Vec::with_capacity(2 * period);
    let mut total: Cycle = 0;
    for t in 0..2 * period {
        total += trace[t % period] as Cycle;
        curve.push(total);
    }
    curve
}

/// The characteristic curve of one stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCharacteristic {
    /// Cumulative transfers, `2 × period` entries
    pub curve: Vec<Cycle>,
    /// Idle flags appended because the run finished before the period ended
    pub padding: Cycle,
}

impl StreamCharacteristic {
    /// Pads and accumulates a raw trace.
    pub fn from_trace(trace: &TransactionTrace, period: Cycle) -> Self {
        let (padded, padding) = pad_trace(trace, period as usize);
        Self {
            curve: accumulate(&padded),
            padding,
        }
    }

    /// Number of transfers in one period.
    pub fn transactions_per_period(&self) -> Cycle {
        let period = self.curve.len() / 2;
        if period == 0 {
            return 0;
        }
        self.curve[period - 1]
    }
}

/// Persisted characterization of a node.
///
/// Streams appear in the order they were tracked during the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicFunction {
    /// Period the node was characterized for
    pub period: Cycle,
    /// Input stream curves
    pub inputs: IndexMap<StreamId, StreamCharacteristic>,
    /// Output stream curves
    pub outputs: IndexMap<StreamId, StreamCharacteristic>,
}

impl CharacteristicFunction {
    /// Builds the curves of every traced stream.
    pub fn from_traces(
        period: Cycle,
        inputs: &IndexMap<StreamId, TransactionTrace>,
        outputs: &IndexMap<StreamId, TransactionTrace>,
    ) -> Self {
        let build = |traces: &IndexMap<StreamId, TransactionTrace>| {
            traces
                .iter()
                .map(|(id, trace)| (id.clone(), StreamCharacteristic::from_trace(trace, period)))
                .collect()
        };
        Self {
            period,
            inputs: build(inputs),
            outputs: build(outputs),
        }
    }

    /// Curves of the input streams.
    pub fn input_curves(&self) -> Vec<&[Cycle]> {
        self.inputs.values().map(|c| c.curve.as_slice()).collect()
    }

    /// Curves of the output streams.
    pub fn output_curves(&self) -> Vec<&[Cycle]> {
        self.outputs.values().map(|c| c.curve.as_slice()).collect()
    }

    /// Padding counts of the input streams.
    pub fn pads_in(&self) -> Vec<Cycle> {
        self.inputs.values().map(|c| c.padding).collect()
    }

    /// Padding counts of the output streams.
    pub fn pads_out(&self) -> Vec<Cycle> {
        self.outputs.values().map(|c| c.padding).collect()
    }
}

/// Lower bound used when a node provides no cycle estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleFallback {
    /// Smaller of the folded input and output volumes
    #[default]
    MinFolded,
    /// No lower bound; every positive period is accepted
    Disabled,
}

/// Settings of the characterization run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterizationConfig {
    /// Lower bound used when the node has no cycle estimate
    #[serde(default)]
    pub fallback: CycleFallback,
    /// Streams tracked by the transaction monitor
    #[serde(default)]
    pub filter: StreamFilter,
    /// Reset the model before the run
    #[serde(default = "default_reset_before_run")]
    pub reset_before_run: bool,
}

fn default_reset_before_run() -> bool {
    true
}

impl Default for CharacterizationConfig {
    fn default() -> Self {
        Self {
            fallback: CycleFallback::default(),
            filter: StreamFilter::default(),
            reset_before_run: default_reset_before_run(),
        }
    }
}

/// Result of a characterization request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CharacterizeOutcome {
    /// Curves were derived and stored on the node
    Derived(CharacterizationReport),
    /// The node already had a characterization for this period; nothing changed
    AlreadyCharacterized { period: Cycle },
}

impl CharacterizeOutcome {
    /// Returns true if new curves were stored.
    pub fn is_derived(&self) -> bool {
        matches!(self, CharacterizeOutcome::Derived(_))
    }
}

/// Derives characteristic functions for nodes.
#[derive(Clone, Debug, Default)]
pub struct Characterizer {
    config: CharacterizationConfig,
}

impl Characterizer {
    /// Creates a characterizer with the given settings.
    pub fn new(config: CharacterizationConfig) -> Self {
        Self { config }
    }

    /// Returns the settings.
    pub fn config(&self) -> &CharacterizationConfig {
        &self.config
    }

    /// Minimum number of cycles the node needs to produce its outputs.
    pub fn expected_cycles(&self, node: &StreamNode) -> Cycle {
        if node.exp_cycles() > 0 {
            return node.exp_cycles();
        }
        match self.config.fallback {
            CycleFallback::MinFolded => {
                node.folded_input_count().min(node.folded_output_count()) as Cycle
            }
            CycleFallback::Disabled => 0,
        }
    }

    /// Zero-valued stimulus covering the node's folded input volume.
    pub fn default_stimulus(node: &StreamNode) -> IoDict {
        IoDict::new()
            .with_input(DEFAULT_INPUT_STREAM, vec![0; node.folded_input_count()])
            .with_output(DEFAULT_OUTPUT_STREAM)
    }

    /// Characterizes `node` over `period` cycles.
    ///
    /// `stimulus` replaces the default zero stimulus. On any error the
    /// node's characterization is left untouched.
    pub fn characterize(
        &self,
        node: &mut StreamNode,
        period: Cycle,
        stimulus: Option<IoDict>,
    ) -> SimResult<CharacterizeOutcome> {
        if period == 0 {
            return Err(SimError::InvalidRun(
                "characterization period must be at least one cycle".to_string(),
            ));
        }
        if !node.is_ready() {
            return Err(SimError::NotReady {
                node: node.name().to_string(),
            });
        }
        if let Some(existing) = node.characteristic() {
            if existing.period > 0 {
                warn!(
                    "Skipping node {}: already has a characteristic for period {}",
                    node.name(),
                    existing.period
                );
                return Ok(CharacterizeOutcome::AlreadyCharacterized {
                    period: existing.period,
                });
            }
        }

        let expected = self.expected_cycles(node);
        if expected > period {
            return Err(SimError::PeriodTooShort {
                node: node.name().to_string(),
                period,
                expected,
            });
        }

        let mut io = stimulus.unwrap_or_else(|| Self::default_stimulus(node));
        let target = node.number_output_values();
        let naming = node.driver_config().naming.clone();
        let streams = StreamSet::from_io(&io, &naming);
        let mut monitor = TransactionMonitor::new(&io, &naming, &self.config.filter);
        let driver = HandshakeDriver::new(DriverConfig::new(period).with_naming(naming));

        debug!(
            "Characterizing {} over period {} (expects >= {} cycles, {} outputs)",
            node.name(),
            period,
            expected,
            target
        );

        let name = node.name().to_string();
        let model = node
            .model_mut()
            .ok_or_else(|| SimError::NotReady { node: name.clone() })?;
        // every stream must resolve before reset drives the model
        streams.validate(model)?;
        if self.config.reset_before_run {
            model.reset()?;
        }
        let run = driver.run_with_hook(model, &mut io, target, Some(&mut monitor))?;
        if run.cycles > period {
            return Err(SimError::CharacterizationOverrun {
                cycles: run.cycles,
                period,
            });
        }

        let (inputs, outputs) = monitor.into_traces();
        let characteristic = CharacteristicFunction::from_traces(period, &inputs, &outputs);
        let report = CharacterizationReport::new(&name, expected, &run, &characteristic);
        node.set_characteristic(characteristic);

        info!(
            "Characterized {} in {} cycles (period {})",
            name, run.cycles, period
        );
        Ok(CharacterizeOutcome::Derived(report))
    }
}
