//! The multi-stream valid/ready handshake driver.
//!
//! A single-stream run is simply the case of one input and one output
//! stream; there is no separate code path for it.

use tracing::{debug, error, trace, warn};

use crate::driver::liveness::LivenessWatchdog;
use crate::driver::DriverConfig;
use crate::error::{SimError, SimResult};
use crate::io::IoDict;
use crate::model::HardwareModel;
use crate::monitor::CycleHook;
use crate::stats::RunReport;
use crate::stream::StreamSet;
use crate::trace::WaveformTrace;
use crate::types::{Cycle, SignalValue};

/// Counters scoped to one driver invocation.
#[derive(Debug)]
struct RunState {
    cycles: Cycle,
    captured: usize,
    watchdog: LivenessWatchdog,
    input_transfers: Vec<u64>,
    output_transfers: Vec<u64>,
}

impl RunState {
    fn new(streams: &StreamSet, threshold: Cycle) -> Self {
        Self {
            cycles: 0,
            captured: 0,
            watchdog: LivenessWatchdog::new(threshold, 0),
            input_transfers: vec![0; streams.inputs.len()],
            output_transfers: vec![0; streams.outputs.len()],
        }
    }
}

/// Feeds input streams and collects output streams of a hardware model.
///
/// The driver is stateless between runs: everything a run counts lives in a
/// local state record, so one driver can be reused for any number of
/// models and runs.
///
/// # Example
///
/// ```rust
/// use axisim::driver::{DriverConfig, HandshakeDriver};
/// use axisim::io::IoDict;
/// use axisim::models::EchoPipeline;
/// use axisim::stream::SignalNaming;
///
/// let mut model = EchoPipeline::new(&SignalNaming::default(), 2);
/// let mut io = IoDict::new().with_input("in0", vec![1, 2, 3]).with_output("out");
///
/// let driver = HandshakeDriver::new(DriverConfig::new(100));
/// let report = driver.run(&mut model, &mut io, 3).unwrap();
///
/// assert_eq!(io.output("out"), Some(&[1, 2, 3][..]));
/// assert_eq!(report.cycles, 5);
/// ```
#[derive(Clone, Debug, Default)]
pub struct HandshakeDriver {
    config: DriverConfig,
}

impl HandshakeDriver {
    /// Creates a driver with the given configuration.
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Returns the driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Runs until `target_count` output values have been captured.
    pub fn run(
        &self,
        model: &mut dyn HardwareModel,
        io: &mut IoDict,
        target_count: usize,
    ) -> SimResult<RunReport> {
        self.run_with_hook(model, io, target_count, None)
    }

    /// Runs until `target_count` output values have been captured, calling
    /// `hook` once per cycle before the clock edge.
    ///
    /// Every stream in `io` is driven. Captured values are appended to the
    /// output sequences of `io` and accepted values are removed from the
    /// front of its input sequences.
    ///
    /// # Errors
    ///
    /// - [`SimError::UnknownSignal`] if a stream has no matching model ports
    /// - [`SimError::LivenessTimeout`] if no output is captured for
    ///   `liveness_threshold` consecutive cycles
    /// - [`SimError::Trace`] if the waveform trace cannot be written
    pub fn run_with_hook(
        &self,
        model: &mut dyn HardwareModel,
        io: &mut IoDict,
        target_count: usize,
        mut hook: Option<&mut dyn CycleHook>,
    ) -> SimResult<RunReport> {
        if self.config.liveness_threshold == 0 {
            return Err(SimError::InvalidRun(
                "liveness threshold must be at least one cycle".to_string(),
            ));
        }
        let streams = StreamSet::from_io(io, &self.config.naming);
        if streams.outputs.is_empty() && target_count > 0 {
            return Err(SimError::InvalidRun(format!(
                "no output stream to collect {} values from",
                target_count
            )));
        }
        streams.validate(model)?;

        let mut waveform = match &self.config.trace_path {
            Some(path) => Some(WaveformTrace::create(path, &streams)?),
            None => None,
        };

        debug!(
            "Driving {} input / {} output streams until {} outputs (liveness threshold {})",
            streams.inputs.len(),
            streams.outputs.len(),
            target_count,
            self.config.liveness_threshold
        );

        let result = self.drive(model, io, &streams, target_count, &mut hook, &mut waveform);

        if let Some(waveform) = waveform {
            let closed = waveform.finish();
            if let Err(err) = &closed {
                warn!("Failed to close waveform trace: {}", err);
            }
            if result.is_ok() {
                closed?;
            }
        }

        result
    }

    fn drive(
        &self,
        model: &mut dyn HardwareModel,
        io: &mut IoDict,
        streams: &StreamSet,
        target_count: usize,
        hook: &mut Option<&mut dyn CycleHook>,
        waveform: &mut Option<WaveformTrace>,
    ) -> SimResult<RunReport> {
        let mut state = RunState::new(streams, self.config.liveness_threshold);

        while state.captured < target_count {
            self.step(model, io, streams, hook, waveform, &mut state)?;
            if let Err(err) = state.watchdog.observe(state.cycles, state.captured) {
                error!(
                    "No output progress for {} cycles (cycle {}, {}/{} outputs captured)",
                    self.config.liveness_threshold, state.cycles, state.captured, target_count
                );
                return Err(err);
            }
        }

        debug!(
            "Run complete: {} outputs in {} cycles",
            state.captured, state.cycles
        );

        Ok(RunReport {
            cycles: state.cycles,
            target_count,
            input_transfers: streams
                .inputs
                .iter()
                .map(|p| p.id.clone())
                .zip(state.input_transfers)
                .collect(),
            output_transfers: streams
                .outputs
                .iter()
                .map(|p| p.id.clone())
                .zip(state.output_transfers)
                .collect(),
        })
    }

    /// Executes one cycle.
    fn step(
        &self,
        model: &mut dyn HardwareModel,
        io: &mut IoDict,
        streams: &StreamSet,
        hook: &mut Option<&mut dyn CycleHook>,
        waveform: &mut Option<WaveformTrace>,
        state: &mut RunState,
    ) -> SimResult<()> {
        for port in &streams.inputs {
            let next = io.inputs.get(&port.id).and_then(|q| q.front().copied());
            model.write(&port.valid, next.is_some() as SignalValue)?;
            model.write(&port.data, next.unwrap_or(0))?;
        }
        for port in &streams.outputs {
            model.write(&port.ready, 1)?;
        }

        if let Some(hook) = hook.as_mut() {
            hook.before_edge(state.cycles, &*model)?;
        }

        for (index, port) in streams.inputs.iter().enumerate() {
            if port.is_transfer(&*model)? {
                if let Some(queue) = io.inputs.get_mut(&port.id) {
                    queue.pop_front();
                }
                state.input_transfers[index] += 1;
                trace!("cycle {}: {} accepted", state.cycles, port.id);
            }
        }
        for (index, port) in streams.outputs.iter().enumerate() {
            if port.is_transfer(&*model)? {
                let value = model.read(&port.data)?;
                if let Some(captured) = io.outputs.get_mut(&port.id) {
                    captured.push(value);
                }
                state.output_transfers[index] += 1;
                state.captured += 1;
                trace!("cycle {}: {} produced {:#x}", state.cycles, port.id, value);
            }
        }

        if let Some(waveform) = waveform.as_mut() {
            waveform.record(state.cycles, &*model, streams)?;
        }

        model.advance_clock();
        state.cycles += 1;
        Ok(())
    }
}
