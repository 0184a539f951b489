//! Stream nodes: a hardware model plus the metadata needed to drive it.
//!
//! A [`StreamNode`] is the unit the characterizer works on. It owns its model
//! exclusively, so independent nodes can be processed on separate threads.

use std::path::PathBuf;

use tracing::debug;

use crate::characterize::{
    CharacteristicFunction, CharacterizeOutcome, Characterizer, DEFAULT_INPUT_STREAM,
    DEFAULT_OUTPUT_STREAM,
};
use crate::driver::{DriverConfig, HandshakeDriver};
use crate::error::{SimError, SimResult};
use crate::io::IoDict;
use crate::model::HardwareModel;
use crate::stats::RunReport;
use crate::types::{Cycle, SignalValue};

/// Trace setting that names the waveform after the node.
pub const DEFAULT_TRACE: &str = "default";

/// Number of folded transactions described by a folded shape.
///
/// The last dimension is the parallel width moved in one transfer, so the
/// count is the product of every other dimension. An empty shape counts as
/// zero.
pub fn folded_count(shape: &[usize]) -> usize {
    match shape.split_last() {
        Some((_, outer)) => outer.iter().product(),
        None => 0,
    }
}

/// A named hardware model with its stream shapes and characterization state.
pub struct StreamNode {
    name: String,
    folded_input_shape: Vec<usize>,
    folded_output_shape: Vec<usize>,
    exp_cycles: Cycle,
    driver: DriverConfig,
    rtlsim_trace: Option<String>,
    trace_dir: Option<PathBuf>,
    cycles_rtlsim: Option<Cycle>,
    characteristic: Option<CharacteristicFunction>,
    model: Option<Box<dyn HardwareModel>>,
}

impl StreamNode {
    /// Creates a node without a model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folded_input_shape: Vec::new(),
            folded_output_shape: Vec::new(),
            exp_cycles: 0,
            driver: DriverConfig::default(),
            rtlsim_trace: None,
            trace_dir: None,
            cycles_rtlsim: None,
            characteristic: None,
            model: None,
        }
    }

    /// Attaches a hardware model.
    pub fn with_model(mut self, model: Box<dyn HardwareModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_folded_input_shape(mut self, shape: Vec<usize>) -> Self {
        self.folded_input_shape = shape;
        self
    }

    pub fn with_folded_output_shape(mut self, shape: Vec<usize>) -> Self {
        self.folded_output_shape = shape;
        self
    }

    /// Sets the cycle estimate used as the lower bound of the period.
    pub fn with_exp_cycles(mut self, cycles: Cycle) -> Self {
        self.exp_cycles = cycles;
        self
    }

    /// Sets the driver configuration used by [`rtlsim`](Self::rtlsim).
    pub fn with_driver_config(mut self, config: DriverConfig) -> Self {
        self.driver = config;
        self
    }

    /// Enables waveform tracing; `"default"` names the file `<name>.vcd`.
    pub fn with_rtlsim_trace(mut self, trace: impl Into<String>) -> Self {
        self.rtlsim_trace = Some(trace.into());
        self
    }

    /// Directory that relative trace paths are placed in.
    pub fn with_trace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.trace_dir = Some(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if a hardware model is attached.
    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&dyn HardwareModel> {
        self.model.as_deref()
    }

    pub fn model_mut(&mut self) -> Option<&mut (dyn HardwareModel + 'static)> {
        self.model.as_deref_mut()
    }

    /// Replaces the attached model, returning the previous one.
    pub fn set_model(&mut self, model: Box<dyn HardwareModel>) -> Option<Box<dyn HardwareModel>> {
        self.model.replace(model)
    }

    pub fn exp_cycles(&self) -> Cycle {
        self.exp_cycles
    }

    pub fn driver_config(&self) -> &DriverConfig {
        &self.driver
    }

    pub fn folded_input_shape(&self) -> &[usize] {
        &self.folded_input_shape
    }

    pub fn folded_output_shape(&self) -> &[usize] {
        &self.folded_output_shape
    }

    /// Folded transactions on the input stream.
    pub fn folded_input_count(&self) -> usize {
        folded_count(&self.folded_input_shape)
    }

    /// Folded transactions on the output stream.
    pub fn folded_output_count(&self) -> usize {
        folded_count(&self.folded_output_shape)
    }

    /// Number of output values a complete run produces.
    pub fn number_output_values(&self) -> usize {
        self.folded_output_count()
    }

    /// Cycles taken by the last [`rtlsim`](Self::rtlsim) run.
    pub fn cycles_rtlsim(&self) -> Option<Cycle> {
        self.cycles_rtlsim
    }

    /// Waveform path for this node, if tracing is enabled.
    pub fn trace_path(&self) -> Option<PathBuf> {
        let trace = self.rtlsim_trace.as_deref()?;
        if trace.is_empty() {
            return None;
        }
        let file = if trace == DEFAULT_TRACE {
            PathBuf::from(format!("{}.vcd", self.name))
        } else {
            PathBuf::from(trace)
        };
        Some(match &self.trace_dir {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file,
        })
    }

    /// Resets the attached model.
    pub fn reset_rtlsim(&mut self) -> SimResult<()> {
        let name = self.name.clone();
        let model = self.model.as_deref_mut().ok_or(SimError::NotReady { node: name })?;
        model.reset()
    }

    /// Drives the model until it has produced
    /// [`number_output_values`](Self::number_output_values) outputs.
    pub fn rtlsim(&mut self, io: &mut IoDict) -> SimResult<RunReport> {
        let mut config = self.driver.clone();
        if let Some(path) = self.trace_path() {
            config = config.with_trace(path);
        }
        let target = self.number_output_values();
        let model = self.model.as_deref_mut().ok_or_else(|| SimError::NotReady {
            node: self.name.clone(),
        })?;

        let report = HandshakeDriver::new(config).run(model, io, target)?;
        debug!("{}: rtlsim finished in {} cycles", self.name, report.cycles);
        self.cycles_rtlsim = Some(report.cycles);
        Ok(report)
    }

    /// Runs the model on one input stream and returns the collected outputs.
    pub fn execute(&mut self, inputs: Vec<SignalValue>) -> SimResult<Vec<SignalValue>> {
        let mut io = IoDict::new()
            .with_input(DEFAULT_INPUT_STREAM, inputs)
            .with_output(DEFAULT_OUTPUT_STREAM);
        self.rtlsim(&mut io)?;
        io.take_captured(DEFAULT_OUTPUT_STREAM)
    }

    /// Derives the characteristic functions with default settings.
    pub fn derive_characteristic_fxns(
        &mut self,
        period: Cycle,
        override_io: Option<IoDict>,
    ) -> SimResult<CharacterizeOutcome> {
        Characterizer::default().characterize(self, period, override_io)
    }

    pub fn characteristic(&self) -> Option<&CharacteristicFunction> {
        self.characteristic.as_ref()
    }

    pub(crate) fn set_characteristic(&mut self, characteristic: CharacteristicFunction) {
        self.characteristic = Some(characteristic);
    }

    /// Drops the stored characterization so the node can be characterized again.
    pub fn clear_characteristic(&mut self) -> Option<CharacteristicFunction> {
        self.characteristic.take()
    }
}

impl std::fmt::Debug for StreamNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamNode")
            .field("name", &self.name)
            .field("folded_input_shape", &self.folded_input_shape)
            .field("folded_output_shape", &self.folded_output_shape)
            .field("exp_cycles", &self.exp_cycles)
            .field("cycles_rtlsim", &self.cycles_rtlsim)
            .field("characterized", &self.characteristic.is_some())
            .field("ready", &self.model.is_some())
            .finish()
    }
}
