//! Error types for driving and characterizing hardware models.

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::Cycle;

/// Errors raised while driving a hardware model or deriving its
/// characteristic functions.
#[derive(Error, Debug)]
pub enum SimError {
    /// No hardware model is attached to the node being run.
    #[error("hardware model not ready for node {node}")]
    NotReady { node: String },

    /// The requested characterization period is below the expected minimum.
    #[error("period {period} too short to characterize {node}: expects min {expected} cycles")]
    PeriodTooShort {
        node: String,
        period: Cycle,
        expected: Cycle,
    },

    /// No output progress was observed for `threshold` consecutive cycles.
    #[error(
        "liveness timeout after {cycles} cycles: no output change for {threshold} cycles \
         (consider a larger liveness threshold)"
    )]
    LivenessTimeout { cycles: Cycle, threshold: Cycle },

    /// The characterization run needed more cycles than the requested period.
    #[error("characterization took {cycles} cycles, more than the period {period}; set the period higher than {cycles}")]
    CharacterizationOverrun { cycles: Cycle, period: Cycle },

    /// The model does not expose a signal with this name.
    #[error("unknown signal: {0}")]
    UnknownSignal(String),

    /// A stream id was referenced that is not part of the run.
    #[error("unknown stream: {0}")]
    UnknownStream(String),

    /// Waveform trace could not be written.
    #[error("waveform trace error: {0}")]
    Trace(#[from] std::io::Error),

    /// A run was requested with inconsistent parameters.
    #[error("invalid run parameters: {0}")]
    InvalidRun(String),

    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type used throughout the crate.
pub type SimResult<T> = Result<T, SimError>;
