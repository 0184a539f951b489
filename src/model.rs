//! The `HardwareModel` trait: the contract between the driver and a
//! cycle-steppable simulator.
//!
//! A hardware model is an opaque black box with named signal ports. The
//! driver only ever reads signals, writes signals and advances the clock by
//! one full edge; it never looks inside. Any simulator backend (a compiled
//! RTL model, a behavioral model, a test fake) plugs in by implementing this
//! trait.

use crate::error::SimResult;
use crate::types::SignalValue;

/// Active-low reset port toggled by the default [`HardwareModel::reset`].
pub const RESET_SIGNAL: &str = "ap_rst_n";

/// A cycle-stepped hardware model exposing named signals.
///
/// Implementations must be deterministic for the driver's guarantees
/// (identical stimulus gives identical outputs and cycle counts) to hold.
/// The driver holds `&mut` access for the whole run, so a model instance is
/// never driven by two runs at once.
pub trait HardwareModel: Send {
    /// Reads the current level of a signal.
    ///
    /// Reading never changes the model state; combinational outputs reflect
    /// the inputs written since the last clock edge.
    fn read(&self, signal: &str) -> SimResult<SignalValue>;

    /// Drives a signal to the given value until it is written again.
    fn write(&mut self, signal: &str, value: SignalValue) -> SimResult<()>;

    /// Advances the model by one full clock edge.
    fn advance_clock(&mut self);

    /// Returns true if the model exposes a port with this name.
    fn has_signal(&self, signal: &str) -> bool;

    /// Resets the model.
    ///
    /// The default drives [`RESET_SIGNAL`] low for one edge and releases it.
    /// Models without a reset port are left untouched.
    fn reset(&mut self) -> SimResult<()> {
        if !self.has_signal(RESET_SIGNAL) {
            return Ok(());
        }
        self.write(RESET_SIGNAL, 0)?;
        self.advance_clock();
        self.write(RESET_SIGNAL, 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use std::collections::HashMap;

    /// Counts edges and remembers the reset level seen at each edge.
    struct ResettableCounter {
        signals: HashMap<String, SignalValue>,
        edges: u64,
        edges_in_reset: u64,
    }

    impl ResettableCounter {
        fn new() -> Self {
            let mut signals = HashMap::new();
            signals.insert(RESET_SIGNAL.to_string(), 1);
            Self {
                signals,
                edges: 0,
                edges_in_reset: 0,
            }
        }
    }

    impl HardwareModel for ResettableCounter {
        fn read(&self, signal: &str) -> SimResult<SignalValue> {
            self.signals
                .get(signal)
                .copied()
                .ok_or_else(|| SimError::UnknownSignal(signal.to_string()))
        }

        fn write(&mut self, signal: &str, value: SignalValue) -> SimResult<()> {
            match self.signals.get_mut(signal) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(SimError::UnknownSignal(signal.to_string())),
            }
        }

        fn advance_clock(&mut self) {
            self.edges += 1;
            if self.signals[RESET_SIGNAL] == 0 {
                self.edges_in_reset += 1;
            }
        }

        fn has_signal(&self, signal: &str) -> bool {
            self.signals.contains_key(signal)
        }
    }

    #[test]
    fn test_default_reset_toggles_reset_port() {
        let mut model = ResettableCounter::new();
        model.reset().unwrap();

        assert_eq!(model.edges, 1);
        assert_eq!(model.edges_in_reset, 1);
        assert_eq!(model.read(RESET_SIGNAL).unwrap(), 1);
    }

    #[test]
    fn test_unknown_signal() {
        let mut model = ResettableCounter::new();
        assert!(matches!(
            model.write("missing", 1),
            Err(SimError::UnknownSignal(_))
        ));
    }
}
