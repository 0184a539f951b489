//! A model that never produces output.

use crate::error::SimResult;
use crate::model::{HardwareModel, RESET_SIGNAL};
use crate::models::signals::SignalBank;
use crate::stream::{SignalNaming, StreamPort};
use crate::types::{Direction, SignalValue};

/// Never asserts output valid; optionally swallows every input word.
///
/// Any run against this model can only end in a liveness timeout, which
/// makes it the fixture for deadlock handling.
#[derive(Debug)]
pub struct StuckModel {
    bank: SignalBank,
    input: StreamPort,
    output: StreamPort,
    accept_inputs: bool,
    /// Clock edges seen since the last reset
    pub edges: u64,
}

impl StuckModel {
    /// Creates a stuck model between `in0` and `out` that accepts inputs.
    pub fn new(naming: &SignalNaming) -> Self {
        let mut bank = SignalBank::new();
        bank.declare_stream(naming, "in0");
        bank.declare_stream(naming, "out");
        bank.declare(RESET_SIGNAL);
        Self {
            bank,
            input: StreamPort::new("in0", Direction::Input, naming),
            output: StreamPort::new("out", Direction::Output, naming),
            accept_inputs: true,
            edges: 0,
        }
    }

    /// Keeps input ready low as well, stalling the producer side too.
    pub fn refusing_inputs(mut self) -> Self {
        self.accept_inputs = false;
        self
    }
}

impl HardwareModel for StuckModel {
    fn read(&self, signal: &str) -> SimResult<SignalValue> {
        if signal == self.input.ready {
            return Ok(self.accept_inputs as SignalValue);
        }
        if signal == self.output.valid || signal == self.output.data {
            return Ok(0);
        }
        self.bank.get(signal)
    }

    fn write(&mut self, signal: &str, value: SignalValue) -> SimResult<()> {
        self.bank.set(signal, value)
    }

    fn advance_clock(&mut self) {
        self.edges += 1;
    }

    fn has_signal(&self, signal: &str) -> bool {
        self.bank.contains(signal)
    }
}
