//! Multi-input join model.
//!
//! The `JoinModel` waits until every input stream has delivered one word,
//! then emits their sum on the output stream. Each input has a one-word
//! register, so an input whose partner streams lag behind is back-pressured.

use crate::error::SimResult;
use crate::model::{HardwareModel, RESET_SIGNAL};
use crate::models::signals::SignalBank;
use crate::stream::{SignalNaming, StreamPort};
use crate::types::{Direction, SignalValue};

/// Sums one word from each input into one output word.
#[derive(Debug)]
pub struct JoinModel {
    bank: SignalBank,
    inputs: Vec<StreamPort>,
    output: StreamPort,
    registers: Vec<Option<SignalValue>>,
    result: Option<SignalValue>,

    /// Words emitted on the output
    pub emitted: u64,
}

impl JoinModel {
    /// Creates a join over the given input streams, emitting on `output`.
    pub fn new(naming: &SignalNaming, inputs: &[&str], output: &str) -> Self {
        let mut bank = SignalBank::new();
        for input in inputs {
            bank.declare_stream(naming, input);
        }
        bank.declare_stream(naming, output);
        bank.declare(RESET_SIGNAL);
        Self {
            bank,
            inputs: inputs
                .iter()
                .map(|id| StreamPort::new(*id, Direction::Input, naming))
                .collect(),
            output: StreamPort::new(output, Direction::Output, naming),
            registers: vec![None; inputs.len()],
            result: None,
            emitted: 0,
        }
    }

    fn input_index_by_ready(&self, signal: &str) -> Option<usize> {
        self.inputs.iter().position(|port| port.ready == signal)
    }
}

impl HardwareModel for JoinModel {
    fn read(&self, signal: &str) -> SimResult<SignalValue> {
        if let Some(index) = self.input_index_by_ready(signal) {
            return Ok(self.registers[index].is_none() as SignalValue);
        }
        if signal == self.output.valid {
            return Ok(self.result.is_some() as SignalValue);
        }
        if signal == self.output.data {
            return Ok(self.result.unwrap_or(0));
        }
        self.bank.get(signal)
    }

    fn write(&mut self, signal: &str, value: SignalValue) -> SimResult<()> {
        self.bank.set(signal, value)
    }

    fn advance_clock(&mut self) {
        let out_fire = self.result.is_some() && self.bank.is_high(&self.output.ready);
        let captured: Vec<Option<SignalValue>> = self
            .inputs
            .iter()
            .zip(&self.registers)
            .map(|(port, register)| {
                if register.is_none() && self.bank.is_high(&port.valid) {
                    Some(self.bank.get(&port.data).unwrap_or(0))
                } else {
                    None
                }
            })
            .collect();

        if out_fire {
            self.result = None;
            self.emitted += 1;
        }
        for (register, word) in self.registers.iter_mut().zip(captured) {
            if word.is_some() {
                *register = word;
            }
        }
        if self.result.is_none() && self.registers.iter().all(Option::is_some) {
            let sum = self
                .registers
                .iter_mut()
                .filter_map(Option::take)
                .fold(0, SignalValue::wrapping_add);
            self.result = Some(sum);
        }
    }

    fn has_signal(&self, signal: &str) -> bool {
        self.bank.contains(signal)
    }

    fn reset(&mut self) -> SimResult<()> {
        self.bank.clear();
        self.bank.set(RESET_SIGNAL, 1)?;
        self.registers.iter_mut().for_each(|r| *r = None);
        self.result = None;
        self.emitted = 0;
        Ok(())
    }
}
