//! Fixed-latency echo pipeline model.
//!
//! The `EchoPipeline` accepts words on one input stream and presents each of
//! them, unchanged, on one output stream a fixed number of cycles later. It
//! optionally limits how often it accepts (initiation interval) and how many
//! words it holds at once (back-pressure through `TREADY`).

use std::collections::VecDeque;

use crate::error::SimResult;
use crate::model::{HardwareModel, RESET_SIGNAL};
use crate::models::signals::SignalBank;
use crate::stream::{SignalNaming, StreamPort};
use crate::types::{Cycle, Direction, SignalValue};

/// A word travelling through the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InFlight {
    /// First cycle in which the word is visible on the output
    visible_at: Cycle,
    value: SignalValue,
}

/// A pipeline echoing `in0` to `out` after a fixed latency.
///
/// A word accepted in cycle `c` asserts output valid from cycle
/// `c + latency` until it is taken.
///
/// # Example
///
/// ```rust
/// use axisim::models::EchoPipeline;
/// use axisim::stream::SignalNaming;
///
/// // Two-cycle latency, accepting one word every cycle
/// let model = EchoPipeline::new(&SignalNaming::default(), 2);
/// assert_eq!(model.latency(), 2);
/// ```
#[derive(Debug)]
pub struct EchoPipeline {
    bank: SignalBank,
    input: StreamPort,
    output: StreamPort,
    latency: Cycle,
    initiation_interval: Cycle,
    capacity: Option<usize>,
    in_flight: VecDeque<InFlight>,
    last_accept: Option<Cycle>,
    cycle: Cycle,

    // Statistics
    /// Words accepted on the input
    pub accepted: u64,
    /// Words delivered on the output
    pub delivered: u64,
    /// Cycles in which a word was offered but refused
    pub stalled_cycles: u64,
}

impl EchoPipeline {
    /// Creates a pipeline between streams `in0` and `out`.
    ///
    /// A latency of zero behaves like a latency of one: a word is never
    /// visible in the cycle it is accepted.
    pub fn new(naming: &SignalNaming, latency: Cycle) -> Self {
        Self::with_streams(naming, "in0", "out", latency)
    }

    /// Creates a pipeline between arbitrarily named streams.
    pub fn with_streams(naming: &SignalNaming, input: &str, output: &str, latency: Cycle) -> Self {
        let mut bank = SignalBank::new();
        bank.declare_stream(naming, input);
        bank.declare_stream(naming, output);
        bank.declare(RESET_SIGNAL);
        Self {
            bank,
            input: StreamPort::new(input, Direction::Input, naming),
            output: StreamPort::new(output, Direction::Output, naming),
            latency: latency.max(1),
            initiation_interval: 1,
            capacity: None,
            in_flight: VecDeque::new(),
            last_accept: None,
            cycle: 0,
            accepted: 0,
            delivered: 0,
            stalled_cycles: 0,
        }
    }

    /// Accepts at most one word every `ii` cycles.
    pub fn with_initiation_interval(mut self, ii: Cycle) -> Self {
        self.initiation_interval = ii.max(1);
        self
    }

    /// Holds at most `capacity` words; `TREADY` drops while full.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity.max(1));
        self
    }

    /// Returns the configured latency.
    pub fn latency(&self) -> Cycle {
        self.latency
    }

    /// Returns the number of words currently in flight.
    pub fn occupancy(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns the number of clock edges seen since the last reset.
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    fn can_accept(&self) -> bool {
        let has_room = match self.capacity {
            Some(max) => self.in_flight.len() < max,
            None => true,
        };
        let interval_elapsed = match self.last_accept {
            Some(last) => self.cycle >= last.saturating_add(self.initiation_interval),
            None => true,
        };
        has_room && interval_elapsed
    }

    fn head_visible(&self) -> Option<InFlight> {
        self.in_flight
            .front()
            .copied()
            .filter(|word| word.visible_at <= self.cycle)
    }
}

impl HardwareModel for EchoPipeline {
    fn read(&self, signal: &str) -> SimResult<SignalValue> {
        if signal == self.input.ready {
            return Ok(self.can_accept() as SignalValue);
        }
        if signal == self.output.valid {
            return Ok(self.head_visible().is_some() as SignalValue);
        }
        if signal == self.output.data {
            return Ok(self.head_visible().map(|w| w.value).unwrap_or(0));
        }
        self.bank.get(signal)
    }

    fn write(&mut self, signal: &str, value: SignalValue) -> SimResult<()> {
        self.bank.set(signal, value)
    }

    fn advance_clock(&mut self) {
        let offered = self.bank.is_high(&self.input.valid);
        let in_fire = offered && self.can_accept();
        let out_fire = self.head_visible().is_some() && self.bank.is_high(&self.output.ready);

        if out_fire {
            self.in_flight.pop_front();
            self.delivered += 1;
        }
        if in_fire {
            let value = self.bank.get(&self.input.data).unwrap_or(0);
            self.in_flight.push_back(InFlight {
                visible_at: self.cycle.saturating_add(self.latency),
                value,
            });
            self.last_accept = Some(self.cycle);
            self.accepted += 1;
        } else if offered {
            self.stalled_cycles += 1;
        }
        self.cycle += 1;
    }

    fn has_signal(&self, signal: &str) -> bool {
        self.bank.contains(signal)
    }

    fn reset(&mut self) -> SimResult<()> {
        self.bank.clear();
        self.bank.set(RESET_SIGNAL, 1)?;
        self.in_flight.clear();
        self.last_accept = None;
        self.cycle = 0;
        self.accepted = 0;
        self.delivered = 0;
        self.stalled_cycles = 0;
        Ok(())
    }
}
