//! End-to-end characterization tests.

use axisim::characterize::{
    CharacterizationConfig, CharacterizeOutcome, Characterizer, CycleFallback,
};
use axisim::io::IoDict;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axisim::model::{HardwareModel, RESET_SIGNAL};
use axisim::models::{EchoPipeline, JoinModel, StuckModel};
use axisim::monitor::StreamFilter;
use axisim::node::StreamNode;
use axisim::stream::{SignalNaming, StreamSignal};
use axisim::types::{Cycle, SignalValue};
use axisim::SimError;

/// Plain signal store that keeps the default reset sequence.
struct PlainModel {
    signals: HashMap<String, SignalValue>,
    edges: u64,
}

impl PlainModel {
    fn new(naming: &SignalNaming, streams: &[&str]) -> Self {
        let mut signals = HashMap::new();
        for stream in streams {
            for signal in StreamSignal::ALL {
                signals.insert(naming.signal_name(stream, signal), 0);
            }
        }
        signals.insert(RESET_SIGNAL.to_string(), 0);
        Self { signals, edges: 0 }
    }
}

impl HardwareModel for PlainModel {
    fn read(&self, signal: &str) -> axisim::SimResult<SignalValue> {
        self.signals
            .get(signal)
            .copied()
            .ok_or_else(|| SimError::UnknownSignal(signal.to_string()))
    }

    fn write(&mut self, signal: &str, value: SignalValue) -> axisim::SimResult<()> {
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
    }

    fn has_signal(&self, signal: &str) -> bool {
        self.signals.contains_key(signal)
    }
}

fn echo_node(latency: Cycle, values: usize) -> StreamNode {
    StreamNode::new("echo")
        .with_model(Box::new(EchoPipeline::new(&SignalNaming::default(), latency)))
        .with_folded_input_shape(vec![1, values, 1])
        .with_folded_output_shape(vec![1, values, 1])
}

#[test]
fn test_echo_curves() {
    let mut node = echo_node(2, 4);

    let outcome = node.derive_characteristic_fxns(8, None).unwrap();
    let report = match outcome {
        CharacterizeOutcome::Derived(report) => report,
        other => panic!("expected new curves, got {other:?}"),
    };
    assert_eq!(report.cycles, 6);
    assert_eq!(report.expected_cycles, 4);

    let chrc = node.characteristic().unwrap();
    assert_eq!(chrc.period, 8);
    assert_eq!(
        chrc.inputs["in0"].curve,
        vec![1, 2, 3, 4, 4, 4, 4, 4, 5, 6, 7, 8, 8, 8, 8, 8]
    );
    assert_eq!(
        chrc.outputs["out"].curve,
        vec![0, 0, 1, 2, 3, 4, 4, 4, 4, 4, 5, 6, 7, 8, 8, 8]
    );
    // the run ends after six cycles, two short of the period
    assert_eq!(chrc.pads_in(), vec![2]);
    assert_eq!(chrc.pads_out(), vec![2]);
}

#[test]
fn test_curves_obey_accumulation_law() {
    let mut node = StreamNode::new("paced")
        .with_model(Box::new(
            EchoPipeline::new(&SignalNaming::default(), 3).with_initiation_interval(2),
        ))
        .with_folded_input_shape(vec![1, 5, 1])
        .with_folded_output_shape(vec![1, 5, 1]);
    node.derive_characteristic_fxns(16, None).unwrap();

    let chrc = node.characteristic().unwrap();
    let period = chrc.period as usize;
    for stream in chrc.inputs.values().chain(chrc.outputs.values()) {
        let curve = &stream.curve;
        assert_eq!(curve.len(), 2 * period);
        let flags: Vec<Cycle> = (0..period)
            .map(|t| if t == 0 { curve[0] } else { curve[t] - curve[t - 1] })
            .collect();
        assert!(flags.iter().all(|&f| f <= 1));
        for t in 1..2 * period {
            assert_eq!(curve[t] - curve[t - 1], flags[t % period]);
        }
        assert_eq!(curve[period - 1], 5);
        assert_eq!(curve[2 * period - 1], 10);
    }
}

#[test]
fn test_run_exactly_period_has_no_padding() {
    // latency 4 and 4 values: 8 cycles
    let mut node = echo_node(4, 4);
    node.derive_characteristic_fxns(8, None).unwrap();

    let chrc = node.characteristic().unwrap();
    assert_eq!(chrc.pads_in(), vec![0]);
    assert_eq!(chrc.pads_out(), vec![0]);
    assert_eq!(chrc.outputs["out"].curve[..8], [0, 0, 0, 0, 1, 2, 3, 4]);
}

#[test]
fn test_second_request_is_noop() {
    let mut node = echo_node(2, 4);
    node.derive_characteristic_fxns(8, None).unwrap();
    let first = node.characteristic().cloned();

    let outcome = node.derive_characteristic_fxns(32, None).unwrap();

    assert_eq!(outcome, CharacterizeOutcome::AlreadyCharacterized { period: 8 });
    assert_eq!(node.characteristic().cloned(), first);
}

#[test]
fn test_recharacterize_after_clear() {
    let mut node = echo_node(2, 4);
    node.derive_characteristic_fxns(8, None).unwrap();
    node.clear_characteristic();

    node.derive_characteristic_fxns(12, None).unwrap();
    assert_eq!(node.characteristic().unwrap().period, 12);
}

#[test]
fn test_not_ready() {
    let mut node = StreamNode::new("unbound").with_folded_output_shape(vec![1, 4, 1]);
    let err = node.derive_characteristic_fxns(8, None).unwrap_err();
    assert!(matches!(err, SimError::NotReady { node } if node == "unbound"));
}

#[test]
fn test_period_too_short() {
    let mut node = echo_node(2, 16);
    let err = node.derive_characteristic_fxns(8, None).unwrap_err();
    assert!(matches!(
        err,
        SimError::PeriodTooShort { period: 8, expected: 16, .. }
    ));
    assert!(node.characteristic().is_none());
}

#[test]
fn test_exp_cycles_overrides_fallback() {
    let mut node = echo_node(2, 4).with_exp_cycles(10);
    assert!(matches!(
        node.derive_characteristic_fxns(8, None),
        Err(SimError::PeriodTooShort { expected: 10, .. })
    ));
}

#[test]
fn test_overrun_leaves_node_untouched() {
    // fallback says 4 cycles are enough, the pipeline needs 10
    let mut node = echo_node(6, 4);
    let err = node.derive_characteristic_fxns(8, None).unwrap_err();

    assert!(matches!(
        err,
        SimError::CharacterizationOverrun { cycles: 10, period: 8 }
    ));
    assert!(node.characteristic().is_none());
}

#[test]
fn test_overrun_reported_when_watchdog_passes() {
    // outputs keep flowing, so only the final cycle count exceeds the period
    let mut node = echo_node(1, 12);
    let characterizer = Characterizer::new(CharacterizationConfig {
        fallback: CycleFallback::Disabled,
        ..CharacterizationConfig::default()
    });

    let err = characterizer.characterize(&mut node, 8, None).unwrap_err();
    assert!(matches!(
        err,
        SimError::CharacterizationOverrun { cycles: 13, period: 8 }
    ));
    assert!(node.characteristic().is_none());
}

#[test]
fn test_stuck_model_times_out_at_period() {
    let mut node = StreamNode::new("stuck")
        .with_model(Box::new(StuckModel::new(&SignalNaming::default())))
        .with_folded_input_shape(vec![1, 2, 1])
        .with_folded_output_shape(vec![1, 2, 1]);

    let err = node.derive_characteristic_fxns(20, None).unwrap_err();
    assert!(matches!(err, SimError::LivenessTimeout { cycles: 20, threshold: 20 }));
}

#[test]
fn test_override_stimulus_filters_aux_streams() {
    let naming = SignalNaming::default();
    let mut node = StreamNode::new("join")
        .with_model(Box::new(JoinModel::new(&naming, &["in0", "weights"], "out")))
        .with_folded_input_shape(vec![1, 3, 1])
        .with_folded_output_shape(vec![1, 3, 1]);
    let io = IoDict::new()
        .with_input("in0", vec![1, 2, 3])
        .with_input("weights", vec![4, 5, 6])
        .with_output("out");

    node.derive_characteristic_fxns(6, Some(io)).unwrap();

    let chrc = node.characteristic().unwrap();
    assert_eq!(chrc.inputs.keys().collect::<Vec<_>>(), vec!["in0"]);
    assert_eq!(chrc.inputs["in0"].curve[..6], [1, 2, 3, 3, 3, 3]);
    assert_eq!(chrc.outputs["out"].curve[..6], [0, 1, 2, 3, 3, 3]);
}

#[test]
fn test_custom_filter_tracks_weights() {
    let naming = SignalNaming::default();
    let mut node = StreamNode::new("join")
        .with_model(Box::new(JoinModel::new(&naming, &["in0", "weights"], "out")))
        .with_folded_output_shape(vec![1, 2, 1]);
    let io = IoDict::new()
        .with_input("in0", vec![1, 2])
        .with_input("weights", vec![3, 4])
        .with_output("out");

    let characterizer = Characterizer::new(CharacterizationConfig {
        filter: StreamFilter::new("", "out"),
        ..CharacterizationConfig::default()
    });
    characterizer.characterize(&mut node, 4, Some(io)).unwrap();

    let chrc = node.characteristic().unwrap();
    assert_eq!(chrc.inputs.len(), 2);
    assert_eq!(chrc.inputs["weights"].curve, vec![1, 2, 2, 2, 3, 4, 4, 4]);
}

#[test]
fn test_reset_before_characterization() {
    let mut node = echo_node(2, 4);
    // leave a stale word in the pipeline
    let model = node.model_mut().unwrap();
    model.write("in0_V_TDATA", 77).unwrap();
    model.write("in0_V_TVALID", 1).unwrap();
    model.advance_clock();

    node.derive_characteristic_fxns(8, None).unwrap();
    let chrc = node.characteristic().unwrap();
    assert_eq!(chrc.outputs["out"].curve[..6], [0, 0, 1, 2, 3, 4]);
}

#[test]
fn test_unknown_stream_rejected_before_reset() {
    // shares its edge and reset observations with the test through atomics
    struct Observed {
        inner: PlainModel,
        edges: Arc<AtomicU64>,
        reset_level: Arc<AtomicU64>,
    }

    impl HardwareModel for Observed {
        fn read(&self, signal: &str) -> axisim::SimResult<SignalValue> {
            self.inner.read(signal)
        }
        fn write(&mut self, signal: &str, value: SignalValue) -> axisim::SimResult<()> {
            if signal == RESET_SIGNAL {
                self.reset_level.store(value, Ordering::SeqCst);
            }
            self.inner.write(signal, value)
        }
        fn advance_clock(&mut self) {
            self.inner.advance_clock();
            self.edges.store(self.inner.edges, Ordering::SeqCst);
        }
        fn has_signal(&self, signal: &str) -> bool {
            self.inner.has_signal(signal)
        }
    }

    let naming = SignalNaming::default();
    let edges = Arc::new(AtomicU64::new(0));
    let reset_level = Arc::new(AtomicU64::new(0));
    let model = Observed {
        inner: PlainModel::new(&naming, &["in0", "out"]),
        edges: Arc::clone(&edges),
        reset_level: Arc::clone(&reset_level),
    };
    let mut node = StreamNode::new("strict")
        .with_model(Box::new(model))
        .with_folded_input_shape(vec![1, 2, 1])
        .with_folded_output_shape(vec![1, 2, 1]);
    let io = IoDict::new().with_input("in7", vec![1, 2]).with_output("out");

    let err = node.derive_characteristic_fxns(8, Some(io)).unwrap_err();

    assert!(matches!(err, SimError::UnknownSignal(name) if name == "in7_V_TDATA"));
    assert_eq!(edges.load(Ordering::SeqCst), 0);
    assert_eq!(reset_level.load(Ordering::SeqCst), 0);
    assert!(node.characteristic().is_none());
}
