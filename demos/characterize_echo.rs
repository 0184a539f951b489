//! Characterize Echo Example
//!
//! This example derives the characteristic functions of an echo pipeline
//! with a two-cycle latency:
//! - A node with a folded input and output of four transactions
//! - Characterization over an eight-cycle period
//! - Report export as a summary, CSV and JSON
//!
//! Run with: `cargo run --example characterize_echo`

use axisim::characterize::CharacterizeOutcome;
use axisim::models::EchoPipeline;
use axisim::node::StreamNode;
use axisim::stats::curves_to_csv;
use axisim::stream::SignalNaming;

const LATENCY: u64 = 2;
const PERIOD: u64 = 8;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    axisim::init_logging("info");

    let mut node = StreamNode::new("echo_0")
        .with_model(Box::new(EchoPipeline::new(&SignalNaming::default(), LATENCY)))
        .with_folded_input_shape(vec![1, 4, 1])
        .with_folded_output_shape(vec![1, 4, 1]);

    // Plain run first, to show the functional behavior
    let outputs = node.execute(vec![10, 20, 30, 40])?;
    println!("Outputs: {:?} after {:?} cycles", outputs, node.cycles_rtlsim());
    println!();

    match node.derive_characteristic_fxns(PERIOD, None)? {
        CharacterizeOutcome::Derived(report) => {
            println!("{}", report.summary());
            println!("{}", report.to_csv());
            println!("{}", report.to_json()?);
        }
        CharacterizeOutcome::AlreadyCharacterized { period } => {
            println!("Already characterized for period {}", period);
        }
    }

    if let Some(chrc) = node.characteristic() {
        println!("Curves:");
        print!("{}", curves_to_csv(chrc));
    }

    Ok(())
}
