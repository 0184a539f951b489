//! Multi-Stream Example
//!
//! This example drives a join model with a data stream and a weight stream:
//! - Both inputs are fed every cycle the model is ready
//! - The monitor tracks only the data stream (default filter)
//! - A VCD waveform of the run is written to the temp directory
//!
//! Run with: `cargo run --example multi_stream`

use axisim::driver::{DriverConfig, HandshakeDriver};
use axisim::io::IoDict;
use axisim::models::JoinModel;
use axisim::monitor::{StreamFilter, TransactionMonitor};
use axisim::stream::SignalNaming;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    axisim::init_logging("debug");

    let naming = SignalNaming::default();
    let mut model = JoinModel::new(&naming, &["in0", "weights"], "out");

    let mut io = IoDict::new()
        .with_input("in0", vec![1, 2, 3, 4, 5, 6])
        .with_input("weights", vec![100, 200, 300, 400, 500, 600])
        .with_output("out");
    let mut monitor = TransactionMonitor::new(&io, &naming, &StreamFilter::default());

    let trace = std::env::temp_dir().join("axisim_multi_stream.vcd");
    let driver = HandshakeDriver::new(DriverConfig::new(1_000).with_trace(&trace));
    let report = driver.run_with_hook(&mut model, &mut io, 6, Some(&mut monitor))?;

    println!("Run finished in {} cycles", report.cycles);
    println!("Outputs: {:?}", io.output("out").unwrap_or_default());
    println!("Joined words: {}", model.emitted);
    println!();

    let (inputs, outputs) = monitor.into_traces();
    for (id, trace) in inputs.iter().chain(outputs.iter()) {
        println!("{:>8}: {:?} ({} transfers)", id, trace.flags(), trace.transactions());
    }

    println!();
    println!("Waveform written to {}", trace.display());
    println!("{}", report.to_json()?);

    Ok(())
}
