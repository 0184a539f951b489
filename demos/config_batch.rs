//! Config Batch Example
//!
//! This example sets everything up from a YAML description:
//! - Logging at the configured `driver.log_level`
//! - Nodes instantiated through the default model registry
//! - Batch characterization for the configured period
//!
//! Run with: `cargo run --example config_batch`

use axisim::config::SimConfig;
use axisim::parallel::ParallelCharacterizer;
use axisim::registry::create_default_registry;
use axisim::CharacterizeOutcome;

const CONFIG: &str = r#"
driver:
  log_level: debug

characterization:
  period: 32

nodes:
  - name: fast
    type: Echo
    attrs:
      latency: "2"
    folded_input_shape: [1, 8, 4]
    folded_output_shape: [1, 8, 4]
  - name: paced
    type: Echo
    attrs:
      latency: "3"
      ii: "3"
    folded_input_shape: [1, 8, 4]
    folded_output_shape: [1, 8, 4]
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SimConfig::from_yaml(CONFIG)?;
    config.init_logging();

    let mut nodes = config.build_nodes(&create_default_registry())?;
    let period = config.characterization.period.unwrap_or(64);

    let batch = ParallelCharacterizer::new(config.characterizer());
    for outcome in batch.characterize_all(&mut nodes, period) {
        match outcome.result {
            Ok(CharacterizeOutcome::Derived(report)) => println!("{}", report.summary()),
            Ok(CharacterizeOutcome::AlreadyCharacterized { period }) => {
                println!("{}: already characterized for period {}", outcome.node, period)
            }
            Err(err) => println!("{}: {}", outcome.node, err),
        }
    }

    println!("{}", batch.stats().to_json()?);
    Ok(())
}
