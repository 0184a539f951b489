//! # axisim
//!
//! A cycle-stepped co-simulation driver for hardware models with AXI-Stream
//! style valid/ready interfaces, and a deriver for their characteristic
//! functions.
//!
//! ## Design Principles
//!
//! - **Opaque models**: the driver only reads and writes named signals and
//!   advances the clock through the [`HardwareModel`] trait.
//! - **One driver for all shapes**: any number of input and output streams
//!   are driven by the same per-cycle handshake loop.
//! - **Liveness first**: every run is guarded by a watchdog that aborts once
//!   outputs stop progressing.
//! - **Cadence curves**: the characterizer turns per-cycle transfer traces
//!   into cumulative curves used to size FIFOs between nodes.
//!
//! ## Features
//!
//! - `parallel` - Characterize independent nodes on a rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use axisim::models::EchoPipeline;
//! use axisim::node::StreamNode;
//! use axisim::stream::SignalNaming;
//!
//! let mut node = StreamNode::new("echo")
//!     .with_model(Box::new(EchoPipeline::new(&SignalNaming::default(), 2)))
//!     .with_folded_input_shape(vec![1, 4, 1])
//!     .with_folded_output_shape(vec![1, 4, 1]);
//!
//! node.derive_characteristic_fxns(8, None).unwrap();
//!
//! let chrc = node.characteristic().unwrap();
//! assert_eq!(chrc.inputs["in0"].curve[..9], [1, 2, 3, 4, 4, 4, 4, 4, 5]);
//! assert_eq!(chrc.outputs["out"].curve[..9], [0, 0, 1, 2, 3, 4, 4, 4, 4]);
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use axisim::config::SimConfig;
//! use axisim::registry::create_default_registry;
//!
//! let config = SimConfig::from_file("nodes.yaml")?;
//! let mut nodes = config.build_nodes(&create_default_registry())?;
//! ```

pub mod types;
pub mod error;
pub mod model;
pub mod stream;
pub mod io;
pub mod monitor;
pub mod trace;
pub mod driver;
pub mod characterize;
pub mod node;
pub mod config;
pub mod registry;
pub mod stats;
pub mod models;
pub mod parallel;

// Re-export commonly used types
pub use types::{Cycle, Direction, SignalValue, StreamId};
pub use error::{SimError, SimResult};
pub use model::HardwareModel;
pub use stream::{SignalNaming, StreamPort, StreamSet};
pub use io::IoDict;
pub use monitor::{CycleHook, StreamFilter, TransactionMonitor, TransactionTrace};
pub use driver::{DriverConfig, HandshakeDriver, LivenessWatchdog};
pub use characterize::{
    CharacteristicFunction, CharacterizationConfig, CharacterizeOutcome, Characterizer,
    CycleFallback,
};
pub use node::StreamNode;
pub use config::{ConfigError, SimConfig, SimConfigBuilder};
pub use registry::{create_default_registry, ModelRegistry};
pub use stats::{CharacterizationReport, RunReport};
pub use parallel::{characterize_all, ParallelCharacterizer};

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging. `RUST_LOG`
/// takes precedence over `level`.
///
/// # Example
///
/// ```rust,ignore
/// axisim::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
