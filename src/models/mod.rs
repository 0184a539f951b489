//! Built-in hardware models.
//!
//! These behavioral models implement [`HardwareModel`](crate::model::HardwareModel)
//! without any external simulator. They are useful for testing the driver and
//! the deriver, and as references for wrapping a real simulator.
//!
//! # Available Models
//!
//! - [`SignalBank`] - Named-port storage with port validation
//! - [`EchoPipeline`] - Fixed-latency echo with initiation interval and back-pressure
//! - [`JoinModel`] - Sums one word from each of several inputs
//! - [`StuckModel`] - Never produces output (deadlock fixture)

pub mod echo;
pub mod join;
pub mod signals;
pub mod stuck;

pub use echo::EchoPipeline;
pub use join::JoinModel;
pub use signals::SignalBank;
pub use stuck::StuckModel;
