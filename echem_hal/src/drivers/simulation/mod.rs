//! Simulation driver module.
//!
//! Software peripherals for running the stimulus core without a board.
//! Timers advance only when [`SimulatedHal::tick`] is called, so runs are
//! fully deterministic.

mod peripherals;
mod sampler;

pub use peripherals::{HalOp, SimulatedHal};
pub use sampler::SimulatedSampler;
