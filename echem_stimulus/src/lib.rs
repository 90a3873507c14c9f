//! # Electrochemical Stimulus Core
//!
//! Waveform generation and hardware timing coordination for a two-channel
//! potentiostat front end: a timer-paced Scan channel (CV / DPV / IT) and a
//! constant Bias channel, coordinated with an external sampling subsystem.
//!
//! ## Layers
//!
//! 1. **WaveformEngine**: next output code per tick, sample marks
//! 2. **ChannelController**: DAC / DMA / timer bring-up, push vs pull delivery
//! 3. **SystemOrchestrator**: both channels, sampling, run-state machine
//!
//! ## Execution Contexts
//!
//! The foreground owns the orchestrator and calls it through `&mut self`. The
//! tick interrupt enters through `SystemOrchestrator::handle_interrupt` and
//! never allocates, blocks or logs. The foreground reads the live code and
//! drains sample marks through atomics only.

pub mod channel;
pub mod config;
pub mod report;
pub mod sim;
pub mod state;
pub mod system;
pub mod waveform;
