//! Prelude module for common re-exports.
//!
//! ```rust
//! use echem_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CODE_MASK, CODE_MAX, CODE_MID, TIMER_TICK_HZ, VREF_VOLTS};

// ─── Waveform ───────────────────────────────────────────────────────
pub use crate::waveform::{
    CvParams, CvVoltParams, DpvParams, RunMode, SampleFlags, ScanDirection, period_to_ticks,
    volt_to_code,
};

// ─── State ──────────────────────────────────────────────────────────
pub use crate::state::RunState;

// ─── HAL ────────────────────────────────────────────────────────────
pub use crate::hal::driver::{AnalogOutput, StimulusHal, TickTimer, TransferEngine};
pub use crate::hal::types::{ChannelBinding, CodeMirror, DacChannel, DmaChannel, IrqEvent, TimerId};
pub use crate::sampling::{Readings, SamplingSubsystem};
