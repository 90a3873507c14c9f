//! Run-state of the stimulus system.
//!
//! `#[repr(u8)]` so the boundary layer can publish it as a single byte.

use serde::{Deserialize, Serialize};

/// Orchestrator run-state.
///
/// `Idle → Running ⇄ Paused → Idle`. The mode may only change in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum RunState {
    /// Outputs disarmed, configuration editable.
    #[default]
    Idle = 0,
    /// Waveform progressing.
    Running = 1,
    /// Timer clock gated, output frozen.
    Paused = 2,
}

impl RunState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Running),
            2 => Some(Self::Paused),
            _ => None,
        }
    }

    /// Running or paused.
    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}
