//! System-wide constants for the stimulus workspace.
//!
//! Single source of truth for the output encoding and the timer base.
//! Imported by all crates; not duplicated elsewhere.

use static_assertions::const_assert;

/// Reference span of the output channel [V].
pub const VREF_VOLTS: f32 = 3.3;

/// Output code resolution in bits.
pub const CODE_BITS: u32 = 12;

/// Largest representable output code.
pub const CODE_MAX: u16 = (1 << CODE_BITS) - 1;

/// Mask applied to every code read by the boundary layer.
pub const CODE_MASK: u16 = CODE_MAX;

/// Mid-scale code (≈ VREF / 2).
pub const CODE_MID: u16 = 2048;

/// System clock feeding the timers [Hz].
pub const SYSTEM_CLOCK_HZ: u32 = 72_000_000;

/// Timer prescaler divisor (register value is `TIMER_PRESCALER - 1`).
pub const TIMER_PRESCALER: u32 = 7200;

/// Timer base tick rate after prescaling [Hz] (0.1 ms per tick).
pub const TIMER_TICK_HZ: u32 = SYSTEM_CLOCK_HZ / TIMER_PRESCALER;

/// Upper bound of a timer period in base ticks (16-bit reload + 1).
pub const MAX_TIMER_TICKS: u32 = 65_536;

/// DPV stepping interval [s]; DPV phase counters are in milliseconds.
pub const DPV_TICK_SECONDS: f32 = 0.001;

/// Fallback CV interval when the configured step duration is not positive [s].
pub const DEFAULT_CV_TICK_SECONDS: f32 = 0.001;

/// Number of analog inputs published by the sampling subsystem.
pub const SAMPLING_CHANNELS: usize = 3;

const_assert!(TIMER_TICK_HZ == 10_000);
const_assert!(CODE_MID <= CODE_MAX);
