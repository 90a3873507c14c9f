//! HAL data types.
//!
//! Peripheral identities (DAC channel, timer, DMA channel), the register
//! level setup structs passed to drivers, and the code mirror read by
//! autonomous transfers.

use crate::consts::{CODE_MASK, MAX_TIMER_TICKS, TIMER_PRESCALER};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// Analog output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DacChannel {
    /// Channel 1 (PA4).
    Ch1,
    /// Channel 2 (PA5).
    Ch2,
}

impl DacChannel {
    /// Zero-based index for per-channel tables.
    #[inline]
    pub const fn index(&self) -> usize {
        match self {
            Self::Ch1 => 0,
            Self::Ch2 => 1,
        }
    }

    /// Output pin number on port A.
    #[inline]
    pub const fn pin(&self) -> u8 {
        match self {
            Self::Ch1 => 4,
            Self::Ch2 => 5,
        }
    }
}

/// Number of analog output channels.
pub const DAC_CHANNELS: usize = 2;

/// General-purpose / basic timer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerId {
    /// Advanced timer 1 (no DAC trigger route).
    Tim1,
    /// TIM2.
    Tim2,
    /// TIM3.
    Tim3,
    /// TIM4.
    Tim4,
    /// TIM5.
    Tim5,
    /// Basic timer 6.
    Tim6,
    /// Basic timer 7.
    Tim7,
    /// Advanced timer 8 (no DAC trigger route).
    Tim8,
}

/// Number of timer identities.
pub const TIMER_COUNT: usize = 8;

impl TimerId {
    /// All identities in register order.
    pub const ALL: [TimerId; TIMER_COUNT] = [
        Self::Tim1,
        Self::Tim2,
        Self::Tim3,
        Self::Tim4,
        Self::Tim5,
        Self::Tim6,
        Self::Tim7,
        Self::Tim8,
    ];

    /// Zero-based index for per-timer tables.
    #[inline]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TIM{}", self.index() + 1)
    }
}

/// Output channel plus the timer pacing it, as written in configuration.
///
/// `timer = None` means the channel is only ever written by software.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelBinding {
    /// Output channel.
    pub dac: DacChannel,
    /// Timer pacing the channel, if any.
    #[serde(default)]
    pub timer: Option<TimerId>,
}

impl ChannelBinding {
    /// Timer-paced binding.
    pub const fn timed(dac: DacChannel, timer: TimerId) -> Self {
        Self {
            dac,
            timer: Some(timer),
        }
    }

    /// Software-only binding.
    pub const fn untimed(dac: DacChannel) -> Self {
        Self { dac, timer: None }
    }
}

/// DMA controller / channel pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DmaChannel {
    /// Controller number (1 or 2).
    pub controller: u8,
    /// Channel number within the controller.
    pub channel: u8,
}

impl DmaChannel {
    /// Build a channel identity.
    pub const fn new(controller: u8, channel: u8) -> Self {
        Self {
            controller,
            channel,
        }
    }
}

impl fmt::Display for DmaChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DMA{}_CH{}", self.controller, self.channel)
    }
}

/// What latches a DAC holding register into its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DacTrigger {
    /// Explicit software trigger.
    Software,
    /// Trigger-output event of a timer.
    TimerTrgo(TimerId),
}

/// Timer event routed to trigger outputs and DMA requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimerEventSource {
    /// Counter overflow / forced update.
    #[default]
    Update,
}

/// Interrupt kind raised by a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrqEvent {
    /// Update (overflow) interrupt.
    Update,
}

/// Interrupt priority pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IrqPriority {
    /// Preemption priority.
    pub preempt: u8,
    /// Sub-priority.
    pub sub: u8,
}

impl IrqPriority {
    /// Build a priority pair.
    pub const fn new(preempt: u8, sub: u8) -> Self {
        Self { preempt, sub }
    }
}

/// DAC channel setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DacSetup {
    /// Latch source.
    pub trigger: DacTrigger,
    /// Output buffer enable.
    pub output_buffer: bool,
    /// Accept DMA requests.
    pub dma_requests: bool,
}

/// DMA channel priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DmaPriority {
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
    /// Very high.
    VeryHigh,
}

/// Memory → DAC transfer programmed into a DMA channel.
///
/// Source and destination addresses are fixed (no increment); the transfer
/// moves one half-word per request.
#[derive(Debug, Clone)]
pub struct DmaTransfer {
    /// Code mirror the transfer reads.
    pub source: Arc<CodeMirror>,
    /// Holding register written.
    pub destination: DacChannel,
    /// Circular mode (reload after each request).
    pub circular: bool,
    /// Transfer count per cycle.
    pub slots: u16,
    /// Arbitration priority.
    pub priority: DmaPriority,
}

/// Timer base setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Prescaler register value.
    pub prescaler: u16,
    /// Auto-reload register value (`ticks - 1`).
    pub reload: u16,
    /// Trigger-output source.
    pub trgo: TimerEventSource,
}

impl TimerConfig {
    /// Timer setup for a period of `ticks` base ticks.
    ///
    /// `ticks` is clamped to `[1, MAX_TIMER_TICKS]`.
    pub fn for_ticks(ticks: u32) -> Self {
        let ticks = ticks.clamp(1, MAX_TIMER_TICKS);
        Self {
            prescaler: (TIMER_PRESCALER - 1) as u16,
            reload: (ticks - 1) as u16,
            trgo: TimerEventSource::Update,
        }
    }

    /// Period in base ticks.
    #[inline]
    pub const fn ticks(&self) -> u32 {
        self.reload as u32 + 1
    }
}

/// Single-word location holding the latest output code.
///
/// Written by the tick context, read by the foreground and by an armed DMA
/// transfer. A half-word load is atomic on the target, so no lock is needed.
#[derive(Debug, Default)]
pub struct CodeMirror {
    code: AtomicU16,
}

impl CodeMirror {
    /// Create a mirror holding `code`.
    pub const fn new(code: u16) -> Self {
        Self {
            code: AtomicU16::new(code),
        }
    }

    /// Latest code, masked to 12 bits.
    #[inline]
    pub fn load(&self) -> u16 {
        self.code.load(Ordering::Acquire) & CODE_MASK
    }

    /// Publish a new code.
    #[inline]
    pub fn store(&self, code: u16) {
        self.code.store(code & CODE_MASK, Ordering::Release);
    }
}
