//! HAL peripheral traits.
//!
//! This module defines:
//! - `AnalogOutput` - GPIO analog mode + DAC channel control
//! - `TransferEngine` - DMA channel arming
//! - `TickTimer` - Timer base, update events and the interrupt line
//! - `StimulusHal` - Everything a channel controller drives
//!
//! Every call is a register write: nothing here can fail, so nothing returns
//! `Result`. Implementations must not block; `dac_write`,
//! `dac_software_trigger` and `timer_clear_pending` run in interrupt context.

use crate::hal::types::{
    DacChannel, DacSetup, DmaChannel, DmaTransfer, IrqEvent, TimerConfig, TimerId,
};

/// DAC channel and its output pin.
pub trait AnalogOutput {
    /// Put the channel's output pin in analog mode.
    fn configure_analog_pin(&mut self, channel: DacChannel);

    /// Configure and enable a DAC channel.
    fn dac_enable(&mut self, channel: DacChannel, setup: DacSetup);

    /// Disable a DAC channel.
    fn dac_disable(&mut self, channel: DacChannel);

    /// Write a right-aligned 12-bit code into the holding register.
    fn dac_write(&mut self, channel: DacChannel, code: u16);

    /// Latch the holding register of a software-triggered channel.
    fn dac_software_trigger(&mut self, channel: DacChannel);
}

/// DMA channels moving codes into DAC holding registers.
pub trait TransferEngine {
    /// Reset, program and enable a DMA channel.
    fn dma_arm(&mut self, channel: DmaChannel, transfer: DmaTransfer);

    /// Disable a DMA channel.
    fn dma_disable(&mut self, channel: DmaChannel);
}

/// Timer base, update event and interrupt line.
pub trait TickTimer {
    /// Reset the timer and program its time base (timer left disabled).
    fn timer_configure(&mut self, timer: TimerId, config: TimerConfig);

    /// Load the counter register.
    fn timer_set_counter(&mut self, timer: TimerId, value: u32);

    /// Clear a pending event flag and its interrupt controller line.
    fn timer_clear_pending(&mut self, timer: TimerId, event: IrqEvent);

    /// Enable or disable an interrupt source of the timer.
    fn timer_set_interrupt(&mut self, timer: TimerId, event: IrqEvent, enabled: bool);

    /// Gate the timer clock.
    fn timer_set_enabled(&mut self, timer: TimerId, enabled: bool);

    /// Force one update event (trigger output, DMA request, interrupt flag).
    fn timer_generate_update(&mut self, timer: TimerId);
}

/// Complete peripheral surface used by a channel controller.
pub trait StimulusHal: AnalogOutput + TransferEngine + TickTimer {}

impl<T: AnalogOutput + TransferEngine + TickTimer> StimulusHal for T {}
