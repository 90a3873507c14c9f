//! Simulated DAC, DMA and timer peripherals.
//!
//! The model follows the register semantics the channel controller relies on:
//!
//! - a DAC channel has a holding and an output register; the output only
//!   changes when the configured trigger fires (software or timer TRGO),
//! - an armed DMA channel copies its code mirror into the destination holding
//!   register on every update event of the timer it serves,
//! - a timer counts base ticks while enabled and raises an update event on
//!   overflow or on [`TickTimer::timer_generate_update`].
//!
//! One pending flag per timer models both the status flag and the interrupt
//! controller line. Every call is appended to a journal so tests can assert
//! bring-up order.

use crate::resource_map;
use echem_common::consts::CODE_MASK;
use echem_common::hal::driver::{AnalogOutput, TickTimer, TransferEngine};
use echem_common::hal::types::{
    DAC_CHANNELS, DacChannel, DacSetup, DacTrigger, DmaChannel, DmaTransfer, IrqEvent,
    TIMER_COUNT, TimerConfig, TimerId,
};
use tracing::trace;

/// One recorded HAL call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalOp {
    /// `configure_analog_pin`
    AnalogPin(DacChannel),
    /// `dac_enable`
    DacEnable(DacChannel, DacSetup),
    /// `dac_disable`
    DacDisable(DacChannel),
    /// `dac_write`
    DacWrite(DacChannel, u16),
    /// `dac_software_trigger`
    DacSoftwareTrigger(DacChannel),
    /// `dma_arm`
    DmaArm(DmaChannel, DacChannel),
    /// `dma_disable`
    DmaDisable(DmaChannel),
    /// `timer_configure`
    TimerConfigure(TimerId, TimerConfig),
    /// `timer_set_counter`
    TimerCounter(TimerId, u32),
    /// `timer_clear_pending`
    TimerClearPending(TimerId),
    /// `timer_set_interrupt`
    TimerInterrupt(TimerId, bool),
    /// `timer_set_enabled`
    TimerEnable(TimerId, bool),
    /// `timer_generate_update`
    TimerGenerateUpdate(TimerId),
}

#[derive(Debug, Clone, Copy, Default)]
struct DacState {
    analog: bool,
    enabled: bool,
    setup: Option<DacSetup>,
    holding: u16,
    output: u16,
}

#[derive(Debug, Clone, Copy, Default)]
struct TimerState {
    config: Option<TimerConfig>,
    counter: u32,
    enabled: bool,
    irq_enabled: bool,
    pending: bool,
    updates: u64,
}

/// Software model of the stimulus peripherals.
#[derive(Debug)]
pub struct SimulatedHal {
    dacs: [DacState; DAC_CHANNELS],
    dma: Vec<(DmaChannel, DmaTransfer)>,
    timers: [TimerState; TIMER_COUNT],
    journal: Vec<HalOp>,
    journaling: bool,
    ticks: u64,
}

impl SimulatedHal {
    /// Create a powered-down peripheral set with journaling enabled.
    pub fn new() -> Self {
        Self {
            dacs: [DacState::default(); DAC_CHANNELS],
            dma: Vec::new(),
            timers: [TimerState::default(); TIMER_COUNT],
            journal: Vec::new(),
            journaling: true,
            ticks: 0,
        }
    }

    /// Same as [`SimulatedHal::new`] without the call journal (long runs).
    pub fn without_journal() -> Self {
        Self {
            journaling: false,
            ..Self::new()
        }
    }

    /// Advance every enabled timer by one base tick.
    pub fn tick(&mut self) {
        self.ticks += 1;
        for timer in TimerId::ALL {
            let state = &mut self.timers[timer.index()];
            let Some(config) = state.config else {
                continue;
            };
            if !state.enabled {
                continue;
            }
            state.counter += 1;
            if state.counter >= config.ticks() {
                state.counter = 0;
                self.fire_update(timer);
            }
        }
    }

    /// Base ticks elapsed since construction.
    pub fn elapsed_ticks(&self) -> u64 {
        self.ticks
    }

    /// Timers with a pending update event and the interrupt enabled.
    pub fn pending_interrupts(&self) -> impl Iterator<Item = TimerId> + '_ {
        TimerId::ALL.into_iter().filter(move |t| {
            let s = &self.timers[t.index()];
            s.pending && s.irq_enabled
        })
    }

    /// Latched output code, `None` while the channel is disabled.
    pub fn dac_output(&self, channel: DacChannel) -> Option<u16> {
        let dac = &self.dacs[channel.index()];
        dac.enabled.then_some(dac.output)
    }

    /// Holding register content.
    pub fn dac_holding(&self, channel: DacChannel) -> u16 {
        self.dacs[channel.index()].holding
    }

    /// Setup of an enabled channel.
    pub fn dac_setup(&self, channel: DacChannel) -> Option<DacSetup> {
        let dac = &self.dacs[channel.index()];
        if dac.enabled { dac.setup } else { None }
    }

    /// Output pin is in analog mode.
    pub fn is_analog(&self, channel: DacChannel) -> bool {
        self.dacs[channel.index()].analog
    }

    /// Transfer currently armed on a DMA channel.
    pub fn armed_transfer(&self, channel: DmaChannel) -> Option<&DmaTransfer> {
        self.dma
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, transfer)| transfer)
    }

    /// Last programmed time base.
    pub fn timer_config(&self, timer: TimerId) -> Option<TimerConfig> {
        self.timers[timer.index()].config
    }

    /// Timer clock is running.
    pub fn timer_enabled(&self, timer: TimerId) -> bool {
        self.timers[timer.index()].enabled
    }

    /// Update interrupt is enabled.
    pub fn timer_irq_enabled(&self, timer: TimerId) -> bool {
        self.timers[timer.index()].irq_enabled
    }

    /// Update event pending.
    pub fn timer_pending(&self, timer: TimerId) -> bool {
        self.timers[timer.index()].pending
    }

    /// Current counter value.
    pub fn timer_counter(&self, timer: TimerId) -> u32 {
        self.timers[timer.index()].counter
    }

    /// Update events raised since the last `timer_configure`.
    pub fn timer_updates(&self, timer: TimerId) -> u64 {
        self.timers[timer.index()].updates
    }

    /// Recorded calls, oldest first.
    pub fn journal(&self) -> &[HalOp] {
        &self.journal
    }

    /// Drop recorded calls.
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    fn record(&mut self, op: HalOp) {
        if self.journaling {
            self.journal.push(op);
        }
    }

    /// Update event: DMA request, trigger output, status flag.
    fn fire_update(&mut self, timer: TimerId) {
        if let Some(res) = resource_map::lookup(timer)
            && let Some((_, transfer)) = self.dma.iter().find(|(c, _)| *c == res.dma)
        {
            let dac = &mut self.dacs[transfer.destination.index()];
            if dac.setup.is_some_and(|s| s.dma_requests) {
                dac.holding = transfer.source.load();
            }
        }

        for dac in self.dacs.iter_mut() {
            let Some(setup) = dac.setup else {
                continue;
            };
            if dac.enabled && setup.trigger == DacTrigger::TimerTrgo(timer) {
                dac.output = dac.holding;
            }
        }

        let state = &mut self.timers[timer.index()];
        state.pending = true;
        state.updates += 1;
    }
}

impl Default for SimulatedHal {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalogOutput for SimulatedHal {
    fn configure_analog_pin(&mut self, channel: DacChannel) {
        self.dacs[channel.index()].analog = true;
        self.record(HalOp::AnalogPin(channel));
    }

    fn dac_enable(&mut self, channel: DacChannel, setup: DacSetup) {
        trace!("{:?} enabled, trigger {:?}", channel, setup.trigger);
        let dac = &mut self.dacs[channel.index()];
        dac.enabled = true;
        dac.setup = Some(setup);
        self.record(HalOp::DacEnable(channel, setup));
    }

    fn dac_disable(&mut self, channel: DacChannel) {
        self.dacs[channel.index()].enabled = false;
        self.record(HalOp::DacDisable(channel));
    }

    fn dac_write(&mut self, channel: DacChannel, code: u16) {
        self.dacs[channel.index()].holding = code & CODE_MASK;
        self.record(HalOp::DacWrite(channel, code));
    }

    fn dac_software_trigger(&mut self, channel: DacChannel) {
        let dac = &mut self.dacs[channel.index()];
        if dac.enabled && dac.setup.is_some_and(|s| s.trigger == DacTrigger::Software) {
            dac.output = dac.holding;
        }
        self.record(HalOp::DacSoftwareTrigger(channel));
    }
}

impl TransferEngine for SimulatedHal {
    fn dma_arm(&mut self, channel: DmaChannel, transfer: DmaTransfer) {
        trace!("{} armed → {:?}", channel, transfer.destination);
        self.record(HalOp::DmaArm(channel, transfer.destination));
        self.dma.retain(|(c, _)| *c != channel);
        self.dma.push((channel, transfer));
    }

    fn dma_disable(&mut self, channel: DmaChannel) {
        self.dma.retain(|(c, _)| *c != channel);
        self.record(HalOp::DmaDisable(channel));
    }
}

impl TickTimer for SimulatedHal {
    fn timer_configure(&mut self, timer: TimerId, config: TimerConfig) {
        trace!("{} configured for {} ticks", timer, config.ticks());
        self.timers[timer.index()] = TimerState {
            config: Some(config),
            ..TimerState::default()
        };
        self.record(HalOp::TimerConfigure(timer, config));
    }

    fn timer_set_counter(&mut self, timer: TimerId, value: u32) {
        self.timers[timer.index()].counter = value;
        self.record(HalOp::TimerCounter(timer, value));
    }

    fn timer_clear_pending(&mut self, timer: TimerId, _event: IrqEvent) {
        self.timers[timer.index()].pending = false;
        self.record(HalOp::TimerClearPending(timer));
    }

    fn timer_set_interrupt(&mut self, timer: TimerId, _event: IrqEvent, enabled: bool) {
        self.timers[timer.index()].irq_enabled = enabled;
        self.record(HalOp::TimerInterrupt(timer, enabled));
    }

    fn timer_set_enabled(&mut self, timer: TimerId, enabled: bool) {
        self.timers[timer.index()].enabled = enabled;
        self.record(HalOp::TimerEnable(timer, enabled));
    }

    fn timer_generate_update(&mut self, timer: TimerId) {
        self.record(HalOp::TimerGenerateUpdate(timer));
        self.timers[timer.index()].counter = 0;
        self.fire_update(timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echem_common::hal::types::{CodeMirror, DmaPriority};
    use std::sync::Arc;

    fn software_setup() -> DacSetup {
        DacSetup {
            trigger: DacTrigger::Software,
            output_buffer: true,
            dma_requests: false,
        }
    }

    #[test]
    fn software_trigger_latches_holding() {
        let mut hal = SimulatedHal::new();
        hal.dac_enable(DacChannel::Ch1, software_setup());
        hal.dac_write(DacChannel::Ch1, 1234);
        assert_eq!(hal.dac_output(DacChannel::Ch1), Some(0));
        hal.dac_software_trigger(DacChannel::Ch1);
        assert_eq!(hal.dac_output(DacChannel::Ch1), Some(1234));
    }

    #[test]
    fn disabled_channel_has_no_output() {
        let mut hal = SimulatedHal::new();
        hal.dac_enable(DacChannel::Ch2, software_setup());
        hal.dac_disable(DacChannel::Ch2);
        assert_eq!(hal.dac_output(DacChannel::Ch2), None);
        assert_eq!(hal.dac_setup(DacChannel::Ch2), None);
    }

    #[test]
    fn timer_overflows_after_reload() {
        let mut hal = SimulatedHal::new();
        hal.timer_configure(TimerId::Tim2, TimerConfig::for_ticks(3));
        hal.timer_set_interrupt(TimerId::Tim2, IrqEvent::Update, true);
        hal.timer_set_enabled(TimerId::Tim2, true);

        hal.tick();
        hal.tick();
        assert!(!hal.timer_pending(TimerId::Tim2));
        hal.tick();
        assert!(hal.timer_pending(TimerId::Tim2));
        assert_eq!(hal.pending_interrupts().collect::<Vec<_>>(), vec![TimerId::Tim2]);
        assert_eq!(hal.timer_counter(TimerId::Tim2), 0);
    }

    #[test]
    fn disabled_timer_does_not_count() {
        let mut hal = SimulatedHal::new();
        hal.timer_configure(TimerId::Tim3, TimerConfig::for_ticks(1));
        hal.tick();
        assert!(!hal.timer_pending(TimerId::Tim3));
        assert_eq!(hal.timer_updates(TimerId::Tim3), 0);
    }

    #[test]
    fn update_event_moves_mirror_to_output() {
        let mut hal = SimulatedHal::new();
        let mirror = Arc::new(CodeMirror::new(777));
        hal.dac_enable(
            DacChannel::Ch2,
            DacSetup {
                trigger: DacTrigger::TimerTrgo(TimerId::Tim2),
                output_buffer: true,
                dma_requests: true,
            },
        );
        hal.dma_arm(
            DmaChannel::new(1, 2),
            DmaTransfer {
                source: Arc::clone(&mirror),
                destination: DacChannel::Ch2,
                circular: true,
                slots: 1,
                priority: DmaPriority::High,
            },
        );
        hal.timer_configure(TimerId::Tim2, TimerConfig::for_ticks(2));
        hal.timer_generate_update(TimerId::Tim2);
        assert_eq!(hal.dac_output(DacChannel::Ch2), Some(777));

        mirror.store(800);
        hal.timer_set_enabled(TimerId::Tim2, true);
        hal.tick();
        assert_eq!(hal.dac_output(DacChannel::Ch2), Some(777));
        hal.tick();
        assert_eq!(hal.dac_output(DacChannel::Ch2), Some(800));
    }

    #[test]
    fn configure_resets_timer_state() {
        let mut hal = SimulatedHal::new();
        hal.timer_configure(TimerId::Tim4, TimerConfig::for_ticks(5));
        hal.timer_set_enabled(TimerId::Tim4, true);
        hal.timer_generate_update(TimerId::Tim4);
        hal.timer_configure(TimerId::Tim4, TimerConfig::for_ticks(5));
        assert!(!hal.timer_enabled(TimerId::Tim4));
        assert!(!hal.timer_pending(TimerId::Tim4));
        assert_eq!(hal.timer_updates(TimerId::Tim4), 0);
    }

    #[test]
    fn journal_can_be_disabled() {
        let mut hal = SimulatedHal::without_journal();
        hal.configure_analog_pin(DacChannel::Ch1);
        assert!(hal.journal().is_empty());
        assert!(hal.is_analog(DacChannel::Ch1));
    }
}
