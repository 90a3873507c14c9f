//! Channel controller: one DAC output, its waveform and its pacing hardware.
//!
//! # Delivery
//!
//! - **Push**: the timer's trigger output latches the DAC and its DMA request
//!   copies the engine mirror into the holding register. No CPU work per
//!   sample beyond advancing the engine. Used for CV when the timer has a
//!   full resource route.
//! - **Pull**: the tick interrupt writes the new code and issues a software
//!   trigger. Used for DPV (edges are computed per event), constant output,
//!   and CV on an unrouted timer.

use crate::waveform::{GenMode, ScanMonitor, WaveformEngine};
use echem_common::hal::driver::StimulusHal;
use echem_common::hal::types::{
    ChannelBinding, DacSetup, DacTrigger, DmaPriority, DmaTransfer, IrqEvent, TimerConfig,
};
use echem_common::waveform::{CvParams, CvVoltParams, DpvParams, period_to_ticks};
use echem_hal::ResolvedHardware;
use std::sync::Arc;
use tracing::{debug, warn};

/// How codes reach the output register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Delivery {
    /// Hardware-triggered DMA from the code mirror.
    Push,
    /// Explicit write + software trigger from the tick interrupt.
    #[default]
    Pull,
}

/// Binds a [`WaveformEngine`] to a DAC channel and optional timer / DMA pair.
#[derive(Debug)]
pub struct ChannelController {
    hw: ResolvedHardware,
    engine: WaveformEngine,
    delivery: Delivery,
    armed: bool,
    paused: bool,
}

impl ChannelController {
    /// Resolve the binding. No hardware is touched.
    pub fn new(binding: &ChannelBinding) -> Self {
        Self {
            hw: ResolvedHardware::resolve(binding),
            engine: WaveformEngine::new(),
            delivery: Delivery::Pull,
            armed: false,
            paused: false,
        }
    }

    /// Configure a CV sweep, pushed when the hardware allows it.
    pub fn init_as_cv(&mut self, volt: &CvVoltParams, params: &CvParams) {
        self.engine.setup_cv(volt, params);
        self.engine.switch_mode(GenMode::CvScan);
        self.delivery = if self.hw.supports_push() {
            Delivery::Push
        } else {
            debug!("{:?}: CV without DMA route, using pull delivery", self.hw.output);
            Delivery::Pull
        };
    }

    /// Configure a DPV staircase (pull delivery).
    pub fn init_as_dpv(&mut self, params: &DpvParams) {
        self.engine.setup_dpv(params);
        self.engine.switch_mode(GenMode::DpvPulse);
        self.delivery = Delivery::Pull;
    }

    /// Configure a constant output (pull delivery).
    pub fn init_as_constant(&mut self, code: u16) {
        self.engine.setup_constant(code);
        self.engine.switch_mode(GenMode::Constant);
        self.delivery = Delivery::Pull;
    }

    /// Bring the output up and, for periodic modes, start the timer.
    ///
    /// The order matters: the current code is written before anything can
    /// trigger, so the output never shows a stale value; the timer is
    /// primed with a forced update so the first trigger is not missed.
    pub fn start<H: StimulusHal + ?Sized>(&mut self, hal: &mut H) {
        let out = self.hw.output;
        let push = self.delivery == Delivery::Push;

        hal.configure_analog_pin(out);
        hal.dac_enable(
            out,
            DacSetup {
                trigger: if push { self.hw.trigger } else { DacTrigger::Software },
                output_buffer: true,
                dma_requests: push,
            },
        );

        if push && let Some(dma) = self.hw.dma {
            hal.dma_arm(
                dma,
                DmaTransfer {
                    source: Arc::clone(self.engine.mirror()),
                    destination: out,
                    circular: true,
                    slots: 1,
                    priority: DmaPriority::High,
                },
            );
        }

        hal.dac_write(out, self.engine.current_data());
        if !push {
            hal.dac_software_trigger(out);
        }

        self.armed = true;
        self.paused = false;

        let Some(period) = self.engine.tick_period() else {
            debug!("{:?}: constant output {}", out, self.engine.current_data());
            return;
        };
        let Some(timer) = self.hw.timer else {
            warn!("{:?}: periodic mode without a timer, output held", out);
            return;
        };

        let ticks = period_to_ticks(period);
        hal.timer_configure(timer, TimerConfig::for_ticks(ticks));
        hal.timer_set_counter(timer, 0);
        hal.timer_clear_pending(timer, IrqEvent::Update);
        hal.timer_set_interrupt(timer, IrqEvent::Update, true);
        hal.timer_set_enabled(timer, true);
        hal.timer_generate_update(timer);
        debug!(
            "{:?}: {:?} on {} every {} ticks ({:?})",
            out,
            self.engine.mode(),
            timer,
            ticks,
            self.delivery
        );
    }

    /// Timer off, then output off, then transfer off.
    ///
    /// On return no tick of this channel can be serviced any more.
    pub fn stop<H: StimulusHal + ?Sized>(&mut self, hal: &mut H) {
        self.armed = false;
        self.paused = false;

        if let Some(timer) = self.hw.timer {
            hal.timer_set_enabled(timer, false);
            hal.timer_set_interrupt(timer, IrqEvent::Update, false);
            hal.timer_clear_pending(timer, IrqEvent::Update);
        }
        hal.dac_disable(self.hw.output);
        if let Some(dma) = self.hw.dma {
            hal.dma_disable(dma);
        }
    }

    /// Gate the timer clock. Repeated calls are no-ops.
    pub fn pause<H: StimulusHal + ?Sized>(&mut self, hal: &mut H) {
        if !self.armed || self.paused {
            return;
        }
        if self.engine.mode().is_periodic()
            && let Some(timer) = self.hw.timer
        {
            hal.timer_set_enabled(timer, false);
        }
        self.paused = true;
    }

    /// Ungate the timer clock. Repeated calls are no-ops.
    pub fn resume<H: StimulusHal + ?Sized>(&mut self, hal: &mut H) {
        if !self.armed || !self.paused {
            return;
        }
        if self.engine.mode().is_periodic()
            && let Some(timer) = self.hw.timer
        {
            hal.timer_set_enabled(timer, true);
        }
        self.paused = false;
    }

    /// Tick interrupt body. The pending flag is already acknowledged.
    #[inline]
    pub fn tim_irq_handler<H: StimulusHal + ?Sized>(&mut self, hal: &mut H) {
        if !self.armed || self.paused {
            return;
        }
        if self.engine.update_next_step() && self.delivery == Delivery::Pull {
            let out = self.hw.output;
            hal.dac_write(out, self.engine.current_data());
            hal.dac_software_trigger(out);
        }
    }

    /// Current engine code.
    #[inline]
    pub fn current_data(&self) -> u16 {
        self.engine.current_data()
    }

    pub fn engine(&self) -> &WaveformEngine {
        &self.engine
    }

    /// Boundary-layer handle on the engine.
    pub fn monitor(&self) -> ScanMonitor {
        self.engine.monitor()
    }

    pub fn hardware(&self) -> &ResolvedHardware {
        &self.hw
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// Started and not stopped.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
