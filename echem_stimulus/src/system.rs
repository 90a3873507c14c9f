//! System orchestrator: Scan and Bias channels, sampling, run-state.
//!
//! The orchestrator is constructed once at startup and owns everything the
//! tick path touches: the peripherals, both channel controllers and the
//! interrupt table. Foreground code drives it through `&mut self`; the tick
//! interrupt enters through [`SystemOrchestrator::handle_interrupt`].
//!
//! # Start sequence
//!
//! 1. sampling subsystem first, so it is never behind the stimulus
//! 2. Scan channel initialised from the cached mode and parameters
//! 3. Bias channel initialised as constant
//! 4. tick handler registered before any timer runs
//! 5. both channels started
//! 6. one more forced update on the scan timer
//! 7. tick counter cleared

use crate::channel::ChannelController;
use crate::state::machine::{RunEvent, RunStateMachine, TransitionResult};
use crate::waveform::ScanMonitor;
use echem_common::consts::{CODE_MAX, CODE_MID};
use echem_common::hal::driver::StimulusHal;
use echem_common::hal::types::{ChannelBinding, DacChannel, IrqEvent, IrqPriority, TimerId};
use echem_common::sampling::SamplingSubsystem;
use echem_common::state::RunState;
use echem_common::waveform::{CvParams, CvVoltParams, DpvParams, RunMode, SampleFlags};
use echem_hal::{IrqRegistry, IrqTarget};
use tracing::{debug, info, warn};

/// Priority of the scan timer update interrupt.
pub const SCAN_IRQ_PRIORITY: IrqPriority = IrqPriority::new(1, 1);

/// Default Scan binding: DAC channel 2 paced by TIM2.
pub const DEFAULT_SCAN_BINDING: ChannelBinding = ChannelBinding::timed(DacChannel::Ch2, TimerId::Tim2);

/// Default Bias binding: DAC channel 1, software only.
pub const DEFAULT_BIAS_BINDING: ChannelBinding = ChannelBinding::untimed(DacChannel::Ch1);

/// Fixed channel roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    /// Timer-driven working electrode channel (CV / DPV / IT).
    Scan,
    /// Constant bias channel.
    Bias,
}

impl ChannelRole {
    /// Zero-based slot index.
    #[inline]
    pub const fn index(&self) -> usize {
        match self {
            Self::Scan => 0,
            Self::Bias => 1,
        }
    }
}

/// The two channel controllers, dispatch target of the tick interrupt.
#[derive(Debug)]
pub struct ChannelPair {
    /// Scan channel.
    pub scan: ChannelController,
    /// Bias channel.
    pub bias: ChannelController,
}

impl ChannelPair {
    #[inline]
    fn get_mut(&mut self, role: ChannelRole) -> &mut ChannelController {
        match role {
            ChannelRole::Scan => &mut self.scan,
            ChannelRole::Bias => &mut self.bias,
        }
    }
}

impl<H: StimulusHal + ?Sized> IrqTarget<ChannelRole, H> for ChannelPair {
    #[inline]
    fn on_interrupt(&mut self, key: ChannelRole, hal: &mut H) {
        self.get_mut(key).tim_irq_handler(hal);
    }
}

/// Top-level coordinator of the stimulus core.
#[derive(Debug)]
pub struct SystemOrchestrator<H, S> {
    hal: H,
    sampler: S,
    channels: ChannelPair,
    irq: IrqRegistry<ChannelRole>,
    state: RunStateMachine,
    mode: RunMode,
    cv_volt: CvVoltParams,
    cv: CvParams,
    dpv: DpvParams,
    constants: [u16; 2],
    ticks: u32,
}

impl<H: StimulusHal, S: SamplingSubsystem> SystemOrchestrator<H, S> {
    /// Build an idle orchestrator with compiled default parameters.
    pub fn new(hal: H, sampler: S, scan: &ChannelBinding, bias: &ChannelBinding) -> Self {
        Self {
            hal,
            sampler,
            channels: ChannelPair {
                scan: ChannelController::new(scan),
                bias: ChannelController::new(bias),
            },
            irq: IrqRegistry::new(),
            state: RunStateMachine::new(),
            mode: RunMode::default(),
            cv_volt: CvVoltParams::default(),
            cv: CvParams::default(),
            dpv: DpvParams::default(),
            constants: [CODE_MID; 2],
            ticks: 0,
        }
    }

    /// [`SystemOrchestrator::new`] with the board's default bindings.
    pub fn with_default_bindings(hal: H, sampler: S) -> Self {
        Self::new(hal, sampler, &DEFAULT_SCAN_BINDING, &DEFAULT_BIAS_BINDING)
    }

    // ─── Run-state ──────────────────────────────────────────────────

    /// `Idle → Running`.
    pub fn start(&mut self) -> TransitionResult {
        let result = self.state.check(RunEvent::Start);
        if !result.is_ok() {
            debug!("start ignored: {:?}", result);
            return result;
        }

        self.sampler.start_conversion();

        let scan = &mut self.channels.scan;
        match self.mode {
            RunMode::Cv => scan.init_as_cv(&self.cv_volt, &self.cv),
            RunMode::Dpv => scan.init_as_dpv(&self.dpv),
            RunMode::It => scan.init_as_constant(self.constants[ChannelRole::Scan.index()]),
        }
        self.channels
            .bias
            .init_as_constant(self.constants[ChannelRole::Bias.index()]);

        let scan_timer = if self.mode.is_periodic() {
            self.channels.scan.hardware().timer
        } else {
            None
        };

        if let Some(timer) = scan_timer {
            if let Err(e) =
                self.irq
                    .register(timer, IrqEvent::Update, ChannelRole::Scan, SCAN_IRQ_PRIORITY)
            {
                warn!("scan tick handler not registered: {e}");
            }
            self.hal.timer_clear_pending(timer, IrqEvent::Update);
        }

        self.channels.scan.start(&mut self.hal);
        self.channels.bias.start(&mut self.hal);

        if let Some(timer) = scan_timer {
            self.hal.timer_generate_update(timer);
        }

        self.ticks = 0;
        let result = self.state.handle_event(RunEvent::Start);
        info!(
            "{} started: scan code {}, bias code {}",
            self.mode,
            self.channels.scan.current_data(),
            self.channels.bias.current_data()
        );
        result
    }

    /// `Running | Paused → Idle`.
    pub fn stop(&mut self) -> TransitionResult {
        let result = self.state.handle_event(RunEvent::Stop);
        if !result.is_ok() {
            debug!("stop ignored: {:?}", result);
            return result;
        }

        self.channels.scan.stop(&mut self.hal);
        self.channels.bias.stop(&mut self.hal);
        if let Some(timer) = self.channels.scan.hardware().timer {
            self.irq.unregister(timer, IrqEvent::Update);
        }
        info!("{} stopped after {} ticks", self.mode, self.ticks);
        result
    }

    /// `Running → Paused`.
    pub fn pause(&mut self) -> TransitionResult {
        let result = self.state.handle_event(RunEvent::Pause);
        if !result.is_ok() {
            debug!("pause ignored: {:?}", result);
            return result;
        }

        self.channels.scan.pause(&mut self.hal);
        self.channels.bias.pause(&mut self.hal);
        self.sampler.pause();
        info!("{} paused", self.mode);
        result
    }

    /// `Paused → Running`.
    pub fn resume(&mut self) -> TransitionResult {
        let result = self.state.handle_event(RunEvent::Resume);
        if !result.is_ok() {
            debug!("resume ignored: {:?}", result);
            return result;
        }

        self.channels.scan.resume(&mut self.hal);
        self.channels.bias.resume(&mut self.hal);
        self.sampler.resume();
        info!("{} resumed", self.mode);
        result
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.state.state()
    }

    // ─── Configuration cache ────────────────────────────────────────

    /// Select the Scan technique. Only honoured in `Idle`.
    pub fn set_mode(&mut self, mode: RunMode) -> bool {
        if !self.state.allows_configuration() {
            debug!("set_mode({}) ignored in {:?}", mode, self.state());
            return false;
        }
        self.mode = mode;
        true
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Cache CV parameters for the next start.
    pub fn set_cv_params(&mut self, volt: CvVoltParams, params: CvParams) {
        self.cv_volt = volt;
        self.cv = params;
    }

    /// Cache DPV parameters for the next start.
    pub fn set_dpv_params(&mut self, params: DpvParams) {
        self.dpv = params;
    }

    /// Cache the constant of one role, clamped to 12 bits.
    pub fn set_constant(&mut self, role: ChannelRole, code: u16) {
        self.constants[role.index()] = code.min(CODE_MAX);
    }

    /// Scan output in IT mode.
    pub fn set_scan_constant(&mut self, code: u16) {
        self.set_constant(ChannelRole::Scan, code);
    }

    /// Bias channel output.
    pub fn set_bias_constant(&mut self, code: u16) {
        self.set_constant(ChannelRole::Bias, code);
    }

    pub fn cv_params(&self) -> (CvVoltParams, CvParams) {
        (self.cv_volt, self.cv)
    }

    pub fn dpv_params(&self) -> DpvParams {
        self.dpv
    }

    pub fn constant(&self, role: ChannelRole) -> u16 {
        self.constants[role.index()]
    }

    // ─── Display tick ───────────────────────────────────────────────

    /// Count one foreground polling interval while running.
    ///
    /// Display timing only; waveform cadence comes from the timer.
    pub fn update_tick(&mut self) {
        if self.state() == RunState::Running {
            self.ticks = self.ticks.wrapping_add(1);
        }
    }

    pub fn tick_count(&self) -> u32 {
        self.ticks
    }

    pub fn clear_tick(&mut self) {
        self.ticks = 0;
    }

    // ─── Interrupt entry ────────────────────────────────────────────

    /// Route one timer interrupt through the registration table.
    ///
    /// Returns `false` when no handler is registered for the source.
    #[inline]
    pub fn handle_interrupt(&mut self, timer: TimerId, event: IrqEvent) -> bool {
        self.irq
            .dispatch(&mut self.hal, timer, event, &mut self.channels)
    }

    // ─── Boundary layer ─────────────────────────────────────────────

    /// Live Scan code, masked to 12 bits.
    #[inline]
    pub fn scan_code(&self) -> u16 {
        self.channels.scan.engine().mirror().load()
    }

    /// Read and clear the DPV sample marks of the Scan channel.
    pub fn consume_sample_flags(&self) -> SampleFlags {
        self.channels.scan.engine().consume_sample_flags()
    }

    /// Cloneable handle on the Scan code and sample marks.
    pub fn scan_monitor(&self) -> ScanMonitor {
        self.channels.scan.monitor()
    }

    pub fn scan(&self) -> &ChannelController {
        &self.channels.scan
    }

    pub fn bias(&self) -> &ChannelController {
        &self.channels.bias
    }

    pub fn irq_registry(&self) -> &IrqRegistry<ChannelRole> {
        &self.irq
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }
}
