//! Simulation board: the orchestrator on simulated peripherals.
//!
//! Time advances in timer base ticks (0.1 ms). After every tick the board
//! plays the interrupt controller: each timer with a pending, enabled update
//! interrupt is routed through the orchestrator's registration table.

use crate::config::StimulusConfig;
use crate::system::SystemOrchestrator;
use echem_common::consts::TIMER_TICK_HZ;
use echem_common::hal::types::{IrqEvent, TIMER_COUNT};
use echem_hal::drivers::simulation::{SimulatedHal, SimulatedSampler};

/// Base ticks per simulated millisecond.
pub const TICKS_PER_MS: u32 = TIMER_TICK_HZ / 1000;

/// Orchestrator type driven by the board.
pub type SimulatedSystem = SystemOrchestrator<SimulatedHal, SimulatedSampler>;

/// Deterministic stand-in for the target board.
#[derive(Debug)]
pub struct SimulationBoard {
    system: SimulatedSystem,
}

impl SimulationBoard {
    /// Board configured from `config`, call journal disabled.
    pub fn new(config: &StimulusConfig) -> Self {
        Self::with_hal(SimulatedHal::without_journal(), config)
    }

    /// Board over a caller-provided peripheral model.
    pub fn with_hal(hal: SimulatedHal, config: &StimulusConfig) -> Self {
        let mut system = SystemOrchestrator::new(
            hal,
            SimulatedSampler::new(),
            &config.channels.scan,
            &config.channels.bias,
        );
        config.apply_defaults(&mut system);
        Self { system }
    }

    /// Advance one base tick and service the resulting interrupts.
    ///
    /// Returns the number of handlers invoked.
    pub fn step(&mut self) -> u32 {
        self.system.hal_mut().tick();
        self.service_interrupts()
    }

    /// Advance `ticks` base ticks.
    pub fn run_ticks(&mut self, ticks: u32) -> u32 {
        (0..ticks).map(|_| self.step()).sum()
    }

    /// Advance whole milliseconds.
    pub fn run_ms(&mut self, ms: u32) -> u32 {
        self.run_ticks(ms.saturating_mul(TICKS_PER_MS))
    }

    /// Dispatch every pending, enabled update interrupt once.
    pub fn service_interrupts(&mut self) -> u32 {
        let mut pending = [None; TIMER_COUNT];
        for (slot, timer) in pending.iter_mut().zip(self.system.hal().pending_interrupts()) {
            *slot = Some(timer);
        }

        let mut serviced = 0;
        for timer in pending.into_iter().flatten() {
            if self.system.handle_interrupt(timer, IrqEvent::Update) {
                serviced += 1;
            }
        }
        serviced
    }

    pub fn system(&self) -> &SimulatedSystem {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut SimulatedSystem {
        &mut self.system
    }

    /// Simulated time since power-up [ms].
    pub fn elapsed_ms(&self) -> u64 {
        self.system.hal().elapsed_ticks() / u64::from(TICKS_PER_MS)
    }
}
