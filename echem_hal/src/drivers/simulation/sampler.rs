//! Simulated sampling subsystem.

use echem_common::sampling::{Readings, SamplingSubsystem};

/// Bookkeeping stand-in for the analog-to-digital side.
///
/// Readings are whatever the test or the board last stored with
/// [`SimulatedSampler::set_readings`].
#[derive(Debug, Clone, Default)]
pub struct SimulatedSampler {
    running: bool,
    paused: bool,
    starts: u32,
    pauses: u32,
    resumes: u32,
    services: u64,
    readings: Readings,
}

impl SimulatedSampler {
    /// Idle sampler with zeroed readings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the reading buffer.
    pub fn set_readings(&mut self, readings: Readings) {
        self.readings = readings;
    }

    /// Conversion started and not paused.
    pub fn is_converting(&self) -> bool {
        self.running && !self.paused
    }

    /// Conversion paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of `start_conversion` calls.
    pub fn starts(&self) -> u32 {
        self.starts
    }

    /// Number of `pause` calls.
    pub fn pauses(&self) -> u32 {
        self.pauses
    }

    /// Number of `resume` calls.
    pub fn resumes(&self) -> u32 {
        self.resumes
    }

    /// Number of `service` calls.
    pub fn services(&self) -> u64 {
        self.services
    }
}

impl SamplingSubsystem for SimulatedSampler {
    fn start_conversion(&mut self) {
        self.running = true;
        self.paused = false;
        self.starts += 1;
    }

    fn pause(&mut self) {
        self.paused = true;
        self.pauses += 1;
    }

    fn resume(&mut self) {
        self.paused = false;
        self.resumes += 1;
    }

    fn service(&mut self) {
        self.services += 1;
    }

    fn readings(&self) -> &Readings {
        &self.readings
    }
}
