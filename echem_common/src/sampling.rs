//! Interface of the external sampling subsystem.
//!
//! The analog-to-digital side (conversion DMA, display service) lives
//! outside this workspace; the orchestrator only drives it through this trait.

use crate::consts::SAMPLING_CHANNELS;

/// Most recent reading of every sampled channel, in raw ADC counts.
pub type Readings = [u16; SAMPLING_CHANNELS];

/// Sampling subsystem consumed by the orchestrator.
///
/// All calls happen from the foreground context.
pub trait SamplingSubsystem {
    /// Begin continuous conversion.
    fn start_conversion(&mut self);

    /// Suspend conversion cadence (waveform paused).
    fn pause(&mut self);

    /// Resume conversion cadence.
    fn resume(&mut self);

    /// Periodic foreground service (display refresh, buffer upkeep).
    fn service(&mut self);

    /// Read-only view of the latest readings.
    fn readings(&self) -> &Readings;
}
