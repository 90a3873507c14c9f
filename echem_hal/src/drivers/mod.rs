//! Peripheral implementations of the HAL traits.
//!
//! - [`simulation`] - Software model of the DAC / DMA / timer peripherals and
//!   of the sampling subsystem, for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `AnalogOutput`, `TransferEngine` and `TickTimer` from
//!    `echem_common::hal::driver` (`StimulusHal` follows automatically)
//! 3. Add export and documentation

pub mod simulation;
