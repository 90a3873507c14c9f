//! Electrochemical stimulus common library
//!
//! Shared constants, waveform parameter types and hardware identity types
//! used by every crate of the workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Reference span, code range, timer base rate
//! - [`waveform`] - CV / DPV / constant parameters and voltage→code mapping
//! - [`state`] - Run-state enum shared with the boundary layer
//! - [`hal`] - Peripheral identities and the HAL traits drivers implement
//! - [`sampling`] - Interface of the external sampling subsystem
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use echem_common::prelude::*;
//!
//! assert_eq!(volt_to_code(0.0), 0);
//! assert_eq!(volt_to_code(VREF_VOLTS), CODE_MAX);
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
pub mod sampling;
pub mod state;
pub mod waveform;
