//! # Stimulus HAL Library
//!
//! Static hardware bindings and interrupt routing for the DAC channels,
//! plus a software model of the peripherals for development and testing.
//!
//! # Module Structure
//!
//! - [`resource_map`] - Timer → DMA channel / DAC trigger lookup
//! - [`irq_registry`] - Interrupt registration table and dispatch
//! - [`drivers`] - Peripheral implementations of the HAL traits
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     echem_hal (single crate)                     │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐  │
//! │  │ ResourceMap  │   │ IrqRegistry  │──►│ IrqTarget (channels) │  │
//! │  │ (static)     │   │ (dispatch)   │   └──────────────────────┘  │
//! │  └──────────────┘   └──────┬───────┘                             │
//! │                            │ ack                                 │
//! │                            ▼                                     │
//! │                   ┌────────────────┐                             │
//! │                   │  StimulusHal   │ (simulation / registers)    │
//! │                   └────────────────┘                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod drivers;
pub mod irq_registry;
pub mod resource_map;

pub use crate::irq_registry::{IrqError, IrqRegistration, IrqRegistry, IrqTarget};
pub use crate::resource_map::{ResolvedHardware, TimerResources};
