//! Hardware abstraction layer types and traits.
//!
//! This module contains the peripheral identities and the traits a
//! peripheral driver (real registers or simulation) implements.

pub mod driver;
pub mod types;
