//! Power management for a generic interrupt controller whose clock domain can be gated.
//!
//! The controller itself is a black box ([`controller::Controller`]). This crate decides *when*
//! its clocks run and when its distributor and CPU interface state must be saved or restored,
//! brings a device up in the right order ([`probe::Driver`]), and exposes a small per-line
//! control surface to the rest of the system ([`control`]).
#![no_std]
#![deny(missing_docs)]

extern crate alloc;

#[cfg(all(test, not(target_os = "none")))]
#[macro_use]
extern crate std;

pub mod capability;
pub mod clock;
pub mod control;
pub mod controller;
pub mod device;
pub mod power;
pub mod probe;

mod error;
pub use error::*;

/// The number of an interrupt line managed by a controller.
pub type Line = u32;
