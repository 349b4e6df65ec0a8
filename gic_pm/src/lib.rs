//! Memory-mapped ARM GIC-400 support for [`gic_pm_core`].
//!
//! [`gic400::Gic400`] is the controller whose state [`gic_pm_core::power`] preserves across clock
//! gating, and [`specifier`] decodes the interrupt specifiers found in device tree nodes that
//! reference it.
#![no_std]
#![deny(missing_docs)]

extern crate alloc;

#[cfg(all(test, not(target_os = "none")))]
#[macro_use]
extern crate std;

pub mod gic400;
pub mod specifier;
