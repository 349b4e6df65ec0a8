//! Interfaces of the host device model and its runtime power-management framework.
//!
//! The framework owns the decision of when a device is suspended or resumed. It calls back into
//! the driver through [`crate::power::runtime_suspend`] and [`crate::power::runtime_resume`],
//! and serializes those calls for a single device.

use alloc::sync::Arc;

use crate::{power::PowerContext, Error, Line};

/// A platform device node the driver is bound to.
pub trait Device {
    /// The `compatible` strings declared by the device, most specific first.
    fn compatible(&self) -> &[&str];

    /// Map the `index`th interrupt of the device into a usable line number.
    fn map_interrupt(&self, index: usize) -> Option<Line>;

    /// Undo a mapping made by [`Device::map_interrupt`].
    fn dispose_interrupt(&self, line: Line);

    /// Associate driver state with the device, or remove the association with `None`.
    fn set_driver_data(&self, context: Option<Arc<PowerContext>>);

    /// The driver state associated with the device, if any.
    fn driver_data(&self) -> Option<Arc<PowerContext>>;
}

/// The runtime power-management framework, as seen by one device.
pub trait RuntimePm {
    /// Start tracking the device. The device is initially considered suspended.
    fn runtime_enable(&self);

    /// Stop tracking the device.
    fn runtime_disable(&self);

    /// Resume the device if it is suspended, and hold a usage reference keeping it active.
    ///
    /// # Errors
    /// Returns the error of the resume callback, in which case no reference is held.
    fn resume_and_get(&self) -> Result<(), Error>;

    /// Drop a usage reference; the device may be suspended later when idle.
    fn put(&self);

    /// Drop a usage reference and suspend the device right away if it is idle.
    fn put_sync(&self);

    /// Suspend the device regardless of usage, for system sleep.
    ///
    /// # Errors
    /// Returns the error of the suspend callback.
    fn force_suspend(&self) -> Result<(), Error>;

    /// Undo [`RuntimePm::force_suspend`] when the system wakes up.
    ///
    /// # Errors
    /// Returns the error of the resume callback.
    fn force_resume(&self) -> Result<(), Error>;
}
