//! The interrupt controller whose state must survive clock gating.
//!
//! The controller is a black box to this crate: it is brought up by a [`Factory`], and from then
//! on it is only asked to save or restore its state and to manipulate individual lines.

use alloc::sync::Arc;

#[cfg(test)]
use mockall::automock;
use snafu::Snafu;

use crate::{
    capability::{Capability, Target},
    Line,
};

/// Errors reported by an interrupt controller.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The line does not exist, or cannot be used for this operation.
    #[snafu(display("line {line} is not valid for this operation"))]
    InvalidLine {
        /// The offending line.
        line: Line,
    },

    /// The CPU interface does not exist on this controller.
    #[snafu(display("target {target:?} is not a CPU interface of this controller"))]
    InvalidTarget {
        /// The offending target.
        target: Target,
    },

    /// The hardware could not be brought up.
    #[snafu(display("initialization failed: {reason}"))]
    Initialization {
        /// A description of what went wrong.
        reason: &'static str,
    },
}

/// An initialized interrupt controller (distributor plus CPU interface).
///
/// Register state is lost whenever the controller's clocks are gated, so the `save_*` methods are
/// called before gating and the `restore_*` methods after the clocks are running again.
#[cfg_attr(test, automock)]
pub trait Controller: Send + Sync {
    /// Save the state shared by all CPU interfaces.
    fn save_distributor(&self);

    /// Save the state of the CPU interface.
    fn save_cpu_interface(&self);

    /// Restore the state saved by [`Controller::save_distributor`].
    fn restore_distributor(&self);

    /// Restore the state saved by [`Controller::save_cpu_interface`].
    /// Depends on the distributor having been restored first.
    fn restore_cpu_interface(&self);

    /// Returns true if the line is pending (raised but not yet acknowledged).
    fn is_pending(&self, line: Line) -> bool;

    /// Clear the pending state of a line.
    fn clear_pending(&self, line: Line);

    /// Returns true if the line is active (acknowledged and being serviced).
    fn is_active(&self, line: Line) -> bool;

    /// Clear the active state of a line.
    fn clear_active(&self, line: Line);

    /// Deliver the line to the CPU interface `target` from now on.
    ///
    /// # Errors
    /// Returns an error if the line cannot be routed, or if `target` does not exist.
    fn route(&self, line: Line, target: Target) -> Result<(), Error>;
}

/// Brings up a controller instance.
#[cfg_attr(test, automock)]
pub trait Factory {
    /// Initialize the controller for a device of the given variant, chained to the `parent`
    /// interrupt line.
    ///
    /// The clocks of the device are running when this is called.
    ///
    /// # Errors
    /// Returns an error if the hardware cannot be initialized.
    fn init(
        &self,
        parent: Line,
        capability: &'static Capability,
    ) -> Result<Arc<dyn Controller>, Error>;
}
