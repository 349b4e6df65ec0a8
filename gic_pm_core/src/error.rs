use snafu::Snafu;

use crate::{clock, controller};

/// Errors that arise while bringing up a device, during its power transitions, or from the
/// control surface.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// No capability descriptor matches the compatible strings of the device.
    #[snafu(display("no device match found"))]
    ConfigurationNotFound,

    /// The parent interrupt line of the device could not be mapped.
    #[snafu(display("no parent interrupt found"))]
    ResourceMappingFailed,

    /// Allocating driver state failed.
    ///
    /// Only the clock bundle allocates fallibly; the power context itself is a plain `Arc`.
    #[snafu(display("out of memory allocating driver state"))]
    ResourceExhausted,

    /// A clock could not be acquired or enabled.
    #[snafu(display("clock failure: {source}"))]
    Clock {
        /// Underlying error.
        source: clock::Error,
    },

    /// The interrupt controller failed to initialize.
    #[snafu(display("controller initialization failed: {source}"))]
    ControllerInit {
        /// Underlying error.
        source: controller::Error,
    },

    /// The interrupt controller rejected an operation.
    #[snafu(display("controller error: {source}"))]
    Controller {
        /// Underlying error.
        source: controller::Error,
    },

    /// The runtime power-management framework could not carry out a request.
    #[snafu(display("runtime power management: {reason}"))]
    RuntimePm {
        /// A description of what went wrong.
        reason: &'static str,
    },

    /// No controller has been published for the requested family yet.
    #[snafu(display("no controller published"))]
    Unpublished,

    /// An argument was not acceptable for the controller it was directed at.
    #[snafu(display("invalid argument: {reason}"))]
    InvalidArgument {
        /// A description further explaining why the argument was rejected.
        reason: &'static str,
    },
}
