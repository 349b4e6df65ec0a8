//! Clock gating of the controller, and preservation of its state across it.
//!
//! A [`PowerContext`] is either clock-gated (its initial state) or clock-active. The state is not
//! stored anywhere: the runtime power-management framework drives the transitions through
//! [`runtime_resume`] and [`runtime_suspend`], and serializes them per device.
//!
//! The only thing the transitions branch on is whether the controller has been initialized yet.
//! The first resume happens while the device is being probed, before the controller exists, and
//! must not restore anything: there is no saved state yet and restoring would write garbage into
//! the registers.

use alloc::sync::Arc;

use log::{debug, error, trace, warn};
use snafu::{OptionExt as _, ResultExt as _};
use spin::Once;

use crate::{
    capability::{Capability, Target},
    clock::Bundle,
    controller::Controller,
    device::Device,
    ClockSnafu, ControllerSnafu, Error, InvalidArgumentSnafu, Line, RuntimePmSnafu,
};

/// Driver state of one controller instance.
pub struct PowerContext {
    capability: &'static Capability,
    parent: Line,
    clocks: Bundle,
    /// Set exactly once, when the controller is initialized, and never cleared.
    controller: Once<Arc<dyn Controller>>,
}

impl core::fmt::Debug for PowerContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PowerContext")
            .field("compatible", &self.capability.compatible)
            .field("parent", &self.parent)
            .field("clocks", &self.clocks.len())
            .field("initialized", &self.controller().is_some())
            .finish()
    }
}

impl PowerContext {
    /// Create the state for a device whose controller has not been initialized yet.
    #[must_use]
    pub fn new(capability: &'static Capability, parent: Line, clocks: Bundle) -> Self {
        Self {
            capability,
            parent,
            clocks,
            controller: Once::new(),
        }
    }

    /// The variant of the device.
    #[must_use]
    pub fn capability(&self) -> &'static Capability {
        self.capability
    }

    /// The parent interrupt line the controller is chained to.
    #[must_use]
    pub fn parent(&self) -> Line {
        self.parent
    }

    /// The clocks of the device.
    #[must_use]
    pub fn clocks(&self) -> &Bundle {
        &self.clocks
    }

    /// The controller, once it has been initialized.
    #[must_use]
    pub fn controller(&self) -> Option<&Arc<dyn Controller>> {
        self.controller.get()
    }

    /// Record the freshly initialized controller.
    ///
    /// Only the first call has an effect; the controller stays installed for the lifetime of the
    /// context. Returns the installed controller.
    pub fn install_controller(&self, controller: Arc<dyn Controller>) -> &Arc<dyn Controller> {
        let mut fresh = false;
        let installed = self.controller.call_once(|| {
            fresh = true;
            controller
        });
        if !fresh {
            warn!("controller already installed, keeping the existing one");
        }
        installed
    }

    /// Transition from clock-gated to clock-active.
    ///
    /// Enables the clocks, then restores the distributor and CPU interface state if the
    /// controller has been initialized.
    ///
    /// # Errors
    /// Returns [`Error::Clock`] if the clocks fail to enable. Nothing is restored in that case.
    pub fn runtime_resume(&self) -> Result<(), Error> {
        self.clocks
            .enable()
            .inspect_err(|e| error!("clk_enable failed: {e}"))
            .context(ClockSnafu)?;

        let Some(controller) = self.controller() else {
            debug!("first resume, controller not initialized yet");
            return Ok(());
        };

        // CPU interface state refers to the distributor configuration.
        controller.restore_distributor();
        controller.restore_cpu_interface();
        trace!("controller state restored");

        Ok(())
    }

    /// Transition from clock-active to clock-gated.
    ///
    /// Saves the distributor and CPU interface state while the registers are still readable,
    /// then disables the clocks.
    ///
    /// # Errors
    /// Gating cannot fail at present; the `Result` matches the shape of the framework callback.
    pub fn runtime_suspend(&self) -> Result<(), Error> {
        match self.controller() {
            Some(controller) => {
                controller.save_distributor();
                controller.save_cpu_interface();
                trace!("controller state saved");
            }
            // happens when probe fails after powering up, before the controller was initialized
            None => debug!("suspending before controller initialization, nothing to save"),
        }

        self.clocks.disable();

        Ok(())
    }

    /// Returns true if `line` is pending. False if the controller is not initialized.
    pub fn is_pending(&self, line: Line) -> bool {
        self.initialized_controller()
            .is_some_and(|c| c.is_pending(line))
    }

    /// Clear the pending state of `line`. Does nothing if the controller is not initialized.
    pub fn clear_pending(&self, line: Line) {
        if let Some(c) = self.initialized_controller() {
            c.clear_pending(line);
        }
    }

    /// Returns true if `line` is active. False if the controller is not initialized.
    pub fn is_active(&self, line: Line) -> bool {
        self.initialized_controller()
            .is_some_and(|c| c.is_active(line))
    }

    /// Clear the active state of `line`. Does nothing if the controller is not initialized.
    pub fn clear_active(&self, line: Line) {
        if let Some(c) = self.initialized_controller() {
            c.clear_active(line);
        }
    }

    /// Route `line` to the CPU interface `target`.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] if the controller is not initialized, the variant cannot
    ///   route, or `target` is out of range.
    /// - [`Error::Controller`] if the controller rejects the request.
    pub fn route(&self, line: Line, target: Target) -> Result<(), Error> {
        let controller = self
            .initialized_controller()
            .context(InvalidArgumentSnafu {
                reason: "controller not initialized",
            })?;
        self.capability.check_route(target)?;
        controller.route(line, target).context(ControllerSnafu)
    }

    fn initialized_controller(&self) -> Option<&Arc<dyn Controller>> {
        let controller = self.controller();
        if controller.is_none() {
            warn!(
                "{} controller used before initialization",
                self.capability.compatible
            );
        }
        controller
    }
}

/// The runtime resume callback of the driver.
///
/// # Errors
/// Returns [`Error::RuntimePm`] if the device has no driver state, or the error of
/// [`PowerContext::runtime_resume`].
pub fn runtime_resume<D: Device + ?Sized>(device: &D) -> Result<(), Error> {
    device
        .driver_data()
        .context(RuntimePmSnafu {
            reason: "device has no power context",
        })?
        .runtime_resume()
}

/// The runtime suspend callback of the driver.
///
/// # Errors
/// Returns [`Error::RuntimePm`] if the device has no driver state.
pub fn runtime_suspend<D: Device + ?Sized>(device: &D) -> Result<(), Error> {
    device
        .driver_data()
        .context(RuntimePmSnafu {
            reason: "device has no power context",
        })?
        .runtime_suspend()
}
