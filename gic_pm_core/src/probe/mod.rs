//! Bring-up and teardown of a controller device.

use alloc::sync::Arc;

use log::{debug, error, info, warn};
use snafu::ResultExt as _;

use crate::{
    capability::{self, Capability, MATCH_TABLE},
    clock,
    control::Registry,
    controller,
    device::{Device, RuntimePm},
    power::PowerContext,
    ConfigurationNotFoundSnafu, ControllerInitSnafu, Error, ResourceMappingFailedSnafu,
};

mod unwind;
pub use unwind::Unwind;

/// The driver: the collaborators shared by every device it binds to.
pub struct Driver<'a> {
    table: &'static [Capability],
    clocks: Arc<dyn clock::Provider + Send + Sync>,
    controllers: &'a dyn controller::Factory,
    registry: &'a Registry,
}

impl<'a> Driver<'a> {
    /// Create a driver matching devices against [`MATCH_TABLE`].
    ///
    /// Controllers are published in `registry`; pass [`crate::control::REGISTRY`] to make them
    /// reachable through the free functions of [`crate::control`].
    pub fn new(
        clocks: Arc<dyn clock::Provider + Send + Sync>,
        controllers: &'a dyn controller::Factory,
        registry: &'a Registry,
    ) -> Self {
        Self {
            table: MATCH_TABLE,
            clocks,
            controllers,
            registry,
        }
    }

    /// Match devices against `table` instead of the built-in one.
    #[must_use]
    pub fn with_table(mut self, table: &'static [Capability]) -> Self {
        self.table = table;
        self
    }

    /// Bring up the controller of `device`.
    ///
    /// The clocks are running while the controller is initialized, and the device is left to the
    /// runtime power-management framework afterwards. The first resume happens here, before the
    /// controller exists, which is what makes [`PowerContext::runtime_resume`] skip the restore.
    ///
    /// # Errors
    /// - [`Error::ConfigurationNotFound`] if the device is not a known variant.
    /// - [`Error::ResourceMappingFailed`] if the parent interrupt cannot be mapped.
    /// - [`Error::ResourceExhausted`] or [`Error::Clock`] if the clocks cannot be acquired.
    /// - Any error of the first resume, typically [`Error::Clock`].
    /// - [`Error::ControllerInit`] if the controller fails to initialize.
    ///
    /// On failure everything acquired so far is released again, and no driver state is left
    /// associated with the device.
    pub fn probe<D: Device + RuntimePm>(&self, device: &D) -> Result<Arc<PowerContext>, Error> {
        let Some(capability) = capability::lookup(self.table, device.compatible().iter().copied())
        else {
            error!("no device match found for {:?}", device.compatible());
            return ConfigurationNotFoundSnafu.fail();
        };
        debug!("probing {}", capability.compatible);

        let mut unwind = Unwind::new();

        let Some(parent) = device.map_interrupt(0) else {
            error!("no parent interrupt found!");
            return ResourceMappingFailedSnafu.fail();
        };
        unwind.push(move || device.dispose_interrupt(parent));

        let clocks = clock::Bundle::acquire(self.clocks.clone(), capability.clock_names)?;
        let context = Arc::new(PowerContext::new(capability, parent, clocks));
        unwind.push({
            let context = context.clone();
            move || context.clocks().release()
        });

        device.set_driver_data(Some(context.clone()));
        unwind.push(move || device.set_driver_data(None));
        device.runtime_enable();
        unwind.push(move || device.runtime_disable());

        // Must happen before the controller is installed, see `PowerContext::runtime_resume`.
        device.resume_and_get()?;
        unwind.push(move || device.put_sync());

        let controller = self
            .controllers
            .init(parent, capability)
            .context(ControllerInitSnafu)?;
        let controller = context.install_controller(controller).clone();

        unwind.commit();
        device.put();

        if let Some(family) = capability.family {
            self.registry.publish(family, capability, controller);
        }

        info!("GIC IRQ controller registered");

        Ok(context)
    }

    /// Tear down a device brought up by [`Driver::probe`].
    ///
    /// The controller is withdrawn from the registry (if it was published there), the device is
    /// suspended for the last time, and every resource is given back.
    pub fn remove<D: Device + RuntimePm>(&self, device: &D) {
        let Some(context) = device.driver_data() else {
            warn!("removing a device that was never probed");
            return;
        };

        if let (Some(family), Some(controller)) =
            (context.capability().family, context.controller())
        {
            self.registry.withdraw(family, controller);
        }

        if let Err(e) = device.force_suspend() {
            // the clocks may still be running, and must not be released that way
            warn!("failed to suspend controller for removal: {e}");
            context.clocks().disable();
        }
        device.runtime_disable();
        device.set_driver_data(None);
        context.clocks().release();
        device.dispose_interrupt(context.parent());

        debug!("removed {}", context.capability().compatible);
    }
}

/// Late system-sleep suspend callback: reuse the runtime suspend path.
///
/// # Errors
/// Returns the error of the forced runtime suspend.
pub fn suspend_late<D: RuntimePm + ?Sized>(device: &D) -> Result<(), Error> {
    device.force_suspend()
}

/// Early system-sleep resume callback: reuse the runtime resume path.
///
/// # Errors
/// Returns the error of the forced runtime resume.
pub fn resume_early<D: RuntimePm + ?Sized>(device: &D) -> Result<(), Error> {
    device.force_resume()
}
