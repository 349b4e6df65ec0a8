//! Process-wide table of controllers, keyed by hardware family.

use alloc::sync::Arc;

use arc_swap::ArcSwapOption;
use log::{debug, warn};

use crate::{
    capability::{Capability, Family},
    controller::Controller,
};

/// A controller published for use by other subsystems.
pub struct Published {
    capability: &'static Capability,
    controller: Arc<dyn Controller>,
}

impl Published {
    /// The variant of the published controller.
    #[must_use]
    pub fn capability(&self) -> &'static Capability {
        self.capability
    }

    /// The published controller.
    #[must_use]
    pub fn controller(&self) -> &Arc<dyn Controller> {
        &self.controller
    }
}

/// Controllers reachable without a device handle, one slot per [`Family`].
///
/// Slots are written when a device is probed and read from arbitrary contexts, so each one is an
/// atomically swapped reference: readers either see nothing or a fully initialized controller.
pub struct Registry {
    slots: [ArcSwapOption<Published>; Family::COUNT],
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry with nothing published.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| ArcSwapOption::empty()),
        }
    }

    /// Publish `controller` for `family`.
    ///
    /// A family is published once: if a controller is already present it stays, and false is
    /// returned.
    pub fn publish(
        &self,
        family: Family,
        capability: &'static Capability,
        controller: Arc<dyn Controller>,
    ) -> bool {
        let entry = Arc::new(Published {
            capability,
            controller,
        });
        let previous = self.slots[family.index()]
            .compare_and_swap(&None::<Arc<Published>>, Some(entry));
        if previous.is_some() {
            let ignored = capability.compatible;
            warn!("{family:?} controller already published, ignoring {ignored}");
            false
        } else {
            debug!("published {} as {family:?}", capability.compatible);
            true
        }
    }

    /// The controller published for `family`, if any.
    #[must_use]
    pub fn lookup(&self, family: Family) -> Option<Arc<Published>> {
        self.slots[family.index()].load_full()
    }

    /// Remove the entry of `family` if it holds `controller`.
    ///
    /// Returns true if the entry was removed.
    pub fn withdraw(&self, family: Family, controller: &Arc<dyn Controller>) -> bool {
        let slot = &self.slots[family.index()];
        let current = slot.load_full();
        if !current
            .as_ref()
            .is_some_and(|p| Arc::ptr_eq(&p.controller, controller))
        {
            return false;
        }
        let previous = slot.compare_and_swap(&current, None::<Arc<Published>>);
        let removed = match (&*previous, &current) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        if removed {
            debug!("withdrew {family:?} controller");
        }
        removed
    }
}
