//! Per-line control of a published controller, for subsystems that have no device handle.
//!
//! All operations are safe to call at any time. Until a controller is published (e.g. early in
//! boot, or if its device failed to probe) queries return false, clears do nothing and routing
//! fails with [`Error::InvalidArgument`]; a warning is logged for every such call.

use alloc::sync::Arc;

use log::warn;
use snafu::{OptionExt as _, ResultExt as _};
use spin::Lazy;

use crate::{
    capability::{Family, Target},
    ControllerSnafu, Error, Line, UnpublishedSnafu,
};

mod registry;
pub use registry::{Published, Registry};

/// The registry that probed devices publish their controllers in.
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// The line operations of one family's controller in a [`Registry`].
#[derive(Clone, Copy)]
pub struct Facade<'r> {
    registry: &'r Registry,
    family: Family,
}

impl<'r> Facade<'r> {
    /// Operate on the controller of `family` published in `registry`.
    #[must_use]
    pub const fn new(registry: &'r Registry, family: Family) -> Self {
        Self { registry, family }
    }

    fn published(&self) -> Result<Arc<Published>, Error> {
        self.registry
            .lookup(self.family)
            .context(UnpublishedSnafu)
            .inspect_err(|_| warn!("no {:?} controller published", self.family))
    }

    /// Returns true if `line` is pending.
    #[must_use]
    pub fn is_pending(&self, line: Line) -> bool {
        self.published()
            .is_ok_and(|p| p.controller().is_pending(line))
    }

    /// Clear the pending state of `line`.
    pub fn clear_pending(&self, line: Line) {
        if let Ok(p) = self.published() {
            p.controller().clear_pending(line);
        }
    }

    /// Returns true if `line` is active.
    #[must_use]
    pub fn is_active(&self, line: Line) -> bool {
        self.published()
            .is_ok_and(|p| p.controller().is_active(line))
    }

    /// Clear the active state of `line`.
    pub fn clear_active(&self, line: Line) {
        if let Ok(p) = self.published() {
            p.controller().clear_active(line);
        }
    }

    /// Route `line` to the CPU interface `target`.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] if nothing is published, the published variant cannot route,
    ///   or `target` is not one of its CPU interfaces.
    /// - [`Error::Controller`] if the controller rejects the request.
    pub fn route(&self, line: Line, target: Target) -> Result<(), Error> {
        let published = self.published().map_err(|_| Error::InvalidArgument {
            reason: "no controller published",
        })?;
        published.capability().check_route(target)?;
        published
            .controller()
            .route(line, target)
            .context(ControllerSnafu)
    }
}

fn agic() -> Facade<'static> {
    Facade::new(&REGISTRY, Family::TegraAgic)
}

/// Returns true if `line` of the Tegra AGIC is pending.
#[must_use]
pub fn is_pending(line: Line) -> bool {
    agic().is_pending(line)
}

/// Clear the pending state of `line` of the Tegra AGIC.
pub fn clear_pending(line: Line) {
    agic().clear_pending(line);
}

/// Returns true if `line` of the Tegra AGIC is active.
#[must_use]
pub fn is_active(line: Line) -> bool {
    agic().is_active(line)
}

/// Clear the active state of `line` of the Tegra AGIC.
pub fn clear_active(line: Line) {
    agic().clear_active(line);
}

/// Route `line` of the Tegra AGIC to the CPU interface `target`.
///
/// # Errors
/// See [`Facade::route`].
pub fn route(line: Line, target: Target) -> Result<(), Error> {
    agic().route(line, target)
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use test_case::test_case;

    use super::*;
    use crate::{
        capability::{lookup, Capability, MATCH_TABLE},
        controller::{self, Controller, MockController},
    };

    fn variant(compatible: &str) -> &'static Capability {
        lookup(MATCH_TABLE, [compatible]).expect("variant in table")
    }

    #[test]
    fn unpublished_global_is_benign() {
        let _ = env_logger::builder().is_test(true).try_init();

        // nothing in the test suite publishes into the global registry
        for _ in 0..3 {
            assert!(!is_pending(42));
            assert!(!is_active(42));
            clear_pending(42);
            clear_active(42);
            assert!(matches!(
                route(42, Target(1)),
                Err(Error::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn operations_reach_published_controller() {
        let mut controller = MockController::new();
        controller
            .expect_is_pending()
            .with(eq(64))
            .return_const(true);
        controller
            .expect_is_active()
            .with(eq(64))
            .return_const(true);
        controller
            .expect_clear_pending()
            .once()
            .with(eq(64))
            .return_const(());
        controller
            .expect_clear_active()
            .once()
            .with(eq(64))
            .return_const(());

        let registry = Registry::new();
        registry.publish(
            Family::TegraAgic,
            variant("nvidia,tegra210-agic"),
            Arc::new(controller),
        );
        let facade = Facade::new(&registry, Family::TegraAgic);

        assert!(facade.is_pending(64));
        assert!(facade.is_active(64));
        facade.clear_pending(64);
        facade.clear_active(64);
    }

    #[test]
    fn route_to_second_interface() {
        let mut controller = MockController::new();
        controller
            .expect_route()
            .once()
            .with(eq(5), eq(Target(1)))
            .returning(|_, _| Ok(()));

        let registry = Registry::new();
        registry.publish(
            Family::TegraAgic,
            variant("nvidia,tegra186-agic"),
            Arc::new(controller),
        );

        Facade::new(&registry, Family::TegraAgic)
            .route(5, Target(1))
            .expect("route line 5");
    }

    #[test_case("nvidia,tegra210-agic", 2)]
    #[test_case("nvidia,tegra210-agic", 7)]
    #[test_case("nvidia,tegra186-agic", 5)]
    #[test_case("arm,gic-400", 0)]
    fn route_rejected_before_reaching_controller(compatible: &str, target: u8) {
        let mut controller = MockController::new();
        controller.expect_route().never();

        let registry = Registry::new();
        registry.publish(Family::TegraAgic, variant(compatible), Arc::new(controller));

        let res = Facade::new(&registry, Family::TegraAgic).route(5, Target(target));
        assert!(matches!(res, Err(Error::InvalidArgument { .. })), "{res:?}");
    }

    #[test]
    fn route_error_from_controller() {
        let mut controller = MockController::new();
        controller
            .expect_route()
            .returning(|line, _| Err(controller::Error::InvalidLine { line }));

        let registry = Registry::new();
        let controller: Arc<dyn Controller> = Arc::new(controller);
        registry.publish(
            Family::TegraAgic,
            variant("nvidia,tegra210-agic"),
            controller,
        );

        let res = Facade::new(&registry, Family::TegraAgic).route(16, Target(0));
        assert!(matches!(
            res,
            Err(Error::Controller {
                source: controller::Error::InvalidLine { line: 16 }
            })
        ));
    }
}
