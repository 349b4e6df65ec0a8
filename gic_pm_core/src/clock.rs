//! Clocks that must run for the controller's registers to be accessible.

use alloc::{sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};
#[cfg(test)]
use mockall::automock;
use snafu::{ensure, ResultExt, Snafu};

use crate::ClockSnafu;

/// An opaque reference to a clock acquired from a [`Provider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle(pub u32);

/// Errors reported by the clock framework.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// No clock by this name is available to the device.
    #[snafu(display("clock \"{name}\" not found"))]
    NotFound {
        /// The name of the requested clock.
        name: &'static str,
    },

    /// A clock could not be switched on.
    #[snafu(display("clock \"{name}\" failed to enable"))]
    EnableFailed {
        /// The name of the failing clock.
        name: &'static str,
    },

    /// The clocks of the bundle have already been given back.
    #[snafu(display("clock bundle was released"))]
    Released,
}

/// The clock framework that owns the clock tree.
#[cfg_attr(test, automock)]
pub trait Provider {
    /// Look up a clock of the device by name and take a reference to it.
    ///
    /// # Errors
    /// Returns an error if the clock does not exist.
    fn acquire(&self, name: &'static str) -> Result<Handle, Error>;

    /// Give back a clock reference obtained from [`Provider::acquire`].
    fn release(&self, handle: Handle);

    /// Prepare and enable `handles` in order. Either all of them end up running or none do.
    ///
    /// # Errors
    /// Returns the error of the first clock that failed to enable.
    fn enable_all(&self, handles: &[Handle]) -> Result<(), Error>;

    /// Disable and unprepare `handles`.
    fn disable_all(&self, handles: &[Handle]);
}

/// The ordered set of clocks a controller variant needs.
///
/// A bundle is either complete, with every clock acquired, or it does not exist:
/// [`Bundle::acquire`] gives back what it got so far if any clock is missing.
pub struct Bundle {
    provider: Arc<dyn Provider + Send + Sync>,
    names: &'static [&'static str],
    handles: Vec<Handle>,
    released: AtomicBool,
}

impl Bundle {
    /// Acquire every clock in `names`, in order.
    ///
    /// # Errors
    /// - [`crate::Error::ResourceExhausted`] if there is no memory for the bundle.
    /// - [`crate::Error::Clock`] if a clock cannot be acquired. The clocks acquired before it are
    ///   released again.
    pub fn acquire(
        provider: Arc<dyn Provider + Send + Sync>,
        names: &'static [&'static str],
    ) -> Result<Self, crate::Error> {
        let mut handles = Vec::new();
        handles
            .try_reserve_exact(names.len())
            .map_err(|_| crate::Error::ResourceExhausted)?;

        for &name in names {
            match provider.acquire(name) {
                Ok(handle) => {
                    trace!("acquired clock {name}: {handle:?}");
                    handles.push(handle);
                }
                Err(e) => {
                    for handle in handles.into_iter().rev() {
                        provider.release(handle);
                    }
                    return Err(e).context(ClockSnafu);
                }
            }
        }

        debug!("acquired clocks {names:?}");

        Ok(Self {
            provider,
            names,
            handles,
            released: AtomicBool::new(false),
        })
    }

    /// Enable all clocks of the bundle in declared order.
    ///
    /// # Errors
    /// Returns the provider's error if any clock fails to enable, in which case none of them are
    /// left running. Fails with [`Error::Released`] once the bundle has been released.
    pub fn enable(&self) -> Result<(), Error> {
        ensure!(!self.released.load(Ordering::Acquire), ReleasedSnafu);
        self.provider.enable_all(&self.handles)
    }

    /// Disable all clocks of the bundle.
    pub fn disable(&self) {
        if self.released.load(Ordering::Acquire) {
            return;
        }
        self.provider.disable_all(&self.handles);
    }

    /// Give every clock back to the provider, last acquired first.
    /// Only the first call does anything; the bundle is unusable afterwards.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        for handle in self.handles.iter().rev() {
            self.provider.release(*handle);
        }
        debug!("released clocks {:?}", self.names);
    }

    /// The `(name, handle)` pairs of the bundle in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Handle)> + '_ {
        self.names.iter().copied().zip(self.handles.iter().copied())
    }

    /// The number of clocks in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns true if the variant needs no clocks at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use mockall::{predicate::eq, Sequence};

    use super::*;

    const TWO_CLOCKS: &[&str] = &["core", "bus"];

    #[test]
    fn acquires_in_declared_order() {
        let mut provider = MockProvider::new();
        let mut seq = Sequence::new();
        provider
            .expect_acquire()
            .once()
            .with(eq("core"))
            .in_sequence(&mut seq)
            .returning(|_| Ok(Handle(1)));
        provider
            .expect_acquire()
            .once()
            .with(eq("bus"))
            .in_sequence(&mut seq)
            .returning(|_| Ok(Handle(2)));

        let bundle = Bundle::acquire(Arc::new(provider), TWO_CLOCKS).expect("acquire clocks");
        assert_eq!(bundle.len(), 2);
        assert_eq!(
            bundle.iter().collect::<Vec<_>>(),
            vec![("core", Handle(1)), ("bus", Handle(2))]
        );
    }

    #[test]
    fn partial_acquisition_releases_earlier_clocks() {
        let mut provider = MockProvider::new();
        provider
            .expect_acquire()
            .with(eq("core"))
            .returning(|_| Ok(Handle(1)));
        provider
            .expect_acquire()
            .with(eq("bus"))
            .returning(|_| Err(Error::NotFound { name: "bus" }));
        provider
            .expect_release()
            .once()
            .with(eq(Handle(1)))
            .return_const(());

        let res = Bundle::acquire(Arc::new(provider), TWO_CLOCKS);
        assert!(matches!(
            res,
            Err(crate::Error::Clock {
                source: Error::NotFound { name: "bus" }
            })
        ));
    }

    #[test]
    fn enable_and_disable_pass_all_handles() {
        let mut provider = MockProvider::new();
        provider
            .expect_acquire()
            .times(2)
            .returning(|name| Ok(Handle(if name == "core" { 1 } else { 2 })));
        provider
            .expect_enable_all()
            .once()
            .withf(|handles| handles == [Handle(1), Handle(2)])
            .returning(|_| Ok(()));
        provider
            .expect_disable_all()
            .once()
            .withf(|handles| handles == [Handle(1), Handle(2)])
            .return_const(());

        let bundle = Bundle::acquire(Arc::new(provider), TWO_CLOCKS).expect("acquire clocks");
        bundle.enable().expect("enable clocks");
        bundle.disable();
    }

    #[test]
    fn release_happens_once_in_reverse() {
        let mut provider = MockProvider::new();
        let mut seq = Sequence::new();
        provider
            .expect_acquire()
            .times(2)
            .returning(|name| Ok(Handle(if name == "core" { 1 } else { 2 })));
        provider
            .expect_release()
            .once()
            .with(eq(Handle(2)))
            .in_sequence(&mut seq)
            .return_const(());
        provider
            .expect_release()
            .once()
            .with(eq(Handle(1)))
            .in_sequence(&mut seq)
            .return_const(());
        provider.expect_enable_all().never();
        provider.expect_disable_all().never();

        let bundle = Bundle::acquire(Arc::new(provider), TWO_CLOCKS).expect("acquire clocks");
        bundle.release();
        bundle.release();

        assert!(matches!(bundle.enable(), Err(Error::Released)));
        bundle.disable();
    }
}
