//! Static descriptions of the hardware variants supported by the driver.
//!
//! Each variant is selected by a device tree `compatible` string. Variants only differ in data
//! (clocks, routing support and the number of CPU interfaces), so they are entries of one table
//! rather than separate drivers.

use snafu::ensure;

use crate::{Error, InvalidArgumentSnafu};

/// A group of hardware variants whose controller other subsystems reach without a handle, through
/// the [`crate::control::Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// The audio processing engine GIC found on Tegra SoCs.
    TegraAgic,
}

impl Family {
    /// Number of families, for sizing per-family tables.
    pub const COUNT: usize = 1;

    /// Position of this family in a per-family table.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A CPU interface of the controller, i.e. a destination an interrupt line can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target(pub u8);

/// Per-variant constant data.
#[derive(Debug)]
pub struct Capability {
    /// The `compatible` string that selects this variant.
    pub compatible: &'static str,
    /// Clocks required for register access, in the order they are enabled.
    pub clock_names: &'static [&'static str],
    /// Whether lines can be routed to a CPU interface other than the default one.
    pub supports_routing: bool,
    /// Number of CPU interfaces (register banks facing a processor) the variant exposes.
    pub num_interfaces: u8,
    /// The family the variant belongs to, if its controller is published process-wide.
    pub family: Option<Family>,
}

impl Capability {
    /// Check that a line may be routed to `target` on this variant.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the variant cannot route at all, or if `target` is
    /// not one of its CPU interfaces.
    pub fn check_route(&self, target: Target) -> Result<(), Error> {
        ensure!(
            self.supports_routing,
            InvalidArgumentSnafu {
                reason: "variant does not support routing"
            }
        );
        ensure!(
            target.0 < self.num_interfaces,
            InvalidArgumentSnafu {
                reason: "target CPU interface out of range"
            }
        );
        Ok(())
    }
}

const GIC400_CLOCKS: &[&str] = &["clk"];

/// Number of CPU interfaces of the Tegra186 AGIC (four APE host interfaces and the ADSP).
const MAX_AGIC_T18X_INTERFACES: u8 = 5;

/// Number of CPU interfaces of the Tegra210 AGIC (the APE host interface and the ADSP).
const MAX_AGIC_T210_INTERFACES: u8 = 2;

/// Every variant the driver knows about.
pub static MATCH_TABLE: &[Capability] = &[
    Capability {
        compatible: "nvidia,tegra186-agic",
        clock_names: GIC400_CLOCKS,
        supports_routing: true,
        num_interfaces: MAX_AGIC_T18X_INTERFACES,
        family: Some(Family::TegraAgic),
    },
    Capability {
        compatible: "nvidia,tegra210-agic",
        clock_names: GIC400_CLOCKS,
        supports_routing: true,
        num_interfaces: MAX_AGIC_T210_INTERFACES,
        family: Some(Family::TegraAgic),
    },
    Capability {
        compatible: "arm,gic-400",
        clock_names: GIC400_CLOCKS,
        supports_routing: false,
        num_interfaces: 1,
        family: None,
    },
];

/// Find the variant for a device in `table`.
///
/// The device's `compatible` strings are tried in order (most specific first), and the first one
/// present in the table wins.
pub fn lookup<'a>(
    table: &'static [Capability],
    compatible: impl IntoIterator<Item = &'a str>,
) -> Option<&'static Capability> {
    compatible
        .into_iter()
        .find_map(|model| table.iter().find(|cap| cap.compatible == model))
}
