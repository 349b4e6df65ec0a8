//! Device tree interrupt specifiers of a GIC (`#interrupt-cells = <3>`).
//!
//! Each specifier is three big-endian cells: the interrupt type, the number within that type, and
//! the trigger flags.

use byteorder::{BigEndian, ByteOrder};
use gic_pm_core::Line;
use log::trace;

/// Size in bytes of one specifier.
pub const SPECIFIER_SIZE: usize = 12;

/// How a line signals an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Rising or falling edge.
    Edge,
    /// High or low level.
    Level,
}

/// Shared peripheral interrupts are numbered 0-987 in the device tree.
const MAX_SPI: u32 = 987;
/// Private peripheral interrupts are numbered 0-15 in the device tree.
const MAX_PPI: u32 = 15;

/// Decode the `index`th specifier of an `interrupts` property into a controller line.
///
/// Returns `None` if there is no such specifier, or if it is malformed.
pub fn decode(cells: &[u8], index: usize) -> Option<(Line, TriggerMode)> {
    let start = index.checked_mul(SPECIFIER_SIZE)?;
    let d = cells.get(start..start.checked_add(SPECIFIER_SIZE)?)?;
    let kind = BigEndian::read_u32(&d[0..4]);
    let number = BigEndian::read_u32(&d[4..8]);
    let flags = BigEndian::read_u32(&d[8..12]);

    let line = match kind {
        // SPI, mapped to lines 32-1019
        0 if number <= MAX_SPI => 32 + number,
        // PPI, mapped to lines 16-31
        1 if number <= MAX_PPI => 16 + number,
        _ => return None,
    };

    let trigger_mode = match flags & 0xf {
        0b0001 | 0b0010 => TriggerMode::Edge,
        0b0100 | 0b1000 => TriggerMode::Level,
        _ => return None,
    };

    trace!("specifier {index}: line {line}, {trigger_mode:?}");
    Some((line, trigger_mode))
}
