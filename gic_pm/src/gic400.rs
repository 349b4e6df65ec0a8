//! Driver for the ARM GIC-400 (a Generic Interrupt Controller version 2).
//!
//! Only what is needed to keep the controller alive across clock gating is implemented here:
//! bring-up, saving and restoring register state, per-line pending/active manipulation and
//! routing to a CPU interface. Saved state lives in buffers allocated at initialization, so the
//! suspend path never allocates.
//!
//! # Reference Documentation
//! - `GICv2` architecture: <https://developer.arm.com/documentation/ihi0048>
//! - GIC-400 technical reference: <https://developer.arm.com/documentation/ddi0471>

use alloc::{sync::Arc, vec::Vec};
use core::ops::Range;

use bitfield::bitfield;
use gic_pm_core::{
    capability::{Capability, Target},
    controller::{self, Controller, Factory},
    Line,
};
use log::{debug, trace, warn};
use snafu::ensure;
use spin::Mutex;

bitfield! {
    /// The `GICD_TYPER` register, describing the implemented configuration.
    struct ControllerType(u32);
    impl Debug;
    u8;
    it_lines_number, _: 4, 0;
    cpu_number, _: 7, 5;
}

/// Largest number of lines a `GICv2` supports (1020-1023 are special).
const MAX_LINES: u32 = 1020;

/// Lines below this are banked per CPU interface (SGIs and PPIs).
const FIRST_SPI: u32 = 32;

/// `GICv2` supports at most eight CPU interfaces.
const MAX_TARGETS: u8 = 8;

/// Distributor state that is shared by all CPU interfaces, i.e. that of the SPIs.
struct DistributorState {
    ctlr: u32,
    config: Vec<u32>,
    priority: Vec<u32>,
    targets: Vec<u32>,
    enable: Vec<u32>,
    active: Vec<u32>,
    saved: bool,
}

impl DistributorState {
    /// Allocate buffers for the SPI registers of a distributor with `num_lines` lines.
    fn new(num_lines: u32) -> Result<Self, controller::Error> {
        let words = |lines_per_word| -> Result<Vec<u32>, controller::Error> {
            let len = spi_words(num_lines, lines_per_word).len();
            let mut buf = Vec::new();
            buf.try_reserve_exact(len)
                .map_err(|_| controller::Error::Initialization {
                    reason: "out of memory for saved distributor state",
                })?;
            buf.resize(len, 0);
            Ok(buf)
        };
        Ok(Self {
            ctlr: 0,
            config: words(16)?,
            priority: words(4)?,
            targets: words(4)?,
            enable: words(32)?,
            active: words(32)?,
            saved: false,
        })
    }

    /// The saved SPI register arrays in restore order: the register, the register that clears it
    /// (for set-only registers), lines per word, and the buffer.
    fn arrays(&mut self) -> [(usize, Option<usize>, u32, &mut Vec<u32>); 5] {
        use dist_regs::*;
        [
            (ICFGR_N, None, 16, &mut self.config),
            (IPRIORITYR_N, None, 4, &mut self.priority),
            (ITARGETSR_N, None, 4, &mut self.targets),
            (ISENABLER_N, Some(ICENABLER_N), 32, &mut self.enable),
            (ISACTIVER_N, Some(ICACTIVER_N), 32, &mut self.active),
        ]
    }
}

/// State of the CPU interface, including the banked SGI/PPI distributor registers.
#[derive(Default)]
struct CpuInterfaceState {
    ctlr: u32,
    pmr: u32,
    bpr: u32,
    enable: u32,
    active: u32,
    config: u32,
    priority: [u32; 8],
    saved: bool,
}

/// The words of a distributor register array holding SPIs, given how many lines share a word.
fn spi_words(num_lines: u32, lines_per_word: u32) -> Range<usize> {
    (FIRST_SPI / lines_per_word) as usize..num_lines.div_ceil(lines_per_word) as usize
}

fn id_to_bit_offset(line: Line) -> (usize, u32) {
    ((line / 32) as usize, (line % 32))
}

/// Set the bit flag of `register` for `line` high.
unsafe fn write_bit_for_id(interface: *mut u32, register: usize, line: Line) {
    let (word_offset, bit_offset) = id_to_bit_offset(line);
    let ptr = interface.add(register).add(word_offset);
    trace!(
        "writing GIC register bit 0x{:x} for line={line} (word={word_offset}, bit={bit_offset})",
        ptr as usize
    );
    ptr.write_volatile(1 << bit_offset);
}

/// Read the bit flag of `register` for `line`.
unsafe fn read_bit_for_id(interface: *mut u32, register: usize, line: Line) -> bool {
    let (word_offset, bit_offset) = id_to_bit_offset(line);
    let word = interface.add(register).add(word_offset).read_volatile();
    word & (1 << bit_offset) != 0
}

/// Set the byte of `register` for `line`.
unsafe fn write_byte_for_id(interface: *mut u32, register: usize, line: Line, value: u8) {
    trace!(
        "writing GIC register byte {interface:x?}+{register:x} for line={line}, value={value:x}"
    );
    interface
        .add(register)
        .cast::<u8>()
        .add(line as usize)
        .write_volatile(value);
}

/// Read the byte of `register` for `line`.
unsafe fn read_byte_for_id(interface: *mut u32, register: usize, line: Line) -> u8 {
    interface
        .add(register)
        .cast::<u8>()
        .add(line as usize)
        .read_volatile()
}

/// Copy the words `range` of `register` into `dst`.
unsafe fn save_words(interface: *mut u32, register: usize, range: Range<usize>, dst: &mut [u32]) {
    for (word, value) in range.zip(dst) {
        *value = interface.add(register + word).read_volatile();
    }
}

/// Write `src` to the words `range` of `register`.
unsafe fn restore_words(interface: *mut u32, register: usize, range: Range<usize>, src: &[u32]) {
    for (word, value) in range.zip(src) {
        interface.add(register + word).write_volatile(*value);
    }
}

/// Write `value` to every word in `range` of `register`.
unsafe fn fill_words(interface: *mut u32, register: usize, range: Range<usize>, value: u32) {
    for word in range {
        interface.add(register + word).write_volatile(value);
    }
}

/// An initialized GIC-400.
pub struct Gic400 {
    distributor_base: Mutex<*mut u32>,
    cpu_base: *mut u32,
    num_lines: u32,
    distributor_state: Mutex<DistributorState>,
    cpu_state: Mutex<CpuInterfaceState>,
}

/// SAFETY: The distributor is only accessed with its lock held. The CPU interface registers are
/// banked per core, and the saved CPU interface state is behind its own lock.
unsafe impl Send for Gic400 {}
unsafe impl Sync for Gic400 {}

impl Gic400 {
    /// Take over the controller whose distributor and CPU interface registers are mapped at
    /// `distributor_base` and `cpu_base`, and enable it.
    ///
    /// # Safety
    /// Both pointers must point to the mapped register frames of the same controller (4 KiB
    /// each), which must stay mapped, and its clocks must be running.
    ///
    /// # Errors
    /// Returns [`controller::Error::Initialization`] if there is no memory for the saved state.
    pub unsafe fn new(
        distributor_base: *mut u32,
        cpu_base: *mut u32,
    ) -> Result<Self, controller::Error> {
        let typer = ControllerType(distributor_base.add(dist_regs::TYPER).read_volatile());
        let num_lines = (32 * (u32::from(typer.it_lines_number()) + 1)).min(MAX_LINES);
        debug!("GIC-400 @ {distributor_base:x?}/{cpu_base:x?}: {num_lines} lines, {typer:?}");

        let gic = Self {
            distributor_base: Mutex::new(distributor_base),
            cpu_base,
            num_lines,
            distributor_state: Mutex::new(DistributorState::new(num_lines)?),
            cpu_state: Mutex::default(),
        };
        gic.initialize();
        Ok(gic)
    }

    /// Number of CPU interfaces reported by the hardware.
    fn num_interfaces(&self) -> u8 {
        let typer = ControllerType(unsafe {
            self.distributor_base
                .lock()
                .add(dist_regs::TYPER)
                .read_volatile()
        });
        typer.cpu_number() + 1
    }

    fn initialize(&self) {
        let dist_base = self.distributor_base.lock();
        debug!("Initializing GIC-400 Distributor @ {:x?}", *dist_base);
        unsafe {
            dist_base.add(dist_regs::CTLR).write_volatile(0x1);
        }

        debug!("Initializing GIC-400 CPU interface @ {:x?}", self.cpu_base);
        unsafe {
            // bit 0: enable group 1 interrupts
            self.cpu_base
                .add(cpu_regs::CTLR)
                .write_volatile(0b0000_0000_0000_0001);

            // Set minimum priority to lowest possible.
            self.cpu_base.add(cpu_regs::PMR).write_volatile(0xff);

            // Disable group priority bits.
            self.cpu_base.add(cpu_regs::BPR).write_volatile(0x00);
        }
    }

    /// Number of lines the distributor implements, including SGIs and PPIs.
    #[must_use]
    pub fn num_lines(&self) -> u32 {
        self.num_lines
    }

    /// The CPU interfaces `line` is currently delivered to, as a bit mask.
    ///
    /// # Errors
    /// Returns [`controller::Error::InvalidLine`] if the line does not exist.
    pub fn target_mask(&self, line: Line) -> Result<u8, controller::Error> {
        ensure!(line < self.num_lines, controller::InvalidLineSnafu { line });
        let distributor_base = self.distributor_base.lock();
        let mask = unsafe { read_byte_for_id(*distributor_base, dist_regs::ITARGETSR_N, line) };
        Ok(mask)
    }

    fn is_valid(&self, line: Line) -> bool {
        let num_lines = self.num_lines;
        let valid = line < num_lines;
        if !valid {
            warn!("line {line} out of range, controller has {num_lines} lines");
        }
        valid
    }

    fn read_bit(&self, register: usize, line: Line) -> bool {
        if !self.is_valid(line) {
            return false;
        }
        let distributor_base = self.distributor_base.lock();
        unsafe { read_bit_for_id(*distributor_base, register, line) }
    }

    fn write_bit(&self, register: usize, line: Line) {
        if !self.is_valid(line) {
            return;
        }
        let distributor_base = self.distributor_base.lock();
        unsafe { write_bit_for_id(*distributor_base, register, line) }
    }
}

impl Controller for Gic400 {
    fn save_distributor(&self) {
        let dist = self.distributor_base.lock();
        let dist_base = *dist;
        let mut state = self.distributor_state.lock();
        let n = self.num_lines;
        unsafe {
            state.ctlr = dist_base.add(dist_regs::CTLR).read_volatile();
            for (register, _, lines_per_word, words) in state.arrays() {
                save_words(dist_base, register, spi_words(n, lines_per_word), words);
            }
        }
        state.saved = true;
        trace!("saved GIC-400 distributor");
    }

    fn save_cpu_interface(&self) {
        let dist = self.distributor_base.lock();
        let dist_base = *dist;
        let mut state = self.cpu_state.lock();
        unsafe {
            state.enable = dist_base.add(dist_regs::ISENABLER_N).read_volatile();
            state.active = dist_base.add(dist_regs::ISACTIVER_N).read_volatile();
            // ICFGR0 (SGIs) is read-only
            state.config = dist_base.add(dist_regs::ICFGR_N + 1).read_volatile();
            let priority = &mut state.priority;
            save_words(dist_base, dist_regs::IPRIORITYR_N, 0..8, priority);

            state.ctlr = self.cpu_base.add(cpu_regs::CTLR).read_volatile();
            state.pmr = self.cpu_base.add(cpu_regs::PMR).read_volatile();
            state.bpr = self.cpu_base.add(cpu_regs::BPR).read_volatile();
        }
        state.saved = true;
        trace!("saved GIC-400 CPU interface");
    }

    fn restore_distributor(&self) {
        let dist = self.distributor_base.lock();
        let dist_base = *dist;
        let mut state = self.distributor_state.lock();
        if !state.saved {
            warn!("no saved GIC-400 distributor state to restore");
            return;
        }
        let n = self.num_lines;
        unsafe {
            // quiesce while the configuration is rewritten
            dist_base.add(dist_regs::CTLR).write_volatile(0);

            for (register, clear, lines_per_word, words) in state.arrays() {
                let range = spi_words(n, lines_per_word);
                if let Some(clear) = clear {
                    fill_words(dist_base, clear, range.clone(), u32::MAX);
                }
                restore_words(dist_base, register, range, words);
            }

            dist_base.add(dist_regs::CTLR).write_volatile(state.ctlr);
        }
        trace!("restored GIC-400 distributor");
    }

    fn restore_cpu_interface(&self) {
        let dist = self.distributor_base.lock();
        let dist_base = *dist;
        let state = self.cpu_state.lock();
        if !state.saved {
            warn!("no saved GIC-400 CPU interface state to restore");
            return;
        }
        unsafe {
            dist_base.add(dist_regs::ICENABLER_N).write_volatile(u32::MAX);
            dist_base.add(dist_regs::ISENABLER_N).write_volatile(state.enable);
            dist_base.add(dist_regs::ICACTIVER_N).write_volatile(u32::MAX);
            dist_base.add(dist_regs::ISACTIVER_N).write_volatile(state.active);
            dist_base.add(dist_regs::ICFGR_N + 1).write_volatile(state.config);
            restore_words(dist_base, dist_regs::IPRIORITYR_N, 0..8, &state.priority);

            self.cpu_base.add(cpu_regs::PMR).write_volatile(state.pmr);
            self.cpu_base.add(cpu_regs::BPR).write_volatile(state.bpr);
            self.cpu_base.add(cpu_regs::CTLR).write_volatile(state.ctlr);
        }
        trace!("restored GIC-400 CPU interface");
    }

    fn is_pending(&self, line: Line) -> bool {
        self.read_bit(dist_regs::ISPENDR_N, line)
    }

    fn clear_pending(&self, line: Line) {
        self.write_bit(dist_regs::ICPENDR_N, line);
    }

    fn is_active(&self, line: Line) -> bool {
        self.read_bit(dist_regs::ISACTIVER_N, line)
    }

    fn clear_active(&self, line: Line) {
        self.write_bit(dist_regs::ICACTIVER_N, line);
    }

    fn route(&self, line: Line, target: Target) -> Result<(), controller::Error> {
        // targets of SGIs and PPIs are fixed to the reading CPU
        ensure!(
            (FIRST_SPI..self.num_lines).contains(&line),
            controller::InvalidLineSnafu { line }
        );
        ensure!(
            target.0 < MAX_TARGETS,
            controller::InvalidTargetSnafu { target }
        );
        debug!("routing line {line} to CPU interface {}", target.0);
        let distributor_base = self.distributor_base.lock();
        unsafe {
            write_byte_for_id(
                *distributor_base,
                dist_regs::ITARGETSR_N,
                line,
                1 << target.0,
            );
        }
        Ok(())
    }
}

/// Brings up the GIC-400 at a fixed pair of register frames.
pub struct Gic400Factory {
    distributor_base: *mut u32,
    cpu_base: *mut u32,
}

impl Gic400Factory {
    /// Create a factory for the controller mapped at `distributor_base` and `cpu_base`.
    ///
    /// # Safety
    /// See [`Gic400::new`]. The clocks only need to be running when [`Factory::init`] is called.
    #[must_use]
    pub unsafe fn new(distributor_base: *mut u32, cpu_base: *mut u32) -> Self {
        Self {
            distributor_base,
            cpu_base,
        }
    }
}

impl Factory for Gic400Factory {
    fn init(
        &self,
        parent: Line,
        capability: &'static Capability,
    ) -> Result<Arc<dyn Controller>, controller::Error> {
        ensure!(
            !self.distributor_base.is_null() && !self.cpu_base.is_null(),
            controller::InitializationSnafu {
                reason: "register frames not mapped"
            }
        );
        // SAFETY: guaranteed by the caller of `Gic400Factory::new`.
        let gic = unsafe { Gic400::new(self.distributor_base, self.cpu_base)? };
        let implemented = gic.num_interfaces();
        if capability.num_interfaces > implemented {
            warn!(
                "{} expects {} CPU interfaces, hardware reports {implemented}",
                capability.compatible,
                capability.num_interfaces
            );
        }
        debug!(
            "{} chained to parent line {parent}",
            capability.compatible
        );
        Ok(Arc::new(gic))
    }
}

/// Register offsets for the GIC distributor (relative to its base address, by u32s).
///
/// The architecture names these `GICD_*`.
#[allow(unused, missing_docs)]
mod dist_regs {
    pub const CTLR: usize = 0x0000 >> 2;
    pub const TYPER: usize = 0x0004 >> 2;
    pub const IIDR: usize = 0x0008 >> 2;
    pub const IGROUPR_N: usize = 0x0080 >> 2;
    pub const ISENABLER_N: usize = 0x0100 >> 2;
    pub const ICENABLER_N: usize = 0x0180 >> 2;
    pub const ISPENDR_N: usize = 0x0200 >> 2;
    pub const ICPENDR_N: usize = 0x0280 >> 2;
    pub const ISACTIVER_N: usize = 0x0300 >> 2;
    pub const ICACTIVER_N: usize = 0x0380 >> 2;
    pub const IPRIORITYR_N: usize = 0x0400 >> 2;
    pub const ITARGETSR_N: usize = 0x0800 >> 2;
    pub const ICFGR_N: usize = 0x0c00 >> 2;
    pub const SGIR: usize = 0x0f00 >> 2;
}

/// Register offsets for the GIC CPU interface (relative to its base address, by u32s).
///
/// The architecture names these `GICC_*`.
#[allow(unused, missing_docs)]
mod cpu_regs {
    pub const CTLR: usize = 0x000 >> 2;
    pub const PMR: usize = 0x0004 >> 2;
    pub const BPR: usize = 0x008 >> 2;
    pub const IAR: usize = 0x000c >> 2;
    pub const EOIR: usize = 0x0010 >> 2;
    pub const IIDR: usize = 0x00fc >> 2;
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use gic_pm_core::capability::{lookup, MATCH_TABLE};
    use test_case::test_case;

    use super::*;

    /// Words in a 4 KiB register frame.
    const FRAME_WORDS: usize = 0x400;

    /// In-memory register frames standing in for a mapped controller.
    struct Regs {
        dist: *mut u32,
        cpu: *mut u32,
        _dist: Vec<u32>,
        _cpu: Vec<u32>,
    }

    impl Regs {
        /// `it_lines` sets the line count to 32 * (it_lines + 1), `cpus` the number of CPU
        /// interfaces.
        fn new(it_lines: u32, cpus: u32) -> Self {
            let _ = env_logger::builder().is_test(true).try_init();
            let mut dist = vec![0u32; FRAME_WORDS];
            let mut cpu = vec![0u32; FRAME_WORDS];
            dist[dist_regs::TYPER] = it_lines | ((cpus - 1) << 5);
            Self {
                dist: dist.as_mut_ptr(),
                cpu: cpu.as_mut_ptr(),
                _dist: dist,
                _cpu: cpu,
            }
        }

        fn gic(&self) -> Gic400 {
            let gic = unsafe { Gic400::new(self.dist, self.cpu) };
            gic.expect("saved state buffers")
        }

        fn dist(&self, word: usize) -> u32 {
            unsafe { self.dist.add(word).read_volatile() }
        }

        fn set_dist(&self, word: usize, value: u32) {
            unsafe { self.dist.add(word).write_volatile(value) }
        }

        fn cpu(&self, word: usize) -> u32 {
            unsafe { self.cpu.add(word).read_volatile() }
        }

        fn set_cpu(&self, word: usize, value: u32) {
            unsafe { self.cpu.add(word).write_volatile(value) }
        }

        /// Fill `words` of `register` with a value derived from the word index.
        fn scribble(&self, register: usize, words: Range<usize>, seed: u32) {
            for w in words {
                self.set_dist(register + w, seed ^ (w as u32).wrapping_mul(0x0101_0101));
            }
        }

        fn snapshot(&self, register: usize, words: Range<usize>) -> Vec<u32> {
            words.map(|w| self.dist(register + w)).collect()
        }
    }

    #[test_case(0, 32)]
    #[test_case(2, 96)]
    #[test_case(31, 1020; "capped")]
    fn geometry(it_lines: u32, num_lines: u32) {
        let regs = Regs::new(it_lines, 1);
        assert_eq!(regs.gic().num_lines(), num_lines);
    }

    #[test]
    fn enables_distributor_and_cpu_interface() {
        let regs = Regs::new(2, 1);
        regs.set_cpu(cpu_regs::BPR, 3);
        let gic = regs.gic();

        assert_eq!(regs.dist(dist_regs::CTLR), 1);
        assert_eq!(regs.cpu(cpu_regs::CTLR), 1);
        assert_eq!(regs.cpu(cpu_regs::PMR), 0xff);
        assert_eq!(regs.cpu(cpu_regs::BPR), 0);
        assert_eq!(gic.num_interfaces(), 1);
    }

    #[test]
    fn distributor_state_survives_power_loss() {
        let regs = Regs::new(2, 2);
        let gic = regs.gic();

        let arrays = [
            (dist_regs::ICFGR_N, spi_words(96, 16)),
            (dist_regs::IPRIORITYR_N, spi_words(96, 4)),
            (dist_regs::ITARGETSR_N, spi_words(96, 4)),
            (dist_regs::ISENABLER_N, spi_words(96, 32)),
            (dist_regs::ISACTIVER_N, spi_words(96, 32)),
        ];
        for (seed, (register, words)) in arrays.iter().cloned().enumerate() {
            regs.scribble(register, words, 0xa5a5_0000 + seed as u32);
        }
        let before: Vec<_> = arrays
            .iter()
            .cloned()
            .map(|(r, w)| regs.snapshot(r, w))
            .collect();

        gic.save_distributor();
        // clock gating loses everything
        for (register, words) in arrays.iter().cloned() {
            for w in words {
                regs.set_dist(register + w, 0);
            }
        }
        regs.set_dist(dist_regs::CTLR, 0);
        // banked SGI/PPI words belong to the CPU interface
        regs.set_dist(dist_regs::ISENABLER_N, 0x1234);

        gic.restore_distributor();

        let after: Vec<_> = arrays
            .iter()
            .cloned()
            .map(|(r, w)| regs.snapshot(r, w))
            .collect();
        assert_eq!(after, before);
        assert_eq!(regs.dist(dist_regs::CTLR), 1);
        assert_eq!(regs.dist(dist_regs::ISENABLER_N), 0x1234);
        assert_eq!(
            regs.snapshot(dist_regs::ICENABLER_N, spi_words(96, 32)),
            [u32::MAX, u32::MAX]
        );
    }

    #[test]
    fn cpu_interface_state_survives_power_loss() {
        let regs = Regs::new(2, 1);
        let gic = regs.gic();
        regs.set_dist(dist_regs::ISENABLER_N, 0x0001_ffff);
        regs.set_dist(dist_regs::ISACTIVER_N, 0x0000_0200);
        regs.set_dist(dist_regs::ICFGR_N + 1, 0x5555_0000);
        regs.scribble(dist_regs::IPRIORITYR_N, 0..8, 0x8080_8080);
        regs.set_cpu(cpu_regs::PMR, 0xf0);
        regs.set_cpu(cpu_regs::BPR, 2);
        let priorities = regs.snapshot(dist_regs::IPRIORITYR_N, 0..8);

        gic.save_cpu_interface();
        for w in 0..FRAME_WORDS {
            if w != dist_regs::TYPER {
                regs.set_dist(w, 0);
            }
            regs.set_cpu(w, 0);
        }
        gic.restore_cpu_interface();

        assert_eq!(regs.dist(dist_regs::ISENABLER_N), 0x0001_ffff);
        assert_eq!(regs.dist(dist_regs::ISACTIVER_N), 0x0000_0200);
        assert_eq!(regs.dist(dist_regs::ICFGR_N + 1), 0x5555_0000);
        assert_eq!(regs.snapshot(dist_regs::IPRIORITYR_N, 0..8), priorities);
        assert_eq!(regs.cpu(cpu_regs::CTLR), 1);
        assert_eq!(regs.cpu(cpu_regs::PMR), 0xf0);
        assert_eq!(regs.cpu(cpu_regs::BPR), 2);
        // SPI state is not touched
        assert_eq!(regs.dist(dist_regs::ISENABLER_N + 1), 0);
    }

    #[test]
    fn restore_without_save_writes_nothing() {
        let regs = Regs::new(2, 1);
        let gic = regs.gic();

        gic.restore_distributor();
        gic.restore_cpu_interface();

        assert_eq!(regs.dist(dist_regs::ICENABLER_N), 0);
        assert_eq!(regs.dist(dist_regs::ICENABLER_N + 1), 0);
        assert_eq!(regs.dist(dist_regs::CTLR), 1);
    }

    #[test]
    fn pending_and_active_bits() {
        let regs = Regs::new(2, 1);
        let gic = regs.gic();
        regs.set_dist(dist_regs::ISPENDR_N + 1, 1 << 3);
        regs.set_dist(dist_regs::ISACTIVER_N + 2, 1 << 31);

        assert!(gic.is_pending(35));
        assert!(!gic.is_pending(36));
        assert!(gic.is_active(95));
        assert!(!gic.is_active(35));

        gic.clear_pending(35);
        gic.clear_active(95);
        assert_eq!(regs.dist(dist_regs::ICPENDR_N + 1), 1 << 3);
        assert_eq!(regs.dist(dist_regs::ICACTIVER_N + 2), 1 << 31);
    }

    #[test]
    fn lines_out_of_range_are_ignored() {
        let regs = Regs::new(2, 1);
        let gic = regs.gic();

        assert!(!gic.is_pending(96));
        assert!(!gic.is_active(5000));
        gic.clear_pending(96);
        gic.clear_active(5000);
        assert_eq!(regs.dist(dist_regs::ICPENDR_N + 3), 0);
        assert!(matches!(
            gic.target_mask(96),
            Err(controller::Error::InvalidLine { line: 96 })
        ));
    }

    #[test]
    fn routes_spi_to_single_interface() {
        let regs = Regs::new(2, 2);
        let gic = regs.gic();

        gic.route(40, Target(1)).expect("route");
        assert_eq!(gic.target_mask(40).expect("valid line"), 0b10);
        gic.route(40, Target(0)).expect("route");
        assert_eq!(gic.target_mask(40).expect("valid line"), 0b01);
        assert_eq!(gic.target_mask(41).expect("valid line"), 0);
    }

    #[test_case(16, 0; "ppi")]
    #[test_case(96, 0; "beyond last line")]
    fn route_rejects_line(line: Line, target: u8) {
        let regs = Regs::new(2, 1);
        let res = regs.gic().route(line, Target(target));
        assert!(
            matches!(res, Err(controller::Error::InvalidLine { line: l }) if l == line),
            "{res:?}"
        );
    }

    #[test]
    fn route_rejects_target() {
        let regs = Regs::new(2, 1);
        let res = regs.gic().route(40, Target(8));
        assert!(matches!(
            res,
            Err(controller::Error::InvalidTarget { target: Target(8) })
        ));
    }

    #[test]
    fn factory_brings_up_controller() {
        let regs = Regs::new(3, 2);
        let factory = unsafe { Gic400Factory::new(regs.dist, regs.cpu) };
        let agic = lookup(MATCH_TABLE, ["nvidia,tegra210-agic"]).expect("variant in table");

        let controller = factory.init(96, agic).expect("init");
        assert_eq!(regs.dist(dist_regs::CTLR), 1);

        controller.route(100, Target(1)).expect("route");
        controller.save_distributor();
        controller.restore_distributor();
        assert_eq!(regs.dist(dist_regs::CTLR), 1);
    }

    #[test]
    fn factory_needs_mapped_frames() {
        let factory = unsafe { Gic400Factory::new(core::ptr::null_mut(), core::ptr::null_mut()) };
        let agic = lookup(MATCH_TABLE, ["arm,gic-400"]).expect("variant in table");
        assert!(matches!(
            factory.init(96, agic),
            Err(controller::Error::Initialization { .. })
        ));
    }
}
