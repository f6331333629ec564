//! In-memory stand-ins for the cache hierarchy and control registers.
//!
//! The mocks record what a sweep or a transition would have done to the
//! hardware so host tests can check instruction counts, operands and
//! barrier ordering.

use core::cell::Cell;

use heapless::Vec;
use tock_registers::interfaces::Readable;
use tock_registers::interfaces::Writeable;
use tock_registers::registers::InMemoryRegister;

use crate::cache::CCSIDR;
use crate::cache::CLIDR;
use crate::cache::CSSELR;
use crate::cache::CacheHierarchy;
use crate::cache::CacheType;
use crate::cache::MaintenanceOperation;
use crate::cache::SetWayOp;
use crate::mmu::ControlRegister;
use crate::mmu::SCTLR;

/// One hardware effect observed by [`MockHierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Dmb,
    Dsb,
    Isb,
    /// Raw value written to CSSELR.
    Select(u64),
    Maintain(MaintenanceOperation, u64),
}

/// Cache hierarchy described by a CLIDR value and per-level CCSIDR values.
///
/// Up to `N` events are kept; later ones are dropped and flagged through
/// [`MockHierarchy::overflowed`].
pub struct MockHierarchy<const N: usize> {
    clidr: CLIDR,
    geometry: [CCSIDR; 7],
    csselr: CSSELR,
    events: Vec<Event, N>,
    overflowed: bool,
}

impl<const N: usize> MockHierarchy<N> {
    /// No caches, level of coherency 0.
    pub const fn new() -> Self {
        Self {
            clidr: CLIDR::from_bits(0),
            geometry: [CCSIDR::from_bits(0); 7],
            csselr: CSSELR::from_bits(0),
            events: Vec::new(),
            overflowed: false,
        }
    }

    /// Declares the cache at `level` (0 based) and the geometry CCSIDR
    /// reports once it is selected. Levels above 6 are ignored.
    pub fn with_level(mut self, level: u8, kind: CacheType, geometry: CCSIDR) -> Self {
        if level < 7 {
            let shift = 3 * u32::from(level);
            let bits = (self.clidr.bits() & !(0b111 << shift)) | (u64::from(kind.code()) << shift);
            self.clidr = CLIDR::from_bits(bits);
            self.geometry[usize::from(level)] = geometry;
        }
        self
    }

    pub fn with_loc(mut self, loc: u8) -> Self {
        self.clidr = self.clidr.set(CLIDR::loc, u64::from(loc));
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Maintenance instructions in issue order.
    pub fn maintenance(&self) -> impl Iterator<Item = (MaintenanceOperation, u64)> + '_ {
        self.events.iter().filter_map(|event| match event {
            Event::Maintain(kind, operand) => Some((*kind, *operand)),
            _ => None,
        })
    }

    /// Values written to CSSELR in issue order.
    pub fn selections(&self) -> impl Iterator<Item = u64> + '_ {
        self.events.iter().filter_map(|event| match event {
            Event::Select(value) => Some(*value),
            _ => None,
        })
    }

    /// Current CSSELR value.
    pub fn selected(&self) -> CSSELR {
        self.csselr
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    fn record(&mut self, event: Event) {
        if self.events.push(event).is_err() {
            self.overflowed = true;
        }
    }
}

impl<const N: usize> Default for MockHierarchy<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CacheHierarchy for MockHierarchy<N> {
    fn clidr(&self) -> CLIDR {
        self.clidr
    }

    fn select(&mut self, csselr: CSSELR) {
        self.csselr = csselr;
        self.record(Event::Select(csselr.bits()));
    }

    fn ccsidr(&self) -> CCSIDR {
        // instruction side of a split cache is not modelled
        self.geometry
            .get(self.csselr.get(CSSELR::level) as usize)
            .copied()
            .unwrap_or(CCSIDR::from_bits(0))
    }

    fn maintain<Op: SetWayOp>(&mut self, operand: u64) {
        self.record(Event::Maintain(Op::KIND, operand));
    }

    fn dmb(&mut self) {
        self.record(Event::Dmb);
    }

    fn dsb(&mut self) {
        self.record(Event::Dsb);
    }

    fn isb(&mut self) {
        self.record(Event::Isb);
    }
}

/// System control register backed by memory.
pub struct MockControlRegister {
    reg: InMemoryRegister<usize, SCTLR::Register>,
    synchronizations: Cell<usize>,
}

impl MockControlRegister {
    pub fn new(value: usize) -> Self {
        Self {
            reg: InMemoryRegister::new(value),
            synchronizations: Cell::new(0),
        }
    }

    /// Number of `synchronize` calls so far.
    pub fn synchronizations(&self) -> usize {
        self.synchronizations.get()
    }
}

impl Readable for MockControlRegister {
    type T = usize;
    type R = SCTLR::Register;

    fn get(&self) -> usize {
        self.reg.get()
    }
}

impl Writeable for MockControlRegister {
    type T = usize;
    type R = SCTLR::Register;

    fn set(&self, value: usize) {
        self.reg.set(value)
    }
}

impl ControlRegister for MockControlRegister {
    const NAME: &'static str = "mock";

    fn synchronize(&self) {
        self.synchronizations.set(self.synchronizations.get() + 1);
    }
}
