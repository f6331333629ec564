//! Set/way maintenance with `DC ISW`, `DC CSW` and `DC CISW`.

use core::arch::asm;

use boot_mm::MaintenanceOperation;
use boot_mm::SetWayOp;
use boot_mm::cache::CCSIDR;
use boot_mm::cache::CLIDR;
use boot_mm::cache::CSSELR;
use boot_mm::cache::CacheHierarchy;
use log::debug;

use crate::cpu;

/// Cache hierarchy of the executing core, reached via CLIDR_EL1,
/// CSSELR_EL1 and CCSIDR_EL1.
pub struct Caches {
    _private: (),
}

impl Caches {
    /// # Safety
    /// Only one handle may drive CSSELR_EL1 of a core at a time, and the
    /// core must not take interrupts while a sweep runs.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl CacheHierarchy for Caches {
    fn clidr(&self) -> CLIDR {
        CLIDR::from_bits(read_sysreg!("clidr_el1"))
    }

    fn select(&mut self, csselr: CSSELR) {
        write_sysreg!("csselr_el1", csselr.bits());
    }

    fn ccsidr(&self) -> CCSIDR {
        CCSIDR::from_bits(read_sysreg!("ccsidr_el1"))
    }

    #[inline(always)]
    fn maintain<Op: SetWayOp>(&mut self, operand: u64) {
        match Op::KIND {
            MaintenanceOperation::Invalidate => unsafe {
                asm!("dc isw, {}", in(reg) operand, options(nostack, preserves_flags))
            },
            MaintenanceOperation::Clean => unsafe {
                asm!("dc csw, {}", in(reg) operand, options(nostack, preserves_flags))
            },
            MaintenanceOperation::CleanAndInvalidate => unsafe {
                asm!("dc cisw, {}", in(reg) operand, options(nostack, preserves_flags))
            },
        }
    }

    fn dmb(&mut self) {
        cpu::dmb_sy();
    }

    fn dsb(&mut self) {
        cpu::dsb_sy();
    }

    fn isb(&mut self) {
        cpu::isb();
    }
}

/// Applies `op` to every data/unified cache line up to the level of coherency.
///
/// # Safety
/// IRQ and FIQ must be masked and nothing else may touch CSSELR_EL1 on this
/// core until the call returns. `Invalidate` discards dirty lines, so it is
/// only sound while the data cache is disabled or holds nothing worth keeping.
pub unsafe fn sweep(op: MaintenanceOperation) {
    debug!("cache: {} by set/way at EL{}", op, cpu::get_current_el());
    debug_assert!(cpu::irqs_masked(), "set/way sweep with interrupts unmasked");
    let mut caches = unsafe { Caches::new() };
    boot_mm::cache::sweep(&mut caches, op);
}

/// Current CSSELR_EL1 value.
pub fn selected_cache() -> CSSELR {
    CSSELR::from_bits(read_sysreg!("csselr_el1"))
}
