//! Set/way maintenance with `DCISW`, `DCCSW` and `DCCISW`.

use core::arch::asm;

use boot_mm::MaintenanceOperation;
use boot_mm::SetWayOp;
use boot_mm::cache::CCSIDR;
use boot_mm::cache::CLIDR;
use boot_mm::cache::CSSELR;
use boot_mm::cache::CacheHierarchy;
use log::debug;

use crate::cpu;

/// Cache hierarchy of the executing core, reached via CP15 CLIDR, CSSELR
/// and CCSIDR.
pub struct Caches {
    _private: (),
}

impl Caches {
    /// # Safety
    /// Only one handle may drive CSSELR of a core at a time, and the core
    /// must not take interrupts while a sweep runs.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl CacheHierarchy for Caches {
    fn clidr(&self) -> CLIDR {
        CLIDR::from_bits(u64::from(read_cp15!(CLIDR)))
    }

    fn select(&mut self, csselr: CSSELR) {
        write_cp15!(CSSELR, csselr.bits() as u32);
    }

    fn ccsidr(&self) -> CCSIDR {
        CCSIDR::from_bits(u64::from(read_cp15!(CCSIDR)))
    }

    #[inline(always)]
    fn maintain<Op: SetWayOp>(&mut self, operand: u64) {
        // way, set and level all sit in the low word
        let operand = operand as u32;
        match Op::KIND {
            MaintenanceOperation::Invalidate => unsafe {
                asm!(concat!("mcr ", crate::cp15!(DCISW)), in(reg) operand, options(nostack, preserves_flags))
            },
            MaintenanceOperation::Clean => unsafe {
                asm!(concat!("mcr ", crate::cp15!(DCCSW)), in(reg) operand, options(nostack, preserves_flags))
            },
            MaintenanceOperation::CleanAndInvalidate => unsafe {
                asm!(concat!("mcr ", crate::cp15!(DCCISW)), in(reg) operand, options(nostack, preserves_flags))
            },
        }
    }

    fn dmb(&mut self) {
        cpu::dmb();
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
/// IRQ and FIQ must be masked and nothing else may touch CSSELR on this core
/// until the call returns. `Invalidate` discards dirty lines, so it is only
/// sound while the data cache is disabled or holds nothing worth keeping.
pub unsafe fn sweep(op: MaintenanceOperation) {
    debug!("cache: {} by set/way from {:?}", op, cpu::cpsr());
    debug_assert!(cpu::irqs_masked(), "set/way sweep with interrupts unmasked");
    let mut caches = unsafe { Caches::new() };
    boot_mm::cache::sweep(&mut caches, op);
}

/// Current CSSELR value.
pub fn selected_cache() -> CSSELR {
    CSSELR::from_bits(u64::from(read_cp15!(CSSELR)))
}
