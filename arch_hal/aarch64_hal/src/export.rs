//! Entry points for assembly callers.

use boot_mm::MaintenanceOperation;

use crate::cache;
use crate::mmu;
use crate::mmu::SctlrEl1;
use crate::mmu::SctlrEl2;

#[unsafe(no_mangle)]
pub unsafe extern "C" fn invalidate_dcache() {
    unsafe { cache::sweep(MaintenanceOperation::Invalidate) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn clean_dcache() {
    unsafe { cache::sweep(MaintenanceOperation::Clean) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn clean_and_invalidate_dcache() {
    unsafe { cache::sweep(MaintenanceOperation::CleanAndInvalidate) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn disable_mmu_sctlr_el1() {
    mmu::disable(&unsafe { SctlrEl1::new() });
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn enable_mmu_sctlr_el1() {
    mmu::enable(&unsafe { SctlrEl1::new() });
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn disable_mmu_sctlr_el2() {
    mmu::disable(&unsafe { SctlrEl2::new() });
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn enable_mmu_sctlr_el2() {
    mmu::enable(&unsafe { SctlrEl2::new() });
}
