//! Entry points for assembly callers.

use boot_mm::MaintenanceOperation;

use crate::cache;
use crate::mmu;
use crate::mmu::Hsctlr;
use crate::mmu::Sctlr;

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
pub unsafe extern "C" fn disable_mmu_sctlr() {
    mmu::disable(&unsafe { Sctlr::new() });
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn enable_mmu_sctlr() {
    mmu::enable(&unsafe { Sctlr::new() });
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn disable_mmu_hsctlr() {
    mmu::disable(&unsafe { Hsctlr::new() });
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn enable_mmu_hsctlr() {
    mmu::enable(&unsafe { Hsctlr::new() });
}
