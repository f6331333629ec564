use core::arch::asm;

use boot_mm::TranslationConfigErr;

use crate::registers::ID_AA64MMFR0_EL1;
use crate::registers::PARange;
use crate::registers::SPSR;

pub fn get_current_el() -> u64 {
    let current_el: u64;
    unsafe { asm!("mrs {}, currentel", out(reg) current_el) };
    current_el >> 2
}

/// True when both IRQ and FIQ are masked in PSTATE.
pub fn irqs_masked() -> bool {
    let daif = SPSR::from_bits(read_sysreg!("daif"));
    daif.get(SPSR::i) == 1 && daif.get(SPSR::f) == 1
}

/// Masks debug, SError, IRQ and FIQ exceptions.
pub fn mask_exceptions() {
    unsafe { asm!("msr daifset, #0xf", options(nomem, nostack, preserves_flags)) };
}

/// Physical address range implemented by this core.
pub fn pa_range() -> Result<PARange, TranslationConfigErr> {
    let mmfr0 = ID_AA64MMFR0_EL1::from_bits(read_sysreg!("id_aa64mmfr0_el1"));
    mmfr0
        .get_enum(ID_AA64MMFR0_EL1::parange)
        .ok_or(TranslationConfigErr::UnsupportedPaRange(
            mmfr0.get(ID_AA64MMFR0_EL1::parange) as u8,
        ))
}

#[inline(always)]
pub fn dmb_sy() {
    unsafe { asm!("dmb sy", options(nostack, preserves_flags)) };
}

#[inline(always)]
pub fn dsb_sy() {
    unsafe { asm!("dsb sy", options(nostack, preserves_flags)) };
}

#[inline(always)]
pub fn isb() {
    unsafe { asm!("isb", options(nostack, preserves_flags)) };
}
