use core::arch::asm;

use crate::registers::CPSR;
use crate::registers::ProcessorMode;

pub fn cpsr() -> CPSR {
    let value: u32;
    unsafe { asm!("mrs {}, cpsr", out(reg) value, options(nomem, nostack, preserves_flags)) };
    CPSR::from_bits(value)
}

pub fn is_hyp_mode() -> bool {
    cpsr().get_enum(CPSR::mode) == Some(ProcessorMode::Hypervisor)
}

/// HTTBR, or `None` outside Hyp mode where the register is not accessible.
pub fn hyp_translation_base() -> Option<u64> {
    if !is_hyp_mode() {
        return None;
    }
    Some(read_cp15_wide!(HTTBR))
}

/// True when both IRQ and FIQ are masked.
pub fn irqs_masked() -> bool {
    let cpsr = cpsr();
    cpsr.get(CPSR::i) == 1 && cpsr.get(CPSR::f) == 1
}

#[inline(always)]
pub fn dmb() {
    unsafe { asm!("dmb", options(nostack, preserves_flags)) };
}

#[inline(always)]
pub fn dsb_sy() {
    unsafe { asm!("dsb sy", options(nostack, preserves_flags)) };
}

#[inline(always)]
pub fn isb() {
    unsafe { asm!("isb", options(nostack, preserves_flags)) };
}
