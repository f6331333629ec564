#![cfg_attr(not(test), no_std)]
//! AArch32 (ARMv7-A) variant of the boot-time cache and MMU layer.
//!
//! System registers live in coprocessor 15. [`registers`] keeps their
//! addressing tuples and layouts; the accessors only exist when compiling for
//! `arm`.

#[cfg(feature = "arm-test")]
pub use aarch32_test::*;

pub mod registers;

#[cfg(target_arch = "arm")]
macro_rules! read_cp15 {
    ($reg:ident) => {{
        let value: u32;
        unsafe {
            core::arch::asm!(
                concat!("mrc ", $crate::cp15!($reg)),
                out(reg) value,
                options(nomem, nostack, preserves_flags)
            )
        };
        value
    }};
}

#[cfg(target_arch = "arm")]
macro_rules! write_cp15 {
    ($reg:ident, $value:expr) => {{
        let value: u32 = $value;
        unsafe {
            core::arch::asm!(
                concat!("mcr ", $crate::cp15!($reg)),
                in(reg) value,
                options(nostack, preserves_flags)
            )
        };
    }};
}

#[cfg(target_arch = "arm")]
macro_rules! read_cp15_wide {
    ($reg:ident) => {{
        let low: u32;
        let high: u32;
        unsafe {
            core::arch::asm!(
                concat!("mrrc ", $crate::cp15_wide!($reg)),
                out(reg) low,
                out(reg) high,
                options(nomem, nostack, preserves_flags)
            )
        };
        (u64::from(high) << 32) | u64::from(low)
    }};
}

#[cfg(target_arch = "arm")]
pub mod cache;
#[cfg(target_arch = "arm")]
pub mod cpu;
#[cfg(all(target_arch = "arm", feature = "c-abi"))]
mod export;
#[cfg(target_arch = "arm")]
pub mod mmu;

pub use boot_mm::MaintenanceOperation;
pub use boot_mm::TranslationConfigErr;
