#![cfg_attr(not(test), no_std)]
//! AArch64 variant of the boot-time cache and MMU layer.
//!
//! [`registers`] is plain data and builds everywhere. The hardware accessors
//! only exist when compiling for `aarch64`.

#[cfg(feature = "uefi-test")]
pub use aarch64_test::*;

#[cfg(target_arch = "aarch64")]
macro_rules! read_sysreg {
    ($sysreg:literal) => {{
        let value: u64;
        unsafe {
            core::arch::asm!(
                concat!("mrs {}, ", $sysreg),
                out(reg) value,
                options(nomem, nostack, preserves_flags)
            )
        };
        value
    }};
}

#[cfg(target_arch = "aarch64")]
macro_rules! write_sysreg {
    ($sysreg:literal, $value:expr) => {{
        let value: u64 = $value;
        unsafe {
            core::arch::asm!(
                concat!("msr ", $sysreg, ", {}"),
                in(reg) value,
                options(nostack, preserves_flags)
            )
        };
    }};
}

pub mod registers;

#[cfg(target_arch = "aarch64")]
pub mod cache;
#[cfg(target_arch = "aarch64")]
pub mod cpu;
#[cfg(all(target_arch = "aarch64", feature = "c-abi"))]
mod export;
#[cfg(target_arch = "aarch64")]
pub mod mmu;

pub use boot_mm::MaintenanceOperation;
pub use boot_mm::TranslationConfigErr;
