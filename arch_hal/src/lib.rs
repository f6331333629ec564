#![no_std]
//! Selects the cache/MMU layer for the architecture being built.
//!
//! `arch` is `aarch64_hal` on AArch64 and `aarch32_hal` on 32-bit ARM. Both
//! expose the same shape: `registers`, `cpu`, `cache::{Caches, sweep}` and
//! `mmu::{enable, disable}` over their own control registers.

#[cfg(target_arch = "aarch64")]
pub use aarch64_hal as arch;

#[cfg(target_arch = "arm")]
pub use aarch32_hal as arch;

#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
pub use arch::cache::sweep;
#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
pub use arch::mmu::disable;
#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
pub use arch::mmu::enable;
#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
pub use arch::registers;

pub use boot_mm::ControlRegister;
pub use boot_mm::MaintenanceOperation;
pub use boot_mm::TranslationConfigErr;
pub use boot_mm::cache::CCSIDR;
pub use boot_mm::cache::CLIDR;
pub use boot_mm::cache::CSSELR;
pub use boot_mm::cache::CacheHierarchy;
pub use boot_mm::cache::CacheLevelDescriptor;
pub use boot_mm::cache::CacheType;
