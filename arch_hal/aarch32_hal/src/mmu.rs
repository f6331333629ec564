//! SCTLR and HSCTLR as [`ControlRegister`]s.

use boot_mm::ControlRegister;
use boot_mm::SCTLR;
use log::debug;
use tock_registers::interfaces::Readable;
use tock_registers::interfaces::Writeable;

use crate::cpu;
use crate::registers::DACR_ALL_CLIENT;
use crate::registers::TTBCR;

pub use boot_mm::mmu::disable;
pub use boot_mm::mmu::enable;
pub use boot_mm::mmu::is_enabled;

macro_rules! control_register {
    ($(#[$m:meta])* $Name:ident, $reg:ident, $name:literal) => {
        $(#[$m])*
        pub struct $Name {
            _private: (),
        }

        impl $Name {
            /// # Safety
            /// Writes through this handle change how the executing core
            /// translates addresses; the caller owns that transition.
            pub const unsafe fn new() -> Self {
                Self { _private: () }
            }
        }

        impl Readable for $Name {
            type T = usize;
            type R = SCTLR::Register;

            fn get(&self) -> usize {
                read_cp15!($reg) as usize
            }
        }

        impl Writeable for $Name {
            type T = usize;
            type R = SCTLR::Register;

            fn set(&self, value: usize) {
                write_cp15!($reg, value as u32);
            }
        }

        impl ControlRegister for $Name {
            const NAME: &'static str = $name;

            fn synchronize(&self) {
                cpu::isb();
            }
        }
    };
}

control_register!(
    /// PL1 system control register.
    Sctlr,
    SCTLR,
    "sctlr"
);
control_register!(
    /// Hyp mode system control register.
    Hsctlr,
    HSCTLR,
    "hsctlr"
);

/// Installs a short-descriptor level 1 table for the PL1&0 regime and drops
/// stale TLB entries. Translation itself stays as it is.
///
/// # Safety
/// `table` must be the physical address of a 16KiB aligned level 1 table that
/// maps all code, data and devices used once [`enable`] is called.
pub unsafe fn set_translation_table(table: u32) {
    debug!("mmu: ttbr0 {:#x}", table);
    write_cp15!(TTBCR, TTBCR::LOADER.bits());
    write_cp15!(DACR, DACR_ALL_CLIENT);
    write_cp15!(TTBR0, table);
    write_cp15!(TLBIALL, 0);
    cpu::dsb_sy();
    cpu::isb();
}
