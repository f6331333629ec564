//! SCTLR_EL1 and SCTLR_EL2 as [`ControlRegister`]s.

use boot_mm::ControlRegister;
use boot_mm::SCTLR;
use tock_registers::interfaces::Readable;
use tock_registers::interfaces::Writeable;

use crate::cpu;

pub use boot_mm::mmu::disable;
pub use boot_mm::mmu::enable;
pub use boot_mm::mmu::is_enabled;

macro_rules! control_register {
    ($(#[$m:meta])* $Name:ident, $sysreg:literal) => {
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
                read_sysreg!($sysreg) as usize
            }
        }

        impl Writeable for $Name {
            type T = usize;
            type R = SCTLR::Register;

            fn set(&self, value: usize) {
                write_sysreg!($sysreg, value as u64);
            }
        }

        impl ControlRegister for $Name {
            const NAME: &'static str = $sysreg;

            fn synchronize(&self) {
                cpu::isb();
            }
        }
    };
}

control_register!(
    /// System control register of the EL1&0 regime.
    SctlrEl1,
    "sctlr_el1"
);
control_register!(
    /// System control register of EL2.
    SctlrEl2,
    "sctlr_el2"
);
