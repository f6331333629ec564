//! MMU enable/disable for a system control register instance.
//!
//! Only three bits ever change: M (stage 1 translation), C (data and unified
//! caches) and I (instruction caches). The rest of the register is written
//! back as read, so `enable` and `disable` are exact inverses.

use log::debug;
use tock_registers::interfaces::ReadWriteable;
use tock_registers::interfaces::Readable;
use tock_registers::interfaces::Writeable;
use tock_registers::register_bitfields;

register_bitfields! {usize,
    /// Bits of SCTLR / HSCTLR / SCTLR_ELx touched by a transition.
    /// The positions are shared by every variant.
    pub SCTLR [
        /// MMU enable for stage 1 translation
        M OFFSET(0) NUMBITS(1) [],
        /// Alignment check enable
        A OFFSET(1) NUMBITS(1) [],
        /// Data and unified cache enable
        C OFFSET(2) NUMBITS(1) [],
        /// Instruction cache enable
        I OFFSET(12) NUMBITS(1) []
    ]
}

/// Bits flipped by [`enable`] and [`disable`].
pub const TRANSITION_MASK: usize = (SCTLR::M.mask << SCTLR::M.shift)
    | (SCTLR::C.mask << SCTLR::C.shift)
    | (SCTLR::I.mask << SCTLR::I.shift);

/// A system control register the transition can be applied to.
///
/// `synchronize` must make a preceding write visible to subsequent
/// instruction fetches (`ISB` on hardware).
pub trait ControlRegister:
    Readable<T = usize, R = SCTLR::Register> + Writeable<T = usize, R = SCTLR::Register>
{
    /// Register name for diagnostics.
    const NAME: &'static str;

    fn synchronize(&self);
}

/// Turns stage 1 translation and both caches off.
pub fn disable<R: ControlRegister>(reg: &R) {
    debug!("mmu: disable via {} (was {:#x})", R::NAME, reg.get());
    reg.modify(SCTLR::M::CLEAR + SCTLR::C::CLEAR + SCTLR::I::CLEAR);
    reg.synchronize();
}

/// Turns stage 1 translation and both caches on.
///
/// The translation tables and the base address register must already be
/// valid; nothing is checked here.
pub fn enable<R: ControlRegister>(reg: &R) {
    debug!("mmu: enable via {} (was {:#x})", R::NAME, reg.get());
    reg.modify(SCTLR::M::SET + SCTLR::C::SET + SCTLR::I::SET);
    reg.synchronize();
}

pub fn is_enabled<R: ControlRegister>(reg: &R) -> bool {
    reg.is_set(SCTLR::M)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::MockControlRegister;

    #[test]
    fn transition_mask_is_m_c_i() {
        assert_eq!(TRANSITION_MASK, 0b1_0000_0000_0101);
    }

    #[test]
    fn enable_sets_exactly_three_bits() {
        for initial in [0usize, 0x30d0_0800, 0x0000_0002, !TRANSITION_MASK] {
            let reg = MockControlRegister::new(initial);

            enable(&reg);

            assert_eq!(reg.get(), initial | TRANSITION_MASK);
            assert!(is_enabled(&reg));
            assert_eq!(reg.synchronizations(), 1);
        }
    }

    #[test]
    fn disable_clears_exactly_three_bits() {
        for initial in [usize::MAX, 0x30d0_1805, TRANSITION_MASK, 0x0000_1000] {
            let reg = MockControlRegister::new(initial);

            disable(&reg);

            assert_eq!(reg.get(), initial & !TRANSITION_MASK);
            assert!(!is_enabled(&reg));
            assert_eq!(reg.synchronizations(), 1);
        }
    }

    #[test]
    fn enable_then_disable_restores_cleared_value() {
        let prior = 0x30d0_0800;
        let reg = MockControlRegister::new(prior);

        enable(&reg);
        disable(&reg);

        assert_eq!(reg.get(), prior);
        assert_eq!(reg.synchronizations(), 2);
    }

    #[test]
    fn disable_then_enable_restores_set_value() {
        let prior = 0x30d0_1805 | TRANSITION_MASK;
        let reg = MockControlRegister::new(prior);

        disable(&reg);
        enable(&reg);

        assert_eq!(reg.get(), prior);
    }

    #[test]
    fn alignment_check_is_left_alone() {
        let reg = MockControlRegister::new(0);
        reg.modify(SCTLR::A::SET);

        enable(&reg);
        assert!(reg.is_set(SCTLR::A));
        disable(&reg);
        assert!(reg.is_set(SCTLR::A));
    }
}
