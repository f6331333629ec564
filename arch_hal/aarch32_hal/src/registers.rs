#![allow(non_camel_case_types)]
//! CP15 addressing and AArch32 layouts.

use bitregs::bitregs;
use boot_mm::Cacheability;
use boot_mm::Shareability;
use boot_mm::TranslationConfigErr;

/// `MRC`/`MCR` addressing of a 32-bit CP15 register: `p15, opc1, Rt, CRn, CRm, opc2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cp15 {
    pub opc1: u8,
    pub crn: u8,
    pub crm: u8,
    pub opc2: u8,
}

impl Cp15 {
    pub const fn new(opc1: u8, crn: u8, crm: u8, opc2: u8) -> Self {
        Self {
            opc1,
            crn,
            crm,
            opc2,
        }
    }

    // identification
    pub const CCSIDR: Cp15 = Cp15::new(1, 0, 0, 0);
    pub const CLIDR: Cp15 = Cp15::new(1, 0, 0, 1);
    pub const CSSELR: Cp15 = Cp15::new(2, 0, 0, 0);

    // PL1 system control and translation
    pub const SCTLR: Cp15 = Cp15::new(0, 1, 0, 0);
    pub const ACTLR: Cp15 = Cp15::new(0, 1, 0, 1);
    pub const TTBR0: Cp15 = Cp15::new(0, 2, 0, 0);
    pub const TTBCR: Cp15 = Cp15::new(0, 2, 0, 2);
    pub const DACR: Cp15 = Cp15::new(0, 3, 0, 0);
    pub const CONTEXTIDR: Cp15 = Cp15::new(0, 13, 0, 1);

    // cache and branch predictor maintenance
    pub const ICIALLU: Cp15 = Cp15::new(0, 7, 5, 0);
    pub const BPIALL: Cp15 = Cp15::new(0, 7, 5, 6);
    pub const DCISW: Cp15 = Cp15::new(0, 7, 6, 2);
    pub const DCCSW: Cp15 = Cp15::new(0, 7, 10, 2);
    pub const DCCISW: Cp15 = Cp15::new(0, 7, 14, 2);

    // TLB maintenance
    pub const DTLBIALL: Cp15 = Cp15::new(0, 8, 6, 0);
    pub const DTLBIASID: Cp15 = Cp15::new(0, 8, 6, 2);
    pub const TLBIALL: Cp15 = Cp15::new(0, 8, 7, 0);
    pub const TLBIASID: Cp15 = Cp15::new(0, 8, 7, 2);

    // Hyp mode
    pub const HSCTLR: Cp15 = Cp15::new(4, 1, 0, 0);
    pub const HACTLR: Cp15 = Cp15::new(4, 1, 0, 1);
    pub const HCR: Cp15 = Cp15::new(4, 1, 1, 0);
    pub const HDCR: Cp15 = Cp15::new(4, 1, 1, 1);
    pub const HCPTR: Cp15 = Cp15::new(4, 1, 1, 2);
    pub const HSTR: Cp15 = Cp15::new(4, 1, 1, 3);
    pub const HACR: Cp15 = Cp15::new(4, 1, 1, 7);
    pub const HTCR: Cp15 = Cp15::new(4, 2, 0, 2);
    pub const HADFSR: Cp15 = Cp15::new(4, 5, 1, 0);
    pub const HAIFSR: Cp15 = Cp15::new(4, 5, 1, 1);
    pub const HSR: Cp15 = Cp15::new(4, 5, 2, 0);
    pub const HDFAR: Cp15 = Cp15::new(4, 6, 0, 0);
    pub const HIFAR: Cp15 = Cp15::new(4, 6, 0, 2);
    pub const HPFAR: Cp15 = Cp15::new(4, 6, 0, 4);
    pub const HMAIR0: Cp15 = Cp15::new(4, 10, 2, 0);
    pub const HMAIR1: Cp15 = Cp15::new(4, 10, 2, 1);
    pub const HAMAIR0: Cp15 = Cp15::new(4, 10, 3, 0);
    pub const HAMAIR1: Cp15 = Cp15::new(4, 10, 3, 1);
    pub const HVBAR: Cp15 = Cp15::new(4, 12, 0, 0);
    pub const HTPIDR: Cp15 = Cp15::new(4, 13, 0, 2);
}

/// `MRRC`/`MCRR` addressing of a 64-bit CP15 register:
/// `p15, opc1, Rt, Rt2, CRm`, low word in `Rt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cp15Wide {
    pub opc1: u8,
    pub crm: u8,
}

impl Cp15Wide {
    pub const fn new(opc1: u8, crm: u8) -> Self {
        Self { opc1, crm }
    }

    pub const TTBR0: Cp15Wide = Cp15Wide::new(0, 2);
    pub const HTTBR: Cp15Wide = Cp15Wide::new(4, 2);
}

/// `MRC`/`MCR` operand string for a CP15 register, with `{}` standing for
/// the general purpose register.
///
/// ```
/// assert_eq!(aarch32_hal::cp15!(SCTLR), "p15, 0, {}, c1, c0, 0");
/// ```
#[macro_export]
macro_rules! cp15 {
    (CCSIDR) => { "p15, 1, {}, c0, c0, 0" };
    (CLIDR) => { "p15, 1, {}, c0, c0, 1" };
    (CSSELR) => { "p15, 2, {}, c0, c0, 0" };
    (SCTLR) => { "p15, 0, {}, c1, c0, 0" };
    (ACTLR) => { "p15, 0, {}, c1, c0, 1" };
    (TTBR0) => { "p15, 0, {}, c2, c0, 0" };
    (TTBCR) => { "p15, 0, {}, c2, c0, 2" };
    (DACR) => { "p15, 0, {}, c3, c0, 0" };
    (CONTEXTIDR) => { "p15, 0, {}, c13, c0, 1" };
    (ICIALLU) => { "p15, 0, {}, c7, c5, 0" };
    (BPIALL) => { "p15, 0, {}, c7, c5, 6" };
    (DCISW) => { "p15, 0, {}, c7, c6, 2" };
    (DCCSW) => { "p15, 0, {}, c7, c10, 2" };
    (DCCISW) => { "p15, 0, {}, c7, c14, 2" };
    (DTLBIALL) => { "p15, 0, {}, c8, c6, 0" };
    (DTLBIASID) => { "p15, 0, {}, c8, c6, 2" };
    (TLBIALL) => { "p15, 0, {}, c8, c7, 0" };
    (TLBIASID) => { "p15, 0, {}, c8, c7, 2" };
    (HSCTLR) => { "p15, 4, {}, c1, c0, 0" };
    (HACTLR) => { "p15, 4, {}, c1, c0, 1" };
    (HCR) => { "p15, 4, {}, c1, c1, 0" };
    (HDCR) => { "p15, 4, {}, c1, c1, 1" };
    (HCPTR) => { "p15, 4, {}, c1, c1, 2" };
    (HSTR) => { "p15, 4, {}, c1, c1, 3" };
    (HACR) => { "p15, 4, {}, c1, c1, 7" };
    (HTCR) => { "p15, 4, {}, c2, c0, 2" };
    (HADFSR) => { "p15, 4, {}, c5, c1, 0" };
    (HAIFSR) => { "p15, 4, {}, c5, c1, 1" };
    (HSR) => { "p15, 4, {}, c5, c2, 0" };
    (HDFAR) => { "p15, 4, {}, c6, c0, 0" };
    (HIFAR) => { "p15, 4, {}, c6, c0, 2" };
    (HPFAR) => { "p15, 4, {}, c6, c0, 4" };
    (HMAIR0) => { "p15, 4, {}, c10, c2, 0" };
    (HMAIR1) => { "p15, 4, {}, c10, c2, 1" };
    (HAMAIR0) => { "p15, 4, {}, c10, c3, 0" };
    (HAMAIR1) => { "p15, 4, {}, c10, c3, 1" };
    (HVBAR) => { "p15, 4, {}, c12, c0, 0" };
    (HTPIDR) => { "p15, 4, {}, c13, c0, 2" };
}

/// `MRRC`/`MCRR` operand string for a 64-bit CP15 register. The first `{}`
/// takes the low word, the second the high word.
///
/// ```
/// assert_eq!(aarch32_hal::cp15_wide!(HTTBR), "p15, 4, {}, {}, c2");
/// ```
#[macro_export]
macro_rules! cp15_wide {
    (TTBR0) => { "p15, 0, {}, {}, c2" };
    (HTTBR) => { "p15, 4, {}, {}, c2" };
}

bitregs! {
    /// CPSR / SPSR: current program status
    /// Purpose:
    ///     Processor mode and exception masks.
    pub struct CPSR: u32 {
        pub mode@[4:0] as ProcessorMode {
            User = 0x10,
            Fiq = 0x11,
            Irq = 0x12,
            Supervisor = 0x13,
            Monitor = 0x16,
            Abort = 0x17,
            Hypervisor = 0x1a,
            Undefined = 0x1b,
            System = 0x1f,
        },
        // Thumb state
        pub t@[5:5],
        // FIQ, IRQ and asynchronous abort masks
        pub f@[6:6],
        pub i@[7:7],
        pub a@[8:8],
        // data endianness
        pub e@[9:9],
        reserved@[31:10] [ignore],
    }
}

impl CPSR {
    pub const fn masked(mode: ProcessorMode) -> Self {
        CPSR::new()
            .set(CPSR::mode, mode as u32)
            .set(CPSR::f, 1)
            .set(CPSR::i, 1)
            .set(CPSR::a, 1)
    }
}

/// Supervisor mode with FIQ, IRQ and asynchronous aborts masked.
pub const CPSR_SUPERVISOR: CPSR = CPSR::masked(ProcessorMode::Supervisor);

bitregs! {
    /// TTBCR: Translation Table Base Control Register (short descriptors)
    /// Purpose:
    ///     Splits the address space between TTBR0 and TTBR1.
    pub struct TTBCR: u32 {
        // TTBR0 covers the bottom 2^(32 - n) bytes
        pub n@[2:0],
        reserved@[3:3] [res0],
        pub pd0@[4:4],
        pub pd1@[5:5],
        reserved@[30:6] [res0],
        // long descriptor format
        pub eae@[31:31],
    }
}

impl TTBCR {
    /// TTBR0 only, short descriptors.
    pub const LOADER: Self = TTBCR::new();
}

/// DACR with all sixteen domains set to client, so access permissions come
/// from the descriptors.
pub const DACR_ALL_CLIENT: u32 = 0x5555_5555;

bitregs! {
    /// Short-descriptor level 1 section entry
    /// Purpose:
    ///     Maps one 1MiB region through a TTBR0/TTBR1 level 1 table.
    pub struct L1Section: u32 {
        // 0b10 = section or supersection
        pub kind@[1:0],
        pub b@[2:2],
        pub c@[3:3],
        pub xn@[4:4],
        pub domain@[8:5],
        reserved@[9:9] [ignore],
        // 0b11 = read/write at every privilege level
        pub ap@[11:10],
        pub tex@[14:12],
        pub ap2@[15:15],
        pub s@[16:16],
        pub ng@[17:17],
        // 1 would make this a 16MiB supersection
        reserved@[18:18] [res0],
        pub ns@[19:19],
        pub base@[31:20],
    }
}

impl L1Section {
    const fn section(megabyte: u32) -> Self {
        L1Section::new()
            .set(L1Section::kind, 0b10)
            .set(L1Section::ap, 0b11)
            .set(L1Section::base, megabyte)
    }

    /// Write-back write-allocate normal memory at `megabyte` << 20.
    pub const fn normal(megabyte: u32) -> Self {
        Self::section(megabyte)
            .set(L1Section::tex, 0b001)
            .set(L1Section::c, 1)
            .set(L1Section::b, 1)
    }

    /// Shareable device memory, never executable.
    pub const fn device(megabyte: u32) -> Self {
        Self::section(megabyte)
            .set(L1Section::b, 1)
            .set(L1Section::xn, 1)
    }
}

bitregs! {
    /// HTCR: Hyp Translation Control Register
    /// Purpose:
    ///     Controls the Hyp mode (PL2) stage 1 translation regime, which
    ///     always uses long descriptors.
    pub struct HTCR: u32 {
        // input size is 2^(32 - t0sz) bytes
        pub t0sz@[2:0],
        reserved@[7:3] [res0],
        pub irgn0@[9:8] as Cacheability,
        pub orgn0@[11:10] as Cacheability,
        pub sh0@[13:12] as Shareability,
        reserved@[22:14] [res0],
        reserved@[23:23] [res1],
        pub hpd@[24:24],
        pub hwu@[28:25],
        reserved@[30:29] [res0],
        reserved@[31:31] [res1],
    }
}

impl HTCR {
    /// Full 32-bit input, write-back inner shareable walks.
    pub const LOADER: Self = HTCR::new()
        .set(HTCR::irgn0, Cacheability::WriteBackWriteAllocate as u32)
        .set(HTCR::orgn0, Cacheability::WriteBackWriteAllocate as u32)
        .set(HTCR::sh0, Shareability::InnerShareable as u32);

    pub const MIN_INPUT_BITS: u8 = 25;
    pub const MAX_INPUT_BITS: u8 = 32;

    pub const fn with_input_bits(self, bits: u8) -> Result<Self, TranslationConfigErr> {
        if bits < Self::MIN_INPUT_BITS || bits > Self::MAX_INPUT_BITS {
            return Err(TranslationConfigErr::InputSizeOutOfRange(bits));
        }
        Ok(self.set(HTCR::t0sz, 32 - bits as u32))
    }
}
