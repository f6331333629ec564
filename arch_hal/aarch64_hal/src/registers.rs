#![allow(non_camel_case_types)]
//! AArch64 layouts consumed by the loader's page-table and mode-switch code.
//!
//! The `LOADER` presets are the values the loader programs before it turns
//! translation on. Their physical address size is filled in at runtime from
//! [`ID_AA64MMFR0_EL1`] through `with_pa_range`.

use bitregs::bitregs;
use boot_mm::Cacheability;
use boot_mm::Shareability;
use boot_mm::TranslationConfigErr;

bitregs! {
    /// ID_AA64MMFR0_EL1: AArch64 Memory Model Feature Register 0
    /// Purpose:
    ///     Reports the physical address range and the supported translation
    ///     granules. Read only.
    pub struct ID_AA64MMFR0_EL1: u64 {
        // Physical address range. 0b0111..0b1111 are reserved or need
        // 128-bit descriptors.
        pub parange@[3:0] as PARange {
            Bits32 = 0b0000,
            Bits36 = 0b0001,
            Bits40 = 0b0010,
            Bits42 = 0b0011,
            Bits44 = 0b0100,
            Bits48 = 0b0101,
            Bits52 = 0b0110,
            Bits56 = 0b0111,
        },

        // 0b0000 = 8-bit ASID, 0b0010 = 16-bit ASID
        pub asidbits@[7:4],
        pub bigend@[11:8],
        pub snsmem@[15:12],
        pub bigendel0@[19:16],

        // Stage 1 granule support. Note the inverted encodings:
        // tgran16 0b0000 = not supported, tgran4/tgran64 0b1111 = not supported.
        pub tgran16@[23:20],
        pub tgran64@[27:24],
        pub tgran4@[31:28],

        reserved@[63:32] [ignore],
    }
}

impl PARange {
    /// Width of a physical address in bits.
    pub const fn bits(self) -> u8 {
        match self {
            PARange::Bits32 => 32,
            PARange::Bits36 => 36,
            PARange::Bits40 => 40,
            PARange::Bits42 => 42,
            PARange::Bits44 => 44,
            PARange::Bits48 => 48,
            PARange::Bits52 => 52,
            PARange::Bits56 => 56,
        }
    }

    /// Encoding for the TCR_ELx PS/IPS fields. Ranges above 48 bits need
    /// FEAT_LPA2 or 128-bit descriptors, which the loader tables never use.
    pub const fn output_size(self) -> Result<u64, TranslationConfigErr> {
        match self {
            PARange::Bits52 | PARange::Bits56 => {
                Err(TranslationConfigErr::UnsupportedPaRange(self as u8))
            }
            other => Ok(other as u64),
        }
    }
}

/// Legal input address sizes for a 4KiB granule without FEAT_LVA/FEAT_TTST.
pub const MIN_INPUT_BITS: u8 = 25;
pub const MAX_INPUT_BITS: u8 = 48;

const fn txsz(bits: u8) -> Result<u64, TranslationConfigErr> {
    if bits < MIN_INPUT_BITS || bits > MAX_INPUT_BITS {
        return Err(TranslationConfigErr::InputSizeOutOfRange(bits));
    }
    Ok(64 - bits as u64)
}

bitregs! {
    /// TCR_EL1: Translation Control Register (EL1)
    /// Purpose:
    ///     Controls the EL1&0 translation regime (TTBR0_EL1 and TTBR1_EL1).
    pub struct TCR_EL1: u64 {
        // Region size of TTBR0_EL1 is 2^(64 - t0sz) bytes.
        pub t0sz@[5:0],
        reserved@[6:6] [res0],
        pub epd0@[7:7],

        // Table walk attributes for TTBR0_EL1
        pub irgn0@[9:8] as Cacheability,
        pub orgn0@[11:10] as Cacheability,
        pub sh0@[13:12] as Shareability,
        pub tg0@[15:14] as Granule0 {
            Kib4 = 0b00,
            Kib64 = 0b01,
            Kib16 = 0b10,
        },

        // Region size of TTBR1_EL1 is 2^(64 - t1sz) bytes.
        pub t1sz@[21:16],
        pub a1@[22:22],
        pub epd1@[23:23],
        pub irgn1@[25:24] as Cacheability,
        pub orgn1@[27:26] as Cacheability,
        pub sh1@[29:28] as Shareability,
        // TG1 uses a different encoding from TG0.
        pub tg1@[31:30] as Granule1 {
            Kib16 = 0b01,
            Kib4 = 0b10,
            Kib64 = 0b11,
        },

        // Intermediate physical address size, same encoding as PARange.
        pub ips@[34:32],
        reserved@[35:35] [res0],

        // 0 = 8-bit ASID, 1 = 16-bit ASID
        pub asid16@[36:36],
        pub tbi0@[37:37],
        pub tbi1@[38:38],

        // HA, HD and later extensions
        reserved@[63:39] [ignore],
    }
}

impl TCR_EL1 {
    /// 48-bit split address space, 4KiB granules, write-back inner shareable
    /// walks and 16-bit ASIDs. IPS is left at 0.
    pub const LOADER: Self = TCR_EL1::new()
        .set(TCR_EL1::t0sz, 16)
        .set(TCR_EL1::t1sz, 16)
        .set(TCR_EL1::irgn0, Cacheability::WriteBackWriteAllocate as u64)
        .set(TCR_EL1::irgn1, Cacheability::WriteBackWriteAllocate as u64)
        .set(TCR_EL1::orgn0, Cacheability::WriteBackWriteAllocate as u64)
        .set(TCR_EL1::orgn1, Cacheability::WriteBackWriteAllocate as u64)
        .set(TCR_EL1::sh0, Shareability::InnerShareable as u64)
        .set(TCR_EL1::sh1, Shareability::InnerShareable as u64)
        .set(TCR_EL1::tg0, Granule0::Kib4 as u64)
        .set(TCR_EL1::tg1, Granule1::Kib4 as u64)
        .set(TCR_EL1::asid16, 1);

    /// Sets both T0SZ and T1SZ for a `bits` wide input address.
    pub const fn with_input_bits(self, bits: u8) -> Result<Self, TranslationConfigErr> {
        match txsz(bits) {
            Ok(size) => Ok(self.set(TCR_EL1::t0sz, size).set(TCR_EL1::t1sz, size)),
            Err(e) => Err(e),
        }
    }

    pub const fn with_pa_range(self, range: PARange) -> Result<Self, TranslationConfigErr> {
        match range.output_size() {
            Ok(ips) => Ok(self.set(TCR_EL1::ips, ips)),
            Err(e) => Err(e),
        }
    }
}

bitregs! {
    /// TCR_EL2: Translation Control Register (EL2, E2H == 0)
    /// Purpose:
    ///     Controls the single-range EL2 translation regime (TTBR0_EL2).
    pub struct TCR_EL2: u64 {
        pub t0sz@[5:0],
        reserved@[7:6] [res0],
        pub irgn0@[9:8] as Cacheability,
        pub orgn0@[11:10] as Cacheability,
        pub sh0@[13:12] as Shareability,
        pub tg0@[15:14] as Granule {
            Kib4 = 0b00,
            Kib64 = 0b01,
            Kib16 = 0b10,
        },

        // Physical address size, same encoding as PARange.
        pub ps@[18:16],
        reserved@[19:19] [res0],
        pub tbi@[20:20],
        pub ha@[21:21],
        pub hd@[22:22],
        reserved@[23:23] [res1],
        pub hpd@[24:24],
        pub hwu@[28:25],
        pub tbid@[29:29],
        pub tcma@[30:30],
        reserved@[31:31] [res1],
        pub ds@[32:32],
        reserved@[63:33] [res0],
    }
}

impl TCR_EL2 {
    /// 48-bit address space, 4KiB granule, write-back inner shareable walks.
    /// PS is left at 0.
    pub const LOADER: Self = TCR_EL2::new()
        .set(TCR_EL2::t0sz, 16)
        .set(TCR_EL2::irgn0, Cacheability::WriteBackWriteAllocate as u64)
        .set(TCR_EL2::orgn0, Cacheability::WriteBackWriteAllocate as u64)
        .set(TCR_EL2::sh0, Shareability::InnerShareable as u64)
        .set(TCR_EL2::tg0, Granule::Kib4 as u64);

    pub const fn with_input_bits(self, bits: u8) -> Result<Self, TranslationConfigErr> {
        match txsz(bits) {
            Ok(size) => Ok(self.set(TCR_EL2::t0sz, size)),
            Err(e) => Err(e),
        }
    }

    pub const fn with_pa_range(self, range: PARange) -> Result<Self, TranslationConfigErr> {
        match range.output_size() {
            Ok(ps) => Ok(self.set(TCR_EL2::ps, ps)),
            Err(e) => Err(e),
        }
    }
}

/// Memory types the loader maps with, named by their MAIR index.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryType {
    DeviceNGnRnE = 0,
    DeviceNGnRE = 1,
    DeviceGRE = 2,
    NormalNonCacheable = 3,
    Normal = 4,
    NormalWriteThrough = 5,
}

impl MemoryType {
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// MAIR attribute byte.
    pub const fn attribute(self) -> u8 {
        match self {
            MemoryType::DeviceNGnRnE => 0x00,
            MemoryType::DeviceNGnRE => 0x04,
            MemoryType::DeviceGRE => 0x0c,
            MemoryType::NormalNonCacheable => 0x44,
            MemoryType::Normal => 0xff,
            MemoryType::NormalWriteThrough => 0xaa,
        }
    }
}

bitregs! {
    /// MAIR_ELx: Memory Attribute Indirection Register
    /// Purpose:
    ///     Eight attribute bytes indexed by AttrIndx of a descriptor.
    pub struct MAIR: u64 {
        pub attr0@[7:0],
        pub attr1@[15:8],
        pub attr2@[23:16],
        pub attr3@[31:24],
        pub attr4@[39:32],
        pub attr5@[47:40],
        pub attr6@[55:48],
        pub attr7@[63:56],
    }
}

impl MAIR {
    pub const fn with(self, ty: MemoryType) -> Self {
        let shift = 8 * ty.index() as u32;
        let bits = (self.bits() & !(0xff << shift)) | ((ty.attribute() as u64) << shift);
        self.with_bits(bits)
    }

    pub const fn attribute(&self, index: u8) -> u8 {
        (self.bits() >> (8 * (index as u32 & 7))) as u8
    }
}

/// Every [`MemoryType`] at its own index.
pub const MAIR_LOADER: MAIR = MAIR::new()
    .with(MemoryType::DeviceNGnRnE)
    .with(MemoryType::DeviceNGnRE)
    .with(MemoryType::DeviceGRE)
    .with(MemoryType::NormalNonCacheable)
    .with(MemoryType::Normal)
    .with(MemoryType::NormalWriteThrough);

bitregs! {
    /// SPSR_ELx / DAIF: saved program status
    /// Purpose:
    ///     Target mode and exception masks for an exception return. DAIF
    ///     reads use the same mask positions.
    pub struct SPSR: u64 {
        pub mode@[4:0] as Mode {
            El0t = 0b00000,
            El1t = 0b00100,
            El1h = 0b00101,
            El2t = 0b01000,
            El2h = 0b01001,
            Svc32 = 0b10011,
        },
        reserved@[5:5] [res0],
        // FIQ, IRQ, SError and debug masks
        pub f@[6:6],
        pub i@[7:7],
        pub a@[8:8],
        pub d@[9:9],
        reserved@[63:10] [ignore],
    }
}

impl SPSR {
    pub const fn masked(mode: Mode) -> Self {
        SPSR::new()
            .set(SPSR::mode, mode as u64)
            .set(SPSR::f, 1)
            .set(SPSR::i, 1)
            .set(SPSR::a, 1)
            .set(SPSR::d, 1)
    }
}

/// EL1h with every exception masked, used to drop from EL2 to EL1.
pub const SPSR_EL1H_MASKED: SPSR = SPSR::masked(Mode::El1h);

bitregs! {
    /// SCR_EL3: Secure Configuration Register
    /// Purpose:
    ///     Security state and execution state of the lower levels.
    pub struct SCR_EL3: u64 {
        pub ns@[0:0],
        pub irq@[1:1],
        pub fiq@[2:2],
        pub ea@[3:3],
        reserved@[5:4] [res1],
        reserved@[6:6] [res0],
        // SMC disable
        pub smd@[7:7],
        pub hce@[8:8],
        pub sif@[9:9],
        // Lower levels are AArch64
        pub rw@[10:10],
        pub st@[11:11],
        pub twi@[12:12],
        pub twe@[13:13],
        reserved@[63:14] [ignore],
    }
}

/// Non-secure AArch64 EL2 with SMC disabled.
pub const SCR_EL3_LOADER: SCR_EL3 = SCR_EL3::new()
    .set(SCR_EL3::ns, 1)
    .set(SCR_EL3::smd, 1)
    .set(SCR_EL3::rw, 1);

#[cfg(test)]
mod test {
    use super::*;

    // Values composed the way the assembly headers compose them.
    const fn tcr_t0sz(x: u64) -> u64 {
        64 - x
    }
    const fn tcr_t1sz(x: u64) -> u64 {
        (64 - x) << 16
    }
    const TCR_IRGN_WBWA: u64 = (1 << 8) | (1 << 24);
    const TCR_ORGN_WBWA: u64 = (1 << 10) | (1 << 26);
    const TCR_SHARED: u64 = (3 << 12) | (3 << 28);
    const TCR_TG1_4K: u64 = 2 << 30;
    const TCR_ASID16: u64 = 1 << 36;
    const TCR_EL2_RES1: u64 = (1 << 23) | (1 << 31);

    #[test]
    fn tcr_el1_loader_matches_header_composition() {
        let expected = tcr_t0sz(48)
            | tcr_t1sz(48)
            | TCR_IRGN_WBWA
            | TCR_ORGN_WBWA
            | TCR_SHARED
            | TCR_TG1_4K
            | TCR_ASID16;

        assert_eq!(TCR_EL1::LOADER.bits(), expected);
        assert_eq!(TCR_EL1::LOADER.bits(), 0x10_b510_3510);
    }

    #[test]
    fn tcr_el2_loader_keeps_res1() {
        let expected = TCR_EL2_RES1 | tcr_t0sz(48) | (1 << 8) | (1 << 10) | (3 << 12);

        assert_eq!(TCR_EL2::LOADER.bits(), expected);
        assert_eq!(TCR_EL2::from_bits(0).bits(), TCR_EL2_RES1);
    }

    #[test]
    fn walk_attributes_decode_by_name() {
        assert_eq!(
            TCR_EL1::LOADER.get_enum(TCR_EL1::irgn1),
            Some(Cacheability::WriteBackWriteAllocate)
        );
        assert_eq!(
            TCR_EL1::LOADER.get_enum(TCR_EL1::sh1),
            Some(Shareability::InnerShareable)
        );
        assert_eq!(
            TCR_EL2::LOADER.get_enum(TCR_EL2::orgn0),
            Some(Cacheability::WriteBackWriteAllocate)
        );

        // TCR_IRGN_WT and TCR_ORGN_NC for TTBR0 only
        let tcr = TCR_EL1::from_bits(0)
            .set_enum(TCR_EL1::irgn0, Cacheability::WriteThrough)
            .set_enum(TCR_EL1::orgn0, Cacheability::NonCacheable)
            .set_enum(TCR_EL1::sh0, Shareability::OuterShareable);
        assert_eq!(tcr.bits(), (2 << 8) | (2 << 12));

        let reserved = TCR_EL2::from_bits(1 << 12);
        assert_eq!(reserved.get_enum(TCR_EL2::sh0), None::<Shareability>);
    }

    #[test]
    fn pa_range_fills_output_size() {
        let tcr = TCR_EL2::LOADER.with_pa_range(PARange::Bits40).unwrap();
        assert_eq!(tcr.get(TCR_EL2::ps), 0b010);
        assert_eq!(tcr.bits() & !(0b111 << 16), TCR_EL2::LOADER.bits());

        let tcr = TCR_EL1::LOADER.with_pa_range(PARange::Bits48).unwrap();
        assert_eq!(tcr.bits() >> 32 & 0b111, 0b101);

        assert_eq!(
            TCR_EL2::LOADER.with_pa_range(PARange::Bits52),
            Err(TranslationConfigErr::UnsupportedPaRange(0b0110))
        );
    }

    #[test]
    fn input_bits_bounds() {
        let tcr = TCR_EL1::LOADER.with_input_bits(39).unwrap();
        assert_eq!(tcr.get(TCR_EL1::t0sz), 25);
        assert_eq!(tcr.get(TCR_EL1::t1sz), 25);

        assert!(TCR_EL2::LOADER.with_input_bits(MIN_INPUT_BITS).is_ok());
        assert_eq!(
            TCR_EL2::LOADER.with_input_bits(MAX_INPUT_BITS + 1),
            Err(TranslationConfigErr::InputSizeOutOfRange(49))
        );
        assert_eq!(
            TCR_EL1::LOADER.with_input_bits(24),
            Err(TranslationConfigErr::InputSizeOutOfRange(24))
        );
    }

    #[test]
    fn mmfr0_decodes_pa_range() {
        // Cortex-A72: 44-bit PA, 16-bit ASID, 4K and 64K granules
        let mmfr0 = ID_AA64MMFR0_EL1::from_bits(0x0000_0000_0000_1124);

        assert_eq!(mmfr0.get_enum(ID_AA64MMFR0_EL1::parange), Some(PARange::Bits44));
        assert_eq!(mmfr0.get(ID_AA64MMFR0_EL1::asidbits), 0b0010);
        assert_eq!(PARange::Bits44.bits(), 44);

        let reserved = ID_AA64MMFR0_EL1::from_bits(0xf);
        assert_eq!(reserved.get_enum(ID_AA64MMFR0_EL1::parange), None::<PARange>);
    }

    #[test]
    fn mair_loader_matches_header_composition() {
        const fn mair(attr: u64, mt: u64) -> u64 {
            attr << (mt * 8)
        }
        let expected = mair(0x00, 0)
            | mair(0x04, 1)
            | mair(0x0c, 2)
            | mair(0x44, 3)
            | mair(0xff, 4)
            | mair(0xaa, 5);

        assert_eq!(MAIR_LOADER.bits(), expected);
        assert_eq!(MAIR_LOADER.attribute(MemoryType::Normal.index()), 0xff);
        assert_eq!(MAIR_LOADER.get(MAIR::attr5), 0xaa);
    }

    #[test]
    fn psr_and_scr_presets() {
        assert_eq!(SPSR_EL1H_MASKED.bits(), 0x40 | 0x80 | 0x100 | 0x200 | 0x5);
        assert_eq!(SPSR_EL1H_MASKED.get_enum(SPSR::mode), Some(Mode::El1h));
        assert_eq!(SPSR::masked(Mode::Svc32).bits(), 0x3d3);
        assert_eq!(SCR_EL3_LOADER.bits(), 0x400 | 0x80 | 0x30 | 0x1);
    }
}
