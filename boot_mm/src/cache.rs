#![allow(non_camel_case_types)]
//! Whole-hierarchy data cache maintenance by set/way.
//!
//! The walk only trusts geometry reported by the hardware: CLIDR gives the
//! level of coherency and the type of every level, CCSIDR (selected through
//! CSSELR) gives line size, associativity and set count. Every line of every
//! data or unified level below the level of coherency gets exactly one
//! maintenance instruction.

use bitregs::bitregs;
use core::fmt;
use log::debug;
use log::trace;

/// Set/way maintenance requested from a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaintenanceOperation {
    /// Discard lines without writing them back (`DC ISW`).
    Invalidate,
    /// Write dirty lines back and keep them valid (`DC CSW`).
    Clean,
    /// Write dirty lines back, then discard them (`DC CISW`).
    CleanAndInvalidate,
}

impl fmt::Display for MaintenanceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MaintenanceOperation::Invalidate => "invalidate",
            MaintenanceOperation::Clean => "clean",
            MaintenanceOperation::CleanAndInvalidate => "clean+invalidate",
        };
        f.write_str(name)
    }
}

/// Compile-time selector for a set/way instruction.
///
/// Implemented by the uninhabited markers in [`op`]; a hardware
/// [`CacheHierarchy::maintain`] matches on `Op::KIND`, which folds to a single
/// instruction per instantiation.
pub trait SetWayOp {
    const KIND: MaintenanceOperation;
}

pub mod op {
    use super::MaintenanceOperation;
    use super::SetWayOp;

    pub enum Invalidate {}
    pub enum Clean {}
    pub enum CleanAndInvalidate {}

    impl SetWayOp for Invalidate {
        const KIND: MaintenanceOperation = MaintenanceOperation::Invalidate;
    }

    impl SetWayOp for Clean {
        const KIND: MaintenanceOperation = MaintenanceOperation::Clean;
    }

    impl SetWayOp for CleanAndInvalidate {
        const KIND: MaintenanceOperation = MaintenanceOperation::CleanAndInvalidate;
    }
}

bitregs! {
    /// CLIDR: Cache Level ID Register
    /// Purpose:
    ///     Identifies the type of cache at each level and the levels of
    ///     coherency and unification. The 32-bit variant is zero extended.
    pub struct CLIDR: u64 {
        // Cache type per level, see `CacheType`.
        pub ctype1@[2:0],
        pub ctype2@[5:3],
        pub ctype3@[8:6],
        pub ctype4@[11:9],
        pub ctype5@[14:12],
        pub ctype6@[17:15],
        pub ctype7@[20:18],

        // Level of Unification Inner Shareable
        pub louis@[23:21],

        // Level of Coherence: number of levels a set/way sweep has to visit.
        pub loc@[26:24],

        // Level of Unification Uniprocessor
        pub louu@[29:27],

        // Inner cache boundary
        pub icb@[32:30],

        // Ttype<n> (FEAT_MTE2) and upper bits
        reserved@[63:33] [ignore],
    }
}

impl CLIDR {
    /// Type of the cache at `level` (0 based, so `level == 0` is L1).
    pub fn cache_type(&self, level: u8) -> CacheType {
        if level >= 7 {
            return CacheType::None;
        }
        CacheType::from_code(((self.bits() >> (3 * u32::from(level))) & 0b111) as u8)
    }

    /// Level of coherency as reported by hardware (0..=7).
    pub const fn level_of_coherency(&self) -> u8 {
        self.get(CLIDR::loc) as u8
    }
}

bitregs! {
    /// CCSIDR: Current Cache Size ID Register
    /// Purpose:
    ///     Geometry of the cache currently selected by CSSELR.
    ///     Layout without FEAT_CCIDX.
    pub struct CCSIDR: u64 {
        // log2(words per line) - 2, i.e. log2(bytes per line) - 4
        pub line_size@[2:0],

        // associativity - 1
        pub associativity@[12:3],

        // number of sets - 1
        pub num_sets@[27:13],

        // WT/WB/RA/WA on ARMv7, UNKNOWN on ARMv8
        reserved@[63:28] [ignore],
    }
}

bitregs! {
    /// CSSELR: Cache Size Selection Register
    /// Purpose:
    ///     Selects the cache whose geometry CCSIDR reports.
    pub struct CSSELR: u64 {
        // 0 = data or unified cache, 1 = instruction cache
        pub in_d@[0:0],

        // cache level - 1
        pub level@[3:1],

        reserved@[63:4] [res0],
    }
}

impl CSSELR {
    /// Selection of the data or unified cache at `level` (0 based).
    pub const fn data(level: u8) -> Self {
        CSSELR::new().set(CSSELR::level, level as u64)
    }
}

/// Decoded `Ctype<n>` field of CLIDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheType {
    None,
    Instruction,
    Data,
    /// Separate instruction and data caches.
    Separate,
    Unified,
    /// Encodings 0b101..=0b111.
    Reserved(u8),
}

impl CacheType {
    pub const fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0b000 => CacheType::None,
            0b001 => CacheType::Instruction,
            0b010 => CacheType::Data,
            0b011 => CacheType::Separate,
            0b100 => CacheType::Unified,
            other => CacheType::Reserved(other),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            CacheType::None => 0b000,
            CacheType::Instruction => 0b001,
            CacheType::Data => 0b010,
            CacheType::Separate => 0b011,
            CacheType::Unified => 0b100,
            CacheType::Reserved(code) => code & 0b111,
        }
    }

    /// Whether a set/way sweep visits this level. Every encoding from
    /// `Data` upward does, reserved ones included.
    pub const fn holds_data(self) -> bool {
        self.code() >= 0b010
    }
}

/// Geometry of one data/unified cache level, decoded from CCSIDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLevelDescriptor {
    /// 0 based level index.
    pub level: u8,
    pub kind: CacheType,
    /// log2 of the line size in bytes.
    pub line_shift: u32,
    pub max_way: u32,
    pub max_set: u32,
}

impl CacheLevelDescriptor {
    pub const fn decode(level: u8, kind: CacheType, ccsidr: CCSIDR) -> Self {
        Self {
            level,
            kind,
            line_shift: ccsidr.get(CCSIDR::line_size) as u32 + 4,
            max_way: ccsidr.get(CCSIDR::associativity) as u32,
            max_set: ccsidr.get(CCSIDR::num_sets) as u32,
        }
    }

    pub const fn ways(&self) -> u32 {
        self.max_way + 1
    }

    pub const fn sets(&self) -> u32 {
        self.max_set + 1
    }

    pub const fn line_size(&self) -> usize {
        1 << self.line_shift
    }

    /// Bit position of the way index in a set/way operand.
    ///
    /// Ways occupy the top bits of the 32-bit operand. A direct-mapped cache
    /// yields 32, which only ever shifts way 0.
    pub const fn way_shift(&self) -> u32 {
        self.max_way.leading_zeros()
    }

    /// Set/way operand for `DC xSW` / `MCR c7, c6|c10|c14, 2`.
    pub const fn operand(&self, way: u32, set: u32) -> u64 {
        ((self.level as u64) << 1)
            | ((way as u64) << self.way_shift())
            | ((set as u64) << self.line_shift)
    }
}

/// Hardware effects a sweep needs.
///
/// Register accessors and barriers of one core. Implementations for real
/// hardware are only constructible through `unsafe` constructors.
pub trait CacheHierarchy {
    fn clidr(&self) -> CLIDR;
    fn select(&mut self, csselr: CSSELR);
    fn ccsidr(&self) -> CCSIDR;
    fn maintain<Op: SetWayOp>(&mut self, operand: u64);
    fn dmb(&mut self);
    fn dsb(&mut self);
    fn isb(&mut self);
}

/// Applies `op` to every line of every data/unified level up to the level of
/// coherency.
pub fn sweep<H: CacheHierarchy>(hw: &mut H, op: MaintenanceOperation) {
    match op {
        MaintenanceOperation::Invalidate => sweep_with::<op::Invalidate, H>(hw),
        MaintenanceOperation::Clean => sweep_with::<op::Clean, H>(hw),
        MaintenanceOperation::CleanAndInvalidate => {
            sweep_with::<op::CleanAndInvalidate, H>(hw)
        }
    }
}

/// [`sweep`] with the operation fixed at compile time.
pub fn sweep_with<Op: SetWayOp, H: CacheHierarchy>(hw: &mut H) {
    hw.dmb();

    let clidr = hw.clidr();
    let loc = clidr.level_of_coherency();
    debug!("cache: {} by set/way, level of coherency {}", Op::KIND, loc);

    for level in 0..loc {
        let kind = clidr.cache_type(level);
        if !kind.holds_data() {
            trace!("cache: L{} {:?} skipped", level + 1, kind);
            continue;
        }

        hw.select(CSSELR::data(level));
        hw.isb();

        let desc = CacheLevelDescriptor::decode(level, kind, hw.ccsidr());
        trace!(
            "cache: L{} {:?} {} ways x {} sets, {} byte lines",
            level + 1,
            kind,
            desc.ways(),
            desc.sets(),
            desc.line_size()
        );

        for way in (0..=desc.max_way).rev() {
            for set in (0..=desc.max_set).rev() {
                hw.maintain::<Op>(desc.operand(way, set));
            }
        }
    }

    hw.select(CSSELR::new());
    hw.dsb();
    hw.isb();
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::Event;
    use crate::mock::MockHierarchy;

    const L1_4WAY_128SET: CCSIDR = CCSIDR::new()
        .set(CCSIDR::line_size, 2)
        .set(CCSIDR::associativity, 3)
        .set(CCSIDR::num_sets, 127);

    #[test]
    fn cache_type_decodes_every_code() {
        assert_eq!(CacheType::from_code(0), CacheType::None);
        assert_eq!(CacheType::from_code(1), CacheType::Instruction);
        assert_eq!(CacheType::from_code(2), CacheType::Data);
        assert_eq!(CacheType::from_code(3), CacheType::Separate);
        assert_eq!(CacheType::from_code(4), CacheType::Unified);
        for code in 5..=7 {
            assert_eq!(CacheType::from_code(code), CacheType::Reserved(code));
            assert!(CacheType::from_code(code).holds_data());
        }
        assert!(!CacheType::None.holds_data());
        assert!(!CacheType::Instruction.holds_data());
        assert!(CacheType::Separate.holds_data());
    }

    #[test]
    fn clidr_fields() {
        // Cortex-A53 like: L1 separate, L2 unified, LoC 2, LoUIS 1
        let clidr = CLIDR::from_bits(0x0A20_0023);

        assert_eq!(clidr.cache_type(0), CacheType::Separate);
        assert_eq!(clidr.cache_type(1), CacheType::Unified);
        assert_eq!(clidr.cache_type(2), CacheType::None);
        assert_eq!(clidr.cache_type(7), CacheType::None);
        assert_eq!(clidr.level_of_coherency(), 2);
        assert_eq!(clidr.get(CLIDR::louis), 1);
        assert_eq!(clidr.get(CLIDR::louu), 1);
    }

    #[test]
    fn descriptor_decodes_geometry() {
        let desc = CacheLevelDescriptor::decode(0, CacheType::Data, L1_4WAY_128SET);

        assert_eq!(desc.line_shift, 6);
        assert_eq!(desc.line_size(), 64);
        assert_eq!(desc.ways(), 4);
        assert_eq!(desc.sets(), 128);
        assert_eq!(desc.way_shift(), 30);
        assert_eq!(desc.operand(3, 127), (3 << 30) | (127 << 6));
    }

    #[test]
    fn descriptor_operand_carries_level() {
        // 16 ways, 1024 sets, 64 byte lines at L2
        let ccsidr = CCSIDR::new()
            .set(CCSIDR::line_size, 2)
            .set(CCSIDR::associativity, 15)
            .set(CCSIDR::num_sets, 1023);
        let desc = CacheLevelDescriptor::decode(1, CacheType::Unified, ccsidr);

        assert_eq!(desc.way_shift(), 28);
        assert_eq!(desc.operand(0, 0), 0b10);
        assert_eq!(desc.operand(15, 1023), (15 << 28) | (1023 << 6) | 0b10);
    }

    #[test]
    fn direct_mapped_cache_never_sets_way_bits() {
        let ccsidr = CCSIDR::new().set(CCSIDR::num_sets, 3);
        let desc = CacheLevelDescriptor::decode(0, CacheType::Data, ccsidr);

        assert_eq!(desc.way_shift(), 32);
        assert_eq!(desc.operand(0, 3), 3 << 4);
    }

    #[test]
    fn csselr_selects_data_side() {
        assert_eq!(CSSELR::data(0).bits(), 0);
        assert_eq!(CSSELR::data(1).bits(), 0b0010);
        assert_eq!(CSSELR::data(6).bits(), 0b1100);
        assert_eq!(CSSELR::data(1).get(CSSELR::in_d), 0);
    }

    #[test]
    fn sweep_covers_every_line_once() {
        let mut hw: MockHierarchy<1024> = MockHierarchy::new()
            .with_level(0, CacheType::Unified, L1_4WAY_128SET)
            .with_loc(1);

        sweep(&mut hw, MaintenanceOperation::CleanAndInvalidate);
        assert!(!hw.overflowed());

        let mut seen = [[false; 128]; 4];
        let mut count = 0;
        for (kind, operand) in hw.maintenance() {
            assert_eq!(kind, MaintenanceOperation::CleanAndInvalidate);
            assert_eq!(operand & 0b1110, 0, "level field must be L1");
            let way = (operand >> 30) as usize;
            let set = ((operand >> 6) & 0x7f) as usize;
            assert_eq!(operand, ((way as u64) << 30) | ((set as u64) << 6));
            assert!(!seen[way][set], "way {} set {} issued twice", way, set);
            seen[way][set] = true;
            count += 1;
        }

        assert_eq!(count, 512);
        assert!(seen.iter().flatten().all(|line| *line));
    }

    #[test]
    fn sweep_walks_ways_and_sets_downward() {
        let mut hw: MockHierarchy<1024> = MockHierarchy::new()
            .with_level(0, CacheType::Data, L1_4WAY_128SET)
            .with_loc(1);

        sweep(&mut hw, MaintenanceOperation::Clean);

        let mut ops = hw.maintenance().map(|(_, operand)| operand);
        assert_eq!(ops.next(), Some((3 << 30) | (127 << 6)));
        assert_eq!(ops.next(), Some((3 << 30) | (126 << 6)));
        assert_eq!(ops.last(), Some(0));
    }

    #[test]
    fn sweep_frames_levels_with_barriers() {
        let mut hw: MockHierarchy<1024> = MockHierarchy::new()
            .with_level(0, CacheType::Data, L1_4WAY_128SET)
            .with_loc(1);

        sweep(&mut hw, MaintenanceOperation::Invalidate);

        let events = hw.events();
        assert_eq!(&events[..3], &[Event::Dmb, Event::Select(0), Event::Isb]);
        assert_eq!(
            &events[events.len() - 3..],
            &[Event::Select(0), Event::Dsb, Event::Isb]
        );
    }

    #[test]
    fn sweep_with_zero_levels_only_issues_barriers() {
        let mut hw: MockHierarchy<16> = MockHierarchy::new()
            .with_level(0, CacheType::Unified, L1_4WAY_128SET)
            .with_loc(0);

        sweep(&mut hw, MaintenanceOperation::CleanAndInvalidate);

        assert_eq!(
            hw.events(),
            &[Event::Dmb, Event::Select(0), Event::Dsb, Event::Isb]
        );
        assert_eq!(hw.maintenance().count(), 0);
    }

    #[test]
    fn sweep_visits_only_data_levels_below_loc() {
        let tiny = CCSIDR::new().set(CCSIDR::associativity, 1).set(CCSIDR::num_sets, 1);
        let kinds = [
            CacheType::Separate,
            CacheType::Instruction,
            CacheType::Unified,
            CacheType::None,
            CacheType::Data,
            CacheType::Reserved(5),
            CacheType::Unified,
        ];

        for loc in 0..=7u8 {
            let mut hw: MockHierarchy<128> = MockHierarchy::new();
            for (level, kind) in kinds.iter().enumerate() {
                hw = hw.with_level(level as u8, *kind, tiny);
            }
            hw = hw.with_loc(loc);

            sweep(&mut hw, MaintenanceOperation::Clean);
            assert!(!hw.overflowed());

            let visited: heapless::Vec<u64, 8> = hw.selections().collect();
            let expected: heapless::Vec<u64, 8> = kinds
                .iter()
                .enumerate()
                .take(loc as usize)
                .filter(|(_, kind)| kind.holds_data())
                .map(|(level, _)| (level as u64) << 1)
                .collect();

            // Last selection is the reset to level 0.
            assert_eq!(visited.last(), Some(&0));
            assert_eq!(&visited[..visited.len() - 1], &expected[..], "loc {}", loc);
            assert_eq!(hw.maintenance().count(), expected.len() * 4, "loc {}", loc);
            for (_, operand) in hw.maintenance() {
                assert!(expected.contains(&(operand & 0b1110)));
            }
        }
    }

    #[test]
    fn sweep_leaves_level_zero_selected() {
        let tiny = CCSIDR::new().set(CCSIDR::num_sets, 7);
        let mut hw: MockHierarchy<64> = MockHierarchy::new()
            .with_level(0, CacheType::Separate, tiny)
            .with_level(1, CacheType::Unified, tiny)
            .with_loc(2);

        sweep(&mut hw, MaintenanceOperation::CleanAndInvalidate);

        assert_eq!(hw.selected().bits(), 0);
        assert_eq!(hw.selections().count(), 3);
    }
}
