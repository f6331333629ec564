#![no_std]
#![no_main]

#[cfg(not(target_arch = "arm"))]
compile_error!("This test is intended to run on 32-bit ARM targets only");

use arch_hal::CSSELR;
use arch_hal::CacheHierarchy;
use arch_hal::CacheLevelDescriptor;
use arch_hal::MaintenanceOperation;
use arch_hal::arch::Case;
use arch_hal::arch::LevelFilter;
use arch_hal::arch::cache;
use arch_hal::arch::cache::Caches;
use arch_hal::arch::cpu;
use arch_hal::arch::init_logger;
use arch_hal::arch::log_records;
use arch_hal::arch::mmu;
use arch_hal::arch::mmu::Sctlr;
use arch_hal::arch::println;
use arch_hal::arch::run_cases;
use arch_hal::registers::L1Section;
use arch_hal::registers::ProcessorMode;
use arch_hal::registers::CPSR;

arch_hal::arch::entry!(arm_main);

extern "C" fn arm_main() -> ! {
    println!("Starting cache_sweep_arm test in {:?}", cpu::cpsr());
    init_logger(LevelFilter::Debug);

    run_cases("cache_sweep_arm", CASES)
}

const CASES: &[Case] = &[
    ("svc_with_mmu_off_at_entry", svc_with_mmu_off_at_entry),
    ("geometry_is_sane", geometry_is_sane),
    ("csselr_reset_after_sweep", csselr_reset_after_sweep),
    ("sweep_logs_at_hal_boundary", sweep_logs_at_hal_boundary),
    ("hyp_registers_need_hyp_mode", hyp_registers_need_hyp_mode),
    ("mmu_round_trip_keeps_data", mmu_round_trip_keeps_data),
];

const RAM_BASE_MB: u32 = 0x400;
const RAM_SIZE_MB: u32 = 128;

#[repr(C, align(16384))]
struct L1Table([u32; 4096]);

static mut TABLE: L1Table = L1Table([0; 4096]);

// devices below RAM, RAM itself write-back, everything above unmapped
fn build_identity_table() -> u32 {
    let table = unsafe { &raw mut TABLE };
    for mb in 0..4096u32 {
        let entry = if mb < RAM_BASE_MB {
            L1Section::device(mb).bits()
        } else if mb < RAM_BASE_MB + RAM_SIZE_MB {
            L1Section::normal(mb).bits()
        } else {
            0
        };
        unsafe { (*table).0[mb as usize] = entry };
    }
    table as u32
}

// -kernel hands over in Supervisor mode, exceptions masked, MMU off
fn svc_with_mmu_off_at_entry() -> Result<(), &'static str> {
    if cpu::cpsr().get_enum(CPSR::mode) != Some(ProcessorMode::Supervisor) {
        return Err("not in Supervisor mode");
    }
    if !cpu::irqs_masked() {
        return Err("IRQ/FIQ not masked");
    }
    if mmu::is_enabled(&unsafe { Sctlr::new() }) {
        return Err("MMU already on");
    }
    Ok(())
}

fn geometry_is_sane() -> Result<(), &'static str> {
    let mut caches = unsafe { Caches::new() };
    let clidr = caches.clidr();
    println!("level of coherency: {}", clidr.level_of_coherency());
    if clidr.level_of_coherency() == 0 {
        return Err("no cache levels reported");
    }

    for level in 0..clidr.level_of_coherency() {
        let kind = clidr.cache_type(level);
        if !kind.holds_data() {
            continue;
        }
        caches.select(CSSELR::data(level));
        caches.isb();
        let desc = CacheLevelDescriptor::decode(level, kind, caches.ccsidr());
        println!(
            "L{}: {:?}, {} ways x {} sets, {} byte lines",
            level + 1,
            kind,
            desc.ways(),
            desc.sets(),
            desc.line_size()
        );
        if desc.line_size() < 16 {
            return Err("line size below architectural minimum");
        }
    }
    caches.select(CSSELR::new());
    Ok(())
}

fn csselr_reset_after_sweep() -> Result<(), &'static str> {
    let mut caches = unsafe { Caches::new() };
    caches.select(CSSELR::data(1));

    unsafe { cache::sweep(MaintenanceOperation::Clean) };

    if cache::selected_cache().bits() != 0 {
        return Err("CSSELR not reset after sweep");
    }
    Ok(())
}

fn sweep_logs_at_hal_boundary() -> Result<(), &'static str> {
    let before = log_records();
    unsafe { cache::sweep(MaintenanceOperation::Invalidate) };

    // one record from the HAL entry point, one from the sweep engine
    if log_records() - before != 2 {
        return Err("expected two debug records per sweep");
    }
    Ok(())
}

fn hyp_registers_need_hyp_mode() -> Result<(), &'static str> {
    if cpu::is_hyp_mode() {
        return Err("unexpected Hyp mode");
    }
    if cpu::hyp_translation_base().is_some() {
        return Err("HTTBR read outside Hyp mode");
    }
    Ok(())
}

// QEMU does not model cache contents, so this checks the SCTLR transitions
// and that memory written with translation on is still there once it is off.
fn mmu_round_trip_keeps_data() -> Result<(), &'static str> {
    const TAG: u32 = 0x5a5a_0000;
    let sctlr = unsafe { Sctlr::new() };

    unsafe { cache::sweep(MaintenanceOperation::Invalidate) };
    let table = build_identity_table();
    unsafe { mmu::set_translation_table(table) };

    mmu::enable(&sctlr);
    if !mmu::is_enabled(&sctlr) {
        return Err("MMU did not turn on");
    }

    let mut pattern = [0u32; 256];
    for (i, word) in pattern.iter_mut().enumerate() {
        unsafe { core::ptr::write_volatile(word, TAG | i as u32) };
    }
    println!("translation on, table at {:#x}", table);

    unsafe { cache::sweep(MaintenanceOperation::CleanAndInvalidate) };
    mmu::disable(&sctlr);
    if mmu::is_enabled(&sctlr) {
        return Err("MMU did not turn off");
    }

    for (i, word) in pattern.iter().enumerate() {
        if unsafe { core::ptr::read_volatile(word) } != TAG | i as u32 {
            return Err("data lost across the MMU round trip");
        }
    }
    Ok(())
}
