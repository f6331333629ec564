#![no_std]
#![no_main]

#[cfg(not(target_arch = "aarch64"))]
compile_error!("This test is intended to run on aarch64 targets only");

use arch_hal::CSSELR;
use arch_hal::CacheHierarchy;
use arch_hal::CacheLevelDescriptor;
use arch_hal::MaintenanceOperation;
use arch_hal::arch::cache;
use arch_hal::arch::cache::Caches;
use arch_hal::arch::Case;
use arch_hal::arch::LevelFilter;
use arch_hal::arch::cpu;
use arch_hal::arch::init_logger;
use arch_hal::arch::log_records;
use arch_hal::arch::mmu;
use arch_hal::arch::mmu::SctlrEl1;
use arch_hal::arch::mmu::SctlrEl2;
use arch_hal::arch::println;
use arch_hal::arch::run_cases;
use arch_hal::registers::TCR_EL2;

#[unsafe(no_mangle)]
extern "C" fn efi_main() -> ! {
    println!("Starting cache_sweep test at EL{}", cpu::get_current_el());
    cpu::mask_exceptions();
    init_logger(LevelFilter::Debug);

    run_cases("cache_sweep", CASES)
}

const CASES: &[Case] = &[
    ("mmu_on_at_entry", mmu_on_at_entry),
    ("geometry_is_sane", geometry_is_sane),
    ("clean_keeps_data", clean_keeps_data),
    ("csselr_reset_after_sweep", csselr_reset_after_sweep),
    ("sweep_logs_at_hal_boundary", sweep_logs_at_hal_boundary),
    ("loader_tcr_for_this_core", loader_tcr_for_this_core),
];

// firmware hands over with translation and caches on
fn mmu_on_at_entry() -> Result<(), &'static str> {
    let enabled = match cpu::get_current_el() {
        2 => mmu::is_enabled(&unsafe { SctlrEl2::new() }),
        1 => mmu::is_enabled(&unsafe { SctlrEl1::new() }),
        _ => return Err("unexpected exception level"),
    };
    if !enabled {
        return Err("MMU is off on entry");
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

fn clean_keeps_data() -> Result<(), &'static str> {
    const TAG: u64 = 0x5a5a_0000_0000_0000;
    let mut pattern = [0u64; 512];
    for (i, word) in pattern.iter_mut().enumerate() {
        unsafe { core::ptr::write_volatile(word, TAG | i as u64) };
    }

    unsafe { cache::sweep(MaintenanceOperation::Clean) };
    unsafe { cache::sweep(MaintenanceOperation::CleanAndInvalidate) };

    for (i, word) in pattern.iter().enumerate() {
        if unsafe { core::ptr::read_volatile(word) } != TAG | i as u64 {
            return Err("data lost across clean+invalidate");
        }
    }
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
    unsafe { cache::sweep(MaintenanceOperation::Clean) };

    // one record from the HAL entry point, one from the sweep engine
    if log_records() - before != 2 {
        return Err("expected two debug records per sweep");
    }
    Ok(())
}

fn loader_tcr_for_this_core() -> Result<(), &'static str> {
    let pa_range = cpu::pa_range().map_err(|_| "reserved PARange encoding")?;
    match TCR_EL2::LOADER.with_pa_range(pa_range) {
        Ok(tcr) => println!("PA range: {} bits, TCR_EL2 {:?}", pa_range.bits(), tcr),
        Err(err) => println!("PA range: {} bits, {}", pa_range.bits(), err),
    }
    Ok(())
}
