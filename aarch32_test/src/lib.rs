//! Bare-metal test harness for ARMv7-A on QEMU `virt`.
//!
//! The image is loaded with `-kernel` and entered in Supervisor mode with
//! translation and caches off. [`entry!`] supplies `_start`, which masks
//! exceptions, sets up the stack, clears `.bss` and calls the test's main.
//! Output goes to the PL011 console and the verdict leaves through a
//! semihosting `SYS_EXIT`, so the runner sees it as the QEMU exit status.
#![cfg(all(target_arch = "arm", target_os = "none"))]
#![no_std]

use core::arch::asm;
use core::fmt;
use core::fmt::Write;
use core::sync::atomic::AtomicUsize;
use core::sync::atomic::Ordering;

pub use log::LevelFilter;

mod pl011 {
    use core::fmt;
    use core::ptr::read_volatile;
    use core::ptr::write_volatile;

    // UART0 of QEMU virt
    pub(crate) const QEMU_VIRT_UART0: usize = 0x0900_0000;

    const DR: usize = 0x00;
    const FR: usize = 0x18;
    const FR_TXFF: u32 = 1 << 5;

    pub(crate) struct Pl011 {
        base: usize,
    }

    impl Pl011 {
        /// # Safety
        /// `base` must be the MMIO base of a PL011 that is ready to
        /// transmit, mapped as device memory whenever translation is on.
        pub(crate) const unsafe fn new(base: usize) -> Self {
            Self { base }
        }

        fn write_byte(&mut self, byte: u8) {
            let flags = (self.base + FR) as *const u32;
            let data = (self.base + DR) as *mut u32;
            while unsafe { read_volatile(flags) } & FR_TXFF != 0 {}
            unsafe { write_volatile(data, byte as u32) };
        }
    }

    impl fmt::Write for Pl011 {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for byte in s.bytes() {
                if byte == b'\n' {
                    self.write_byte(b'\r');
                }
                self.write_byte(byte);
            }
            Ok(())
        }
    }
}

/// Defines `_start` for an `extern "C" fn() -> !` test entry.
#[macro_export]
macro_rules! entry {
    ($main:path) => {
        const _: extern "C" fn() -> ! = $main;

        core::arch::global_asm!(
            ".section .text.start, \"ax\"",
            ".global _start",
            "_start:",
            "    cpsid aif",
            "    ldr sp, =__stack_top",
            "    ldr r0, =__bss_start",
            "    ldr r1, =__bss_end",
            "    mov r2, #0",
            "1:  cmp r0, r1",
            "    strlo r2, [r0], #4",
            "    blo 1b",
            "    bl {main}",
            "2:  b 2b",
            ".ltorg",
            main = sym $main,
        );
    };
}

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;
static RECORDS: AtomicUsize = AtomicUsize::new(0);

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        RECORDS.fetch_add(1, Ordering::Relaxed);
        println!("[{:<5}] {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

/// Routes `log` output to the console. Later calls only change the level.
pub fn init_logger(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// Number of records printed since boot.
pub fn log_records() -> usize {
    RECORDS.load(Ordering::Relaxed)
}

/// Named test case run by [`run_cases`].
pub type Case = (&'static str, fn() -> Result<(), &'static str>);

/// Runs every case in order, reports each one, then exits with success only
/// if all of them passed.
pub fn run_cases(suite: &str, cases: &[Case]) -> ! {
    let mut failed = 0usize;
    println!("{}: running {} cases", suite, cases.len());
    for (name, case) in cases {
        match case() {
            Ok(()) => println!("  {} ... ok", name),
            Err(err) => {
                println!("  {} ... FAIL: {}", name, err);
                failed += 1;
            }
        }
    }

    if failed == 0 {
        println!("{} test: PASS", suite);
        exit_success()
    } else {
        println!("{} test: FAIL ({} of {})", suite, failed, cases.len());
        exit_failure()
    }
}

pub fn exit_success() -> ! {
    exit_with_code(0)
}

pub fn exit_failure() -> ! {
    exit_with_code(1)
}

/// Semihosting `SYS_EXIT`. The 32-bit call only carries a reason, so any
/// non-zero `code` is reported as a run-time error.
pub extern "C" fn exit_with_code(code: u32) -> ! {
    const SYS_EXIT: u32 = 0x18;
    const ADP_APP_EXIT: u32 = 0x20026;
    const ADP_RUNTIME_ERROR: u32 = 0x20023;

    let reason = if code == 0 {
        ADP_APP_EXIT
    } else {
        ADP_RUNTIME_ERROR
    };

    unsafe {
        asm!(
            "svc #0x123456",
            in("r0") SYS_EXIT,
            in("r1") reason,
            options(noreturn)
        );
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    let mut uart = unsafe { pl011::Pl011::new(pl011::QEMU_VIRT_UART0) };
    let _ = uart.write_fmt(args);
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::_print(core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n")
    };
    ($($arg:tt)*) => {{
        $crate::_print(core::format_args!($($arg)*));
        $crate::print!("\n");
    }};
}

#[panic_handler]
fn panic_handler(info: &core::panic::PanicInfo<'_>) -> ! {
    println!("PANIC: {}", info);
    exit_failure()
}
