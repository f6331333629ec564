//! Bare-metal test harness for QEMU `virt`.
//!
//! Output goes to the PL011 console and the verdict leaves through an
//! AArch64 semihosting exit, so the runner sees the result as the QEMU exit
//! status. `log` records from the code under test go to the same console.
//! Nothing here allocates.
#![cfg(all(target_arch = "aarch64", any(target_os = "uefi", target_os = "none")))]
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
        /// `base` must be the MMIO base of a PL011 that firmware already
        /// configured for transmission.
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

pub extern "C" fn exit_with_code(code: u32) -> ! {
    const SYS_EXIT_EXTENDED: u64 = 0x20;
    // ADP_Stopped_ApplicationExit
    const ADP_APP_EXIT: u32 = 0x20026;

    #[repr(C)]
    struct ExitArgs {
        reason: u32,
        value: u32,
    }

    let args = ExitArgs {
        reason: ADP_APP_EXIT,
        value: code,
    };

    unsafe {
        asm!(
            "hlt #0xf000",
            in("x0") SYS_EXIT_EXTENDED,
            in("x1") &args as *const ExitArgs as usize,
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
