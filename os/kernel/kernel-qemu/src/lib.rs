//! # QEMU Debug Console
//!
//! Kernel diagnostics go to QEMU's debug console, an I/O port that the
//! emulator forwards to the host (`-debugcon stdio`).
//!
//! ```text
//! log::info!  ─► QemuLogger ─┐
//!                            ├─► QemuSink (fmt::Write) ─► out 0x402 ─► host
//! qemu_trace! ───────────────┘
//! ```
//!
//! * [`QemuLogger`] is the `log` backend. Records are written as
//!   `[LEVEL] target: message` lines.
//! * [`qemu_trace!`] writes formatted text directly, bypassing `log`. It works
//!   before the logger is installed.
//!
//! Without the `enabled` feature both become no-ops. The port is only touched
//! on 32-bit x86; on other targets (host-side tests) the sink swallows output.
//!
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::LevelFilter;
//!
//! QemuLogger::new(LevelFilter::Debug).init().expect("logger installed once");
//! log::info!("trap gates loaded");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::{QemuLogger, write_record};

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// QEMU's debug console port.
    pub const QEMU_DEBUG_PORT: u16 = 0x402;

    /// Write a single byte to the debug console.
    #[allow(clippy::inline_always)]
    #[inline(always)]
    pub fn dbg_putc(c: u8) {
        // SAFETY: writing the debug port has no effect besides host output.
        unsafe { outb(QEMU_DEBUG_PORT, c) }
    }

    #[cfg(target_arch = "x86")]
    #[allow(clippy::inline_always)]
    #[inline(always)]
    unsafe fn outb(port: u16, val: u8) {
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") port,
                in("al") val,
                options(nomem, nostack, preserves_flags)
            );
        }
    }

    #[cfg(not(target_arch = "x86"))]
    #[allow(clippy::inline_always)]
    #[inline(always)]
    const unsafe fn outb(_port: u16, _val: u8) {}

    /// `fmt::Write` onto the debug console, unbuffered.
    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            s.bytes().for_each(dbg_putc);
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub fn qemu_write(args: fmt::Arguments) {
        // Best effort; the sink itself never fails.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// Discards everything.
    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, _: &str) -> fmt::Result {
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub const fn qemu_write(_: fmt::Arguments) {}
}

/// Write `format!`-style text straight to the debug console.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
