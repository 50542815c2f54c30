//! # Page Faults
//!
//! Kernel-mode faults are kernel bugs and panic. User-mode faults destroy the
//! faulting environment. There is no fixup or copy-on-write path yet.

use crate::dispatch::Disposition;
use crate::env::{EnvId, Environments};
use crate::trap_frame::TrapFrame;
use bitfield_struct::bitfield;
use core::fmt;
use kernel_memory_addresses::VirtualAddress;
use log::error;

/// Error code the CPU pushes for a page fault.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct PageFaultError {
    /// 0: the page was not present. 1: protection violation.
    pub present: bool,

    /// 0: read. 1: write.
    pub write: bool,

    /// 0: supervisor mode. 1: user mode.
    pub user: bool,

    /// A reserved bit was set in a paging entry.
    pub reserved_bit: bool,

    #[bits(28)]
    __: u32,
}

impl fmt::Display for PageFaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}]",
            if self.user() { "user" } else { "kernel" },
            if self.write() { "write" } else { "read" },
            if self.present() { "protection" } else { "not-present" },
        )
    }
}

/// Handle a page fault at `fault_address`.
///
/// # Panics
/// If the fault happened in kernel mode.
pub fn handle_page_fault<E: Environments>(
    envs: &mut E,
    frame: &TrapFrame,
    fault_address: VirtualAddress,
) -> Disposition {
    let current = envs.current();
    let env = current.unwrap_or(EnvId(0));

    assert!(
        frame.from_user(),
        "[{env}] kernel fault va {:08x} ip {:08x}",
        fault_address.as_u32(),
        frame.eip
    );

    let Some(env) = current else {
        panic!("user page fault without a current environment");
    };
    error!(
        "[{env}] user fault va {:08x} ip {:08x}",
        fault_address.as_u32(),
        frame.eip
    );
    error!("{}", frame.dump(fault_address));
    envs.destroy(env);
    Disposition::Destroyed { env }
}
