//! # Two-Level Page Tables
//!
//! A 32-bit virtual address is split into three fields:
//!
//! ```text
//! | 31‒22     | 21‒12     | 11‒0   |
//! | directory | table     | offset |
//! ```
//!
//! The directory index selects one of 1024 [`PdEntry`]s in the
//! [`PageDirectory`]; a present PDE names the frame of a [`PageTable`], whose
//! 1024 [`PtEntry`]s each map one 4 KiB page.

pub mod pd;
pub mod pt;

use kernel_memory_addresses::VirtualAddress;
pub use pd::{PageDirectory, PdEntry, PdIndex};
pub use pt::{PageTable, PtEntry, PtIndex};

/// Entries per directory and per table.
pub const ENTRIES: usize = 1024;

#[inline]
#[must_use]
pub const fn split_indices(va: VirtualAddress) -> (PdIndex, PtIndex) {
    (PdIndex::from(va), PtIndex::from(va))
}
