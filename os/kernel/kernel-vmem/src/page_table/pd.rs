//! # Page Directory (PD)
//!
//! - [`PdIndex`]: index type for virtual-address bits `[31:22]`.
//! - [`PdEntry`]: a PDE pointing at a [`PageTable`](super::PageTable) frame.
//! - [`PageDirectory`]: a 4 KiB-aligned array of 1024 PDEs.
//!
//! Directory entries are created permissive (present, writable, user); the
//! leaf entries carry the real restriction.

use super::ENTRIES;
use crate::{PageEntryBits, PagePermissions};
use kernel_memory_addresses::{PhysicalPage, VirtualAddress};

/// Index into the Page Directory (VA bits `[31:22]`).
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PdIndex(u16);

impl PdIndex {
    #[inline]
    #[must_use]
    pub const fn from(va: VirtualAddress) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self::new((va.as_u32() >> 22) as u16)
    }

    /// ### Debug assertions
    /// - Asserts `v < 1024`.
    #[inline]
    #[must_use]
    pub const fn new(v: u16) -> Self {
        debug_assert!((v as usize) < ENTRIES);
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A single Page Directory entry (PDE).
#[doc(alias = "PDE")]
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PdEntry(PageEntryBits);

impl PdEntry {
    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self(PageEntryBits::new())
    }

    /// Link to a page table with the permissive directory flags.
    #[inline]
    #[must_use]
    pub const fn make_table(table: PhysicalPage) -> Self {
        Self(
            PageEntryBits::new()
                .with_frame(table)
                .with_permissions(PagePermissions::USER_RW),
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_present(self) -> bool {
        self.0.present()
    }

    /// The page-table frame, if present.
    ///
    /// Debug-asserts that `PS=0`; large pages are never installed.
    #[inline]
    #[must_use]
    pub fn table(self) -> Option<PhysicalPage> {
        if !self.is_present() {
            return None;
        }
        debug_assert!(!self.0.large_page(), "PDE must have PS=0");
        Some(self.0.frame())
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> PageEntryBits {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0.into_bits()
    }
}

/// The Page Directory: 1024 entries, 4 KiB-aligned.
#[doc(alias = "PD")]
#[repr(C, align(4096))]
pub struct PageDirectory {
    entries: [PdEntry; ENTRIES],
}

const _: () = assert!(size_of::<PageDirectory>() == 4096);

impl PageDirectory {
    #[inline]
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            entries: [PdEntry::zero(); ENTRIES],
        }
    }

    #[inline]
    #[must_use]
    pub const fn get(&self, i: PdIndex) -> PdEntry {
        self.entries[i.as_usize()]
    }

    #[inline]
    pub const fn set(&mut self, i: PdIndex, e: PdEntry) {
        self.entries[i.as_usize()] = e;
    }
}
