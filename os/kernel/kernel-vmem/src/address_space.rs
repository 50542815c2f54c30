//! # Address Space (IA-32, directory-rooted)
//!
//! An [`AddressSpace`] is one page directory together with the seams needed
//! to change it safely: a [`PhysMapper`] to reach table frames, and a [`Tlb`]
//! to drop stale translations.
//!
//! ## Operations
//!
//! - [`AddressSpace::walk`] finds (optionally creating) the PTE for a VA.
//! - [`AddressSpace::insert`] maps a counted frame at a VA.
//! - [`AddressSpace::remove`] unmaps a VA and releases its frame.
//! - [`AddressSpace::lookup`] and [`AddressSpace::query`] translate.
//! - [`AddressSpace::map_region`] installs static boot-time mappings.
//!
//! ## Ordering
//!
//! Every mutation leaves the tables consistent at each step:
//!
//! - `insert` counts the new reference *before* writing the entry and
//!   releases the previous frame only *after* the entry is replaced and the
//!   TLB invalidated. Re-inserting the frame already mapped at a VA therefore
//!   never frees it.
//! - `remove` clears the entry and invalidates before releasing, so a freed
//!   frame is never reachable through a page table or a cached translation.

use crate::page_table::split_indices;
use crate::{
    AllocFlags, FrameAlloc, OutOfMemory, PageDirectory, PagePermissions, PageTable, PdEntry,
    PhysMapper, PtEntry, Tlb, table_mut,
};
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress, PhysicalPage, VirtualAddress};
use log::trace;
use thiserror::Error;

/// Whether [`AddressSpace::walk`] may allocate a missing page table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WalkMode {
    /// Only follow existing tables.
    Existing,
    /// Allocate, zero and link a page table when the PDE is empty.
    Create,
}

#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum VmemError {
    #[error("out of memory")]
    OutOfMemory,
    #[error("region is not page aligned: va {va}, pa {pa}, len {len:#x}")]
    Misaligned {
        va: VirtualAddress,
        pa: PhysicalAddress,
        len: u32,
    },
    #[error("region wraps past the top of the address space: va {va}, len {len:#x}")]
    Wraps { va: VirtualAddress, len: u32 },
}

impl From<OutOfMemory> for VmemError {
    fn from(_: OutOfMemory) -> Self {
        Self::OutOfMemory
    }
}

/// Handle to a single, concrete address space.
pub struct AddressSpace<'m, M: PhysMapper, T: Tlb> {
    root: PhysicalPage,
    mapper: &'m M,
    tlb: &'m T,
}

impl<'m, M: PhysMapper, T: Tlb> AddressSpace<'m, M, T> {
    /// Allocate a fresh, empty page directory.
    ///
    /// The directory frame is counted once, for the address space itself.
    ///
    /// # Errors
    /// [`OutOfMemory`] if no frame is available.
    pub fn new<A: FrameAlloc>(alloc: &mut A, mapper: &'m M, tlb: &'m T) -> Result<Self, OutOfMemory> {
        let root = alloc.allocate(AllocFlags::ZERO)?;
        alloc.add_ref(root);
        Ok(Self { root, mapper, tlb })
    }

    /// Wrap an existing page directory.
    #[inline]
    pub const fn from_root(mapper: &'m M, tlb: &'m T, root: PhysicalPage) -> Self {
        Self { root, mapper, tlb }
    }

    /// Frame holding the page directory (the value loaded into CR3).
    #[inline]
    pub const fn root_page(&self) -> PhysicalPage {
        self.root
    }

    #[inline]
    fn directory(&self) -> &PageDirectory {
        // SAFETY: `root` holds this space's page directory.
        unsafe { table_mut::<M, PageDirectory>(self.mapper, self.root) }
    }

    #[inline]
    fn directory_mut(&mut self) -> &mut PageDirectory {
        // SAFETY: `root` holds this space's page directory; `&mut self` is exclusive.
        unsafe { table_mut::<M, PageDirectory>(self.mapper, self.root) }
    }

    #[inline]
    fn table(&self, page: PhysicalPage) -> &PageTable {
        // SAFETY: `page` came from a present PDE of this directory.
        unsafe { table_mut::<M, PageTable>(self.mapper, page) }
    }

    #[inline]
    fn table_mut(&mut self, page: PhysicalPage) -> &mut PageTable {
        // SAFETY: as for `table`, and `&mut self` is exclusive.
        unsafe { table_mut::<M, PageTable>(self.mapper, page) }
    }

    /// Locate the PTE for `va`.
    ///
    /// With [`WalkMode::Create`] a missing page table is allocated zeroed,
    /// counted once and linked with the permissive directory flags.
    ///
    /// Returns `None` if the table is missing and `mode` is
    /// [`WalkMode::Existing`], or if creating it ran out of memory.
    pub fn walk<A: FrameAlloc>(
        &mut self,
        alloc: &mut A,
        va: VirtualAddress,
        mode: WalkMode,
    ) -> Option<&mut PtEntry> {
        let (di, ti) = split_indices(va);
        if let Some(table) = self.directory().get(di).table() {
            return Some(self.table_mut(table).get_mut(ti));
        }
        if mode == WalkMode::Existing {
            return None;
        }

        let table = alloc.allocate(AllocFlags::ZERO).ok()?;
        alloc.add_ref(table);
        self.directory_mut().set(di, PdEntry::make_table(table));
        trace!("page table {table} created for {va}");
        Some(self.table_mut(table).get_mut(ti))
    }

    /// Map `frame` at `va` with `perm` (the present bit is implied).
    ///
    /// Replaces and releases any frame previously mapped at `va`. Inserting
    /// the frame that is already mapped there only updates the permissions.
    ///
    /// # Errors
    /// [`VmemError::OutOfMemory`] if a page table was needed and none could
    /// be allocated. Nothing is changed in that case.
    pub fn insert<A: FrameAlloc>(
        &mut self,
        alloc: &mut A,
        frame: PhysicalPage,
        va: VirtualAddress,
        perm: PagePermissions,
    ) -> Result<(), VmemError> {
        let pte = self
            .walk(alloc, va, WalkMode::Create)
            .ok_or(VmemError::OutOfMemory)?;

        alloc.add_ref(frame);
        let previous = pte.page();
        *pte = PtEntry::make(frame, perm);
        self.tlb.invalidate(va.page_base());

        if let Some(old) = previous {
            alloc.release(old);
        }
        Ok(())
    }

    /// Unmap `va` and release its frame. Does nothing if `va` is unmapped.
    pub fn remove<A: FrameAlloc>(&mut self, alloc: &mut A, va: VirtualAddress) {
        let Some((frame, pte)) = self.lookup(va) else {
            return;
        };
        *pte = PtEntry::zero();
        self.tlb.invalidate(va.page_base());
        alloc.release(frame);
    }

    /// The frame mapped at `va` together with its PTE.
    pub fn lookup(&mut self, va: VirtualAddress) -> Option<(PhysicalPage, &mut PtEntry)> {
        let (di, ti) = split_indices(va);
        let table = self.directory().get(di).table()?;
        let pte = self.table_mut(table).get_mut(ti);
        Some((pte.page()?, pte))
    }

    /// Copy of the present PTE for `va`, if any.
    #[must_use]
    pub fn mapping(&self, va: VirtualAddress) -> Option<PtEntry> {
        let (di, ti) = split_indices(va);
        let table = self.directory().get(di).table()?;
        let pte = self.table(table).get(ti);
        pte.is_present().then_some(pte)
    }

    /// Translate `va` to a physical address, keeping the in-page offset.
    #[must_use]
    pub fn query(&self, va: VirtualAddress) -> Option<PhysicalAddress> {
        let page = self.mapping(va)?.page()?;
        Some(page.join(va.page_offset()))
    }

    /// Map `[va, va+len)` linearly onto `[pa, pa+len)` with `perm`.
    ///
    /// For static kernel mappings of memory the frame allocator does not hand
    /// out: no references are counted and no TLB entries are invalidated, so
    /// this is meant for address spaces that are not yet active.
    ///
    /// # Errors
    /// - [`VmemError::Misaligned`] unless `va`, `pa` and `len` are page aligned.
    /// - [`VmemError::Wraps`] if the region runs past `0xFFFF_FFFF`.
    /// - [`VmemError::OutOfMemory`] if a page table could not be allocated;
    ///   pages mapped before the failure stay mapped.
    pub fn map_region<A: FrameAlloc>(
        &mut self,
        alloc: &mut A,
        va: VirtualAddress,
        pa: PhysicalAddress,
        len: u32,
        perm: PagePermissions,
    ) -> Result<(), VmemError> {
        if !va.is_page_aligned() || !pa.is_page_aligned() || !len.is_multiple_of(PAGE_SIZE) {
            return Err(VmemError::Misaligned { va, pa, len });
        }
        if u64::from(va.as_u32()) + u64::from(len) > 1 << 32 {
            return Err(VmemError::Wraps { va, len });
        }

        for i in 0..len / PAGE_SIZE {
            let offset = i * PAGE_SIZE;
            let page_va = VirtualAddress::new(va.as_u32() + offset);
            let frame = PhysicalPage::from_addr(PhysicalAddress::new(pa.as_u32().wrapping_add(offset)));
            let pte = self
                .walk(alloc, page_va, WalkMode::Create)
                .ok_or(VmemError::OutOfMemory)?;
            *pte = PtEntry::make(frame, perm);
        }
        Ok(())
    }
}
