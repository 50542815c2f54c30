//! # Virtual Memory Support
//!
//! IA-32 two-level paging for a single-CPU kernel.
//!
//! ## What you get
//! - 32-bit [`PageEntryBits`] with [`PdEntry`]/[`PtEntry`] level wrappers.
//! - 4 KiB-aligned [`PageDirectory`] and [`PageTable`] types.
//! - An [`AddressSpace`] that walks, inserts, removes and looks up mappings
//!   while keeping frame reference counts and the TLB consistent.
//! - [`check_user_range`](user_memory::check_user_range) for validating
//!   user-supplied pointers against an address space.
//! - The seams the engine rests on: [`FrameAlloc`] (counted physical frames),
//!   [`PhysMapper`] (dereferencing a physical frame) and [`Tlb`].
//!
//! ## Virtual Address → Physical Address Walk
//!
//! ```text
//!  CR3 ─► Page Directory ──PDE──► Page Table ──PTE──► 4 KiB frame
//!          (1024 × u32)            (1024 × u32)        + offset
//! ```
//!
//! ### Reference counting
//!
//! Every present leaf counts one reference on the frame it maps, and every
//! page table counts one reference on its own frame. A frame goes back to
//! the allocator when its last mapping is removed. Mappings created through
//! [`AddressSpace::map_region`] are static and take no references; they are
//! for memory the allocator never hands out.

#![cfg_attr(not(test), no_std)]
#![allow(unsafe_code, clippy::inline_always)]

pub mod address_space;
mod page_entry_bits;
pub mod page_table;
mod tlb;
pub mod user_memory;

#[cfg(test)]
mod test_support;

pub use crate::address_space::{AddressSpace, VmemError, WalkMode};
pub use crate::page_entry_bits::{PageEntryBits, PagePermissions};
pub use crate::page_table::{PageDirectory, PageTable, PdEntry, PdIndex, PtEntry, PtIndex};
pub use crate::tlb::{LocalTlb, Tlb};
pub use crate::user_memory::{UserMemoryViolation, check_user_range};

/// Re-export constants as info module.
pub use kernel_info::memory as info;

use bitfield_struct::bitfield;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage};
use thiserror::Error;

/// No free physical frame is left.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("out of physical memory")]
pub struct OutOfMemory;

/// Options for [`FrameAlloc::allocate`].
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct AllocFlags {
    /// Fill the frame with zero bytes before returning it.
    pub zero: bool,
    #[bits(7)]
    __: u8,
}

impl AllocFlags {
    pub const NONE: Self = Self::new();
    pub const ZERO: Self = Self::new().with_zero(true);
}

/// Source of counted 4 KiB physical frames.
///
/// A frame handed out by [`allocate`](Self::allocate) starts with a count of
/// zero; whoever installs it somewhere calls [`add_ref`](Self::add_ref).
/// [`release`](Self::release) drops one reference and returns the frame to
/// the pool when none remain.
pub trait FrameAlloc {
    /// Take one frame off the free pool.
    ///
    /// # Errors
    /// [`OutOfMemory`] when the pool is empty.
    fn allocate(&mut self, flags: AllocFlags) -> Result<PhysicalPage, OutOfMemory>;

    /// Count one more reference to `frame`.
    fn add_ref(&mut self, frame: PhysicalPage);

    /// Drop one reference to `frame`, freeing it when the count reaches zero.
    fn release(&mut self, frame: PhysicalPage);

    /// Current number of references to `frame`.
    fn ref_count(&self, frame: PhysicalPage) -> u16;
}

/// Converts physical addresses to usable references in the current address
/// space (e.g. through the kernel's linear window onto physical memory).
pub trait PhysMapper {
    /// Convert a *physical* address to a usable mutable reference.
    ///
    /// # Safety
    /// - `pa` must be mapped writable in the current page tables.
    /// - Lifetime `'a` is not tracked; the mapping must stay valid for `'a`
    ///   and no other reference to the same bytes may be alive.
    /// - `T` must match the bytes at `pa`.
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T;
}

/// Map a page-table frame and return it typed.
///
/// # Safety
/// See [`PhysMapper::phys_to_mut`]; `page` must hold a table of type `T`.
#[inline]
unsafe fn table_mut<'a, M: PhysMapper, T>(m: &M, page: PhysicalPage) -> &'a mut T {
    unsafe { m.phys_to_mut::<T>(page.base()) }
}
