//! # Physical, Virtual and Kernel-Window Address Types
//!
//! Strongly typed wrappers for the 32-bit addresses handled by the paging and
//! trap code.
//!
//! ## Overview
//!
//! The kernel deals with three kinds of addresses that are all plain `u32`
//! values to the CPU but must never be mixed up:
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`VirtualAddress`] | Any address as seen through the page tables (user or kernel). |
//! | [`PhysicalAddress`] | A location in RAM or MMIO as seen by the memory bus. |
//! | [`KernelVirtualAddress`] | An address inside the kernel's fixed window onto physical memory. |
//!
//! [`PhysicalPage`] names the page-aligned base of one physical frame and is
//! the unit the frame allocator hands out.
//!
//! ## The kernel window
//!
//! All of physical memory is mapped once, linearly, at [`KernelWindow::base`]
//! (`KERNBASE`). A [`KernelVirtualAddress`] can only be obtained from the
//! window's bounds-checked conversions, so any code holding one has already
//! proven the address lies inside managed memory:
//!
//! ```text
//! 0xFFFF_FFFF ┌──────────────────────────────┐
//!             │  physical frame N-1          │
//!             │  ...                         │  KernelVirtualAddress = PA + KERNBASE
//! KERNBASE    ├──────────────────────────────┤
//!             │  user space / kernel stacks  │  VirtualAddress (unchecked)
//! 0x0000_0000 └──────────────────────────────┘
//! ```
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let window = KernelWindow::new(0xF000_0000, 1024);
//! let pa = PhysicalAddress::new(0x0012_3456);
//! let kva = window.kernel_virtual(pa);
//! assert_eq!(kva.as_u32(), 0xF012_3456);
//! assert_eq!(window.physical_of(kva), pa);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod kernel_window;
mod physical_address;
mod physical_page;
mod virtual_address;

pub use crate::kernel_window::{KernelVirtualAddress, KernelWindow};
pub use crate::physical_address::PhysicalAddress;
pub use crate::physical_page::PhysicalPage;
pub use crate::virtual_address::VirtualAddress;

pub use kernel_info::memory::PAGE_SIZE;

/// log2([`PAGE_SIZE`]), the number of in-page offset bits.
pub const PAGE_SHIFT: u32 = 12;

/// Mask selecting the in-page offset bits of an address.
pub const PAGE_OFFSET_MASK: u32 = PAGE_SIZE - 1;

const _: () = assert!(1 << PAGE_SHIFT == PAGE_SIZE);

/// Align `x` down to the nearest multiple of [`PAGE_SIZE`].
#[inline(always)]
#[must_use]
pub const fn page_align_down(x: u32) -> u32 {
    x & !PAGE_OFFSET_MASK
}

/// Align `x` up to the nearest multiple of [`PAGE_SIZE`].
///
/// Returns `None` if the aligned value does not fit in 32 bits.
#[inline(always)]
#[must_use]
pub const fn page_align_up(x: u32) -> Option<u32> {
    match x.checked_add(PAGE_OFFSET_MASK) {
        Some(v) => Some(v & !PAGE_OFFSET_MASK),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_helpers() {
        assert_eq!(page_align_down(0), 0);
        assert_eq!(page_align_down(4095), 0);
        assert_eq!(page_align_down(4097), 4096);
        assert_eq!(page_align_up(1), Some(4096));
        assert_eq!(page_align_up(4096), Some(4096));
        assert_eq!(page_align_up(0xFFFF_F000), Some(0xFFFF_F000));
        assert_eq!(page_align_up(0xFFFF_F001), None);
    }
}
