use crate::{PAGE_OFFSET_MASK, PAGE_SHIFT, PhysicalAddress};
use core::fmt;

/// Physical frame, identified by its page-aligned base address.
///
/// `PhysicalPage` is the handle the frame allocator hands out and the value a
/// page-table entry points at. Frame number `n` is the frame at physical
/// address `n * PAGE_SIZE`.
///
/// ### Invariants
/// - The low [`PAGE_SHIFT`] bits of the base are always zero.
///
/// ### Examples
/// ```rust
/// # use kernel_memory_addresses::*;
/// let pa = PhysicalAddress::new(0x0040_1234);
/// let page = pa.page();
/// assert_eq!(page.number(), 0x401);
/// assert_eq!(page.join(pa.page_offset()), pa);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalPage(PhysicalAddress);

impl PhysicalPage {
    /// The frame containing `p` (aligns down).
    #[inline]
    #[must_use]
    pub const fn from_addr(p: PhysicalAddress) -> Self {
        Self(PhysicalAddress::new(p.as_u32() & !PAGE_OFFSET_MASK))
    }

    /// The frame with the given frame number.
    ///
    /// ### Debug assertions
    /// - Asserts that the frame lies within the 32-bit physical address space.
    #[inline]
    #[must_use]
    pub const fn from_number(n: u32) -> Self {
        debug_assert!(n < (1 << (32 - PAGE_SHIFT)));
        Self(PhysicalAddress::new(n << PAGE_SHIFT))
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn number(self) -> u32 {
        self.0.frame_number()
    }

    /// Combine with an in-page offset to form a full address.
    #[inline]
    #[must_use]
    pub const fn join(self, offset: u32) -> PhysicalAddress {
        debug_assert!(offset <= PAGE_OFFSET_MASK);
        PhysicalAddress::new(self.0.as_u32() | (offset & PAGE_OFFSET_MASK))
    }
}

impl fmt::Display for PhysicalPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame {:#x} ({})", self.number(), self.0)
    }
}

impl fmt::Debug for PhysicalPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalPage(0x{:08X})", self.0.as_u32())
    }
}
