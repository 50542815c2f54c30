//! # Kernel Window
//!
//! The kernel maps all managed physical memory at a fixed virtual offset.
//! [`KernelWindow`] is the only way to cross between the two address spaces:
//! both directions are bounds-checked and panic at the caller's location when
//! handed an address outside the window.

use crate::{PAGE_SHIFT, PhysicalAddress, VirtualAddress};
use core::fmt;

/// Address inside the kernel's linear window onto physical memory.
///
/// Only [`KernelWindow::kernel_virtual`] constructs values of this type, so
/// holding one proves the address maps a managed physical frame.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct KernelVirtualAddress(u32);

impl KernelVirtualAddress {
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn as_virtual(self) -> VirtualAddress {
        VirtualAddress::new(self.0)
    }

    /// Raw pointer to the bytes at this address.
    ///
    /// Dereferencing it is only meaningful while the window is mapped.
    #[inline]
    #[must_use]
    pub const fn as_ptr<T>(self) -> *mut T {
        self.0 as usize as *mut T
    }
}

impl fmt::Debug for KernelVirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KVA(0x{:08X})", self.0)
    }
}

impl fmt::Display for KernelVirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl From<KernelVirtualAddress> for VirtualAddress {
    #[inline]
    fn from(value: KernelVirtualAddress) -> Self {
        value.as_virtual()
    }
}

/// Linear mapping of physical frames `0..frames` at virtual `base..`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KernelWindow {
    base: u32,
    frames: u32,
}

impl KernelWindow {
    /// Create a window of `frames` managed frames mapped at `base`.
    ///
    /// # Panics
    /// If `base` is not page aligned or the window does not fit below 4 GiB.
    #[must_use]
    pub const fn new(base: u32, frames: u32) -> Self {
        assert!(base & ((1 << PAGE_SHIFT) - 1) == 0, "window base must be page aligned");
        let span = (frames as u64) << PAGE_SHIFT;
        assert!(
            base as u64 + span <= 1 << 32,
            "window does not fit in the 32-bit address space"
        );
        Self { base, frames }
    }

    #[inline]
    #[must_use]
    pub const fn base(&self) -> VirtualAddress {
        VirtualAddress::new(self.base)
    }

    /// Number of physical frames reachable through the window.
    #[inline]
    #[must_use]
    pub const fn frames(&self) -> u32 {
        self.frames
    }

    /// Whether `pa` lies within the managed frames.
    #[inline]
    #[must_use]
    pub const fn contains_physical(&self, pa: PhysicalAddress) -> bool {
        pa.frame_number() < self.frames
    }

    /// Physical address of a kernel virtual address (`PADDR`).
    ///
    /// # Panics
    /// If `va` lies below the window base.
    #[track_caller]
    #[must_use]
    pub fn physical(&self, va: VirtualAddress) -> PhysicalAddress {
        match va.as_u32().checked_sub(self.base) {
            Some(pa) => PhysicalAddress::new(pa),
            None => panic!("physical called with invalid kva {va}"),
        }
    }

    /// Physical address of an already validated window address. Never fails.
    #[inline]
    #[must_use]
    pub const fn physical_of(&self, kva: KernelVirtualAddress) -> PhysicalAddress {
        PhysicalAddress::new(kva.0 - self.base)
    }

    /// Kernel virtual address of a managed physical address (`KADDR`).
    ///
    /// # Panics
    /// If the frame containing `pa` is not managed by this window.
    #[track_caller]
    #[must_use]
    pub fn kernel_virtual(&self, pa: PhysicalAddress) -> KernelVirtualAddress {
        assert!(
            self.contains_physical(pa),
            "kernel_virtual called with invalid pa {pa}"
        );
        KernelVirtualAddress(self.base + pa.as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KERNBASE: u32 = 0xF000_0000;

    #[test]
    fn round_trips_inside_window() {
        let w = KernelWindow::new(KERNBASE, 0x1_0000);
        let pa = PhysicalAddress::new(0x0FFF_FFFF);
        let kva = w.kernel_virtual(pa);
        assert_eq!(kva.as_u32(), 0xFFFF_FFFF);
        assert_eq!(w.physical(kva.as_virtual()), pa);
        assert_eq!(w.physical_of(kva), pa);
    }

    #[test]
    fn physical_at_base_is_zero() {
        let w = KernelWindow::new(KERNBASE, 16);
        assert_eq!(w.physical(VirtualAddress::new(KERNBASE)), PhysicalAddress::zero());
    }

    #[test]
    #[should_panic(expected = "physical called with invalid kva 0xefffffff")]
    fn physical_below_base_panics() {
        let w = KernelWindow::new(KERNBASE, 16);
        let _ = w.physical(VirtualAddress::new(KERNBASE - 1));
    }

    #[test]
    #[should_panic(expected = "kernel_virtual called with invalid pa 0x00010000")]
    fn kernel_virtual_past_managed_frames_panics() {
        let w = KernelWindow::new(KERNBASE, 16);
        let _ = w.kernel_virtual(PhysicalAddress::new(16 * 4096));
    }

    #[test]
    fn last_managed_byte_is_reachable() {
        let w = KernelWindow::new(KERNBASE, 16);
        let kva = w.kernel_virtual(PhysicalAddress::new(16 * 4096 - 1));
        assert_eq!(kva.as_u32(), KERNBASE + 16 * 4096 - 1);
    }
}
