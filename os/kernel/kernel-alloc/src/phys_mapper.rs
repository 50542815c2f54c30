//! # Kernel-window PhysMapper
//!
//! All managed physical memory is mapped linearly at `KERNBASE`. This module
//! implements [`PhysMapper`] on top of the bounds-checked
//! [`KernelWindow`] conversion, so every page-table and frame-content access
//! in the kernel fails loudly on a physical address outside managed memory.
//!
//! ## Example
//! ```rust
//! use kernel_alloc::phys_mapper::KernelWindowMapper;
//! use kernel_memory_addresses::{KernelWindow, PhysicalPage};
//! let mapper = KernelWindowMapper::new(KernelWindow::new(0xF000_0000, 0x4000));
//! let kva = mapper.kernel_address(PhysicalPage::from_number(0x123));
//! assert_eq!(kva.as_u32(), 0xF012_3000);
//! ```

use kernel_info::memory::KERNBASE;
use kernel_memory_addresses::{KernelVirtualAddress, KernelWindow, PhysicalAddress, PhysicalPage};
use kernel_vmem::PhysMapper;

/// [`PhysMapper`] through the kernel's linear window onto physical memory.
#[derive(Copy, Clone, Debug)]
pub struct KernelWindowMapper {
    window: KernelWindow,
}

impl KernelWindowMapper {
    #[must_use]
    pub const fn new(window: KernelWindow) -> Self {
        Self { window }
    }

    /// The standard window at `KERNBASE` covering `frames` frames.
    #[must_use]
    pub const fn at_kernbase(frames: u32) -> Self {
        Self::new(KernelWindow::new(KERNBASE, frames))
    }

    #[must_use]
    pub const fn window(&self) -> &KernelWindow {
        &self.window
    }

    /// Kernel virtual address of the first byte of `frame`.
    ///
    /// # Panics
    /// If `frame` is not managed.
    #[track_caller]
    #[must_use]
    pub fn kernel_address(&self, frame: PhysicalPage) -> KernelVirtualAddress {
        self.window.kernel_virtual(frame.base())
    }
}

impl PhysMapper for KernelWindowMapper {
    #[track_caller]
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        let kva = self.window.kernel_virtual(pa);
        // SAFETY: the window maps `pa` at `kva`; the caller vouches for `T`.
        unsafe { &mut *kva.as_ptr::<T>() }
    }
}
