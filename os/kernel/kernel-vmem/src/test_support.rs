//! In-memory stand-ins for physical RAM, the frame allocator and the TLB.

use crate::{AllocFlags, FrameAlloc, OutOfMemory, PhysMapper, Tlb};
use core::cell::{RefCell, UnsafeCell};
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, VirtualAddress};
use std::collections::HashMap;
use std::ops::Range;

/// A 4 KiB-aligned raw frame.
#[repr(C, align(4096))]
pub struct Aligned4K([u8; 4096]);

/// Physical memory as a vector of frames; physical address 0 is frame 0.
pub struct TestPhys {
    frames: Box<[UnsafeCell<Aligned4K>]>,
}

impl TestPhys {
    /// Frames start out filled with `0xA5` so missing zero-fills show up.
    pub fn with_frames(n: usize) -> Self {
        Self {
            frames: (0..n).map(|_| UnsafeCell::new(Aligned4K([0xA5; 4096]))).collect(),
        }
    }
}

impl PhysMapper for TestPhys {
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        let idx = pa.frame_number() as usize;
        let off = pa.page_offset() as usize;
        assert!(off + size_of::<T>() <= 4096, "object crosses a frame boundary");
        // SAFETY: in bounds of one owned, 4 KiB-aligned frame.
        unsafe { &mut *self.frames[idx].get().cast::<u8>().add(off).cast::<T>() }
    }
}

/// Free-list allocator with per-frame counts; records every freed frame.
pub struct CountingAlloc<'p> {
    phys: &'p TestPhys,
    free: Vec<PhysicalPage>,
    refs: HashMap<PhysicalPage, u16>,
    pub freed: Vec<PhysicalPage>,
}

impl<'p> CountingAlloc<'p> {
    /// Frames in `numbers` are free; the lowest is handed out first.
    pub fn new(phys: &'p TestPhys, numbers: Range<u32>) -> Self {
        Self {
            phys,
            free: numbers.rev().map(PhysicalPage::from_number).collect(),
            refs: HashMap::new(),
            freed: Vec::new(),
        }
    }

    pub fn free_frames(&self) -> usize {
        self.free.len()
    }
}

impl FrameAlloc for CountingAlloc<'_> {
    fn allocate(&mut self, flags: AllocFlags) -> Result<PhysicalPage, OutOfMemory> {
        let frame = self.free.pop().ok_or(OutOfMemory)?;
        if flags.zero() {
            let bytes: &mut [u8; 4096] = unsafe { self.phys.phys_to_mut(frame.base()) };
            bytes.fill(0);
        }
        Ok(frame)
    }

    fn add_ref(&mut self, frame: PhysicalPage) {
        *self.refs.entry(frame).or_default() += 1;
    }

    fn release(&mut self, frame: PhysicalPage) {
        let count = self.refs.get_mut(&frame).expect("release of unreferenced frame");
        *count -= 1;
        if *count == 0 {
            self.free.push(frame);
            self.freed.push(frame);
        }
    }

    fn ref_count(&self, frame: PhysicalPage) -> u16 {
        self.refs.get(&frame).copied().unwrap_or(0)
    }
}

/// Records every invalidated page in order.
#[derive(Default)]
pub struct RecordingTlb(RefCell<Vec<VirtualAddress>>);

impl RecordingTlb {
    pub fn invalidated(&self) -> Vec<VirtualAddress> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Tlb for RecordingTlb {
    fn invalidate(&self, va: VirtualAddress) {
        self.0.borrow_mut().push(va);
    }
}
