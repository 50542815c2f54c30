#![allow(dead_code)]

use kernel_alloc::{FrameAllocator, FrameDescriptor};
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, VirtualAddress};
use kernel_vmem::{PhysMapper, Tlb};
use std::cell::{RefCell, UnsafeCell};

/// Frames in a machine with 300 frames (1.2 MiB) of RAM.
pub const FRAMES: usize = 300;

/// First byte after the kernel image and boot allocations.
pub const FIRST_FREE: PhysicalAddress = PhysicalAddress::new(0x0011_0000);

/// Frames the allocator may hand out for [`FRAMES`] and [`FIRST_FREE`]:
/// 1..0xA0 below the IO hole and 0x110..300 above the kernel.
pub const USABLE: u32 = (0xA0 - 1) + (300 - 0x110);

#[repr(C, align(4096))]
pub struct Aligned4K([u8; 4096]);

/// Physical RAM; every byte starts out as `0xA5`.
pub struct TestPhys {
    frames: Box<[UnsafeCell<Aligned4K>]>,
}

impl TestPhys {
    pub fn new() -> Self {
        Self {
            frames: (0..FRAMES).map(|_| UnsafeCell::new(Aligned4K([0xA5; 4096]))).collect(),
        }
    }

    pub fn bytes(&self, frame: PhysicalPage) -> &[u8; 4096] {
        unsafe { &(*self.frames[frame.number() as usize].get()).0 }
    }
}

impl PhysMapper for TestPhys {
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        let off = pa.page_offset() as usize;
        assert!(off + size_of::<T>() <= 4096);
        let frame = self.frames[pa.frame_number() as usize].get().cast::<u8>();
        unsafe { &mut *frame.add(off).cast::<T>() }
    }
}

#[derive(Default)]
pub struct RecordingTlb(pub RefCell<Vec<VirtualAddress>>);

impl Tlb for RecordingTlb {
    fn invalidate(&self, va: VirtualAddress) {
        self.0.borrow_mut().push(va);
    }
}

pub fn descriptors() -> Vec<FrameDescriptor> {
    vec![FrameDescriptor::RESERVED; FRAMES]
}

pub fn allocator<'d>(descriptors: &'d mut [FrameDescriptor], phys: &'d TestPhys) -> FrameAllocator<'d, TestPhys> {
    FrameAllocator::new(descriptors, phys, FIRST_FREE)
}
