//! # The kernel's frame allocator
//!
//! Published once during boot and reached through a [`SpinLock`] afterwards.

use crate::frame_alloc::{FrameAllocator, FrameDescriptor};
use crate::phys_mapper::KernelWindowMapper;
use kernel_memory_addresses::PhysicalAddress;
use kernel_sync::{SpinLock, SyncOnceCell};
use log::info;

pub type KernelFrameAllocator = FrameAllocator<'static, KernelWindowMapper>;

static FRAME_ALLOCATOR: SyncOnceCell<SpinLock<KernelFrameAllocator>> = SyncOnceCell::new();

/// Build and publish the kernel's frame allocator.
///
/// # Panics
/// If called more than once.
pub fn init_frame_allocator(
    descriptors: &'static mut [FrameDescriptor],
    mapper: &'static KernelWindowMapper,
    first_free: PhysicalAddress,
) -> &'static SpinLock<KernelFrameAllocator> {
    let allocator = FrameAllocator::new(descriptors, mapper, first_free);
    let free = allocator.free_frames();
    let Ok(published) = FRAME_ALLOCATOR.set(SpinLock::new(allocator)) else {
        panic!("frame allocator initialized twice");
    };
    info!("physical memory: {free} free frames");
    published
}

/// The kernel's frame allocator, once [`init_frame_allocator`] has run.
pub fn frame_allocator() -> Option<&'static SpinLock<KernelFrameAllocator>> {
    FRAME_ALLOCATOR.get()
}
