use kernel_alloc::FrameDescriptor;
use kernel_alloc::global::{frame_allocator, init_frame_allocator};
use kernel_alloc::phys_mapper::KernelWindowMapper;
use kernel_memory_addresses::PhysicalAddress;
use kernel_vmem::AllocFlags;
use std::panic;

static MAPPER: KernelWindowMapper = KernelWindowMapper::at_kernbase(512);

fn leaked_descriptors() -> &'static mut [FrameDescriptor] {
    Box::leak(vec![FrameDescriptor::RESERVED; 512].into_boxed_slice())
}

#[test]
fn published_once() {
    assert!(frame_allocator().is_none());

    let first_free = PhysicalAddress::new(0x0012_0000);
    let lock = init_frame_allocator(leaked_descriptors(), &MAPPER, first_free);
    assert!(std::ptr::eq(lock, frame_allocator().unwrap()));

    // Contents are never touched without the zero flag, so no window access.
    let frame = lock.with_lock(|a| a.allocate(AllocFlags::NONE)).unwrap();
    assert_eq!(frame.number(), 511);

    let again = panic::catch_unwind(|| {
        init_frame_allocator(leaked_descriptors(), &MAPPER, first_free);
    });
    assert!(again.is_err());
    let free = frame_allocator().unwrap().with_lock(|a| a.free_frames());
    assert_eq!(free, 512 - 0x120 + (0xA0 - 1) - 1);
}
