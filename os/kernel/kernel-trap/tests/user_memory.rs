//! `assert_user_range` against a real address space.

mod common;

use common::MockEnvs;
use kernel_alloc::{FrameAllocator, FrameDescriptor};
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_trap::{EnvId, EnvStatus, Environments, assert_user_range};
use kernel_vmem::{AddressSpace, AllocFlags, PagePermissions, PhysMapper, Tlb};
use std::cell::UnsafeCell;

const FRAMES: usize = 300;

#[repr(C, align(4096))]
struct Aligned4K([u8; 4096]);

struct TestPhys {
    frames: Box<[UnsafeCell<Aligned4K>]>,
}

impl TestPhys {
    fn new() -> Self {
        Self {
            frames: (0..FRAMES).map(|_| UnsafeCell::new(Aligned4K([0; 4096]))).collect(),
        }
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

struct NoTlb;

impl Tlb for NoTlb {
    fn invalidate(&self, _: VirtualAddress) {}
}

#[test]
fn inaccessible_range_destroys_the_environment() {
    let phys = TestPhys::new();
    let mut descriptors = vec![FrameDescriptor::RESERVED; FRAMES];
    let mut alloc = FrameAllocator::new(&mut descriptors, &phys, PhysicalAddress::new(0x0011_0000));
    let mut aspace = AddressSpace::new(&mut alloc, &phys, &NoTlb).unwrap();
    let frame = alloc.allocate(AllocFlags::ZERO).unwrap();
    let va = VirtualAddress::new(0x0080_0000);
    aspace.insert(&mut alloc, frame, va, PagePermissions::USER_RO).unwrap();

    let mut envs = MockEnvs::running(0x1001);
    let env = EnvId(0x1001);

    assert_eq!(
        assert_user_range(&mut envs, env, &aspace, va, 0x100, PagePermissions::NONE),
        Ok(())
    );
    assert!(envs.destroyed.is_empty());

    let err = assert_user_range(&mut envs, env, &aspace, va + 0x10, 8, PagePermissions::WRITABLE).unwrap_err();
    assert_eq!(err.address, va + 0x10);
    assert_eq!(envs.destroyed, [env]);
    assert_eq!(envs.status(env), EnvStatus::Free);
}
