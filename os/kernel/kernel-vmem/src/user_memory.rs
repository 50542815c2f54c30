//! # User-Memory Validation
//!
//! Before the kernel touches memory on behalf of user code it checks that
//! the user could have touched it too: every page of the range must be
//! mapped, user-accessible, carry the requested permissions and lie below
//! [`ULIM`].

use crate::{AddressSpace, PagePermissions, PhysMapper, Tlb};
use kernel_info::memory::ULIM;
use kernel_memory_addresses::{PAGE_SIZE, VirtualAddress};
use thiserror::Error;

/// The lowest address of a range that the user may not access.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("user memory check failed at {address}")]
pub struct UserMemoryViolation {
    pub address: VirtualAddress,
}

/// Check that `[va, va+len)` is accessible to user code with `perm`.
///
/// `PRESENT` and `USER` are always required in addition to `perm`. An empty
/// range is always accessible.
///
/// # Errors
/// The first failing address: `va` itself if the first page fails, otherwise
/// the base of the first failing page. A range that wraps past the top of the
/// address space fails at the first page at or above [`ULIM`].
#[allow(clippy::cast_possible_truncation)]
pub fn check_user_range<M: PhysMapper, T: Tlb>(
    aspace: &AddressSpace<'_, M, T>,
    va: VirtualAddress,
    len: u32,
    perm: PagePermissions,
) -> Result<(), UserMemoryViolation> {
    if len == 0 {
        return Ok(());
    }

    let required = perm | PagePermissions::PRESENT | PagePermissions::USER;
    let start = u64::from(va.page_base().as_u32());
    let end = u64::from(va.as_u32()) + u64::from(len);

    for page in (start..end).step_by(PAGE_SIZE as usize) {
        let address = VirtualAddress::new(page.max(u64::from(va.as_u32())) as u32);
        if page >= u64::from(ULIM) {
            return Err(UserMemoryViolation { address });
        }

        let accessible = aspace
            .mapping(VirtualAddress::new(page as u32))
            .is_some_and(|pte| pte.permissions().contains(required));
        if !accessible {
            return Err(UserMemoryViolation { address });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CountingAlloc, RecordingTlb, TestPhys};
    use crate::{AllocFlags, FrameAlloc};

    struct Fixture {
        phys: TestPhys,
        tlb: RecordingTlb,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                phys: TestPhys::with_frames(32),
                tlb: RecordingTlb::default(),
            }
        }

        /// An address space with one fresh frame mapped per `(va, perm)`.
        fn space(&self, maps: &[(u32, PagePermissions)]) -> AddressSpace<'_, TestPhys, RecordingTlb> {
            let mut alloc = CountingAlloc::new(&self.phys, 1..32);
            let mut aspace = AddressSpace::new(&mut alloc, &self.phys, &self.tlb).unwrap();
            for &(va, perm) in maps {
                let frame = alloc.allocate(AllocFlags::NONE).unwrap();
                aspace
                    .insert(&mut alloc, frame, VirtualAddress::new(va), perm)
                    .unwrap();
            }
            aspace
        }
    }

    fn check(
        aspace: &AddressSpace<'_, TestPhys, RecordingTlb>,
        va: u32,
        len: u32,
        perm: PagePermissions,
    ) -> Result<(), u32> {
        check_user_range(aspace, VirtualAddress::new(va), len, perm).map_err(|e| e.address.as_u32())
    }

    #[test]
    fn mapped_user_range_passes() {
        let f = Fixture::new();
        let aspace = f.space(&[
            (0x0080_0000, PagePermissions::USER_RW),
            (0x0080_1000, PagePermissions::USER_RW),
        ]);
        assert_eq!(check(&aspace, 0x0080_0010, 0x1FF0, PagePermissions::WRITABLE), Ok(()));
        assert_eq!(check(&aspace, 0x0080_0FFF, 2, PagePermissions::NONE), Ok(()));
    }

    #[test]
    fn empty_range_is_accessible() {
        let f = Fixture::new();
        let aspace = f.space(&[]);
        assert_eq!(check(&aspace, 0x1234, 0, PagePermissions::WRITABLE), Ok(()));
        assert_eq!(check(&aspace, 0xFFFF_FFFF, 0, PagePermissions::NONE), Ok(()));
    }

    #[test]
    fn first_page_failure_reports_va_itself() {
        let f = Fixture::new();
        let aspace = f.space(&[]);
        assert_eq!(check(&aspace, 0x0080_0123, 4, PagePermissions::NONE), Err(0x0080_0123));
    }

    #[test]
    fn later_page_failure_reports_page_base() {
        let f = Fixture::new();
        let aspace = f.space(&[(0x0080_0000, PagePermissions::USER_RW)]);
        assert_eq!(check(&aspace, 0x0080_0FF0, 0x20, PagePermissions::NONE), Err(0x0080_1000));
    }

    #[test]
    fn missing_write_permission_fails() {
        let f = Fixture::new();
        let aspace = f.space(&[(0x0080_0000, PagePermissions::USER_RO)]);
        assert_eq!(check(&aspace, 0x0080_0000, 16, PagePermissions::NONE), Ok(()));
        assert_eq!(check(&aspace, 0x0080_0008, 16, PagePermissions::WRITABLE), Err(0x0080_0008));
    }

    #[test]
    fn supervisor_page_fails() {
        let f = Fixture::new();
        let aspace = f.space(&[(0x0080_0000, PagePermissions::KERNEL_RW)]);
        assert_eq!(check(&aspace, 0x0080_0000, 1, PagePermissions::NONE), Err(0x0080_0000));
    }

    #[test]
    fn range_crossing_ulim_fails_at_ulim() {
        let f = Fixture::new();
        let below = ULIM - PAGE_SIZE;
        let aspace = f.space(&[(below, PagePermissions::USER_RW), (ULIM, PagePermissions::USER_RW)]);
        assert_eq!(check(&aspace, below, PAGE_SIZE, PagePermissions::NONE), Ok(()));
        assert_eq!(check(&aspace, ULIM - 4, 8, PagePermissions::NONE), Err(ULIM));
        assert_eq!(check(&aspace, ULIM + 4, 8, PagePermissions::NONE), Err(ULIM + 4));
    }

    #[test]
    fn wrapping_range_fails() {
        let f = Fixture::new();
        let below = ULIM - PAGE_SIZE;
        let aspace = f.space(&[(below, PagePermissions::USER_RW)]);
        assert_eq!(check(&aspace, below, u32::MAX, PagePermissions::NONE), Err(ULIM));
        assert_eq!(check(&aspace, 0xFFFF_F000, 0x2000, PagePermissions::NONE), Err(0xFFFF_F000));
    }
}
