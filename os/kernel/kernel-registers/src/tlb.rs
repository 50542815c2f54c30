//! # TLB maintenance

use kernel_memory_addresses::VirtualAddress;

/// Drop the TLB entry that translates `va`, if any.
///
/// # Safety
/// Ring 0 only.
#[cfg(all(feature = "asm", target_arch = "x86"))]
#[inline]
pub unsafe fn invlpg(va: VirtualAddress) {
    unsafe {
        core::arch::asm!("invlpg [{}]", in(reg) va.as_u32(), options(nostack, preserves_flags));
    }
}

/// Host builds have no TLB to maintain.
///
/// # Safety
/// Always safe; mirrors the signature of the ring-0 variant.
#[cfg(not(all(feature = "asm", target_arch = "x86")))]
#[inline]
pub const unsafe fn invlpg(_va: VirtualAddress) {}
