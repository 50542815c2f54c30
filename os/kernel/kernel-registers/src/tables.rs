//! # Descriptor-table registers (`IDTR`, `TR`)

/// Operand of `lidt`/`lgdt`: limit followed by the linear base address.
#[repr(C, packed(2))]
#[derive(Copy, Clone, Debug)]
pub struct DescriptorTablePointer {
    /// Size of the table in bytes, minus one.
    pub limit: u16,
    /// Linear address of the first descriptor.
    pub base: u32,
}

impl DescriptorTablePointer {
    #[must_use]
    pub const fn new(base: u32, size_in_bytes: usize) -> Self {
        assert!(size_in_bytes > 0 && size_in_bytes <= 0x1_0000);
        #[allow(clippy::cast_possible_truncation)]
        Self {
            limit: (size_in_bytes - 1) as u16,
            base,
        }
    }
}

const _: () = assert!(size_of::<DescriptorTablePointer>() == 6);

/// Load the interrupt descriptor table register.
///
/// # Safety
/// The table at `ptr.base` must stay valid and unchanged for as long as it
/// is loaded.
#[cfg(all(feature = "asm", target_arch = "x86"))]
#[inline]
pub unsafe fn lidt(ptr: &DescriptorTablePointer) {
    unsafe {
        core::arch::asm!("lidt [{}]", in(reg) ptr, options(readonly, nostack, preserves_flags));
    }
}

/// Load the task register with a GDT selector.
///
/// # Safety
/// The selector must name an available 32-bit TSS descriptor in the loaded
/// GDT; the descriptor is marked busy by the CPU.
#[cfg(all(feature = "asm", target_arch = "x86"))]
#[inline]
pub unsafe fn ltr(selector: u16) {
    unsafe {
        core::arch::asm!("ltr {0:x}", in(reg) selector, options(nostack, preserves_flags));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_size_minus_one() {
        let p = DescriptorTablePointer::new(0xF011_2000, 256 * 8);
        let limit = p.limit;
        let base = p.base;
        assert_eq!(limit, 2047);
        assert_eq!(base, 0xF011_2000);
    }
}
