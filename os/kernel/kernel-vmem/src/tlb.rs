use kernel_memory_addresses::VirtualAddress;

/// Translation lookaside buffer maintenance.
///
/// Every change to a present entry is followed by exactly one call for the
/// affected page, before the old frame can be reused.
pub trait Tlb {
    fn invalidate(&self, va: VirtualAddress);
}

/// The TLB of the CPU this code runs on (`invlpg`).
#[derive(Debug, Default, Copy, Clone)]
pub struct LocalTlb;

impl Tlb for LocalTlb {
    #[inline]
    fn invalidate(&self, va: VirtualAddress) {
        // SAFETY: the kernel runs in ring 0.
        unsafe { kernel_registers::tlb::invlpg(va) }
    }
}
