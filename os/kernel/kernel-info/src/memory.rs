//! # Memory Layout

/// Bytes mapped by a single page, and the size of a physical frame.
pub const PAGE_SIZE: u32 = 4096;

/// Bytes mapped by one page table (one page-directory entry).
pub const PT_SIZE: u32 = PAGE_SIZE * 1024;

/// All of physical memory is mapped at this address.
pub const KERNBASE: u32 = 0xF000_0000;

/// Top of the kernel stack; the ring-0 stack pointer loaded on a trap.
pub const KSTACKTOP: u32 = KERNBASE;

/// Size of the kernel stack.
pub const KSTACK_SIZE: u32 = 8 * PAGE_SIZE;

/// Unmapped guard below the kernel stack.
pub const KSTACK_GAP: u32 = 8 * PAGE_SIZE;

/// End of the memory-mapped I/O region.
pub const MMIOLIM: u32 = KSTACKTOP - PT_SIZE;

/// Start of the memory-mapped I/O region.
pub const MMIOBASE: u32 = MMIOLIM - PT_SIZE;

/// User-accessible addresses are strictly below this limit.
pub const ULIM: u32 = MMIOBASE;

/// Read-only user view of the current page table.
const UVPT: u32 = ULIM - PT_SIZE;

/// Read-only user view of the frame descriptors.
const UPAGES: u32 = UVPT - PT_SIZE;

/// Read-only user view of the environment table.
const UENVS: u32 = UPAGES - PT_SIZE;

/// Top of user-writable memory.
pub const UTOP: u32 = UENVS;

/// Start of the legacy IO hole in physical memory.
pub const IOPHYSMEM: u32 = 0x000A_0000;

/// Start of extended memory, where the kernel image is loaded.
pub const EXTPHYSMEM: u32 = 0x0010_0000;

const _: () = {
    assert!(KERNBASE.is_multiple_of(PT_SIZE));
    assert!(KSTACK_SIZE + KSTACK_GAP <= PT_SIZE);
    assert!(ULIM == 0xEF80_0000);
    assert!(UTOP < ULIM);
    assert!(IOPHYSMEM < EXTPHYSMEM);
    assert!(EXTPHYSMEM.is_multiple_of(PAGE_SIZE));
};
