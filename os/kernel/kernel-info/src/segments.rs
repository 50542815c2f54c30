//! # GDT Selectors

/// Kernel text.
pub const GD_KT: u16 = 0x08;

/// Kernel data; also the ring-0 stack segment.
pub const GD_KD: u16 = 0x10;

/// User text.
pub const GD_UT: u16 = 0x18;

/// User data.
pub const GD_UD: u16 = 0x20;

/// Task state segment for the (single) CPU.
pub const GD_TSS0: u16 = 0x28;

/// Requested privilege level bits of a selector.
pub const RPL_MASK: u16 = 0b11;

/// Index of a selector within the GDT.
#[must_use]
pub const fn gdt_index(selector: u16) -> usize {
    (selector >> 3) as usize
}

const _: () = {
    assert!(GD_KT & RPL_MASK == 0);
    assert!(GD_TSS0 & RPL_MASK == 0);
    assert!(gdt_index(GD_TSS0) == 5);
};
