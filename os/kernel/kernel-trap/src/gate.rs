//! # Interrupt Descriptor Table
//!
//! 256 eight-byte IA-32 gate descriptors, built from [`VECTORS`] and
//! published once through [`init_traps`].
//!
//! ```text
//! 63            48 47 46 45 44  40 39  37 36    32
//! +---------------+--+-----+--+-----+------+-------+
//! | offset[31:16] |P | DPL |0 | type|  000 | args  |
//! +---------------+--+-----+--+-----+------+-------+
//! 31            16 15                             0
//! +---------------+--------------------------------+
//! |   selector    |          offset[15:0]          |
//! +---------------+--------------------------------+
//! ```

use crate::privilege::Ring;
use crate::vectors::{GateType, VECTORS};
use bitfield_struct::bitfield;
use core::mem::size_of;
use core::ops::{Index, IndexMut};
use kernel_info::segments::GD_KT;
use kernel_memory_addresses::VirtualAddress;
use kernel_registers::tables::DescriptorTablePointer;
use kernel_sync::SyncOnceCell;
use log::debug;

const _: () = assert!(size_of::<GateDescriptor>() == 8);
const _: () = assert!(size_of::<Idt>() == 256 * 8);

/// The two middle bytes of a gate: parameter count and type/attributes.
#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub struct GateAttr {
    /// Parameter count; only meaningful for call gates.
    #[bits(5)]
    pub args: u8,

    #[bits(3)]
    __zero: u8,

    /// 0xE = interrupt gate, 0xF = trap gate.
    #[bits(4)]
    pub typ: u8,

    /// System descriptor bit, always 0 for gates.
    pub s: bool,

    #[bits(2)]
    pub dpl: u8,

    pub present: bool,
}

/// One 8-byte gate descriptor.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GateDescriptor {
    offset_lo: u16,
    selector: u16,
    attr: u16,
    offset_hi: u16,
}

impl GateDescriptor {
    /// A zeroed, non-present gate.
    pub const MISSING: Self = Self {
        offset_lo: 0,
        selector: 0,
        attr: 0,
        offset_hi: 0,
    };

    /// Point this gate at `handler` and return a builder for the rest.
    ///
    /// The gate starts out as a non-present DPL 0 interrupt gate in the
    /// kernel text segment.
    pub const fn set_handler(&mut self, handler: VirtualAddress) -> GateBuilder<'_> {
        let addr = handler.as_u32();
        #[allow(clippy::cast_possible_truncation)]
        let (lo, hi) = (addr as u16, (addr >> 16) as u16);
        self.offset_lo = lo;
        self.offset_hi = hi;
        self.selector = GD_KT;
        self.attr = GateAttr::new()
            .with_typ(GateType::InterruptGate.code())
            .into_bits();
        GateBuilder { gate: self }
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> VirtualAddress {
        VirtualAddress::new((u32::from(self.offset_hi) << 16) | u32::from(self.offset_lo))
    }

    #[inline]
    #[must_use]
    pub const fn selector(&self) -> u16 {
        self.selector
    }

    #[inline]
    #[must_use]
    pub const fn attr(&self) -> GateAttr {
        GateAttr::from_bits(self.attr)
    }

    #[inline]
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.attr().present()
    }

    /// Raw descriptor as the CPU reads it.
    #[inline]
    #[must_use]
    pub fn into_bits(self) -> u64 {
        u64::from(self.offset_lo)
            | (u64::from(self.selector) << 16)
            | (u64::from(self.attr) << 32)
            | (u64::from(self.offset_hi) << 48)
    }
}

/// Fluent builder over a [`GateDescriptor`].
///
/// ```
/// # use kernel_trap::gate::GateDescriptor;
/// # use kernel_trap::{GateType, Ring};
/// # use kernel_memory_addresses::VirtualAddress;
/// let mut gate = GateDescriptor::MISSING;
/// gate.set_handler(VirtualAddress::new(0xF010_3A5C))
///     .dpl(Ring::Ring3)
///     .gate_type(GateType::InterruptGate)
///     .present(true);
/// assert_eq!(gate.into_bits(), 0xF010_EE00_0008_3A5C);
/// ```
pub struct GateBuilder<'a> {
    gate: &'a mut GateDescriptor,
}

impl GateBuilder<'_> {
    #[inline]
    pub const fn present(self, p: bool) -> Self {
        self.gate.attr = GateAttr::from_bits(self.gate.attr).with_present(p).into_bits();
        self
    }

    /// Lowest privilege allowed to use this gate through `int n`.
    #[inline]
    pub const fn dpl(self, dpl: Ring) -> Self {
        self.gate.attr = GateAttr::from_bits(self.gate.attr)
            .with_dpl(dpl.to_u8())
            .into_bits();
        self
    }

    #[inline]
    pub const fn gate_type(self, gate_type: GateType) -> Self {
        self.gate.attr = GateAttr::from_bits(self.gate.attr)
            .with_typ(gate_type.code())
            .with_s(false)
            .into_bits();
        self
    }

    /// Override the code segment selector (defaults to kernel text).
    #[inline]
    pub const fn selector(self, sel: u16) -> Self {
        self.gate.selector = sel;
        self
    }
}

/// A 256-entry Interrupt Descriptor Table.
#[repr(C, align(8))]
#[derive(Clone, Debug)]
pub struct Idt {
    entries: [GateDescriptor; 256],
}

impl Default for Idt {
    fn default() -> Self {
        Self::new()
    }
}

impl Idt {
    /// An empty table, every gate non-present.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [GateDescriptor::MISSING; 256],
        }
    }

    /// A table with one present gate per entry of [`VECTORS`].
    ///
    /// `stubs` returns the address of the assembly entry stub for a vector.
    #[must_use]
    pub fn configured(stubs: impl Fn(u8) -> VirtualAddress) -> Self {
        let mut idt = Self::new();
        for v in &VECTORS {
            idt[v.vector]
                .set_handler(stubs(v.vector))
                .selector(GD_KT)
                .dpl(v.dpl)
                .gate_type(v.gate)
                .present(true);
        }
        idt
    }

    #[must_use]
    pub const fn entries(&self) -> &[GateDescriptor; 256] {
        &self.entries
    }

    /// Operand for `lidt`.
    #[must_use]
    pub fn pointer(&'static self) -> DescriptorTablePointer {
        #[allow(clippy::cast_possible_truncation)]
        let base = core::ptr::from_ref(self) as usize as u32;
        DescriptorTablePointer::new(base, size_of::<Self>())
    }
}

impl Index<u8> for Idt {
    type Output = GateDescriptor;
    fn index(&self, i: u8) -> &Self::Output {
        &self.entries[usize::from(i)]
    }
}

impl IndexMut<u8> for Idt {
    fn index_mut(&mut self, i: u8) -> &mut Self::Output {
        &mut self.entries[usize::from(i)]
    }
}

static IDT: SyncOnceCell<Idt> = SyncOnceCell::new();

/// Build the gate table from `stubs` and publish it.
///
/// The table is shared by every processor; each one loads it in
/// [`init_traps_per_processor`](crate::init_traps_per_processor).
///
/// # Panics
/// If called more than once.
#[track_caller]
pub fn init_traps(stubs: impl Fn(u8) -> VirtualAddress) -> &'static Idt {
    let Ok(idt) = IDT.set(Idt::configured(stubs)) else {
        panic!("trap gates initialized twice");
    };
    debug!("trap gates: {} vectors configured", VECTORS.len());
    idt
}

/// The published gate table, if [`init_traps`] ran.
#[must_use]
pub fn gate_table() -> Option<&'static Idt> {
    IDT.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectors::{BREAKPOINT, NMI, PAGE_FAULT, SYSCALL};

    fn stub(v: u8) -> VirtualAddress {
        VirtualAddress::new(0xF010_0000 + u32::from(v) * 0x10)
    }

    #[test]
    fn attr_bits_match_ia32() {
        let bits = |a: GateAttr| a.into_bits();
        assert_eq!(bits(GateAttr::new().with_typ(0xF)), 0x0F00);
        assert_eq!(bits(GateAttr::new().with_s(true)), 1 << 12);
        assert_eq!(bits(GateAttr::new().with_dpl(3)), 3 << 13);
        assert_eq!(bits(GateAttr::new().with_present(true)), 1 << 15);
        assert_eq!(bits(GateAttr::new().with_args(0x1F)), 0x1F);
    }

    #[test]
    fn handler_offset_is_split_around_the_selector() {
        let mut gate = GateDescriptor::MISSING;
        gate.set_handler(VirtualAddress::new(0x1234_5678))
            .gate_type(GateType::TrapGate)
            .present(true);
        assert_eq!(gate.offset(), VirtualAddress::new(0x1234_5678));
        assert_eq!(gate.selector(), GD_KT);
        assert_eq!(gate.into_bits(), 0x1234_8F00_0008_5678);
    }

    #[test]
    fn configured_table_follows_the_vector_list() {
        let idt = Idt::configured(stub);
        let present = idt.entries().iter().filter(|g| g.is_present()).count();
        assert_eq!(present, VECTORS.len());
        assert!(!idt[9].is_present());
        assert!(!idt[15].is_present());
        assert!(!idt[20].is_present());

        for v in &VECTORS {
            let gate = idt[v.vector];
            assert_eq!(gate.offset(), stub(v.vector));
            assert_eq!(gate.selector(), GD_KT);
            assert_eq!(gate.attr().dpl(), v.dpl.to_u8());
            assert_eq!(gate.attr().typ(), v.gate.code());
            assert!(!gate.attr().s());
        }
    }

    #[test]
    fn privileges_and_types() {
        let idt = Idt::configured(stub);
        assert_eq!(idt[BREAKPOINT].attr().dpl(), 3);
        assert_eq!(idt[SYSCALL].attr().dpl(), 3);
        assert_eq!(idt[SYSCALL].attr().typ(), 0xE);
        assert_eq!(idt[NMI].attr().dpl(), 0);
        assert_eq!(idt[PAGE_FAULT].attr().dpl(), 0);
        assert_eq!(idt[PAGE_FAULT].attr().typ(), 0xF);
    }
}
