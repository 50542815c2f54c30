//! Processor operations the trap path needs, behind a trait so the
//! dispatcher can run against a recording CPU in tests.

use crate::gate::Idt;
use crate::tss::TssDescriptor;
use kernel_memory_addresses::VirtualAddress;

pub trait TrapCpu {
    /// `EFLAGS.IF`.
    fn interrupts_enabled(&self) -> bool;

    /// `cld`; user code may have left the direction flag set.
    fn clear_direction_flag(&self);

    /// `CR2`.
    fn fault_address(&self) -> VirtualAddress;

    /// Write a TSS descriptor into the GDT slot named by `selector`.
    fn install_task_state(&mut self, selector: u16, descriptor: TssDescriptor);

    /// `ltr selector`.
    fn load_task_register(&mut self, selector: u16);

    /// `lidt` with `idt`.
    fn load_gate_table(&mut self, idt: &'static Idt);
}

#[cfg(target_arch = "x86")]
pub use x86::X86Cpu;

#[cfg(target_arch = "x86")]
mod x86 {
    use super::TrapCpu;
    use crate::gate::Idt;
    use crate::tss::TssDescriptor;
    use kernel_info::segments::gdt_index;
    use kernel_memory_addresses::VirtualAddress;
    use kernel_registers::LoadRegister;
    use kernel_registers::LoadRegisterUnsafe;
    use kernel_registers::cr2::Cr2;
    use kernel_registers::eflags::{Eflags, clear_direction_flag};
    use kernel_registers::tables::{lidt, ltr};

    /// The processor this code runs on.
    pub struct X86Cpu {
        gdt: &'static mut [u64],
    }

    impl X86Cpu {
        /// # Safety
        /// Must run in ring 0, and `gdt` must be the table currently loaded
        /// into `GDTR`.
        pub const unsafe fn new(gdt: &'static mut [u64]) -> Self {
            Self { gdt }
        }
    }

    impl TrapCpu for X86Cpu {
        fn interrupts_enabled(&self) -> bool {
            Eflags::load().if_interrupt_enable()
        }

        fn clear_direction_flag(&self) {
            clear_direction_flag();
        }

        fn fault_address(&self) -> VirtualAddress {
            // SAFETY: ring 0 is a constructor precondition.
            unsafe { Cr2::load_unsafe() }.fault_address()
        }

        fn install_task_state(&mut self, selector: u16, descriptor: TssDescriptor) {
            let index = gdt_index(selector);
            let Some(slot) = self.gdt.get_mut(index) else {
                panic!("GDT has no slot {index} for selector {selector:#x}");
            };
            *slot = descriptor.into_bits();
        }

        fn load_task_register(&mut self, selector: u16) {
            // SAFETY: callers install the descriptor first.
            unsafe { ltr(selector) }
        }

        fn load_gate_table(&mut self, idt: &'static Idt) {
            // SAFETY: the table is static and never modified once published.
            unsafe { lidt(&idt.pointer()) }
        }
    }
}
