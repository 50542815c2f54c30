use crate::page_fault::PageFaultError;
use crate::privilege::Ring;
use crate::syscall::SyscallArgs;
use crate::vectors::{PAGE_FAULT, trap_name};
use core::fmt;
use core::mem::size_of;
use kernel_memory_addresses::VirtualAddress;

/// General-purpose registers in `pushal` order.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PushRegs {
    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    /// `esp` at the time of `pushal`; ignored by `popal`.
    pub oesp: u32,
    pub ebx: u32,
    pub edx: u32,
    pub ecx: u32,
    pub eax: u32,
}

/// Register state saved on trap entry.
///
/// The entry stubs push everything from `ds` down; the CPU pushes the rest.
/// `err` is the CPU's error code or a zero pushed by the stub. `esp`/`ss` are
/// only pushed when the trap crossed from user to kernel mode.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TrapFrame {
    pub regs: PushRegs,
    pub es: u16,
    pub padding1: u16,
    pub ds: u16,
    pub padding2: u16,
    pub trapno: u32,
    pub err: u32,
    pub eip: u32,
    pub cs: u16,
    pub padding3: u16,
    pub eflags: u32,
    pub esp: u32,
    pub ss: u16,
    pub padding4: u16,
}

const _: () = assert!(size_of::<PushRegs>() == 32);
const _: () = assert!(size_of::<TrapFrame>() == 68);

impl TrapFrame {
    /// Privilege level the trapped code ran at.
    #[inline]
    #[must_use]
    pub const fn ring(&self) -> Ring {
        Ring::of_selector(self.cs)
    }

    /// Whether the trap came from ring 3.
    ///
    /// The GDT has no ring 1 or ring 2 segments, so those never trap here;
    /// a frame claiming one is treated as kernel mode.
    #[inline]
    #[must_use]
    pub const fn from_user(&self) -> bool {
        self.ring().is_user()
    }

    #[inline]
    #[must_use]
    pub const fn syscall_args(&self) -> SyscallArgs {
        SyscallArgs::from_frame(self)
    }

    /// Store a system call result where the caller expects it.
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub const fn set_return_value(&mut self, value: i32) {
        self.regs.eax = value as u32;
    }

    /// A multi-line register dump.
    ///
    /// `fault_address` is printed for page faults only.
    #[must_use]
    pub const fn dump(&self, fault_address: VirtualAddress) -> TrapFrameDump<'_> {
        TrapFrameDump {
            frame: self,
            fault_address,
        }
    }
}

impl fmt::Display for PushRegs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  edi  0x{:08x}", self.edi)?;
        writeln!(f, "  esi  0x{:08x}", self.esi)?;
        writeln!(f, "  ebp  0x{:08x}", self.ebp)?;
        writeln!(f, "  oesp 0x{:08x}", self.oesp)?;
        writeln!(f, "  ebx  0x{:08x}", self.ebx)?;
        writeln!(f, "  edx  0x{:08x}", self.edx)?;
        writeln!(f, "  ecx  0x{:08x}", self.ecx)?;
        writeln!(f, "  eax  0x{:08x}", self.eax)
    }
}

/// See [`TrapFrame::dump`].
pub struct TrapFrameDump<'a> {
    frame: &'a TrapFrame,
    fault_address: VirtualAddress,
}

impl fmt::Display for TrapFrameDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tf = self.frame;
        let page_fault = tf.trapno == u32::from(PAGE_FAULT);

        writeln!(f, "TRAP frame at {:p}", core::ptr::from_ref(tf))?;
        write!(f, "{}", tf.regs)?;
        writeln!(f, "  es   0x----{:04x}", tf.es)?;
        writeln!(f, "  ds   0x----{:04x}", tf.ds)?;
        writeln!(f, "  trap 0x{:08x} {}", tf.trapno, trap_name(tf.trapno))?;
        if page_fault {
            writeln!(f, "  cr2  0x{:08x}", self.fault_address.as_u32())?;
        }
        write!(f, "  err  0x{:08x}", tf.err)?;
        if page_fault {
            write!(f, " {}", PageFaultError::from_bits(tf.err))?;
        }
        writeln!(f)?;
        writeln!(f, "  eip  0x{:08x}", tf.eip)?;
        writeln!(f, "  cs   0x----{:04x}", tf.cs)?;
        write!(f, "  flag 0x{:08x}", tf.eflags)?;
        if tf.ring() != Ring::Ring0 {
            writeln!(f)?;
            writeln!(f, "  esp  0x{:08x}", tf.esp)?;
            write!(f, "  ss   0x----{:04x}", tf.ss)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::offset_of;
    use kernel_info::segments::{GD_KT, GD_UD, GD_UT};

    fn user_page_fault() -> TrapFrame {
        TrapFrame {
            regs: PushRegs {
                eax: 0x11,
                ..PushRegs::default()
            },
            es: GD_UD | 3,
            ds: GD_UD | 3,
            trapno: 14,
            err: 0b110,
            eip: 0x0080_0039,
            cs: GD_UT | 3,
            eflags: 0x0000_0292,
            esp: 0xEEBF_DFD0,
            ss: GD_UD | 3,
            ..TrapFrame::default()
        }
    }

    #[test]
    fn layout_matches_the_entry_stubs() {
        assert_eq!(offset_of!(TrapFrame, es), 32);
        assert_eq!(offset_of!(TrapFrame, ds), 36);
        assert_eq!(offset_of!(TrapFrame, trapno), 40);
        assert_eq!(offset_of!(TrapFrame, err), 44);
        assert_eq!(offset_of!(TrapFrame, eip), 48);
        assert_eq!(offset_of!(TrapFrame, cs), 52);
        assert_eq!(offset_of!(TrapFrame, eflags), 56);
        assert_eq!(offset_of!(TrapFrame, esp), 60);
        assert_eq!(offset_of!(TrapFrame, ss), 64);
    }

    #[test]
    fn user_page_fault_dump() {
        let tf = user_page_fault();
        let text = tf.dump(VirtualAddress::new(0xDEAD_B000)).to_string();
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(
            lines,
            [
                "  edi  0x00000000",
                "  esi  0x00000000",
                "  ebp  0x00000000",
                "  oesp 0x00000000",
                "  ebx  0x00000000",
                "  edx  0x00000000",
                "  ecx  0x00000000",
                "  eax  0x00000011",
                "  es   0x----0023",
                "  ds   0x----0023",
                "  trap 0x0000000e Page Fault",
                "  cr2  0xdeadb000",
                "  err  0x00000006 [user, write, not-present]",
                "  eip  0x00800039",
                "  cs   0x----001b",
                "  flag 0x00000292",
                "  esp  0xeebfdfd0",
                "  ss   0x----0023",
            ]
        );
        assert!(text.starts_with("TRAP frame at "));
    }

    #[test]
    fn kernel_frame_omits_stack_and_cr2() {
        let tf = TrapFrame {
            trapno: 13,
            err: 0x10,
            cs: GD_KT,
            ..TrapFrame::default()
        };
        let text = tf.dump(VirtualAddress::new(0x1234)).to_string();
        assert!(text.contains("  trap 0x0000000d General Protection\n"));
        assert!(text.contains("  err  0x00000010\n"));
        assert!(!text.contains("cr2"));
        assert!(!text.contains("\n  esp "));
        assert!(text.contains("\n  oesp "));
        assert!(text.ends_with("  flag 0x00000000"));
    }

    #[test]
    fn only_ring_3_is_user_mode() {
        let ring1 = TrapFrame {
            cs: GD_KT | 1,
            ..TrapFrame::default()
        };
        assert_eq!(ring1.ring(), Ring::Ring1);
        assert!(!ring1.from_user());
        assert!(user_page_fault().from_user());
    }

    #[test]
    fn return_value_lands_in_eax() {
        let mut tf = user_page_fault();
        tf.set_return_value(-3);
        assert_eq!(tf.regs.eax, 0xFFFF_FFFD);
        assert!(tf.from_user());
    }
}
