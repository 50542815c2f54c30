use crate::trap_frame::TrapFrame;

/// A system call as it arrives through the `int 48` gate.
///
/// The number travels in `eax`, the arguments in `edx`, `ecx`, `ebx`, `edi`
/// and `esi`. The result goes back in `eax`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SyscallArgs {
    pub number: u32,
    pub args: [u32; 5],
}

impl SyscallArgs {
    #[must_use]
    pub const fn from_frame(tf: &TrapFrame) -> Self {
        let r = &tf.regs;
        Self {
            number: r.eax,
            args: [r.edx, r.ecx, r.ebx, r.edi, r.esi],
        }
    }
}
