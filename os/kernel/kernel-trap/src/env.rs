//! The parts of the environment (process) layer the trap path relies on.

use crate::trap_frame::TrapFrame;
use core::fmt;

/// Environment identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EnvId(pub u32);

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EnvStatus {
    Free,
    Dying,
    Runnable,
    Running,
    NotRunnable,
}

/// The environment table.
pub trait Environments {
    /// The environment that was running when the trap arrived.
    fn current(&self) -> Option<EnvId>;

    fn status(&self, env: EnvId) -> EnvStatus;

    /// Saved registers of `env`; it resumes from these.
    fn trap_frame_mut(&mut self, env: EnvId) -> &mut TrapFrame;

    /// Tear `env` down. The table may pick another current environment;
    /// whatever is current and running afterwards is resumed.
    fn destroy(&mut self, env: EnvId);

    /// Return to user mode in `env` from its saved frame.
    fn resume(&mut self, env: EnvId) -> !;

    /// Pop `frame` and return to the code it interrupted.
    fn resume_frame(&mut self, frame: &TrapFrame) -> !;
}

/// Kernel side of the system call interface.
///
/// For a call from user mode the caller's saved frame in `envs` is already
/// up to date and is what the caller resumes from; changes made to it here
/// are kept. The caller is resumed as soon as this returns, whatever its
/// status; a call that tears its caller down must switch away instead.
pub trait SyscallHandler<E: Environments + ?Sized> {
    /// Returns the value for the caller's `eax`; negative values are errors.
    fn syscall(&mut self, envs: &mut E, number: u32, args: [u32; 5]) -> i32;
}

/// Interactive kernel monitor, entered on breakpoints.
pub trait Monitor {
    fn enter(&mut self, frame: &mut TrapFrame);
}
