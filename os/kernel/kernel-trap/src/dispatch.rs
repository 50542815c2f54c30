//! # Trap Dispatch
//!
//! ```text
//! entry stub ─► trap ─► handle ─┬─ user frame? copy into the environment
//!                               ├─ dispatch by VECTORS route
//!                               │    PageFault ─► handle_page_fault
//!                               │    Monitor   ─► Monitor::enter
//!                               │    Syscall   ─► SyscallHandler, result in eax,
//!                               │                 resume the caller directly
//!                               │    Unhandled ─► dump; kernel panics, user dies
//!                               └─ current environment must be running
//!                  ◄─ resume ◄──┘
//! ```
//!
//! A user-mode trap is handled on the environment's saved frame, not on the
//! one the entry stub pushed: whatever the handlers change there is what the
//! environment resumes from.

use crate::cpu::TrapCpu;
use crate::env::{EnvId, EnvStatus, Environments, Monitor, SyscallHandler};
use crate::page_fault::handle_page_fault;
use crate::syscall::SyscallArgs;
use crate::trap_frame::TrapFrame;
use crate::vectors::{Route, route, trap_name};
use kernel_memory_addresses::VirtualAddress;
use log::{debug, error, info};

/// Outcome of dispatching one trap.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Disposition {
    /// Handled; resume where the trap came from.
    Resume,
    /// A system call completed with `value`, already stored in `eax`.
    SyscallReturn { value: i32 },
    /// The environment that caused the trap was destroyed.
    Destroyed { env: EnvId },
}

/// Where [`Dispatcher::trap`] leaves the kernel to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ResumeTarget {
    /// The environment, from its saved frame.
    Env(EnvId),
    /// The frame the entry stub pushed. Only a system call made from kernel
    /// mode returns this way.
    TrapFrame,
}

/// The frame a trap is handled on.
enum Slot<'f> {
    /// The saved frame of an environment, looked up on every access.
    Saved(EnvId),
    /// The frame on the kernel stack.
    Stack(&'f mut TrapFrame),
}

fn slot_frame<'s, E: Environments>(envs: &'s mut E, slot: &'s mut Slot<'_>) -> &'s mut TrapFrame {
    match slot {
        Slot::Saved(env) => envs.trap_frame_mut(*env),
        Slot::Stack(frame) => &mut **frame,
    }
}

/// Routes traps to the page-fault handler, the monitor and the system call
/// layer.
pub struct Dispatcher<'a, E, S, M> {
    envs: &'a mut E,
    syscalls: &'a mut S,
    monitor: &'a mut M,
}

impl<'a, E, S, M> Dispatcher<'a, E, S, M>
where
    E: Environments,
    S: SyscallHandler<E>,
    M: Monitor,
{
    pub const fn new(envs: &'a mut E, syscalls: &'a mut S, monitor: &'a mut M) -> Self {
        Self {
            envs,
            syscalls,
            monitor,
        }
    }

    /// Handle one trap on `frame`.
    ///
    /// `fault_address` is the `CR2` value sampled on entry; only page faults
    /// look at it.
    ///
    /// # Panics
    /// On a kernel-mode page fault or any other unhandled kernel-mode trap.
    pub fn dispatch(&mut self, frame: &mut TrapFrame, fault_address: VirtualAddress) -> Disposition {
        self.dispatch_on(Slot::Stack(frame), fault_address)
    }

    fn dispatch_on(&mut self, mut slot: Slot<'_>, fault_address: VirtualAddress) -> Disposition {
        let frame = *slot_frame(&mut *self.envs, &mut slot);
        match route(frame.trapno) {
            Route::PageFault => handle_page_fault(&mut *self.envs, &frame, fault_address),
            Route::Monitor => {
                self.monitor.enter(slot_frame(&mut *self.envs, &mut slot));
                Disposition::Resume
            }
            Route::Syscall => {
                let SyscallArgs { number, args } = frame.syscall_args();
                let value = self.syscalls.syscall(&mut *self.envs, number, args);
                // The handler may have rewritten the saved frame; only eax is ours.
                slot_frame(&mut *self.envs, &mut slot).set_return_value(value);
                Disposition::SyscallReturn { value }
            }
            Route::Unhandled => {
                error!("{}", frame.dump(fault_address));
                assert!(frame.from_user(), "unhandled trap in kernel");
                let Some(env) = self.envs.current() else {
                    panic!("unhandled user trap without a current environment");
                };
                self.envs.destroy(env);
                Disposition::Destroyed { env }
            }
        }
    }

    /// Everything [`trap`](Self::trap) does short of leaving the kernel.
    /// Returns where to resume.
    ///
    /// A system call resumes its caller straight away. Every other trap ends
    /// in the current environment, which must be running.
    ///
    /// # Panics
    /// If interrupts are enabled, if a user-mode trap arrives with no current
    /// environment, if no environment is running afterwards, or on any fatal
    /// condition of [`dispatch`](Self::dispatch).
    pub fn handle<C: TrapCpu>(&mut self, cpu: &C, frame: &mut TrapFrame) -> ResumeTarget {
        // Read before anything else can fault and overwrite it.
        let fault_address = cpu.fault_address();
        cpu.clear_direction_flag();
        let trapno = frame.trapno;
        assert!(
            !cpu.interrupts_enabled(),
            "trap {trapno} entered with interrupts enabled"
        );
        info!("trap {trapno:#x} ({}) from {}", trap_name(trapno), frame.ring());

        let caller = if frame.from_user() {
            let Some(env) = self.envs.current() else {
                panic!("trap from user mode without a current environment");
            };
            *self.envs.trap_frame_mut(env) = *frame;
            Some(env)
        } else {
            None
        };
        let disposition = match caller {
            Some(env) => self.dispatch_on(Slot::Saved(env), fault_address),
            None => self.dispatch_on(Slot::Stack(frame), fault_address),
        };
        debug!("trap {trapno:#x}: {disposition:?}");

        if let Disposition::SyscallReturn { .. } = disposition {
            return caller.map_or(ResumeTarget::TrapFrame, ResumeTarget::Env);
        }

        let current = self.envs.current();
        let running = current.filter(|env| self.envs.status(*env) == EnvStatus::Running);
        let Some(env) = running else {
            panic!("no running environment to resume after trap {trapno}");
        };
        ResumeTarget::Env(env)
    }

    /// Entry point of every trap stub: handle the trap and leave the kernel.
    pub fn trap<C: TrapCpu>(&mut self, cpu: &C, frame: &mut TrapFrame) -> ! {
        match self.handle(cpu, frame) {
            ResumeTarget::Env(env) => self.envs.resume(env),
            ResumeTarget::TrapFrame => self.envs.resume_frame(frame),
        }
    }
}
