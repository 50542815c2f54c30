//! # Traps
//!
//! Gate table, task state and the trap dispatcher for a single-CPU 32-bit
//! kernel.
//!
//! ## Setup
//! 1. [`init_traps`] builds the gate table from [`VECTORS`] and the entry
//!    stub addresses, once.
//! 2. [`init_traps_per_processor`] sets `ss0:esp0` in the TSS, installs the
//!    TSS descriptor, loads the task register and the gate table.
//!
//! ## Handling
//! Every entry stub pushes a [`TrapFrame`] and calls
//! [`Dispatcher::trap`], which never returns: it resumes the current
//! environment, or the trapped code itself after a kernel-mode system call,
//! or panics.
//!
//! The environment layer, the system call table and the monitor are
//! outside this crate; they plug in through [`Environments`],
//! [`SyscallHandler`] and [`Monitor`]. [`TrapCpu`] abstracts the handful of
//! privileged instructions involved.

#![cfg_attr(not(test), no_std)]
#![allow(unsafe_code)]

pub mod cpu;
pub mod dispatch;
pub mod env;
pub mod gate;
pub mod page_fault;
mod privilege;
mod syscall;
pub mod trap_frame;
pub mod tss;
mod user_memory;
pub mod vectors;

pub use crate::cpu::TrapCpu;
#[cfg(target_arch = "x86")]
pub use crate::cpu::X86Cpu;
pub use crate::dispatch::{Dispatcher, Disposition, ResumeTarget};
pub use crate::env::{EnvId, EnvStatus, Environments, Monitor, SyscallHandler};
pub use crate::gate::{GateDescriptor, Idt, gate_table, init_traps};
pub use crate::page_fault::{PageFaultError, handle_page_fault};
pub use crate::privilege::Ring;
pub use crate::syscall::SyscallArgs;
pub use crate::trap_frame::{PushRegs, TrapFrame};
pub use crate::tss::{TaskState, TssDescriptor, init_traps_per_processor, task_state};
pub use crate::user_memory::assert_user_range;
pub use crate::vectors::{GateType, Route, VECTORS, VectorInfo, trap_name};
