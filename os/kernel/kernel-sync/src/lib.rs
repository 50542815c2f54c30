//! # Kernel synchronization primitives
//!
//! The kernel runs on a single CPU with interrupts disabled while it is
//! inside a trap, so these locks are never contended in practice. They exist
//! to make every process-wide singleton an explicit, auditable exclusion
//! point:
//!
//! * [`SyncOnceCell`] publishes a value exactly once (the gate table, the
//!   logger, the frame allocator).
//! * [`SpinLock`] guards singletons that stay mutable after boot (the task
//!   state, the frame allocator behind its cell).

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod spin_lock;
mod sync_once_cell;

pub use spin_lock::{SpinLock, SpinLockGuard};
pub use sync_once_cell::SyncOnceCell;
