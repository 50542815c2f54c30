//! # Kernel Layout Configuration
//!
//! Compile-time constants shared by the paging, allocator and trap crates.
//! Everything here is `const`, so a misconfigured layout fails the build
//! rather than the boot.
//!
//! ## Virtual Address Space Layout (32-bit)
//!
//! ```text
//! 0xFFFF_FFFF ┌─────────────────────────────────┐
//!             │  Remapped physical memory       │  RW/--
//! KERNBASE    ├─────────────────────────────────┤ 0xF000_0000 = KSTACKTOP
//!             │  Kernel stack + guard gap       │  RW/--
//!             ├─────────────────────────────────┤
//!             │  Memory-mapped I/O              │  RW/--
//! ULIM        ├─────────────────────────────────┤ 0xEF80_0000
//!             │  Read-only views for user space │  R-/R-
//! UTOP        ├─────────────────────────────────┤ 0xEEC0_0000
//!             │  User exception stack, stack,   │  RW/RW
//!             │  program text and data          │
//! 0x0000_0000 └─────────────────────────────────┘
//! ```
//!
//! User code may never touch anything at or above [`memory::ULIM`], whatever
//! the page-table permissions say.
//!
//! ## Segments ([`segments`])
//!
//! GDT selectors the trap gates and the task state refer to. The GDT itself
//! is built by boot code; this crate only fixes where things live in it.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
pub mod segments;
