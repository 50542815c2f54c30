//! # Physical Frame Allocation
//!
//! This crate owns physical memory: which frames are free, who references
//! the others, and how the kernel reaches their contents.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │             kernel-vmem AddressSpace                │
//! │    • walk / insert / remove / lookup                │
//! └───────────┬───────────────────────────┬─────────────┘
//!             │ FrameAlloc                │ PhysMapper
//! ┌───────────▼─────────────┐ ┌───────────▼─────────────┐
//! │  Frame Allocator        │ │  Kernel-Window Mapper   │
//! │  • LIFO free list       │ │  • PA + KERNBASE        │
//! │  • per-frame refcounts  │ │  • bounds-checked       │
//! └─────────────────────────┘ └─────────────────────────┘
//! ```
//!
//! ## Components
//!
//! - [`frame_alloc`]: descriptor array, free list and reference counts.
//! - [`phys_mapper`]: the kernel window as a [`PhysMapper`](kernel_vmem::PhysMapper).
//! - [`global`]: the boot-published singleton.
//!
//! ## Frame lifetime
//!
//! ```text
//!   Reserved ────────────────────────────── (never changes)
//!
//!   Free ──allocate──► Allocated(0) ──add_ref──► Allocated(n)
//!    ▲                      │                        │
//!    └────────free──────────┘◄──release (n → 0)──────┘
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod frame_alloc;
pub mod global;
pub mod phys_mapper;

pub use frame_alloc::{FrameAllocator, FrameDescriptor, FrameState};
pub use phys_mapper::KernelWindowMapper;
