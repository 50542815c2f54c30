//! # Physical Frame Allocator
//!
//! One [`FrameDescriptor`] per physical frame; descriptor `i` describes the
//! frame at physical address `i * PAGE_SIZE`. Free frames form a singly
//! linked LIFO list threaded through the descriptors, so allocation and
//! freeing are O(1).
//!
//! ```text
//! descriptors: [ R ][ F ][ F ][ A ][ F ] ... [ R ][ R ][ F ][ F ]
//!                     ▲    │         ▲ │                    │
//!                     └────┼─────────┘ └─ head ◄── ... ◄────┘
//!                          ▼
//!                         end
//! R = reserved, F = free (linked), A = allocated (counted)
//! ```
//!
//! ## Invariants
//! - A free frame has a count of zero and sits on the list exactly once.
//! - A frame with a nonzero count is never on the list.
//! - Reserved frames (page 0, the IO hole, the kernel image and everything
//!   the boot code placed after it) are never handed out.
//!
//! Violations are kernel bugs and panic at the offending caller.

use kernel_info::memory::{EXTPHYSMEM, IOPHYSMEM};
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress, PhysicalPage};
use kernel_vmem::{AllocFlags, FrameAlloc, OutOfMemory, PhysMapper};
use log::{debug, trace};

/// Allocation state of a frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameState {
    /// Never handed out.
    Reserved,
    /// On the free list; `next` is the following frame number.
    Free { next: Option<u32> },
    /// Handed out by [`FrameAllocator::allocate`].
    Allocated,
}

/// Bookkeeping for one physical frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameDescriptor {
    refs: u16,
    state: FrameState,
}

impl FrameDescriptor {
    /// Initial value for descriptor storage.
    pub const RESERVED: Self = Self {
        refs: 0,
        state: FrameState::Reserved,
    };

    #[inline]
    #[must_use]
    pub const fn ref_count(&self) -> u16 {
        self.refs
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> FrameState {
        self.state
    }
}

impl Default for FrameDescriptor {
    fn default() -> Self {
        Self::RESERVED
    }
}

/// Free-list allocator over a fixed descriptor array.
pub struct FrameAllocator<'d, M: PhysMapper> {
    descriptors: &'d mut [FrameDescriptor],
    mapper: &'d M,
    head: Option<u32>,
    free: u32,
}

/// Whether frame `n` may be handed out, given the first free byte after the
/// kernel's boot-time allocations.
const fn is_usable(n: u32, first_free: u32) -> bool {
    let pa = n as u64 * PAGE_SIZE as u64;
    let io_hole = pa >= IOPHYSMEM as u64 && pa < EXTPHYSMEM as u64;
    let kernel = pa >= EXTPHYSMEM as u64 && pa < first_free as u64;
    n != 0 && !io_hole && !kernel
}

impl<'d, M: PhysMapper> FrameAllocator<'d, M> {
    /// Take over `descriptors` and build the free list.
    ///
    /// `first_free` is the first physical address not used by the kernel
    /// image or its boot-time allocations (including `descriptors` itself).
    ///
    /// # Panics
    /// If `descriptors` describes more frames than fit in 32 bits of
    /// physical address space.
    pub fn new(descriptors: &'d mut [FrameDescriptor], mapper: &'d M, first_free: PhysicalAddress) -> Self {
        let frames = u32::try_from(descriptors.len())
            .ok()
            .filter(|n| u64::from(*n) * u64::from(PAGE_SIZE) <= 1 << 32);
        let Some(frames) = frames else {
            panic!("{} frames exceed the physical address space", descriptors.len());
        };

        let first_free = first_free.as_u32().next_multiple_of(PAGE_SIZE);
        let mut head = None;
        let mut free = 0;
        for n in 0..frames {
            let d = &mut descriptors[n as usize];
            d.refs = 0;
            d.state = if is_usable(n, first_free) {
                free += 1;
                let next = head.replace(n);
                FrameState::Free { next }
            } else {
                FrameState::Reserved
            };
        }

        debug!("frame allocator: {free} of {frames} frames free");
        Self {
            descriptors,
            mapper,
            head,
            free,
        }
    }

    /// Number of frames this allocator describes.
    #[inline]
    #[must_use]
    pub fn frames(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let n = self.descriptors.len() as u32;
        n
    }

    /// Number of frames currently on the free list.
    #[inline]
    #[must_use]
    pub const fn free_frames(&self) -> u32 {
        self.free
    }

    /// The frame containing `pa`.
    ///
    /// # Panics
    /// If `pa` lies beyond the described frames.
    #[track_caller]
    #[must_use]
    pub fn frame_containing(&self, pa: PhysicalAddress) -> PhysicalPage {
        assert!(
            pa.frame_number() < self.frames(),
            "frame_containing called with invalid pa {pa}"
        );
        pa.page()
    }

    #[must_use]
    #[track_caller]
    pub fn descriptor(&self, frame: PhysicalPage) -> &FrameDescriptor {
        let n = frame.number();
        assert!(n < self.frames(), "{frame} is not managed");
        &self.descriptors[n as usize]
    }

    #[track_caller]
    fn descriptor_mut(&mut self, frame: PhysicalPage) -> &mut FrameDescriptor {
        let n = frame.number();
        assert!(n < self.frames(), "{frame} is not managed");
        &mut self.descriptors[n as usize]
    }

    /// Take the head of the free list.
    ///
    /// With [`AllocFlags::ZERO`] the frame is filled with zero bytes;
    /// otherwise its contents are whatever the previous owner left.
    /// The returned frame has a count of zero.
    ///
    /// # Errors
    /// [`OutOfMemory`] if the free list is empty.
    pub fn allocate(&mut self, flags: AllocFlags) -> Result<PhysicalPage, OutOfMemory> {
        let n = self.head.ok_or(OutOfMemory)?;
        let frame = PhysicalPage::from_number(n);
        let d = self.descriptor_mut(frame);
        let FrameState::Free { next } = d.state else {
            panic!("free list corrupted at {frame}: {:?}", d.state);
        };
        d.state = FrameState::Allocated;
        self.head = next;
        self.free -= 1;

        if flags.zero() {
            // SAFETY: the frame was free, so nothing else refers to it.
            let bytes: &mut [u8; PAGE_SIZE as usize] = unsafe { self.mapper.phys_to_mut(frame.base()) };
            bytes.fill(0);
        }
        trace!("allocated {frame}");
        Ok(frame)
    }

    /// Return an unreferenced frame to the free list.
    ///
    /// # Panics
    /// If the frame still has references, is already free, or is reserved.
    #[track_caller]
    pub fn free(&mut self, frame: PhysicalPage) {
        let head = self.head;
        let d = self.descriptor_mut(frame);
        assert!(d.refs == 0, "freeing {frame} with {} references", d.refs);
        match d.state {
            FrameState::Allocated => d.state = FrameState::Free { next: head },
            FrameState::Free { .. } => panic!("double free of {frame}"),
            FrameState::Reserved => panic!("freeing reserved {frame}"),
        }
        self.head = Some(frame.number());
        self.free += 1;
        trace!("freed {frame}");
    }

    /// Count one more reference to `frame`.
    ///
    /// # Panics
    /// If `frame` is free or its count would overflow.
    #[track_caller]
    pub fn add_ref(&mut self, frame: PhysicalPage) {
        let d = self.descriptor_mut(frame);
        assert!(
            !matches!(d.state, FrameState::Free { .. }),
            "reference to free {frame}"
        );
        d.refs = d
            .refs
            .checked_add(1)
            .unwrap_or_else(|| panic!("reference count overflow on {frame}"));
    }

    /// Drop one reference; an allocated frame whose count reaches zero is
    /// freed. Reserved frames are only counted, never freed.
    ///
    /// # Panics
    /// If `frame` has no references.
    #[track_caller]
    pub fn release(&mut self, frame: PhysicalPage) {
        let d = self.descriptor_mut(frame);
        assert!(d.refs > 0, "release of unreferenced {frame}");
        d.refs -= 1;
        if d.refs == 0 && d.state == FrameState::Allocated {
            self.free(frame);
        }
    }

    #[must_use]
    #[track_caller]
    pub fn ref_count(&self, frame: PhysicalPage) -> u16 {
        self.descriptor(frame).refs
    }
}

impl<M: PhysMapper> FrameAlloc for FrameAllocator<'_, M> {
    #[inline]
    fn allocate(&mut self, flags: AllocFlags) -> Result<PhysicalPage, OutOfMemory> {
        Self::allocate(self, flags)
    }

    #[inline]
    #[track_caller]
    fn add_ref(&mut self, frame: PhysicalPage) {
        Self::add_ref(self, frame);
    }

    #[inline]
    #[track_caller]
    fn release(&mut self, frame: PhysicalPage) {
        Self::release(self, frame);
    }

    #[inline]
    fn ref_count(&self, frame: PhysicalPage) -> u16 {
        Self::ref_count(self, frame)
    }
}
