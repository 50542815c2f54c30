use bitfield_struct::bitfield;
use kernel_memory_addresses::PhysicalPage;

/// A single 32-bit IA-32 paging entry in its raw bitfield form.
///
/// Page-directory entries (PDE) and page-table entries (PTE) share this
/// layout; [`PdEntry`](crate::PdEntry) and [`PtEntry`](crate::PtEntry) wrap it
/// with level-specific helpers.
///
/// ### Bit layout
///
/// | Bits  | Name       | Meaning |
/// |-------|------------|---------|
/// | 0     | `P`        | Present |
/// | 1     | `RW`       | Writable |
/// | 2     | `US`       | User-mode accessible |
/// | 3     | `PWT`      | Write-through caching |
/// | 4     | `PCD`      | Cache disable |
/// | 5     | `A`        | Accessed (set by the CPU) |
/// | 6     | `D`        | Dirty (set by the CPU, leaf only) |
/// | 7     | `PS`/`PAT` | Page size in a PDE, PAT in a PTE |
/// | 8     | `G`        | Global (leaf only) |
/// | 9–11  | `AVL`      | Available to software |
/// | 12–31 | frame      | Physical frame number |
///
/// ### Example
/// ```rust
/// # use kernel_vmem::PageEntryBits;
/// # use kernel_memory_addresses::PhysicalPage;
/// let e = PageEntryBits::new()
///     .with_present(true)
///     .with_writable(true)
///     .with_frame(PhysicalPage::from_number(0x123));
/// assert_eq!(e.into_bits(), 0x0012_3003);
/// ```
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct PageEntryBits {
    /// Present (P, bit 0).
    pub present: bool,

    /// Writable (RW, bit 1).
    pub writable: bool,

    /// User/Supervisor (US, bit 2).
    pub user: bool,

    /// Page Write-Through (PWT, bit 3).
    pub write_through: bool,

    /// Page Cache Disable (PCD, bit 4).
    pub cache_disabled: bool,

    /// Accessed (A, bit 5).
    pub accessed: bool,

    /// Dirty (D, bit 6), leaf only.
    pub dirty: bool,

    /// Page Size (PS) in a PDE; PAT in a PTE (bit 7).
    ///
    /// 4 MiB pages are never created; a set PS bit in a directory entry is
    /// treated as corruption.
    pub large_page: bool,

    /// Global (G, bit 8), leaf only.
    pub global: bool,

    /// Available to software (bits 9..=11).
    #[bits(3)]
    pub available: u8,

    /// Physical frame number (bits 12..=31).
    #[bits(20)]
    frame_number: u32,
}

impl PageEntryBits {
    #[inline]
    #[must_use]
    pub const fn with_frame(self, frame: PhysicalPage) -> Self {
        self.with_frame_number(frame.number())
    }

    #[inline]
    #[must_use]
    pub const fn frame(&self) -> PhysicalPage {
        PhysicalPage::from_number(self.frame_number())
    }

    /// Low twelve bits (flags only).
    #[inline]
    #[must_use]
    pub const fn permissions(&self) -> PagePermissions {
        #[allow(clippy::cast_possible_truncation)]
        PagePermissions::from_bits((self.into_bits() & PagePermissions::MASK) as u16)
    }

    /// Replace the low twelve bits with `perm`.
    #[inline]
    #[must_use]
    pub const fn with_permissions(self, perm: PagePermissions) -> Self {
        Self::from_bits((self.into_bits() & !PagePermissions::MASK) | perm.into_bits() as u32)
    }
}

/// Permission and attribute bits of an entry, without the frame number.
///
/// Bit positions are identical to [`PageEntryBits`] so the two combine with a
/// plain OR. Callers pass these to `insert` and the user-memory check.
#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub struct PagePermissions {
    pub present: bool,
    pub writable: bool,
    pub user: bool,
    pub write_through: bool,
    pub cache_disabled: bool,
    pub accessed: bool,
    pub dirty: bool,
    pub large_page: bool,
    pub global: bool,
    #[bits(3)]
    pub available: u8,
    #[bits(4)]
    __: u8,
}

impl PagePermissions {
    /// Bits of an entry that hold permissions.
    pub const MASK: u32 = 0xFFF;

    pub const NONE: Self = Self::new();
    pub const PRESENT: Self = Self::new().with_present(true);
    pub const WRITABLE: Self = Self::new().with_writable(true);
    pub const USER: Self = Self::new().with_user(true);

    /// Kernel read/write.
    pub const KERNEL_RW: Self = Self::new().with_present(true).with_writable(true);

    /// User read-only.
    pub const USER_RO: Self = Self::new().with_present(true).with_user(true);

    /// User read/write.
    pub const USER_RW: Self = Self::USER_RO.with_writable(true);

    /// Bitwise OR.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self::from_bits(self.into_bits() | other.into_bits())
    }

    /// Whether every bit of `required` is also set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, required: Self) -> bool {
        self.into_bits() & required.into_bits() == required.into_bits()
    }
}

impl core::ops::BitOr for PagePermissions {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}
