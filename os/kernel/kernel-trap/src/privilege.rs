use core::fmt;
use kernel_info::segments::RPL_MASK;

/// CPU privilege ring, as found in the low two bits of a selector.
///
/// Only [`Ring::Ring0`] (kernel) and [`Ring::Ring3`] (user) are used; the
/// middle rings exist so every selector decodes to something. No segment in
/// the GDT runs at ring 1 or 2, and [`Ring::is_user`] counts them as kernel.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
#[repr(u8)]
pub enum Ring {
    Ring0 = 0,
    Ring1 = 1,
    Ring2 = 2,
    Ring3 = 3,
}

impl Ring {
    /// Privilege level a selector requests (its RPL). For `cs` this is the
    /// privilege the interrupted code ran at.
    #[inline]
    #[must_use]
    pub const fn of_selector(selector: u16) -> Self {
        match selector & RPL_MASK {
            0 => Self::Ring0,
            1 => Self::Ring1,
            2 => Self::Ring2,
            _ => Self::Ring3,
        }
    }

    #[inline]
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether code at this ring is user code.
    #[inline]
    #[must_use]
    pub const fn is_user(self) -> bool {
        matches!(self, Self::Ring3)
    }
}

impl From<Ring> for u8 {
    #[inline]
    fn from(r: Ring) -> Self {
        r.to_u8()
    }
}

impl TryFrom<u8> for Ring {
    type Error = u8;

    #[inline]
    fn try_from(r: u8) -> Result<Self, Self::Error> {
        match r {
            0 => Ok(Self::Ring0),
            1 => Ok(Self::Ring1),
            2 => Ok(Self::Ring2),
            3 => Ok(Self::Ring3),
            _ => Err(r),
        }
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ring {}", self.to_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_info::segments::{GD_KT, GD_UT};

    #[test]
    fn selectors_decode_to_their_rpl() {
        assert_eq!(Ring::of_selector(GD_KT), Ring::Ring0);
        assert_eq!(Ring::of_selector(GD_UT | 3), Ring::Ring3);
        assert!(Ring::of_selector(GD_UT | 3).is_user());
        assert!(!Ring::of_selector(GD_UT).is_user());
    }

    #[test]
    fn only_four_rings_exist() {
        assert_eq!(Ring::try_from(3), Ok(Ring::Ring3));
        assert_eq!(Ring::try_from(4), Err(4));
        assert_eq!(u8::from(Ring::Ring2), 2);
    }
}
