//! # Signatures
//!
//! A signature is a fixed-width bitset. On an entity, bit *i* is set iff the
//! entity owns a component whose [`ComponentType`] is *i*. On a system, it is
//! the set of components an entity must own to be of interest.

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Maximum number of component types (signature width).
pub const MAX_COMPONENTS: usize = 32;

/// Bit index assigned to a component type at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ComponentType(u8);

impl ComponentType {
    /// Creates a component type from its bit index.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not fit in a signature.
    #[inline]
    #[must_use]
    pub const fn new(index: u8) -> Self {
        assert!((index as usize) < MAX_COMPONENTS, "component type index out of range");
        Self(index)
    }

    /// Returns the bit index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Fixed-width component bitset.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Signature(u32);

impl Signature {
    /// Signature with no bits set.
    pub const EMPTY: Self = Self(0);

    /// Creates a signature from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Sets the bit for `component`.
    #[inline]
    pub fn set(&mut self, component: ComponentType) {
        self.0 |= 1 << component.0;
    }

    /// Clears the bit for `component`.
    #[inline]
    pub fn reset(&mut self, component: ComponentType) {
        self.0 &= !(1 << component.0);
    }

    /// Returns a copy with the bit for `component` set.
    #[inline]
    #[must_use]
    pub const fn with(self, component: ComponentType) -> Self {
        Self(self.0 | (1 << component.0))
    }

    /// Checks the bit for `component`.
    #[inline]
    #[must_use]
    pub const fn test(self, component: ComponentType) -> bool {
        (self.0 & (1 << component.0)) != 0
    }

    /// Returns `true` if every bit of `required` is also set here.
    ///
    /// This is the system-interest test `(self & required) == required`.
    #[inline]
    #[must_use]
    pub const fn contains(self, required: Self) -> bool {
        (self.0 & required.0) == required.0
    }

    /// Returns `true` if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of set bits.
    #[inline]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl FromIterator<ComponentType> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentType>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl BitAnd for Signature {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for Signature {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:#034b})", self.0)
    }
}
