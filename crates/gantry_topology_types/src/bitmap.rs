use bitvec::prelude::{bitvec, BitVec, Lsb0};

#[cfg(test)]
#[path = "bitmap_test.rs"]
mod bitmap_test;

/// A fixed-width bitmap over dense indices (node or switch positions).
///
/// The width is chosen at allocation and never changes; binary operations
/// require both operands to share it. All operations are linear in the number
/// of backing words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    bits: BitVec<u64, Lsb0>,
}

impl Bitmap {
    /// Allocates a zeroed bitmap covering `len` indices.
    pub fn new(len: usize) -> Self {
        Self { bits: bitvec![u64, Lsb0; 0; len] }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Overwrites this bitmap with the contents of `other` (same width).
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.len(), other.len());
        self.bits.copy_from_bitslice(&other.bits);
    }

    pub fn test(&self, index: usize) -> bool {
        self.bits[index]
    }

    pub fn set(&mut self, index: usize) {
        self.bits.set(index, true);
    }

    pub fn clear(&mut self, index: usize) {
        self.bits.set(index, false);
    }

    /// Population count.
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Population count of `self & other`, without materializing the AND.
    pub fn overlap_count(&self, other: &Self) -> usize {
        debug_assert_eq!(self.len(), other.len());
        self.raw()
            .iter()
            .zip(other.raw())
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// True if `self & other` has any bit set.
    pub fn overlap_any(&self, other: &Self) -> bool {
        debug_assert_eq!(self.len(), other.len());
        self.raw().iter().zip(other.raw()).any(|(a, b)| a & b != 0)
    }

    /// True if every bit set in `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        debug_assert_eq!(self.len(), other.len());
        self.raw().iter().zip(other.raw()).all(|(a, b)| a & !b == 0)
    }

    /// `self |= other`, in place.
    pub fn union_with(&mut self, other: &Self) {
        debug_assert_eq!(self.len(), other.len());
        for (dst, src) in self.raw_mut().iter_mut().zip(other.raw()) {
            *dst |= *src;
        }
    }

    /// `self &= other`, in place.
    pub fn intersect_with(&mut self, other: &Self) {
        debug_assert_eq!(self.len(), other.len());
        for (dst, src) in self.raw_mut().iter_mut().zip(other.raw()) {
            *dst &= *src;
        }
    }

    /// `self &= !other`, in place.
    pub fn subtract(&mut self, other: &Self) {
        debug_assert_eq!(self.len(), other.len());
        for (dst, src) in self.raw_mut().iter_mut().zip(other.raw()) {
            *dst &= !*src;
        }
    }

    pub fn first_set(&self) -> Option<usize> {
        self.bits.first_one()
    }

    pub fn last_set(&self) -> Option<usize> {
        self.bits.last_one()
    }

    /// Iterates set indices in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    fn raw(&self) -> &[u64] {
        self.bits.as_raw_slice()
    }

    fn raw_mut(&mut self) -> &mut [u64] {
        self.bits.as_raw_mut_slice()
    }
}
