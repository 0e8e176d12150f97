//! A growable bit vector with word-level scans.
//!
//! Every entity/aspect comparison in the crate is a `BitVector` operation, so
//! the scans here work a word at a time rather than a bit at a time.

use std::fmt::{self, Debug, Formatter};

use bit_vec::BitVec;

/// The number of bits in one backing word.
pub const WORD_BITS: usize = 32;

/// A bit vector which grows on demand when bits are set.
///
/// Indices are never bounds-checked against a logical length: reading past
/// the end yields `false`, setting past the end grows the backing storage in
/// whole words.
#[derive(Clone, Default)]
pub struct BitVector {
    bits: BitVec<u32>,
}

impl BitVector {
    /// Create a new, empty, bit vector.
    pub fn new() -> BitVector {
        BitVector {
            bits: BitVec::default(),
        }
    }

    /// Create a bit vector with room for at least `nbits` bits.
    pub fn with_capacity(nbits: usize) -> BitVector {
        BitVector {
            bits: BitVec::from_elem(words_for(nbits) * WORD_BITS, false),
        }
    }

    /// Return the backing words of this vector.
    pub fn words(&self) -> &[u32] {
        self.bits.storage()
    }

    fn word(&self, index: usize) -> u32 {
        self.words().get(index).copied().unwrap_or(0)
    }

    fn ensure(&mut self, index: usize) {
        let len = self.bits.len();
        if index < len {
            return;
        }

        let required = words_for(index + 1) * WORD_BITS;
        let target = required.max(len * 2);
        self.bits.grow(target - len, false);
    }

    /// Set the bit at `index`.
    pub fn set(&mut self, index: usize) {
        self.ensure(index);
        self.bits.set(index, true);
    }

    /// Clear the bit at `index`.
    pub fn clear(&mut self, index: usize) {
        if index < self.bits.len() {
            self.bits.set(index, false);
        }
    }

    /// Clear every bit, keeping the backing storage.
    pub fn clear_all(&mut self) {
        self.bits.clear();
    }

    /// Returns true if the bit at `index` is set.
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).unwrap_or(false)
    }

    /// Find the first set bit at or after `from`.
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        let words = self.words();
        let mut u = from / WORD_BITS;
        if u >= words.len() {
            return None;
        }

        let mut word = words[u] & (u32::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                return Some(u * WORD_BITS + word.trailing_zeros() as usize);
            }

            u += 1;
            if u == words.len() {
                return None;
            }
            word = words[u];
        }
    }

    /// Returns true if any bit is set in both vectors.
    pub fn intersects(&self, other: &BitVector) -> bool {
        self.words().iter()
            .zip(other.words().iter())
            .any(|(a, b)| (a & b) != 0)
    }

    /// Returns true if every bit set in `other` is also set in this vector.
    pub fn contains_all(&self, other: &BitVector) -> bool {
        other.words().iter()
            .enumerate()
            .all(|(idx, w)| (w & !self.word(idx)) == 0)
    }

    /// Returns true if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words().iter().all(|w| *w == 0)
    }

    /// Count the set bits.
    pub fn count_ones(&self) -> usize {
        self.words().iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate over the indices of the set bits, in ascending order.
    pub fn ones(&self) -> Ones<'_> {
        Ones {
            bits: self,
            next: 0,
        }
    }
}

fn words_for(nbits: usize) -> usize {
    (nbits + WORD_BITS - 1) / WORD_BITS
}

impl PartialEq for BitVector {
    fn eq(&self, other: &BitVector) -> bool {
        let len = self.words().len().max(other.words().len());
        (0..len).all(|idx| self.word(idx) == other.word(idx))
    }
}

impl Eq for BitVector {}

impl Debug for BitVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ones()).finish()
    }
}

/// An iterator over the set bits of a `BitVector`.
pub struct Ones<'a> {
    bits: &'a BitVector,
    next: usize,
}

impl<'a> Iterator for Ones<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let found = self.bits.next_set_bit(self.next)?;
        self.next = found + 1;
        Some(found)
    }
}
