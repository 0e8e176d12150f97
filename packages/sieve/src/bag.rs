//! A fast, unordered, index-addressed collection.
//!
//! `IndexedBag` has two personalities. Used through `add`/`remove_at` it is an
//! unordered list with O(1) removal (the last element is swapped into the
//! hole). Used through `set`/`safe_get` it is a sparse array addressed by an
//! integer key, growing whenever a key lands past the end.

use std::fmt::{self, Debug, Formatter};

use crate::error::{Error, Result};

const DEFAULT_CAPACITY: usize = 64;

/// An unordered collection of optional slots.
pub struct IndexedBag<T> {
    data: Vec<Option<T>>,
    size: usize,
}

impl<T> IndexedBag<T> {
    /// Create a new bag with the default capacity.
    pub fn new() -> IndexedBag<T> {
        IndexedBag::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new bag with room for `capacity` slots.
    pub fn with_capacity(capacity: usize) -> IndexedBag<T> {
        let mut data = Vec::new();
        data.resize_with(capacity, || None);
        IndexedBag {
            data,
            size: 0,
        }
    }

    /// Return the logical size of the bag.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the logical size of the bag is zero.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Return the number of slots the bag can address without growing.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns true if `index` is addressable without growing.
    pub fn is_index_within_bounds(&self, index: usize) -> bool {
        index < self.capacity()
    }

    /// Fetch the slot at `index`.
    ///
    /// Fails with `Error::OutOfRange` when `index` is past the current capacity.
    pub fn get(&self, index: usize) -> Result<Option<&T>> {
        match self.data.get(index) {
            Some(slot) => Ok(slot.as_ref()),
            None => Err(Error::OutOfRange {
                index,
                capacity: self.capacity(),
            }),
        }
    }

    /// Fetch the slot at `index` mutably.
    ///
    /// Fails with `Error::OutOfRange` when `index` is past the current capacity.
    pub fn get_mut(&mut self, index: usize) -> Result<Option<&mut T>> {
        let capacity = self.capacity();
        match self.data.get_mut(index) {
            Some(slot) => Ok(slot.as_mut()),
            None => Err(Error::OutOfRange { index, capacity }),
        }
    }

    /// Fetch the slot at `index`, growing the bag instead of failing.
    pub fn safe_get(&mut self, index: usize) -> Option<&T> {
        self.grow_for(index);
        self.data[index].as_ref()
    }

    /// Fetch the slot at `index` mutably, growing the bag instead of failing.
    pub fn safe_get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.grow_for(index);
        self.data[index].as_mut()
    }

    /// Append an item at the end of the bag.
    pub fn add(&mut self, value: T) {
        if self.size == self.data.len() {
            let capacity = (self.data.len() * 3) / 2 + 1;
            self.grow(capacity);
        }

        self.data[self.size] = Some(value);
        self.size += 1;
    }

    /// Store an item at `index`, growing if needed.
    ///
    /// This redefines the logical size of the bag as `index + 1`.
    pub fn set(&mut self, index: usize, value: T) {
        self.ensure_capacity(index);
        self.size = index + 1;
        self.data[index] = Some(value);
    }

    /// Store an item at `index` as a sparse slot, growing if needed.
    ///
    /// The logical size only ever grows to cover `index`. Returns the previous
    /// occupant of the slot.
    pub fn insert(&mut self, index: usize, value: T) -> Option<T> {
        self.ensure_capacity(index);
        self.size = self.size.max(index + 1);
        self.data[index].replace(value)
    }

    /// Get the item at `index`, storing the result of `make` there first if
    /// the slot is empty. Grows like `insert`.
    pub fn get_or_insert_with(&mut self, index: usize, make: impl FnOnce() -> T) -> &mut T {
        self.ensure_capacity(index);
        self.size = self.size.max(index + 1);
        self.data[index].get_or_insert_with(make)
    }

    /// Take the item out of the slot at `index`, leaving it empty.
    ///
    /// Unlike `remove_at`, no other slot moves and the size is unchanged.
    pub fn take(&mut self, index: usize) -> Option<T> {
        self.data.get_mut(index).and_then(|slot| slot.take())
    }

    /// Remove the item at `index`, moving the last item into its place.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.size {
            return None;
        }

        self.size -= 1;
        let removed = self.data[index].take();
        if index != self.size {
            self.data[index] = self.data[self.size].take();
        }
        removed
    }

    /// Remove and return the last item in the bag.
    pub fn remove_last(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }

        self.size -= 1;
        self.data[self.size].take()
    }

    /// Remove every slot, releasing the held items.
    pub fn clear(&mut self) {
        for slot in self.data.iter_mut() {
            *slot = None;
        }
        self.size = 0;
    }

    /// Make sure `index` is addressable.
    pub fn ensure_capacity(&mut self, index: usize) {
        if index >= self.capacity() {
            self.grow((index * 2).max(index + 1));
        }
    }

    fn grow_for(&mut self, index: usize) {
        if index >= self.capacity() {
            self.grow((index * 7) / 4 + 1);
        }
    }

    fn grow(&mut self, capacity: usize) {
        if capacity > self.data.len() {
            self.data.resize_with(capacity, || None);
        }
    }

    /// Iterate over the occupied slots within the logical size.
    pub fn iter(&self) -> impl Iterator<Item=&T> + '_ {
        self.data[..self.size].iter().filter_map(|slot| slot.as_ref())
    }

    /// Iterate mutably over the occupied slots within the logical size.
    pub fn iter_mut(&mut self) -> impl Iterator<Item=&mut T> + '_ {
        self.data[..self.size].iter_mut().filter_map(|slot| slot.as_mut())
    }

    /// Iterate over every occupied slot with its index, regardless of the
    /// logical size.
    pub fn occupied(&self) -> impl Iterator<Item=(usize, &T)> + '_ {
        self.data.iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|v| (idx, v)))
    }
}

impl<T: PartialEq> IndexedBag<T> {
    /// Returns true if the bag holds `value` within its logical size.
    pub fn contains(&self, value: &T) -> bool {
        self.iter().any(|v| v == value)
    }

    /// Remove the first occurrence of `value`, moving the last item into its
    /// place.
    ///
    /// Returns true if the value was found.
    pub fn remove(&mut self, value: &T) -> bool {
        let position = self.data[..self.size].iter()
            .position(|slot| slot.as_ref() == Some(value));

        match position {
            Some(idx) => {
                self.remove_at(idx);
                true
            }
            None => false,
        }
    }
}

impl<T> Default for IndexedBag<T> {
    fn default() -> IndexedBag<T> {
        IndexedBag::new()
    }
}

impl<T: Debug> Debug for IndexedBag<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_add_and_remove() {
        let mut bag = IndexedBag::with_capacity(2);
        bag.add('a');
        bag.add('b');
        bag.add('c');
        assert_eq!(bag.len(), 3);
        assert!(bag.capacity() >= 3);

        assert_eq!(bag.remove_at(0), Some('a'));
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get(0).unwrap(), Some(&'c'));
        assert_eq!(bag.get(1).unwrap(), Some(&'b'));

        assert!(bag.remove(&'b'));
        assert!(!bag.remove(&'b'));
        assert_eq!(bag.iter().collect::<Vec<_>>(), vec![&'c']);

        assert_eq!(bag.remove_last(), Some('c'));
        assert_eq!(bag.remove_last(), None);
        assert!(bag.is_empty());
    }

    #[test]
    fn test_get_out_of_range() {
        let mut bag: IndexedBag<u32> = IndexedBag::with_capacity(4);
        assert_eq!(bag.get(3).unwrap(), None);
        assert_eq!(bag.get(4), Err(Error::OutOfRange { index: 4, capacity: 4 }));

        assert_eq!(bag.safe_get(40), None);
        assert!(bag.capacity() > 40);
        assert_eq!(bag.get(40).unwrap(), None);
    }

    #[test]
    fn test_sparse_set() {
        let mut bag = IndexedBag::with_capacity(0);
        bag.set(10, "ten");
        assert_eq!(bag.len(), 11);

        bag.set(3, "three");
        assert_eq!(bag.len(), 4);
        assert_eq!(bag.get(10).unwrap(), Some(&"ten"));

        assert_eq!(bag.take(10), Some("ten"));
        assert_eq!(bag.take(10), None);
        assert_eq!(bag.take(1000), None);
        assert_eq!(bag.occupied().collect::<Vec<_>>(), vec![(3, &"three")]);
    }

    #[test]
    fn test_clear_releases_sparse_slots() {
        let mut bag = IndexedBag::new();
        bag.set(20, 1);
        bag.set(2, 2);
        bag.clear();

        assert!(bag.is_empty());
        assert_eq!(bag.get(20).unwrap(), None);
        assert_eq!(bag.occupied().count(), 0);
    }
}
