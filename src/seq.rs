use std::slice;

use ecow::EcoVec;

use crate::error::SeqError;

/// Capacity of a freshly created [`Seq`].
pub const INITIAL_CAPACITY: usize = 255;

/// An append-only sequence whose capacity doubles whenever it fills up.
///
/// Storage is reference counted, so cloning a `Seq` hands out another
/// handle to the same elements instead of copying them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seq<T> {
    inner: EcoVec<T>,
}

impl<T: Clone> Seq<T> {
    pub fn new() -> Seq<T> {
        Seq {
            inner: EcoVec::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.inner.len() >= self.inner.capacity() {
            let additional = self.inner.capacity().max(1);
            self.inner.reserve(additional);
        }
        self.inner.push(item);
    }

    pub fn get(&self, index: usize) -> Result<&T, SeqError> {
        self.inner.get(index).ok_or(SeqError::IndexOutOfRange {
            index,
            len: self.inner.len(),
        })
    }
}

impl<T> Seq<T> {
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn last(&self) -> Option<&T> {
        self.inner.last()
    }

    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.inner.iter()
    }
}

impl<T: Clone> Default for Seq<T> {
    fn default() -> Seq<T> {
        Seq::new()
    }
}

impl<'a, T> IntoIterator for &'a Seq<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone> FromIterator<T> for Seq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Seq<T> {
        let mut seq = Seq::new();
        for item in iter {
            seq.push(item);
        }
        seq
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn starts_empty_with_initial_capacity() {
        let seq: Seq<u32> = Seq::new();
        assert!(seq.is_empty());
        assert!(seq.capacity() >= INITIAL_CAPACITY);
    }

    #[test]
    fn preserves_push_order_across_growth() {
        for n in [1, 255, 256, 511, 512, 1000] {
            let mut seq = Seq::new();
            for i in 0..n {
                seq.push(i);
            }
            assert_eq!(seq.len(), n);
            assert_eq!(seq.last(), Some(&(n - 1)));
            for i in 0..n {
                assert_eq!(seq.get(i), Ok(&i));
            }
        }
    }

    #[test]
    fn capacity_at_least_doubles_when_full() {
        let mut seq = Seq::new();
        let before = seq.capacity();
        for i in 0..=before {
            seq.push(i);
        }
        assert!(seq.capacity() >= before * 2);
    }

    #[test]
    fn out_of_range_index_fails() {
        let seq: Seq<char> = ['a', 'b'].into_iter().collect();
        assert_eq!(
            seq.get(2),
            Err(SeqError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn clones_share_elements() {
        let mut seq = Seq::new();
        seq.push(String::from("int"));
        let copy = seq.clone();
        seq.push(String::from("char"));
        assert_eq!(copy.as_slice(), ["int".to_string()]);
        assert_eq!(seq.len(), 2);
    }
}
