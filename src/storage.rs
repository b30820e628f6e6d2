//! Inline-or-heap element storage
//!
//! [`Storage<T, N>`] backs every variable-length value in the data model
//! (`OctetString`, `BitString`, character strings, `SequenceOf`, `SetOf`).
//! While a value holds at most `N` elements they are kept inline in an
//! [`ArrayVec`]; the first push beyond that moves them, in order, into a
//! `Vec`. Codecs only ever see the `[T]` slice the storage dereferences to,
//! so the representation has no bearing on the encoding.
//!
//! A capacity of `N = 0` selects purely dynamic storage.

use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};

use arrayvec::ArrayVec;

pub enum Storage<T, const N: usize> {
    Inline(ArrayVec<T, N>),
    Heap(Vec<T>),
}

impl<T, const N: usize> Storage<T, N> {
    /// Inline capacity of this storage type; zero when purely dynamic
    pub const INLINE_CAPACITY: usize = N;

    #[must_use]
    pub const fn new() -> Self {
        if N == 0 {
            Self::Heap(Vec::new())
        } else {
            Self::Inline(ArrayVec::new_const())
        }
    }

    /// Returns `true` if the elements are currently held inline
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::Inline(arr) => arr.as_slice(),
            Self::Heap(vec) => vec.as_slice(),
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Self::Inline(arr) => arr.as_mut_slice(),
            Self::Heap(vec) => vec.as_mut_slice(),
        }
    }

    /// Appends an element, moving to the heap if the inline capacity is exhausted
    pub fn push(&mut self, value: T) {
        match self {
            Self::Heap(vec) => vec.push(value),
            Self::Inline(arr) => {
                if let Err(err) = arr.try_push(value) {
                    let mut vec = Vec::with_capacity(N * 2);
                    vec.extend(arr.drain(..));
                    vec.push(err.element());
                    *self = Self::Heap(vec);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        match self {
            Self::Inline(arr) => arr.clear(),
            Self::Heap(vec) => vec.clear(),
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Inline(arr) => arr.into_iter().collect(),
            Self::Heap(vec) => vec,
        }
    }
}

impl<T: Clone, const N: usize> Storage<T, N> {
    pub fn extend_from_slice(&mut self, items: &[T]) {
        match self {
            Self::Heap(vec) => vec.extend_from_slice(items),
            Self::Inline(arr) if arr.remaining_capacity() >= items.len() => {
                arr.extend(items.iter().cloned())
            }
            Self::Inline(arr) => {
                let mut vec = Vec::with_capacity(arr.len() + items.len());
                vec.extend(arr.drain(..));
                vec.extend_from_slice(items);
                *self = Self::Heap(vec);
            }
        }
    }
}

impl<T, const N: usize> Default for Storage<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Deref for Storage<T, N> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for Storage<T, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T, const N: usize> AsRef<[T]> for Storage<T, N> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Clone, const N: usize> Clone for Storage<T, N> {
    fn clone(&self) -> Self {
        match self {
            Self::Inline(arr) => Self::Inline(arr.clone()),
            Self::Heap(vec) => Self::Heap(vec.clone()),
        }
    }
}

impl<T: Debug, const N: usize> Debug for Storage<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, const N: usize> PartialEq for Storage<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, const N: usize> Eq for Storage<T, N> {}

impl<T: PartialOrd, const N: usize> PartialOrd for Storage<T, N> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord, const N: usize> Ord for Storage<T, N> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash, const N: usize> Hash for Storage<T, N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T, const N: usize> From<Vec<T>> for Storage<T, N> {
    /// Keeps the elements inline when they fit, avoiding a copy otherwise
    fn from(vec: Vec<T>) -> Self {
        if vec.len() <= N && N > 0 {
            Self::Inline(vec.into_iter().collect())
        } else {
            Self::Heap(vec)
        }
    }
}

impl<T: Clone, const N: usize> From<&[T]> for Storage<T, N> {
    fn from(items: &[T]) -> Self {
        let mut ret = Self::new();
        ret.extend_from_slice(items);
        ret
    }
}

impl<T: Clone, const N: usize, const M: usize> From<[T; M]> for Storage<T, N> {
    fn from(items: [T; M]) -> Self {
        Self::from(&items[..])
    }
}

impl<T, const N: usize> FromIterator<T> for Storage<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ret = Self::new();
        ret.extend(iter);
        ret
    }
}

impl<T, const N: usize> Extend<T> for Storage<T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T, const N: usize> IntoIterator for Storage<T, N> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a Storage<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(feature = "serde_impls")]
impl<T: serde::Serialize, const N: usize> serde::Serialize for Storage<T, N> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

#[cfg(feature = "serde_impls")]
impl<'de, T: serde::Deserialize<'de>, const N: usize> serde::Deserialize<'de> for Storage<T, N> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spills_in_order() {
        let mut s: Storage<u8, 3> = Storage::new();
        s.extend([1, 2, 3]);
        assert!(s.is_inline());
        s.push(4);
        assert!(!s.is_inline());
        assert_eq!(&*s, &[1, 2, 3, 4]);
        s.extend_from_slice(&[5, 6]);
        assert_eq!(s.into_vec(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn slice_extension_spills() {
        let mut s: Storage<u8, 4> = Storage::from(&[9u8, 8][..]);
        assert!(s.is_inline());
        s.extend_from_slice(&[7, 6, 5]);
        assert!(!s.is_inline());
        assert_eq!(&*s, &[9, 8, 7, 6, 5]);
    }

    #[test]
    fn zero_capacity_is_dynamic() {
        let s: Storage<u32, 0> = Storage::new();
        assert!(!s.is_inline());
        let s: Storage<u32, 0> = Storage::from(vec![1, 2]);
        assert!(!s.is_inline());
    }

    #[test]
    fn equality_ignores_representation() {
        let inline: Storage<u8, 8> = Storage::from(vec![1, 2, 3]);
        let heap: Storage<u8, 8> = Storage::Heap(vec![1, 2, 3]);
        assert!(inline.is_inline());
        assert_eq!(inline, heap);

        use std::collections::hash_map::DefaultHasher;
        let digest = |s: &Storage<u8, 8>| {
            let mut h = DefaultHasher::new();
            s.hash(&mut h);
            h.finish()
        };
        assert_eq!(digest(&inline), digest(&heap));
    }
}
