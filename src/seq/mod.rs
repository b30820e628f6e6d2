//! Homogeneous collections: SEQUENCE OF and SET OF
//!
//! [`SequenceOf<T, N, K>`] and [`SetOf<T, N, K>`] are parameterized by their
//! element type `T`, the inline capacity `N` of their [`Storage`] (zero for
//! purely dynamic storage), and a type-level tagging chain `K` applied to the
//! natural universal tag of the collection. Both defaults (`N = 0`,
//! `K = Natural`) can be left out, so that a schema-level `SEQUENCE OF Foo`
//! with no particular requirements is just `SequenceOf<Foo>`.
//!
//! The content of either collection is the concatenation of the complete
//! encodings of its elements; decoding reads elements until the content is
//! exhausted.
//!
//! A `SequenceOf` compares element by element, in order. A `SetOf` compares
//! as a multiset, since DER reorders its elements on the wire.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::storage::Storage;
use crate::tag::{Natural, TagMode};

mod sequence_of;
mod set_of;

pub use set_of::canonical_order;

macro_rules! collection {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<T, const N: usize = 0, K: TagMode = Natural> {
            items: Storage<T, N>,
            _mode: PhantomData<K>,
        }

        impl<T, const N: usize, K: TagMode> $name<T, N, K> {
            #[must_use]
            pub const fn new() -> Self {
                Self {
                    items: Storage::new(),
                    _mode: PhantomData,
                }
            }

            #[must_use]
            pub fn into_vec(self) -> Vec<T> {
                self.items.into_vec()
            }
        }

        impl<T, const N: usize, K: TagMode> Default for $name<T, N, K> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T, const N: usize, K: TagMode> Deref for $name<T, N, K> {
            type Target = Storage<T, N>;

            fn deref(&self) -> &Self::Target {
                &self.items
            }
        }

        impl<T, const N: usize, K: TagMode> DerefMut for $name<T, N, K> {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.items
            }
        }

        impl<T: Clone, const N: usize, K: TagMode> Clone for $name<T, N, K> {
            fn clone(&self) -> Self {
                Self {
                    items: self.items.clone(),
                    _mode: PhantomData,
                }
            }
        }

        impl<T: std::fmt::Debug, const N: usize, K: TagMode> std::fmt::Debug for $name<T, N, K> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(stringify!($name))?;
                f.debug_list().entries(self.items.iter()).finish()
            }
        }

        impl<T, const N: usize, K: TagMode> From<Vec<T>> for $name<T, N, K> {
            fn from(items: Vec<T>) -> Self {
                Self {
                    items: Storage::from(items),
                    _mode: PhantomData,
                }
            }
        }

        impl<T, const N: usize, K: TagMode> FromIterator<T> for $name<T, N, K> {
            fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
                Self {
                    items: iter.into_iter().collect(),
                    _mode: PhantomData,
                }
            }
        }

        impl<T, const N: usize, K: TagMode> IntoIterator for $name<T, N, K> {
            type Item = T;
            type IntoIter = std::vec::IntoIter<T>;

            fn into_iter(self) -> Self::IntoIter {
                self.items.into_iter()
            }
        }

        impl<'a, T, const N: usize, K: TagMode> IntoIterator for &'a $name<T, N, K> {
            type Item = &'a T;
            type IntoIter = std::slice::Iter<'a, T>;

            fn into_iter(self) -> Self::IntoIter {
                self.items.iter()
            }
        }

        #[cfg(feature = "serde_impls")]
        impl<T: serde::Serialize, const N: usize, K: TagMode> serde::Serialize for $name<T, N, K> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.items.serialize(serializer)
            }
        }

        #[cfg(feature = "serde_impls")]
        impl<'de, T: serde::Deserialize<'de>, const N: usize, K: TagMode> serde::Deserialize<'de>
            for $name<T, N, K>
        {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Vec::<T>::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

collection!(
    /// SEQUENCE OF `T`, preserving element order
    SequenceOf
);
collection!(
    /// SET OF `T`; under DER, elements are written in canonical order
    SetOf
);
