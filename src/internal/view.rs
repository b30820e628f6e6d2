use crate::internal::stack::Stack;

cfg_if::cfg_if! {
    if #[cfg(feature = "smallvec_viewstack")] {
        use ::smallvec::SmallVec;

        /// Number of windows a `SmallVec`-based `ViewStack<'a>` holds before it
        /// requires heap allocation.
        ///
        /// As an un-windowed `ViewStack` has one element, this is one higher
        /// than the nesting depth of TLVs that can be decoded without allocating.
        pub const INLINE_ALLOC: usize = 8;

        /// Stack of nested content windows over one input slice, innermost on top
        ///
        /// Implemented using `SmallVec`, with an array-size of [`INLINE_ALLOC`]
        #[derive(Clone, Default, PartialEq, Eq, Hash)]
        pub(crate) struct ViewStack<'a>(SmallVec<[&'a [u8]; INLINE_ALLOC]>);

        impl<'a> ViewStack<'a> {
            pub fn from_slice(slice: &'a [u8]) -> Self {
                let mut inner = SmallVec::new();
                inner.push(slice);
                Self(inner)
            }
        }
    } else {
        /// Stack of nested content windows over one input slice, innermost on top
        ///
        /// Setting the `smallvec_viewstack` feature flag replaces this with an
        /// implementation that avoids allocation for shallow nesting.
        #[derive(Clone, Default, PartialEq, Eq, Hash)]
        pub(crate) struct ViewStack<'a>(Vec<&'a [u8]>);

        impl<'a> ViewStack<'a> {
            pub fn from_slice(slice: &'a [u8]) -> Self {
                Self(vec![slice])
            }
        }
    }
}

impl std::fmt::Debug for ViewStack<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter().map(|view| view.len())).finish()
    }
}

impl<'a> Stack for ViewStack<'a> {
    type Item = &'a [u8];

    #[inline]
    fn peek(&self) -> Option<Self::Item> {
        self.0.last().copied()
    }

    #[inline]
    fn peek_mut(&mut self) -> Option<&mut Self::Item> {
        self.0.last_mut()
    }

    #[inline]
    fn pop(&mut self) -> Option<Self::Item> {
        self.0.pop()
    }

    #[inline]
    fn push(&mut self, item: Self::Item) {
        self.0.push(item)
    }

    #[inline]
    fn depth(&self) -> usize {
        self.0.len()
    }
}
