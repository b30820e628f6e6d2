/// LIFO access to the windows a parser has opened
///
/// Only the innermost window is ever read or narrowed; outer windows are
/// restored by popping once a TLV's content has been consumed.
pub(crate) trait Stack {
    type Item: Copy;

    /// The innermost entry, if any
    fn peek(&self) -> Option<Self::Item>;

    /// In-place access to the innermost entry, for consuming bytes from it
    fn peek_mut(&mut self) -> Option<&mut Self::Item>;

    fn pop(&mut self) -> Option<Self::Item>;

    fn push(&mut self, item: Self::Item);

    /// Count of entries, the outermost (whole input) included
    fn depth(&self) -> usize;
}
