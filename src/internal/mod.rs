//! Low-level logic used by the parser
//!
//! The definitions here back [`SliceParser`](crate::parse::SliceParser):
//! a minimal [`Stack`] abstraction and the [`ViewStack`] of nested content
//! windows it is implemented over.

pub(crate) mod stack;
pub(crate) mod view;

pub(crate) use stack::Stack;
pub(crate) use view::ViewStack;
