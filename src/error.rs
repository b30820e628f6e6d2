//! Runtime error taxonomy
//!
//! Every failure of the codec runtime is a [`CodecError`]. Errors carry the
//! byte offset at which they were detected, relative to the start of the input
//! handed to the outermost decode call, and [`CodecError::kind`] collapses
//! them into the flat [`ErrorKind`] reported through the result structures of
//! [`encode`](crate::encode) and [`decode`](crate::decode).
//!
//! Low-level helpers that operate on bare slices report offsets relative to
//! the slice they were given; the parser-level wrappers rebase them with
//! [`CodecError::shift`].

use std::fmt::Display;

use crate::tag::Tag;

pub type CodecResult<T> = Result<T, CodecError>;

/// Flat classification of [`CodecError`] values
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// Insufficient output capacity
    BufferOverflow,
    /// Fewer bytes remain than a length or identifier requires
    TruncatedInput,
    InvalidTagEncoding,
    /// Reserved or non-canonical length octets
    InvalidLength,
    /// Content octets violate the form required of their type
    InvalidEncoding,
    /// Mandatory structured member absent
    MissingField,
    /// No CHOICE alternative accepts the observed tag
    NoMatchingAlternative,
    /// Observed tag differs from the expected one outside of a structured member
    UnexpectedTag,
    /// Decoded value does not fit the native type it is decoded into
    ValueOutOfRange,
    /// Value cannot be encoded as it stands
    InvalidValue,
    /// Bytes left over after a complete value
    TrailingData,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::BufferOverflow => "BufferOverflow",
            ErrorKind::TruncatedInput => "TruncatedInput",
            ErrorKind::InvalidTagEncoding => "InvalidTagEncoding",
            ErrorKind::InvalidLength => "InvalidLength",
            ErrorKind::InvalidEncoding => "InvalidEncoding",
            ErrorKind::MissingField => "MissingField",
            ErrorKind::NoMatchingAlternative => "NoMatchingAlternative",
            ErrorKind::UnexpectedTag => "UnexpectedTag",
            ErrorKind::ValueOutOfRange => "ValueOutOfRange",
            ErrorKind::InvalidValue => "InvalidValue",
            ErrorKind::TrailingData => "TrailingData",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("output buffer too small: {needed} bytes needed, {available} available")]
    BufferOverflow { needed: usize, available: usize },
    #[error("input truncated at offset {offset}: {needed} bytes needed, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("malformed identifier octets at offset {offset}: {reason}")]
    InvalidTagEncoding { offset: usize, reason: &'static str },
    #[error("invalid length octets at offset {offset}: {reason}")]
    InvalidLength { offset: usize, reason: &'static str },
    #[error("invalid {what} content at offset {offset}: {reason}")]
    InvalidEncoding {
        offset: usize,
        what: &'static str,
        reason: &'static str,
    },
    #[error("mandatory member `{field}` of {ty} is absent (offset {offset})")]
    MissingField {
        offset: usize,
        ty: &'static str,
        field: &'static str,
    },
    #[error("no alternative of {ty} accepts tag {found} at offset {offset}")]
    NoMatchingAlternative {
        offset: usize,
        ty: &'static str,
        found: Tag,
    },
    #[error("expected tag {expected}, found {found} at offset {offset}")]
    UnexpectedTag {
        offset: usize,
        expected: Tag,
        found: Tag,
    },
    #[error("value at offset {offset} does not fit in {target}")]
    ValueOutOfRange { offset: usize, target: &'static str },
    #[error("invalid {what} value: {reason}")]
    InvalidValue {
        what: &'static str,
        reason: &'static str,
    },
    #[error("{residual} unconsumed bytes at offset {offset}")]
    TrailingData { offset: usize, residual: usize },
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::BufferOverflow { .. } => ErrorKind::BufferOverflow,
            CodecError::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            CodecError::InvalidTagEncoding { .. } => ErrorKind::InvalidTagEncoding,
            CodecError::InvalidLength { .. } => ErrorKind::InvalidLength,
            CodecError::InvalidEncoding { .. } => ErrorKind::InvalidEncoding,
            CodecError::MissingField { .. } => ErrorKind::MissingField,
            CodecError::NoMatchingAlternative { .. } => ErrorKind::NoMatchingAlternative,
            CodecError::UnexpectedTag { .. } => ErrorKind::UnexpectedTag,
            CodecError::ValueOutOfRange { .. } => ErrorKind::ValueOutOfRange,
            CodecError::InvalidValue { .. } => ErrorKind::InvalidValue,
            CodecError::TrailingData { .. } => ErrorKind::TrailingData,
        }
    }

    /// Offset into the input at which the error was detected, for decode errors
    pub fn offset(&self) -> Option<usize> {
        match *self {
            CodecError::BufferOverflow { .. } | CodecError::InvalidValue { .. } => None,
            CodecError::TruncatedInput { offset, .. }
            | CodecError::InvalidTagEncoding { offset, .. }
            | CodecError::InvalidLength { offset, .. }
            | CodecError::InvalidEncoding { offset, .. }
            | CodecError::MissingField { offset, .. }
            | CodecError::NoMatchingAlternative { offset, .. }
            | CodecError::UnexpectedTag { offset, .. }
            | CodecError::ValueOutOfRange { offset, .. }
            | CodecError::TrailingData { offset, .. } => Some(offset),
        }
    }

    /// Rebases the offset of a decode error produced against a sub-slice
    /// starting `base` bytes into the input
    #[must_use]
    pub fn shift(mut self, base: usize) -> Self {
        match &mut self {
            CodecError::BufferOverflow { .. } | CodecError::InvalidValue { .. } => {}
            CodecError::TruncatedInput { offset, .. }
            | CodecError::InvalidTagEncoding { offset, .. }
            | CodecError::InvalidLength { offset, .. }
            | CodecError::InvalidEncoding { offset, .. }
            | CodecError::MissingField { offset, .. }
            | CodecError::NoMatchingAlternative { offset, .. }
            | CodecError::UnexpectedTag { offset, .. }
            | CodecError::ValueOutOfRange { offset, .. }
            | CodecError::TrailingData { offset, .. } => *offset += base,
        }
        self
    }

    pub(crate) const fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        CodecError::TruncatedInput {
            offset,
            needed,
            available,
        }
    }

    pub(crate) const fn bad_tag(offset: usize, reason: &'static str) -> Self {
        CodecError::InvalidTagEncoding { offset, reason }
    }

    pub(crate) const fn bad_length(offset: usize, reason: &'static str) -> Self {
        CodecError::InvalidLength { offset, reason }
    }

    pub(crate) const fn bad_content(offset: usize, what: &'static str, reason: &'static str) -> Self {
        CodecError::InvalidEncoding { offset, what, reason }
    }

    pub(crate) const fn bad_value(what: &'static str, reason: &'static str) -> Self {
        CodecError::InvalidValue { what, reason }
    }

    pub(crate) const fn out_of_range(offset: usize, target: &'static str) -> Self {
        CodecError::ValueOutOfRange { offset, target }
    }
}

/// Failure to emit one type definition or value assignment
///
/// Generation errors are reported through the diagnostic sink and suppress
/// only the item they concern; see [`crate::gen`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("value `{name}` does not fit {ty}: {reason}")]
    LiteralOutOfRange {
        name: String,
        ty: String,
        reason: String,
    },
    #[error("`{name}` referenced from `{from}` is not defined or imported")]
    UnresolvedReference { name: String, from: String },
    #[error("value `{name}` has type {expected}, but its literal is {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },
    #[error("definition of `{name}` refers to itself through aliases alone")]
    CyclicDefinition { name: String },
    #[error("tag {tag} of `{second}` in {ty} is already used by `{first}`")]
    DuplicateTag {
        ty: String,
        tag: Tag,
        first: String,
        second: String,
    },
    #[error("tagging of `{name}` nests more than {} tags", crate::tag::MAX_TAG_DEPTH)]
    TaggingTooDeep { name: String },
    #[error("default of member `{member}` in {ty}: {reason}")]
    UnsupportedDefault {
        ty: String,
        member: String,
        reason: String,
    },
}

impl GenerationError {
    /// Name of the type or value whose emission the error suppresses
    pub fn subject(&self) -> &str {
        match self {
            GenerationError::LiteralOutOfRange { name, .. }
            | GenerationError::TypeMismatch { name, .. }
            | GenerationError::CyclicDefinition { name }
            | GenerationError::TaggingTooDeep { name } => name,
            GenerationError::UnresolvedReference { from, .. } => from,
            GenerationError::DuplicateTag { ty, .. } | GenerationError::UnsupportedDefault { ty, .. } => ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Class;

    #[test]
    fn codec_error_threadsafe() {
        fn assert_send_sync<T: Send + Sync + std::error::Error + 'static>() {}
        assert_send_sync::<CodecError>();
        assert_send_sync::<GenerationError>();
    }

    #[test]
    fn shift_rebases_offsets() {
        let err = CodecError::bad_content(3, "NULL", "non-empty content").shift(10);
        assert_eq!(err.offset(), Some(13));
        assert_eq!(err.kind(), ErrorKind::InvalidEncoding);
        let err = CodecError::BufferOverflow { needed: 4, available: 2 }.shift(10);
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn messages() {
        let err = CodecError::UnexpectedTag {
            offset: 2,
            expected: Tag::primitive(Class::Universal, 2),
            found: Tag::constructed(Class::Context, 1),
        };
        assert_eq!(err.to_string(), "expected tag [UNIVERSAL 2], found [1]c at offset 2");
        assert_eq!(ErrorKind::MissingField.to_string(), "MissingField");
    }
}
