//! Abstract ASN.1 schema, as handed over by a grammar front-end
//!
//! The types in this module describe one ASN.1 module after parsing: its
//! tagging environment, imports, type definitions and value assignments.
//! They carry no behavior beyond a few constructors; the generator in
//! [`crate::gen`] treats a [`Module`] as read-only input.
//!
//! With the `serde_impls` feature the whole model can be deserialized, which
//! is how an external parser is expected to hand a schema over.

use num_bigint::BigInt;

use crate::tag::Class;

#[cfg(feature = "serde_impls")]
use serde::{Deserialize, Serialize};

/// Default tagging declared in the module header
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum TaggingDefault {
    #[default]
    Explicit,
    Implicit,
    Automatic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum TagKind {
    Implicit,
    Explicit,
}

/// A tag written in the schema, e.g. `[APPLICATION 3] IMPLICIT`
///
/// A `kind` of `None` leaves the choice to the module's tagging default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct TagSpec {
    pub class: Class,
    pub number: u32,
    pub kind: Option<TagKind>,
}

impl TagSpec {
    pub const fn context(number: u32) -> Self {
        Self {
            class: Class::Context,
            number,
            kind: None,
        }
    }

    #[must_use]
    pub const fn implicit(self) -> Self {
        Self {
            kind: Some(TagKind::Implicit),
            ..self
        }
    }

    #[must_use]
    pub const fn explicit(self) -> Self {
        Self {
            kind: Some(TagKind::Explicit),
            ..self
        }
    }
}

/// Built-in types with a direct runtime counterpart
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum Builtin {
    Boolean,
    Integer,
    Null,
    OctetString,
    BitString,
    ObjectIdentifier,
    UtcTime,
    GeneralizedTime,
    Utf8String,
    PrintableString,
    Ia5String,
    VisibleString,
    NumericString,
}

impl Builtin {
    /// Name in ASN.1 notation
    pub const fn asn1_name(self) -> &'static str {
        match self {
            Builtin::Boolean => "BOOLEAN",
            Builtin::Integer => "INTEGER",
            Builtin::Null => "NULL",
            Builtin::OctetString => "OCTET STRING",
            Builtin::BitString => "BIT STRING",
            Builtin::ObjectIdentifier => "OBJECT IDENTIFIER",
            Builtin::UtcTime => "UTCTime",
            Builtin::GeneralizedTime => "GeneralizedTime",
            Builtin::Utf8String => "UTF8String",
            Builtin::PrintableString => "PrintableString",
            Builtin::Ia5String => "IA5String",
            Builtin::VisibleString => "VisibleString",
            Builtin::NumericString => "NumericString",
        }
    }

    /// Whether values of this type have a variable number of elements, and so
    /// take a storage hint
    pub const fn is_variable_length(self) -> bool {
        matches!(
            self,
            Builtin::OctetString
                | Builtin::BitString
                | Builtin::Utf8String
                | Builtin::PrintableString
                | Builtin::Ia5String
                | Builtin::VisibleString
                | Builtin::NumericString
        )
    }
}

/// Inclusive value-range constraint on an INTEGER type, either end open
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct ValueRange {
    pub min: Option<BigInt>,
    pub max: Option<BigInt>,
}

impl ValueRange {
    pub fn new(min: impl Into<BigInt>, max: impl Into<BigInt>) -> Self {
        Self {
            min: Some(min.into()),
            max: Some(max.into()),
        }
    }

    pub fn contains(&self, value: &BigInt) -> bool {
        self.min.as_ref().map_or(true, |min| min <= value) && self.max.as_ref().map_or(true, |max| value <= max)
    }
}

/// Representation chosen for a variable-length member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum StorageHint {
    /// Inline storage for up to the given number of elements, spilling to the heap beyond it
    Inline(usize),
    Dynamic,
}

/// Reference from a definition or member to a type
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum TypeRef {
    Builtin(Builtin),
    /// A type defined in this module, or imported into it
    Named(String),
    /// A type from another module, referenced as `Module.Type`
    External { module: String, name: String },
    /// An anonymous type written in place; its `name` is ignored
    Inline(Box<TypeDefinition>),
}

impl TypeRef {
    pub fn named(name: &str) -> Self {
        TypeRef::Named(name.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum TypeKind {
    Builtin(Builtin),
    Sequence,
    Set,
    Choice,
    SequenceOf(TypeRef),
    SetOf(TypeRef),
    /// Named numbers; a number of `None` follows the previous one
    Enumerated(Vec<(String, Option<i64>)>),
    Alias(TypeRef),
}

impl TypeKind {
    pub const fn has_members(&self) -> bool {
        matches!(self, TypeKind::Sequence | TypeKind::Set | TypeKind::Choice)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TypeKind::Builtin(builtin) => builtin.asn1_name(),
            TypeKind::Sequence => "SEQUENCE",
            TypeKind::Set => "SET",
            TypeKind::Choice => "CHOICE",
            TypeKind::SequenceOf(_) => "SEQUENCE OF",
            TypeKind::SetOf(_) => "SET OF",
            TypeKind::Enumerated(_) => "ENUMERATED",
            TypeKind::Alias(_) => "type reference",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum Presence {
    Required,
    Optional,
    Default(Literal),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct MemberDefinition {
    /// `None` for members written without an identifier
    pub name: Option<String>,
    pub ty: TypeRef,
    pub presence: Presence,
    pub tag: Option<TagSpec>,
    pub storage: Option<StorageHint>,
}

impl MemberDefinition {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: Some(name.to_owned()),
            ty,
            presence: Presence::Required,
            tag: None,
            storage: None,
        }
    }

    pub fn anonymous(ty: TypeRef) -> Self {
        Self {
            name: None,
            ..Self::new("", ty)
        }
    }

    #[must_use]
    pub fn optional(self) -> Self {
        Self {
            presence: Presence::Optional,
            ..self
        }
    }

    #[must_use]
    pub fn with_default(self, value: Literal) -> Self {
        Self {
            presence: Presence::Default(value),
            ..self
        }
    }

    #[must_use]
    pub fn tagged(self, tag: TagSpec) -> Self {
        Self { tag: Some(tag), ..self }
    }

    #[must_use]
    pub fn stored(self, hint: StorageHint) -> Self {
        Self {
            storage: Some(hint),
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    /// Members of SEQUENCE, SET and CHOICE types, in declaration order
    pub members: Vec<MemberDefinition>,
    pub tag: Option<TagSpec>,
    /// Whether the member list ends in an extension marker `...`
    pub extensible: bool,
    /// Value range of INTEGER types
    pub range: Option<ValueRange>,
    /// Storage of variable-length types and collections
    pub storage: Option<StorageHint>,
}

impl TypeDefinition {
    pub fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            members: Vec::new(),
            tag: None,
            extensible: false,
            range: None,
            storage: None,
        }
    }

    #[must_use]
    pub fn with_members(self, members: Vec<MemberDefinition>) -> Self {
        Self { members, ..self }
    }

    #[must_use]
    pub fn tagged(self, tag: TagSpec) -> Self {
        Self { tag: Some(tag), ..self }
    }

    #[must_use]
    pub fn extensible(self) -> Self {
        Self {
            extensible: true,
            ..self
        }
    }

    #[must_use]
    pub fn ranged(self, range: ValueRange) -> Self {
        Self {
            range: Some(range),
            ..self
        }
    }

    #[must_use]
    pub fn stored(self, hint: StorageHint) -> Self {
        Self {
            storage: Some(hint),
            ..self
        }
    }
}

/// One component of an OBJECT IDENTIFIER value
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum OidComponent {
    Arc(u64),
    /// Another OBJECT IDENTIFIER value whose arcs are spliced in; only
    /// permitted as the first component
    Reference(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum Literal {
    Integer(BigInt),
    Boolean(bool),
    String(String),
    Oid(Vec<OidComponent>),
    /// The value of another assignment
    Reference(String),
}

impl Literal {
    pub fn describe(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "an integer",
            Literal::Boolean(_) => "a boolean",
            Literal::String(_) => "a string",
            Literal::Oid(_) => "an object identifier",
            Literal::Reference(_) => "a value reference",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct ValueAssignment {
    pub name: String,
    pub ty: TypeRef,
    pub value: Literal,
}

impl ValueAssignment {
    pub fn new(name: &str, ty: TypeRef, value: Literal) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            value,
        }
    }
}

/// `IMPORTS ... FROM module`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct Import {
    pub module: String,
    pub names: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct Module {
    pub name: String,
    pub tagging: TaggingDefault,
    pub imports: Vec<Import>,
    pub types: Vec<TypeDefinition>,
    pub values: Vec<ValueAssignment>,
}

impl Module {
    pub fn new(name: &str, tagging: TaggingDefault) -> Self {
        Self {
            name: name.to_owned(),
            tagging,
            ..Self::default()
        }
    }

    /// The module a type name is imported from, if it is imported
    pub fn import_source(&self, name: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|import| import.names.iter().any(|n| n == name))
            .map(|import| import.module.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        let range = ValueRange::new(-5, 10);
        assert!(range.contains(&BigInt::from(-5)));
        assert!(range.contains(&BigInt::from(10)));
        assert!(!range.contains(&BigInt::from(11)));
        let open = ValueRange {
            min: Some(BigInt::from(0)),
            max: None,
        };
        assert!(open.contains(&BigInt::from(u64::MAX)));
        assert!(!open.contains(&BigInt::from(-1)));
    }

    #[test]
    fn imports() {
        let mut module = Module::new("Certs", TaggingDefault::Implicit);
        module.imports.push(Import {
            module: "PKIX-Common".to_owned(),
            names: vec!["Name".to_owned(), "Extension".to_owned()],
        });
        assert_eq!(module.import_source("Extension"), Some("PKIX-Common"));
        assert_eq!(module.import_source("Certificate"), None);
    }

    #[test]
    fn builders() {
        let member = MemberDefinition::new("serialNumber", TypeRef::Builtin(Builtin::Integer))
            .tagged(TagSpec::context(0).implicit())
            .optional();
        assert_eq!(member.presence, Presence::Optional);
        assert_eq!(member.tag.and_then(|t| t.kind), Some(TagKind::Implicit));
        assert!(MemberDefinition::anonymous(TypeRef::named("Foo")).name.is_none());
    }
}
