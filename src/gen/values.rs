//! Value assignments and DEFAULT values
//!
//! A literal is checked against the type it is declared with before anything
//! is emitted: references are followed to the literal they name, INTEGER
//! values are held to every range constraint along the type's alias chain,
//! character strings to the repertoire of their type and object identifiers
//! to the X.690 rules on their first arcs.

use std::collections::HashSet;

use num_bigint::BigInt;

use super::emit::{form, Form};
use super::imports::Imports;
use super::naming;
use super::{Recursion, Resolved, Symbols};
use crate::error::GenerationError;
use crate::prim::strings::{Charset, Ia5, Numeric, Printable, Utf8, Visible};
use crate::prim::ObjectIdentifier;
use crate::schema::{Builtin, Literal, OidComponent, TypeKind, TypeRef, ValueRange};

/// Smallest native integer type covering `range`, if both of its ends are known
pub(crate) fn native_integer(range: Option<&ValueRange>) -> Option<&'static str> {
    let range = range?;
    let (min, max) = (range.min.as_ref()?, range.max.as_ref()?);
    let candidates: [(&'static str, BigInt, BigInt); 8] = [
        ("u8", u8::MIN.into(), u8::MAX.into()),
        ("u16", u16::MIN.into(), u16::MAX.into()),
        ("u32", u32::MIN.into(), u32::MAX.into()),
        ("u64", u64::MIN.into(), u64::MAX.into()),
        ("i8", i8::MIN.into(), i8::MAX.into()),
        ("i16", i16::MIN.into(), i16::MAX.into()),
        ("i32", i32::MIN.into(), i32::MAX.into()),
        ("i64", i64::MIN.into(), i64::MAX.into()),
    ];
    candidates
        .into_iter()
        .find(|(_, lo, hi)| lo <= min && max <= hi)
        .map(|(ty, ..)| ty)
}

fn describe_range(range: &ValueRange) -> String {
    let end = |bound: &Option<BigInt>, open: &str| bound.as_ref().map_or(open.to_owned(), BigInt::to_string);
    format!("{}..{}", end(&range.min, "MIN"), end(&range.max, "MAX"))
}

/// What a rendered literal is emitted for
#[derive(Clone, Copy, Debug)]
pub(crate) enum Subject<'a> {
    Value(&'a str),
    Default { ty: &'a str, member: &'a str },
}

impl Subject<'_> {
    fn name(&self) -> String {
        match self {
            Subject::Value(name) => (*name).to_owned(),
            Subject::Default { ty, member } => format!("{ty}.{member}"),
        }
    }

    fn mismatch(&self, expected: &str, found: &Literal) -> GenerationError {
        match *self {
            Subject::Value(name) => GenerationError::TypeMismatch {
                name: name.to_owned(),
                expected: expected.to_owned(),
                found: found.describe().to_owned(),
            },
            Subject::Default { ty, member } => GenerationError::UnsupportedDefault {
                ty: ty.to_owned(),
                member: member.to_owned(),
                reason: format!("{} cannot be written as a default of {expected}", found.describe()),
            },
        }
    }

    fn out_of_range(&self, ty: &str, reason: String) -> GenerationError {
        GenerationError::LiteralOutOfRange {
            name: self.name(),
            ty: ty.to_owned(),
            reason,
        }
    }
}

/// A literal as a Rust expression
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Rendered {
    pub ty: String,
    pub expr: String,
    /// Whether `expr` may initialize a `const`
    pub constant: bool,
}

enum Base<'a> {
    Builtin(Builtin, Option<&'a ValueRange>),
    Enumerated {
        ident: &'a str,
        items: &'a [(String, Option<i64>)],
    },
    Other(&'static str),
}

/// The type a literal is checked against, after following aliases
struct Chain<'a> {
    /// Newtypes passed through, outermost first
    wrappers: Vec<&'a str>,
    ranges: Vec<&'a ValueRange>,
    base: Base<'a>,
}

pub(crate) struct Values<'s, 'm> {
    symbols: &'s Symbols<'m>,
    recursion: &'s Recursion,
}

impl<'s, 'm> Values<'s, 'm> {
    pub fn new(symbols: &'s Symbols<'m>, recursion: &'s Recursion) -> Self {
        Self { symbols, recursion }
    }

    fn chain<'a>(&'a self, ty: &'a TypeRef, from: &str) -> Result<Chain<'a>, GenerationError> {
        let mut wrappers = Vec::new();
        let mut ranges = Vec::new();
        let mut seen = HashSet::new();
        let mut cur = ty;
        let base = loop {
            let (def, ident) = match self.symbols.resolve(cur, from)? {
                Resolved::Builtin(builtin) => break Base::Builtin(builtin, None),
                Resolved::External { .. } => break Base::Other("a type defined in another module"),
                Resolved::Inline(def) => (def, None),
                Resolved::Local(ix) => {
                    let decl = &self.symbols.decls[ix];
                    if !seen.insert(ix) {
                        return Err(GenerationError::CyclicDefinition { name: decl.key.clone() });
                    }
                    if form(decl, self.recursion.is_recursive(ix)) == Form::Newtype {
                        wrappers.push(decl.ident.as_str());
                    }
                    (&decl.def, Some(decl.ident.as_str()))
                }
            };
            ranges.extend(def.range.as_ref());
            match &def.kind {
                TypeKind::Alias(target) => cur = target,
                TypeKind::Builtin(builtin) => break Base::Builtin(*builtin, def.range.as_ref()),
                TypeKind::Enumerated(items) => match ident {
                    Some(ident) => break Base::Enumerated { ident, items },
                    None => break Base::Other("ENUMERATED"),
                },
                kind => break Base::Other(kind.describe()),
            }
        };
        Ok(Chain { wrappers, ranges, base })
    }

    /// Follows value references to the literal they name
    ///
    /// A reference naming one of `enumerators` is left in place.
    fn follow<'a>(
        &'a self,
        literal: &'a Literal,
        enumerators: &[(String, Option<i64>)],
        from: &str,
    ) -> Result<&'a Literal, GenerationError> {
        let mut seen = HashSet::new();
        let mut cur = literal;
        while let Literal::Reference(name) = cur {
            if enumerators.iter().any(|(item, _)| item == name) {
                break;
            }
            if !seen.insert(name.as_str()) {
                return Err(GenerationError::CyclicDefinition { name: name.clone() });
            }
            match self.symbols.value(name) {
                Some(value) => cur = &value.value,
                None => {
                    return Err(GenerationError::UnresolvedReference {
                        name: name.clone(),
                        from: from.to_owned(),
                    })
                }
            }
        }
        Ok(cur)
    }

    /// Arcs of an OBJECT IDENTIFIER literal, splicing in referenced values
    fn arcs<'a>(
        &'a self,
        components: &'a [OidComponent],
        subject: Subject<'_>,
        from: &str,
    ) -> Result<Vec<u64>, GenerationError> {
        let mut seen = HashSet::new();
        let mut tails = Vec::new();
        let mut head = components;
        while let Some(OidComponent::Reference(name)) = head.first() {
            if !seen.insert(name.as_str()) {
                return Err(GenerationError::CyclicDefinition { name: name.clone() });
            }
            tails.push(&head[1..]);
            let Some(value) = self.symbols.value(name) else {
                return Err(GenerationError::UnresolvedReference {
                    name: name.clone(),
                    from: from.to_owned(),
                });
            };
            match self.follow(&value.value, &[], from)? {
                Literal::Oid(components) => head = components,
                other => return Err(subject.mismatch("OBJECT IDENTIFIER", other)),
            }
        }
        let mut arcs = Vec::new();
        for part in std::iter::once(head).chain(tails.into_iter().rev()) {
            for component in part {
                match component {
                    OidComponent::Arc(arc) => arcs.push(*arc),
                    OidComponent::Reference(name) => {
                        return Err(subject.out_of_range(
                            "OBJECT IDENTIFIER",
                            format!("reference `{name}` is only allowed as the first component"),
                        ))
                    }
                }
            }
        }
        Ok(arcs)
    }

    /// Renders `literal` as a value of the type `ty` denotes
    ///
    /// With `exact` set, the expression has exactly the Rust type generated
    /// for `ty`, as needed for DEFAULT functions. Otherwise INTEGER values
    /// without a native representation are emitted as `i64` where they fit,
    /// and strings as `&str`.
    pub fn render<'a>(
        &'a self,
        ty: &'a TypeRef,
        literal: &'a Literal,
        exact: bool,
        subject: Subject<'_>,
        from: &str,
        imports: &mut Imports,
    ) -> Result<Rendered, GenerationError> {
        let chain = self.chain(ty, from)?;
        let exact = exact || !chain.wrappers.is_empty();
        let enumerators = match chain.base {
            Base::Enumerated { items, .. } => items,
            _ => &[],
        };
        let literal = self.follow(literal, enumerators, from)?;

        let inner = match (&chain.base, literal) {
            (Base::Builtin(Builtin::Integer, range), Literal::Integer(value)) => {
                for constraint in &chain.ranges {
                    if !constraint.contains(value) {
                        return Err(subject.out_of_range(
                            "INTEGER",
                            format!("{value} is outside {}", describe_range(constraint)),
                        ));
                    }
                }
                let small = i64::try_from(value).ok();
                match (native_integer(*range), small) {
                    (Some(native), _) => Rendered {
                        ty: native.to_owned(),
                        expr: value.to_string(),
                        constant: true,
                    },
                    (None, Some(small)) if !exact => Rendered {
                        ty: "i64".to_owned(),
                        expr: small.to_string(),
                        constant: true,
                    },
                    (None, small) => {
                        imports.runtime("Integer");
                        let expr = match small {
                            Some(small) => format!("Integer::from({small}i64)"),
                            None => {
                                let bytes: Vec<String> =
                                    value.to_signed_bytes_be().iter().map(|b| format!("0x{b:02x}")).collect();
                                format!("Integer::from_signed_bytes_be(&[{}])", bytes.join(", "))
                            }
                        };
                        Rendered {
                            ty: "Integer".to_owned(),
                            expr,
                            constant: false,
                        }
                    }
                }
            }
            (Base::Builtin(Builtin::Boolean, _), Literal::Boolean(value)) => Rendered {
                ty: "bool".to_owned(),
                expr: value.to_string(),
                constant: true,
            },
            (Base::Builtin(builtin, _), Literal::String(text)) if is_char_string(*builtin) => {
                if let Some(ch) = text.chars().find(|&ch| !permits(*builtin, ch)) {
                    return Err(subject.out_of_range(
                        builtin.asn1_name(),
                        format!("character {ch:?} is not permitted"),
                    ));
                }
                if exact {
                    Rendered {
                        ty: "_".to_owned(),
                        expr: format!("{text:?}.parse().expect(\"literal checked against the character set\")"),
                        constant: false,
                    }
                } else {
                    Rendered {
                        ty: "&str".to_owned(),
                        expr: format!("{text:?}"),
                        constant: true,
                    }
                }
            }
            (Base::Builtin(Builtin::ObjectIdentifier, _), Literal::Oid(components)) => {
                let arcs = self.arcs(components, subject, from)?;
                if let Err(err) = ObjectIdentifier::new(&arcs) {
                    return Err(subject.out_of_range("OBJECT IDENTIFIER", err.to_string()));
                }
                imports.runtime("ObjectIdentifier");
                let arcs: Vec<String> = arcs.iter().map(u64::to_string).collect();
                Rendered {
                    ty: "ObjectIdentifier".to_owned(),
                    expr: format!("ObjectIdentifier::from_arcs(&[{}])", arcs.join(", ")),
                    constant: false,
                }
            }
            (Base::Enumerated { ident, items }, Literal::Reference(name)) => {
                let mut variants = naming::Namespace::default();
                let variant = items
                    .iter()
                    .map(|(item, _)| (item, variants.claim(naming::type_ident(item))))
                    .find(|(item, _)| *item == name)
                    .map(|(_, variant)| variant);
                match variant {
                    Some(variant) => Rendered {
                        ty: (*ident).to_owned(),
                        expr: format!("{ident}::{variant}"),
                        constant: true,
                    },
                    None => return Err(subject.mismatch("ENUMERATED", literal)),
                }
            }
            (Base::Builtin(builtin, _), _) => return Err(subject.mismatch(builtin.asn1_name(), literal)),
            (Base::Enumerated { .. }, _) => return Err(subject.mismatch("ENUMERATED", literal)),
            (Base::Other(what), _) => return Err(subject.mismatch(what, literal)),
        };

        Ok(chain.wrappers.iter().rev().fold(inner, |inner, wrapper| Rendered {
            ty: (*wrapper).to_owned(),
            expr: format!("{wrapper}({})", inner.expr),
            constant: inner.constant,
        }))
    }
}

fn is_char_string(builtin: Builtin) -> bool {
    matches!(
        builtin,
        Builtin::Utf8String
            | Builtin::PrintableString
            | Builtin::Ia5String
            | Builtin::VisibleString
            | Builtin::NumericString
    )
}

fn permits(builtin: Builtin, ch: char) -> bool {
    match builtin {
        Builtin::PrintableString => Printable::permits(ch),
        Builtin::Ia5String => Ia5::permits(ch),
        Builtin::VisibleString => Visible::permits(ch),
        Builtin::NumericString => Numeric::permits(ch),
        _ => Utf8::permits(ch),
    }
}
