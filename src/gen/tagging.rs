//! Tag resolution for generated declarations
//!
//! A reference to a type may pass through any number of aliases, each of
//! which may add a tag of its own. The chain is followed iteratively down to
//! the natural tag of the underlying type and folded into one [`TagPlan`],
//! which is what the derived codecs compute at compile time. Here it is used
//! to reject chains the runtime cannot represent and member lists whose
//! decoding would be ambiguous.

use std::collections::HashSet;

use super::imports::Imports;
use super::naming;
use super::{Resolved, Symbols};
use crate::error::GenerationError;
use crate::schema::{
    Builtin, MemberDefinition, Presence, TagKind, TagSpec, TaggingDefault, TypeDefinition, TypeKind, TypeRef,
};
use crate::tag::{number, Class, Tag, TagPlan, TagStep, MAX_TAG_DEPTH};

pub(crate) fn builtin_plan(builtin: Builtin) -> TagPlan {
    TagPlan::primitive(match builtin {
        Builtin::Boolean => number::BOOLEAN,
        Builtin::Integer => number::INTEGER,
        Builtin::Null => number::NULL,
        Builtin::OctetString => number::OCTET_STRING,
        Builtin::BitString => number::BIT_STRING,
        Builtin::ObjectIdentifier => number::OBJECT_IDENTIFIER,
        Builtin::UtcTime => number::UTC_TIME,
        Builtin::GeneralizedTime => number::GENERALIZED_TIME,
        Builtin::Utf8String => number::UTF8_STRING,
        Builtin::PrintableString => number::PRINTABLE_STRING,
        Builtin::Ia5String => number::IA5_STRING,
        Builtin::VisibleString => number::VISIBLE_STRING,
        Builtin::NumericString => number::NUMERIC_STRING,
    })
}

/// Plan of a definition before its own tag, `None` for aliases
fn natural(kind: &TypeKind) -> Option<TagPlan> {
    Some(match kind {
        TypeKind::Builtin(builtin) => builtin_plan(*builtin),
        TypeKind::Sequence | TypeKind::SequenceOf(_) => TagPlan::constructed(number::SEQUENCE),
        TypeKind::Set | TypeKind::SetOf(_) => TagPlan::constructed(number::SET),
        TypeKind::Choice => TagPlan::EMPTY,
        TypeKind::Enumerated(_) => TagPlan::primitive(number::ENUMERATED),
        TypeKind::Alias(_) => return None,
    })
}

/// The step a written tag stands for, given the plan it is applied to
///
/// Tags without a keyword follow the module default, AUTOMATIC counting as
/// IMPLICIT. A tag applied to an untagged CHOICE is always explicit.
pub(crate) fn resolve_step(spec: TagSpec, tagging: TaggingDefault, beneath: Option<&TagPlan>) -> TagStep {
    let kind = spec.kind.unwrap_or(match tagging {
        TaggingDefault::Explicit => TagKind::Explicit,
        TaggingDefault::Implicit | TaggingDefault::Automatic => TagKind::Implicit,
    });
    match kind {
        TagKind::Implicit if beneath.map_or(true, |plan| !plan.is_empty()) => {
            TagStep::implicit(spec.class, spec.number)
        }
        _ => TagStep::explicit(spec.class, spec.number),
    }
}

/// Whether a tag is written on the member, either before its type or as
/// part of a type defined in place
fn carries_tag(member: &MemberDefinition) -> bool {
    member.tag.is_some() || matches!(&member.ty, TypeRef::Inline(def) if def.tag.is_some())
}

/// Member tags after AUTOMATIC tagging
///
/// Under AUTOMATIC tagging, the members of a SEQUENCE, SET or CHOICE none of
/// whose members carries a tag are numbered `[0]`, `[1]`, ... in order.
pub(crate) fn member_tags(def: &TypeDefinition, tagging: TaggingDefault) -> Vec<Option<TagSpec>> {
    let automatic = tagging == TaggingDefault::Automatic
        && def.kind.has_members()
        && !def.members.iter().any(carries_tag);
    def.members
        .iter()
        .zip(0u32..)
        .map(|(member, ix)| if automatic { Some(TagSpec::context(ix)) } else { member.tag })
        .collect()
}

/// Folds written tags, outermost first, onto `base`
fn apply_specs(
    mut plan: TagPlan,
    specs: &[TagSpec],
    tagging: TaggingDefault,
    name: &str,
) -> Result<TagPlan, GenerationError> {
    for spec in specs.iter().rev() {
        let step = resolve_step(*spec, tagging, Some(&plan));
        if matches!(step, TagStep::Explicit(..)) && plan.len() == MAX_TAG_DEPTH {
            return Err(GenerationError::TaggingTooDeep { name: name.to_owned() });
        }
        plan = plan.apply(step);
    }
    Ok(plan)
}

pub(crate) struct Tagging<'s, 'm> {
    symbols: &'s Symbols<'m>,
    default: TaggingDefault,
}

impl<'s, 'm> Tagging<'s, 'm> {
    pub fn new(symbols: &'s Symbols<'m>) -> Self {
        Self {
            symbols,
            default: symbols.module.tagging,
        }
    }

    pub fn default_tagging(&self) -> TaggingDefault {
        self.default
    }

    /// Effective plan of the type `r` denotes, with `outer` written in front
    ///
    /// Returns `None` when the chain leads into another module.
    pub fn plan(&self, r: &TypeRef, outer: Option<TagSpec>, from: &str) -> Result<Option<TagPlan>, GenerationError> {
        let mut specs: Vec<TagSpec> = outer.into_iter().collect();
        let mut seen = HashSet::new();
        let mut cur = r;
        let base = loop {
            let def = match self.symbols.resolve(cur, from)? {
                Resolved::Builtin(builtin) => break builtin_plan(builtin),
                Resolved::External { .. } => return Ok(None),
                Resolved::Inline(def) => def,
                Resolved::Local(ix) => {
                    if !seen.insert(ix) {
                        return Err(GenerationError::CyclicDefinition {
                            name: self.symbols.decls[ix].key.clone(),
                        });
                    }
                    &self.symbols.decls[ix].def
                }
            };
            specs.extend(def.tag);
            match &def.kind {
                TypeKind::Alias(target) => cur = target,
                kind => break natural(kind).unwrap_or(TagPlan::EMPTY),
            }
        };
        apply_specs(base, &specs, self.default, from).map(Some)
    }

    /// The step for the tag written on a definition, or on a member of type `ty`
    pub fn step(&self, spec: TagSpec, ty: &TypeRef, from: &str) -> Result<TagStep, GenerationError> {
        let beneath = self.plan(ty, None, from)?;
        Ok(resolve_step(spec, self.default, beneath.as_ref()))
    }

    /// Step of a definition's own tag, applied to its natural plan
    pub fn own_step(&self, def: &TypeDefinition, from: &str) -> Result<Option<TagStep>, GenerationError> {
        let Some(spec) = def.tag else { return Ok(None) };
        let beneath = match &def.kind {
            TypeKind::Alias(target) => self.plan(target, None, from)?,
            kind => natural(kind),
        };
        Ok(Some(resolve_step(spec, self.default, beneath.as_ref())))
    }

    /// Every tag the encoding of a member may start with, or `None` if that
    /// depends on another module
    ///
    /// Untagged CHOICE types are expanded into the first tags of their
    /// alternatives.
    fn first_tags(&self, ty: &TypeRef, tag: Option<TagSpec>, from: &str) -> Result<Option<Vec<Tag>>, GenerationError> {
        let mut ret = Vec::new();
        let mut expanded: Vec<*const TypeDefinition> = Vec::new();
        let mut pending = vec![(ty, tag)];
        while let Some((ty, tag)) = pending.pop() {
            let Some(plan) = self.plan(ty, tag, from)? else {
                return Ok(None);
            };
            if let Some(outermost) = plan.outermost() {
                ret.push(outermost);
                continue;
            }
            let Some(choice) = self.symbols.base_def(ty, from)? else {
                return Ok(None);
            };
            if expanded.contains(&(choice as *const _)) {
                continue;
            }
            expanded.push(choice);
            let tags = member_tags(choice, self.default);
            pending.extend(choice.members.iter().map(|m| &m.ty).zip(tags));
        }
        Ok(Some(ret))
    }

    /// Checks that decoding `def` can tell its members apart by tag
    ///
    /// Alternatives of a CHOICE and members of a SET must have distinct tags.
    /// An OPTIONAL or DEFAULT member of a SEQUENCE must differ in tag from the
    /// members following it, up to and including the next mandatory one.
    pub fn check_members(&self, key: &str, def: &TypeDefinition) -> Result<(), GenerationError> {
        let labels = naming::member_labels(&def.members);
        let tags = member_tags(def, self.default);
        let mut firsts = Vec::with_capacity(def.members.len());
        for (member, tag) in def.members.iter().zip(&tags) {
            self.plan(&member.ty, *tag, key)?;
            firsts.push(self.first_tags(&member.ty, *tag, key)?);
        }

        let clash = |i: usize, j: usize| -> Result<(), GenerationError> {
            let (Some(a), Some(b)) = (&firsts[i], &firsts[j]) else {
                return Ok(());
            };
            match b.iter().find(|t| a.iter().any(|u| same_identity(t, u))) {
                Some(tag) => Err(GenerationError::DuplicateTag {
                    ty: key.to_owned(),
                    tag: *tag,
                    first: labels[i].clone(),
                    second: labels[j].clone(),
                }),
                None => Ok(()),
            }
        };

        match def.kind {
            TypeKind::Choice | TypeKind::Set => {
                for j in 0..def.members.len() {
                    for i in 0..j {
                        clash(i, j)?;
                    }
                }
            }
            TypeKind::Sequence => {
                for (i, member) in def.members.iter().enumerate() {
                    if is_required(member) {
                        continue;
                    }
                    for j in i + 1..def.members.len() {
                        clash(i, j)?;
                        if is_required(&def.members[j]) {
                            break;
                        }
                    }
                }
            }
            _ => (),
        }
        Ok(())
    }
}

fn is_required(member: &MemberDefinition) -> bool {
    member.presence == Presence::Required
}

/// Tags that a decoder cannot tell apart, whatever their form
fn same_identity(a: &Tag, b: &Tag) -> bool {
    a.class() == b.class() && a.number() == b.number()
}

/// Text of a tag attribute, as read back by the derive macros
pub(crate) fn attribute(step: TagStep) -> String {
    step.to_string()
}

fn class_marker(class: Class) -> &'static str {
    match class {
        Class::Universal => "Universal",
        Class::Application => "Application",
        Class::Context => "Context",
        Class::Private => "Private",
    }
}

/// Type-level form of a tag step, for the `K` argument of collections
pub(crate) fn mode_type(step: TagStep, imports: &mut Imports) -> String {
    let (mode, class, number) = match step {
        TagStep::Implicit(class, number) => ("Implicit", class, number),
        TagStep::Explicit(class, number) => ("Explicit", class, number),
    };
    imports.runtime(if mode == "Implicit" { "tag::Implicit" } else { "tag::Explicit" });
    imports.runtime(match class {
        Class::Universal => "tag::Universal",
        Class::Application => "tag::Application",
        Class::Context => "tag::Context",
        Class::Private => "tag::Private",
    });
    format!("{mode}<{}, {number}>", class_marker(class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Module;

    fn module(tagging: TaggingDefault, types: Vec<TypeDefinition>) -> Module {
        Module {
            types,
            ..Module::new("Test", tagging)
        }
    }

    #[test]
    fn keyword_defaults() {
        let spec = TagSpec::context(1);
        let int = TagPlan::primitive(number::INTEGER);
        assert_eq!(
            resolve_step(spec, TaggingDefault::Explicit, Some(&int)),
            TagStep::explicit(Class::Context, 1)
        );
        assert_eq!(
            resolve_step(spec, TaggingDefault::Automatic, Some(&int)),
            TagStep::implicit(Class::Context, 1)
        );
        assert_eq!(
            resolve_step(spec.implicit(), TaggingDefault::Explicit, Some(&TagPlan::EMPTY)),
            TagStep::explicit(Class::Context, 1)
        );
    }

    #[test]
    fn alias_chain_folds() {
        let m = module(
            TaggingDefault::Explicit,
            vec![
                TypeDefinition::new("Inner", TypeKind::Builtin(Builtin::Integer))
                    .tagged(TagSpec::context(2).implicit()),
                TypeDefinition::new("Outer", TypeKind::Alias(TypeRef::named("Inner")))
                    .tagged(TagSpec { class: Class::Application, number: 1, kind: None }),
            ],
        );
        let symbols = Symbols::build(&m);
        let tagging = Tagging::new(&symbols);
        let plan = tagging.plan(&TypeRef::named("Outer"), None, "test").unwrap().unwrap();
        assert_eq!(
            plan.as_slice(),
            [Tag::constructed(Class::Application, 1), Tag::primitive(Class::Context, 2)]
        );
    }

    #[test]
    fn alias_cycle_detected() {
        let m = module(
            TaggingDefault::Explicit,
            vec![
                TypeDefinition::new("A", TypeKind::Alias(TypeRef::named("B"))),
                TypeDefinition::new("B", TypeKind::Alias(TypeRef::named("A"))),
            ],
        );
        let symbols = Symbols::build(&m);
        let err = Tagging::new(&symbols).plan(&TypeRef::named("A"), None, "A").unwrap_err();
        assert!(matches!(err, GenerationError::CyclicDefinition { .. }));
    }

    #[test]
    fn too_deep() {
        let mut types = vec![TypeDefinition::new("T0", TypeKind::Builtin(Builtin::Null))];
        for n in 1..=MAX_TAG_DEPTH {
            types.push(
                TypeDefinition::new(&format!("T{n}"), TypeKind::Alias(TypeRef::named(&format!("T{}", n - 1))))
                    .tagged(TagSpec::context(n as u32)),
            );
        }
        let m = module(TaggingDefault::Explicit, types);
        let symbols = Symbols::build(&m);
        let tagging = Tagging::new(&symbols);
        assert!(tagging.plan(&TypeRef::named("T7"), None, "T7").is_ok());
        let err = tagging.plan(&TypeRef::named("T8"), None, "T8").unwrap_err();
        assert_eq!(err, GenerationError::TaggingTooDeep { name: "T8".to_owned() });
    }

    #[test]
    fn automatic_numbering() {
        let def = TypeDefinition::new("S", TypeKind::Sequence).with_members(vec![
            MemberDefinition::new("a", TypeRef::Builtin(Builtin::Integer)),
            MemberDefinition::new("b", TypeRef::Builtin(Builtin::Integer)),
        ]);
        assert_eq!(
            member_tags(&def, TaggingDefault::Automatic),
            [Some(TagSpec::context(0)), Some(TagSpec::context(1))]
        );
        assert_eq!(member_tags(&def, TaggingDefault::Implicit), [None, None]);
    }

    #[test]
    fn tag_on_type_in_place_disables_automatic_numbering() {
        let tagged_inline = TypeDefinition::new("", TypeKind::Builtin(Builtin::Integer)).tagged(TagSpec::context(5));
        let def = TypeDefinition::new("S", TypeKind::Sequence).with_members(vec![
            MemberDefinition::new("a", TypeRef::Inline(Box::new(tagged_inline))),
            MemberDefinition::new("b", TypeRef::Builtin(Builtin::Boolean)),
        ]);
        assert_eq!(member_tags(&def, TaggingDefault::Automatic), [None, None]);

        // an untagged type in place still gets numbered
        let untagged_inline = TypeDefinition::new("", TypeKind::Builtin(Builtin::Integer));
        let def = TypeDefinition::new("S", TypeKind::Sequence).with_members(vec![
            MemberDefinition::new("a", TypeRef::Inline(Box::new(untagged_inline))),
            MemberDefinition::new("b", TypeRef::Builtin(Builtin::Boolean)),
        ]);
        assert_eq!(
            member_tags(&def, TaggingDefault::Automatic),
            [Some(TagSpec::context(0)), Some(TagSpec::context(1))]
        );
    }

    #[test]
    fn ambiguous_optional_member() {
        let int = || TypeRef::Builtin(Builtin::Integer);
        let def = TypeDefinition::new("S", TypeKind::Sequence).with_members(vec![
            MemberDefinition::new("a", int()).optional(),
            MemberDefinition::new("b", int()),
        ]);
        let m = module(TaggingDefault::Explicit, vec![def.clone()]);
        let symbols = Symbols::build(&m);
        let err = Tagging::new(&symbols).check_members("S", &def).unwrap_err();
        assert!(matches!(err, GenerationError::DuplicateTag { ref first, ref second, .. } if first == "a" && second == "b"));
    }

    #[test]
    fn choice_alternatives_expand() {
        let inner = TypeDefinition::new("Inner", TypeKind::Choice).with_members(vec![
            MemberDefinition::new("x", TypeRef::Builtin(Builtin::Boolean)),
            MemberDefinition::new("y", TypeRef::Builtin(Builtin::Null)),
        ]);
        let outer = TypeDefinition::new("Outer", TypeKind::Choice).with_members(vec![
            MemberDefinition::new("inner", TypeRef::named("Inner")),
            MemberDefinition::new("flag", TypeRef::Builtin(Builtin::Boolean)),
        ]);
        let m = module(TaggingDefault::Explicit, vec![inner, outer.clone()]);
        let symbols = Symbols::build(&m);
        let tagging = Tagging::new(&symbols);
        let err = tagging.check_members("Outer", &outer).unwrap_err();
        assert_eq!(
            err,
            GenerationError::DuplicateTag {
                ty: "Outer".to_owned(),
                tag: Tag::primitive(Class::Universal, number::BOOLEAN),
                first: "inner".to_owned(),
                second: "flag".to_owned(),
            }
        );
    }

    #[test]
    fn mode_types() {
        let mut imports = Imports::default();
        assert_eq!(mode_type(TagStep::implicit(Class::Context, 1), &mut imports), "Implicit<Context, 1>");
        assert_eq!(imports.render("berium"), ["use berium::{tag::Context, tag::Implicit};"]);
        assert_eq!(attribute(TagStep::explicit(Class::Application, 3)), "[APPLICATION 3] EXPLICIT");
    }
}
