//! Rendering of declarations and constants
//!
//! | Definition | Emitted as |
//! |---|---|
//! | SEQUENCE, SET | `struct` with named fields |
//! | CHOICE | `enum` with one-field variants |
//! | ENUMERATED | field-less `enum` with explicit discriminants |
//! | SEQUENCE OF, SET OF | `pub type` of `SequenceOf<T, N, K>` / `SetOf<T, N, K>` |
//! | untagged alias or built-in | `pub type` |
//! | tagged alias or built-in | tuple struct wrapping the underlying type |
//!
//! Aliases that take part in a cycle are emitted as tuple structs as well,
//! since a `type` item cannot refer to itself.

use super::imports::Imports;
use super::naming::{self, Namespace};
use super::tagging::{self, Tagging};
use super::values::{native_integer, Subject, Values};
use super::{Decl, GeneratorConfig, Recursion, Resolved, Symbols};
use crate::error::GenerationError;
use crate::schema::{
    Builtin, MemberDefinition, Presence, StorageHint, TagSpec, TypeKind, TypeRef, ValueAssignment, ValueRange,
};
use crate::tag::TagStep;

/// Shape of the item emitted for a declaration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Form {
    Struct,
    Choice,
    Enumerated,
    Alias,
    Newtype,
}

pub(crate) fn form(decl: &Decl, recursive: bool) -> Form {
    match decl.def.kind {
        TypeKind::Sequence | TypeKind::Set => Form::Struct,
        TypeKind::Choice => Form::Choice,
        TypeKind::Enumerated(_) => Form::Enumerated,
        TypeKind::SequenceOf(_) | TypeKind::SetOf(_) if recursive => Form::Newtype,
        TypeKind::SequenceOf(_) | TypeKind::SetOf(_) => Form::Alias,
        TypeKind::Builtin(_) | TypeKind::Alias(_) if recursive || decl.def.tag.is_some() => Form::Newtype,
        TypeKind::Builtin(_) | TypeKind::Alias(_) => Form::Alias,
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("    {line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Type name of a runtime item that takes an inline capacity
fn sized(name: &'static str, capacity: usize, imports: &mut Imports) -> String {
    imports.runtime(name);
    if capacity == 0 {
        name.to_owned()
    } else {
        format!("{name}<{capacity}>")
    }
}

fn builtin_type(builtin: Builtin, range: Option<&ValueRange>, capacity: usize, imports: &mut Imports) -> String {
    let plain = |name: &'static str, imports: &mut Imports| {
        imports.runtime(name);
        name.to_owned()
    };
    match builtin {
        Builtin::Boolean => "bool".to_owned(),
        Builtin::Integer => match native_integer(range) {
            Some(native) => native.to_owned(),
            None => plain("Integer", imports),
        },
        Builtin::Null => plain("Null", imports),
        Builtin::OctetString => sized("OctetString", capacity, imports),
        Builtin::BitString => sized("BitString", capacity, imports),
        Builtin::ObjectIdentifier => plain("ObjectIdentifier", imports),
        Builtin::UtcTime => plain("UtcTime", imports),
        Builtin::GeneralizedTime => plain("GeneralizedTime", imports),
        Builtin::Utf8String => sized("Utf8String", capacity, imports),
        Builtin::PrintableString => sized("PrintableString", capacity, imports),
        Builtin::Ia5String => sized("Ia5String", capacity, imports),
        Builtin::VisibleString => sized("VisibleString", capacity, imports),
        Builtin::NumericString => sized("NumericString", capacity, imports),
    }
}

pub(crate) struct Emitter<'s, 'm> {
    symbols: &'s Symbols<'m>,
    recursion: &'s Recursion,
    config: &'s GeneratorConfig,
    tagging: Tagging<'s, 'm>,
    values: Values<'s, 'm>,
    /// Names in the value namespace: tuple structs, constants and default functions
    names: Namespace,
    imports: Imports,
    items: Vec<String>,
    statics: Vec<String>,
}

impl<'s, 'm> Emitter<'s, 'm> {
    pub fn new(symbols: &'s Symbols<'m>, recursion: &'s Recursion, config: &'s GeneratorConfig) -> Self {
        let mut names = Namespace::default();
        for decl in &symbols.decls {
            names.claim(decl.ident.clone());
        }
        Self {
            symbols,
            recursion,
            config,
            tagging: Tagging::new(symbols),
            values: Values::new(symbols, recursion),
            names,
            imports: Imports::default(),
            items: Vec::new(),
            statics: Vec::new(),
        }
    }

    fn capacity(&self, hint: Option<StorageHint>) -> usize {
        match hint {
            Some(StorageHint::Inline(capacity)) => capacity,
            Some(StorageHint::Dynamic) => 0,
            None => self.config.default_inline_capacity,
        }
    }

    /// Rust type of a reference made from declaration `ix`
    fn rust_type(
        &self,
        r: &TypeRef,
        hint: Option<StorageHint>,
        ix: usize,
        imports: &mut Imports,
    ) -> Result<String, GenerationError> {
        let key = &self.symbols.decls[ix].key;
        Ok(match self.symbols.resolve(r, key)? {
            Resolved::Builtin(builtin) => builtin_type(builtin, None, self.capacity(hint), imports),
            Resolved::External { module, name } => {
                let ident = naming::type_ident(name);
                imports.external(naming::module_ident(module), ident.clone());
                ident
            }
            Resolved::Local(to) => {
                let ident = &self.symbols.decls[to].ident;
                if self.recursion.is_boxed(ix, to) {
                    format!("Box<{ident}>")
                } else {
                    ident.clone()
                }
            }
            Resolved::Inline(def) => {
                let hint = hint.or(def.storage);
                match &def.kind {
                    TypeKind::Builtin(builtin) => {
                        builtin_type(*builtin, def.range.as_ref(), self.capacity(hint), imports)
                    }
                    TypeKind::SequenceOf(elem) => self.collection("SequenceOf", elem, None, hint, ix, imports)?,
                    TypeKind::SetOf(elem) => self.collection("SetOf", elem, None, hint, ix, imports)?,
                    TypeKind::Alias(target) => self.rust_type(target, hint, ix, imports)?,
                    // structured types are hoisted before emission
                    _ => naming::type_ident(&def.name),
                }
            }
        })
    }

    fn collection(
        &self,
        container: &'static str,
        elem: &TypeRef,
        step: Option<TagStep>,
        hint: Option<StorageHint>,
        ix: usize,
        imports: &mut Imports,
    ) -> Result<String, GenerationError> {
        imports.runtime(container);
        let elem = self.rust_type(elem, None, ix, imports)?;
        let capacity = self.capacity(hint);
        Ok(match step {
            Some(step) => format!("{container}<{elem}, {capacity}, {}>", tagging::mode_type(step, imports)),
            None if capacity == 0 => format!("{container}<{elem}>"),
            None => format!("{container}<{elem}, {capacity}>"),
        })
    }

    /// The type a non-structured declaration stands for, with its own tag
    /// folded into the type when `step` is given
    fn underlying(&self, ix: usize, step: Option<TagStep>, imports: &mut Imports) -> Result<String, GenerationError> {
        let decl = &self.symbols.decls[ix];
        let def = &decl.def;
        match &def.kind {
            TypeKind::Builtin(builtin) => Ok(builtin_type(
                *builtin,
                def.range.as_ref(),
                self.capacity(def.storage),
                imports,
            )),
            TypeKind::SequenceOf(elem) => self.collection("SequenceOf", elem, step, def.storage, ix, imports),
            TypeKind::SetOf(elem) => self.collection("SetOf", elem, step, def.storage, ix, imports),
            TypeKind::Alias(target) => self.rust_type(target, def.storage, ix, imports),
            _ => Ok(decl.ident.clone()),
        }
    }

    fn header(&self, decl: &Decl, lines: &mut Vec<String>) {
        if self.config.emit_docs {
            lines.push(format!("/// ASN.1 `{}`: {}", decl.key, decl.def.kind.describe()));
        }
    }

    fn derives(&self, lines: &mut Vec<String>, enumerated: bool, imports: &mut Imports) {
        let mut derives = vec!["Clone"];
        if enumerated {
            derives.push("Copy");
        }
        if self.config.derive_debug {
            derives.push("Debug");
        }
        derives.push("PartialEq");
        if enumerated {
            derives.extend(["Eq", "Hash"]);
        }
        derives.extend(["Encode", "Decode"]);
        imports.runtime("Encode");
        imports.runtime("Decode");
        lines.push(format!("#[derive({})]", derives.join(", ")));
    }

    fn container_attrs(&self, ix: usize, lines: &mut Vec<String>) -> Result<(), GenerationError> {
        let decl = &self.symbols.decls[ix];
        let mut attrs = Vec::new();
        if matches!(decl.def.kind, TypeKind::Set) {
            attrs.push("set".to_owned());
        }
        if decl.def.extensible && matches!(decl.def.kind, TypeKind::Sequence | TypeKind::Set) {
            attrs.push("extensible".to_owned());
        }
        if let Some(step) = self.tagging.own_step(&decl.def, &decl.key)? {
            attrs.push(format!("tag = {:?}", tagging::attribute(step)));
        }
        if !attrs.is_empty() {
            lines.push(format!("#[asn1({})]", attrs.join(", ")));
        }
        Ok(())
    }

    fn member_tag(
        &self,
        ix: usize,
        member: &MemberDefinition,
        tag: Option<TagSpec>,
    ) -> Result<Option<String>, GenerationError> {
        let key = &self.symbols.decls[ix].key;
        match tag {
            Some(spec) => {
                let step = self.tagging.step(spec, &member.ty, key)?;
                Ok(Some(format!("tag = {:?}", tagging::attribute(step))))
            }
            None => Ok(None),
        }
    }

    fn default_fn(
        &mut self,
        ix: usize,
        label: &str,
        member: &MemberDefinition,
        ty: &str,
        imports: &mut Imports,
    ) -> Result<(String, String), GenerationError> {
        let symbols = self.symbols;
        let key = &symbols.decls[ix].key;
        let Presence::Default(literal) = &member.presence else {
            return Err(GenerationError::UnsupportedDefault {
                ty: key.clone(),
                member: label.to_owned(),
                reason: "member has no default".to_owned(),
            });
        };
        if ty.starts_with("Box<") {
            return Err(GenerationError::UnsupportedDefault {
                ty: key.clone(),
                member: label.to_owned(),
                reason: "recursive members cannot have a default".to_owned(),
            });
        }
        let subject = Subject::Default { ty: key, member: label };
        let rendered = self.values.render(&member.ty, literal, true, subject, key, imports)?;
        let name = self.names.claim(naming::field_ident(&format!("{key}-{label}-default")));
        let body = format!("fn {name}() -> {ty} {{\n    {}\n}}", rendered.expr);
        Ok((name, body))
    }

    fn structure(&mut self, ix: usize, imports: &mut Imports) -> Result<Vec<String>, GenerationError> {
        let symbols = self.symbols;
        let decl = &symbols.decls[ix];
        let mut lines = Vec::new();
        self.header(decl, &mut lines);
        self.derives(&mut lines, false, imports);
        self.container_attrs(ix, &mut lines)?;
        lines.push(format!("pub struct {} {{", decl.ident));

        let labels = naming::member_labels(&decl.def.members);
        let tags = tagging::member_tags(&decl.def, self.tagging.default_tagging());
        let mut fields = Namespace::default();
        let mut defaults = Vec::new();
        for ((member, label), tag) in decl.def.members.iter().zip(&labels).zip(tags) {
            let field = fields.claim(naming::field_ident(label));
            let ty = self.rust_type(&member.ty, member.storage, ix, imports)?;
            let mut attrs: Vec<String> = self.member_tag(ix, member, tag)?.into_iter().collect();
            let ty = match member.presence {
                Presence::Required => ty,
                Presence::Optional => format!("Option<{ty}>"),
                Presence::Default(_) => {
                    let (name, body) = self.default_fn(ix, label, member, &ty, imports)?;
                    attrs.push(format!("default = {name:?}"));
                    defaults.push(body);
                    ty
                }
            };
            if !attrs.is_empty() {
                lines.push(format!("    #[asn1({})]", attrs.join(", ")));
            }
            lines.push(format!("    pub {field}: {ty},"));
        }
        lines.push("}".to_owned());
        for body in defaults {
            lines.push(String::new());
            lines.push(body);
        }
        Ok(lines)
    }

    fn choice(&self, ix: usize, imports: &mut Imports) -> Result<Vec<String>, GenerationError> {
        let decl = &self.symbols.decls[ix];
        let mut lines = Vec::new();
        self.header(decl, &mut lines);
        self.derives(&mut lines, false, imports);
        self.container_attrs(ix, &mut lines)?;
        lines.push(format!("pub enum {} {{", decl.ident));

        let labels = naming::member_labels(&decl.def.members);
        let tags = tagging::member_tags(&decl.def, self.tagging.default_tagging());
        let mut variants = Namespace::default();
        for ((member, label), tag) in decl.def.members.iter().zip(&labels).zip(tags) {
            let variant = variants.claim(naming::type_ident(label));
            let ty = self.rust_type(&member.ty, member.storage, ix, imports)?;
            if let Some(attr) = self.member_tag(ix, member, tag)? {
                lines.push(format!("    #[asn1({attr})]"));
            }
            lines.push(format!("    {variant}({ty}),"));
        }
        lines.push("}".to_owned());
        Ok(lines)
    }

    fn enumerated(
        &self,
        ix: usize,
        items: &[(String, Option<i64>)],
        imports: &mut Imports,
    ) -> Result<Vec<String>, GenerationError> {
        let decl = &self.symbols.decls[ix];
        let invalid = |reason: String| GenerationError::LiteralOutOfRange {
            name: decl.key.clone(),
            ty: "ENUMERATED".to_owned(),
            reason,
        };
        if items.is_empty() {
            return Err(invalid("no enumerators".to_owned()));
        }

        let mut lines = Vec::new();
        self.header(decl, &mut lines);
        self.derives(&mut lines, true, imports);
        self.container_attrs(ix, &mut lines)?;
        lines.push("#[repr(i64)]".to_owned());
        lines.push(format!("pub enum {} {{", decl.ident));

        let mut variants = Namespace::default();
        let mut used: Vec<i64> = Vec::with_capacity(items.len());
        let mut next = Some(0i64);
        for (name, number) in items {
            let Some(value) = number.or(next) else {
                return Err(invalid(format!("`{name}` follows the largest possible number")));
            };
            if used.contains(&value) {
                return Err(invalid(format!("number {value} of `{name}` is already used")));
            }
            used.push(value);
            next = value.checked_add(1);
            lines.push(format!("    {} = {value},", variants.claim(naming::type_ident(name))));
        }
        lines.push("}".to_owned());
        Ok(lines)
    }

    fn alias(&self, ix: usize, imports: &mut Imports) -> Result<Vec<String>, GenerationError> {
        let decl = &self.symbols.decls[ix];
        let step = self.tagging.own_step(&decl.def, &decl.key)?;
        let mut lines = Vec::new();
        self.header(decl, &mut lines);
        lines.push(format!("pub type {} = {};", decl.ident, self.underlying(ix, step, imports)?));
        Ok(lines)
    }

    fn newtype(&self, ix: usize, imports: &mut Imports) -> Result<Vec<String>, GenerationError> {
        let decl = &self.symbols.decls[ix];
        let mut lines = Vec::new();
        self.header(decl, &mut lines);
        self.derives(&mut lines, false, imports);
        self.container_attrs(ix, &mut lines)?;
        lines.push(format!("pub struct {}(pub {});", decl.ident, self.underlying(ix, None, imports)?));
        Ok(lines)
    }

    /// Emits declaration `ix`, or leaves it out and returns why
    pub fn declaration(&mut self, ix: usize) -> Result<(), GenerationError> {
        let symbols = self.symbols;
        let decl = &symbols.decls[ix];
        let mut imports = Imports::default();

        self.tagging.plan(&TypeRef::Named(decl.key.clone()), None, &decl.key)?;
        if decl.def.kind.has_members() {
            self.tagging.check_members(&decl.key, &decl.def)?;
        }

        let lines = match (form(decl, self.recursion.is_recursive(ix)), &decl.def.kind) {
            (Form::Struct, _) => self.structure(ix, &mut imports)?,
            (Form::Choice, _) => self.choice(ix, &mut imports)?,
            (Form::Enumerated, TypeKind::Enumerated(items)) => self.enumerated(ix, items, &mut imports)?,
            (Form::Newtype, _) => self.newtype(ix, &mut imports)?,
            (Form::Alias | Form::Enumerated, _) => self.alias(ix, &mut imports)?,
        };
        self.imports.merge(imports);
        self.items.push(lines.join("\n"));
        Ok(())
    }

    /// Emits a value assignment, or leaves it out and returns why
    pub fn value(&mut self, value: &ValueAssignment) -> Result<(), GenerationError> {
        let mut imports = Imports::default();
        let rendered = self.values.render(
            &value.ty,
            &value.value,
            false,
            Subject::Value(&value.name),
            &value.name,
            &mut imports,
        )?;
        let ident = self.names.claim(naming::value_ident(&value.name));
        let doc = if self.config.emit_docs {
            format!("/// ASN.1 value `{}`\n", value.name)
        } else {
            String::new()
        };
        if rendered.constant {
            self.items
                .push(format!("{doc}pub const {ident}: {} = {};", rendered.ty, rendered.expr));
        } else {
            imports.runtime("lazy_static");
            self.statics
                .push(format!("{doc}pub static ref {ident}: {} = {};", rendered.ty, rendered.expr));
        }
        self.imports.merge(imports);
        Ok(())
    }

    /// The `use` directives and the complete source text
    pub fn finish(self, module_name: &str, module_ident: &str) -> (Vec<String>, String) {
        let imports = self.imports.render(&self.config.runtime_path);
        let mut body = Vec::new();
        if !imports.is_empty() {
            body.push(imports.join("\n"));
        }
        body.extend(self.items);
        if !self.statics.is_empty() {
            body.push(format!("lazy_static! {{\n{}\n}}", indent(&self.statics.join("\n"))));
        }

        let mut source = String::new();
        if self.config.emit_docs {
            source.push_str(&format!("//! Generated from ASN.1 module `{module_name}`\n\n"));
        }
        source.push_str(&format!("pub mod {module_ident} {{\n"));
        source.push_str(&indent(&body.join("\n\n")));
        source.push_str("\n}\n");
        (imports, source)
    }
}
