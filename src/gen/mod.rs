//! Generation of Rust source from an abstract ASN.1 schema
//!
//! A [`Generator`] turns one [`schema::Module`](crate::schema::Module) into
//! an [`Artifact`]: the text of a Rust module declaring one item per type
//! definition and value assignment, written against this crate's runtime
//! types and derive macros.
//!
//! Generation proceeds in a fixed order, so that an unchanged schema always
//! yields identical output:
//!
//! 1. inline SEQUENCE, SET, CHOICE, ENUMERATED and tagged member types are
//!    hoisted into declarations of their own, named after their parent and
//!    member ([`naming`]);
//! 2. references closing a cycle between declarations are found and boxed;
//! 3. each declaration is emitted after its tagging has been resolved and
//!    checked for ambiguity;
//! 4. value assignments are resolved and checked against their types;
//! 5. the runtime and cross-module `use` directives ([`imports`]) are
//!    prepended and everything is wrapped in `pub mod <module>`.
//!
//! Failure to emit one item is reported through the [`Diagnostics`] sink and
//! leaves that item out; generation continues with the remaining items, but
//! the resulting artifact is marked invalid.

use std::collections::{HashMap, HashSet};

use crate::error::GenerationError;
use crate::schema::{Builtin, Module, TypeDefinition, TypeKind, TypeRef, ValueAssignment};

pub mod diag;
pub mod dump;
mod emit;
pub mod imports;
pub mod naming;
mod tagging;
mod values;

pub use diag::{CollectSink, Diagnostics, LogSink, Severity};
pub use dump::{ByteDump, DirectoryDump, MemoryDump};

use self::emit::Emitter;
use self::naming::Namespace;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Path of the runtime crate in `use` directives
    pub runtime_path: String,
    /// Whether generated types derive `Debug`
    pub derive_debug: bool,
    /// Inline capacity of variable-length members without a storage hint
    pub default_inline_capacity: usize,
    /// Whether to emit doc comments giving the ASN.1 origin of each item
    pub emit_docs: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime_path: "berium".to_owned(),
            derive_debug: true,
            default_inline_capacity: 0,
            emit_docs: true,
        }
    }
}

/// Output of generation for one module
#[derive(Clone, Debug)]
pub struct Artifact {
    /// Rust identifier of the generated module
    pub module: String,
    pub source: String,
    /// The `use` directives included in `source`
    pub imports: Vec<String>,
    /// Errors that suppressed individual items
    pub diagnostics: Vec<GenerationError>,
}

impl Artifact {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("generation of module `{}` reported {} error(s)", .0.module, .0.diagnostics.len())]
    Invalid(Box<Artifact>),
}

/// A type definition as emitted: either one of the module's own, or one
/// hoisted out of an inline member type
#[derive(Clone, Debug)]
pub(crate) struct Decl {
    /// ASN.1 name, or `Parent.member` for hoisted definitions
    pub key: String,
    pub ident: String,
    pub def: TypeDefinition,
}

/// What a [`TypeRef`] denotes
#[derive(Clone, Copy, Debug)]
pub(crate) enum Resolved<'a> {
    Builtin(Builtin),
    Local(usize),
    /// A type written in place that did not need hoisting
    Inline(&'a TypeDefinition),
    External {
        module: &'a str,
        name: &'a str,
    },
}

/// Symbol table of one module
pub(crate) struct Symbols<'m> {
    pub module: &'m Module,
    pub decls: Vec<Decl>,
    index: HashMap<String, usize>,
    values: HashMap<&'m str, &'m ValueAssignment>,
}

/// Whether an inline type must become a declaration of its own
fn needs_declaration(def: &TypeDefinition) -> bool {
    def.tag.is_some()
        || matches!(
            def.kind,
            TypeKind::Sequence | TypeKind::Set | TypeKind::Choice | TypeKind::Enumerated(_)
        )
}

/// Replaces the inline type behind `slot` (looking through untagged
/// collections and aliases) with a reference to a new hoisted declaration
fn hoist(slot: &mut TypeRef, parent: &str, label: &str, out: &mut Vec<Decl>) {
    match slot {
        TypeRef::Inline(def) if needs_declaration(&**def) => (),
        TypeRef::Inline(def) => {
            match &mut def.kind {
                TypeKind::SequenceOf(elem) | TypeKind::SetOf(elem) => hoist(elem, parent, label, out),
                TypeKind::Alias(target) => hoist(target, parent, label, out),
                _ => (),
            }
            return;
        }
        _ => return,
    }
    let key = format!("{parent}.{label}");
    if let TypeRef::Inline(mut def) = std::mem::replace(slot, TypeRef::Named(key.clone())) {
        def.name = key.clone();
        out.push(Decl {
            key,
            ident: naming::hoisted_ident(parent, label),
            def: *def,
        });
    }
}

impl<'m> Symbols<'m> {
    pub fn build(module: &'m Module) -> Self {
        let mut namespace = Namespace::default();
        let mut decls: Vec<Decl> = module
            .types
            .iter()
            .map(|def| Decl {
                key: def.name.clone(),
                ident: namespace.claim(naming::type_ident(&def.name)),
                def: def.clone(),
            })
            .collect();

        let mut ix = 0;
        while ix < decls.len() {
            let parent = decls[ix].key.clone();
            let labels = naming::member_labels(&decls[ix].def.members);
            // AUTOMATIC numbering looks at tags written in place, which hoisting moves away
            let tags = tagging::member_tags(&decls[ix].def, module.tagging);
            for (member, tag) in decls[ix].def.members.iter_mut().zip(tags) {
                member.tag = tag;
            }
            let mut hoisted = Vec::new();
            for (member, label) in decls[ix].def.members.iter_mut().zip(&labels) {
                hoist(&mut member.ty, &parent, label, &mut hoisted);
            }
            match &mut decls[ix].def.kind {
                TypeKind::SequenceOf(elem) | TypeKind::SetOf(elem) => hoist(elem, &parent, "item", &mut hoisted),
                TypeKind::Alias(target) => hoist(target, &parent, "inner", &mut hoisted),
                _ => (),
            }
            for mut decl in hoisted {
                decl.ident = namespace.claim(decl.ident);
                decls.push(decl);
            }
            ix += 1;
        }

        let index = decls.iter().enumerate().map(|(ix, d)| (d.key.clone(), ix)).collect();
        let values = module.values.iter().map(|v| (v.name.as_str(), v)).collect();
        Self {
            module,
            decls,
            index,
            values,
        }
    }

    pub fn resolve<'a>(&'a self, r: &'a TypeRef, from: &str) -> Result<Resolved<'a>, GenerationError> {
        match r {
            TypeRef::Builtin(builtin) => Ok(Resolved::Builtin(*builtin)),
            TypeRef::Inline(def) => Ok(Resolved::Inline(def)),
            TypeRef::External { module, name } => Ok(Resolved::External { module, name }),
            TypeRef::Named(name) => {
                if let Some(&ix) = self.index.get(name) {
                    Ok(Resolved::Local(ix))
                } else if let Some(module) = self.module.import_source(name) {
                    Ok(Resolved::External { module, name })
                } else {
                    Err(GenerationError::UnresolvedReference {
                        name: name.clone(),
                        from: from.to_owned(),
                    })
                }
            }
        }
    }

    pub fn value(&self, name: &str) -> Option<&'m ValueAssignment> {
        self.values.get(name).copied()
    }

    /// The definition a reference ultimately denotes, following aliases
    ///
    /// Returns `None` for built-in and external types.
    pub fn base_def<'a>(&'a self, r: &'a TypeRef, from: &str) -> Result<Option<&'a TypeDefinition>, GenerationError> {
        let mut cur = r;
        let mut seen = HashSet::new();
        loop {
            let def = match self.resolve(cur, from)? {
                Resolved::Builtin(_) | Resolved::External { .. } => return Ok(None),
                Resolved::Inline(def) => def,
                Resolved::Local(ix) => {
                    if !seen.insert(ix) {
                        return Err(GenerationError::CyclicDefinition {
                            name: self.decls[ix].key.clone(),
                        });
                    }
                    &self.decls[ix].def
                }
            };
            match &def.kind {
                TypeKind::Alias(target) => cur = target,
                _ => return Ok(Some(def)),
            }
        }
    }
}

/// Local declarations referenced by value from within `def`
fn references(symbols: &Symbols<'_>, def: &TypeDefinition) -> Vec<usize> {
    let mut pending: Vec<&TypeRef> = def.members.iter().map(|m| &m.ty).collect();
    match &def.kind {
        TypeKind::SequenceOf(elem) | TypeKind::SetOf(elem) => pending.push(elem),
        TypeKind::Alias(target) => pending.push(target),
        _ => (),
    }
    let mut ret = Vec::new();
    while let Some(r) = pending.pop() {
        match r {
            TypeRef::Named(name) => {
                if let Some(&ix) = symbols.index.get(name) {
                    if !ret.contains(&ix) {
                        ret.push(ix);
                    }
                }
            }
            TypeRef::Inline(inner) => match &inner.kind {
                TypeKind::SequenceOf(elem) | TypeKind::SetOf(elem) => pending.push(elem),
                TypeKind::Alias(target) => pending.push(target),
                _ => (),
            },
            TypeRef::Builtin(_) | TypeRef::External { .. } => (),
        }
    }
    ret.sort_unstable();
    ret
}

/// Cycles between declarations
///
/// Every reference found as a back edge by a depth-first walk over the
/// declarations, in declaration order, is boxed; this breaks every cycle.
/// Declarations lying on a cycle are recorded as recursive.
pub(crate) struct Recursion {
    boxed: HashSet<(usize, usize)>,
    recursive: Vec<bool>,
}

impl Recursion {
    pub fn analyze(symbols: &Symbols<'_>) -> Self {
        let n = symbols.decls.len();
        let edges: Vec<Vec<usize>> = symbols.decls.iter().map(|d| references(symbols, &d.def)).collect();

        let mut boxed = HashSet::new();
        let mut state = vec![0u8; n];
        for root in 0..n {
            if state[root] != 0 {
                continue;
            }
            state[root] = 1;
            let mut stack = vec![(root, 0usize)];
            while let Some((node, next)) = stack.last_mut() {
                let node = *node;
                match edges[node].get(*next) {
                    Some(&succ) => {
                        *next += 1;
                        match state[succ] {
                            0 => {
                                state[succ] = 1;
                                stack.push((succ, 0));
                            }
                            1 => {
                                boxed.insert((node, succ));
                            }
                            _ => (),
                        }
                    }
                    None => {
                        state[node] = 2;
                        stack.pop();
                    }
                }
            }
        }

        let recursive = (0..n)
            .map(|start| {
                let mut seen = vec![false; n];
                let mut pending = edges[start].clone();
                while let Some(ix) = pending.pop() {
                    if ix == start {
                        return true;
                    }
                    if !std::mem::replace(&mut seen[ix], true) {
                        pending.extend(&edges[ix]);
                    }
                }
                false
            })
            .collect();

        Self { boxed, recursive }
    }

    pub fn is_boxed(&self, from: usize, to: usize) -> bool {
        self.boxed.contains(&(from, to))
    }

    pub fn is_recursive(&self, ix: usize) -> bool {
        self.recursive[ix]
    }
}

fn report(sink: &mut dyn Diagnostics, err: &GenerationError) {
    sink.emit(Severity::Error, &[&"`", &err.subject(), &"`: ", err]);
}

/// Generates Rust source for ASN.1 modules
pub struct Generator<'a> {
    config: GeneratorConfig,
    sink: &'a mut dyn Diagnostics,
    dump: Option<&'a mut dyn ByteDump>,
}

impl<'a> Generator<'a> {
    pub fn new(config: GeneratorConfig, sink: &'a mut dyn Diagnostics) -> Self {
        Self {
            config,
            sink,
            dump: None,
        }
    }

    /// Also hands the source of every artifact to `dump`
    #[must_use]
    pub fn with_dump(self, dump: &'a mut dyn ByteDump) -> Self {
        Self {
            dump: Some(dump),
            ..self
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates the artifact for `module`
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Invalid`], holding the partial artifact, if
    /// any item could not be generated. Every such failure has already been
    /// reported to the diagnostic sink.
    pub fn generate(&mut self, module: &Module) -> Result<Artifact, GenerateError> {
        log::debug!("generating module {} ({} types, {} values)", module.name, module.types.len(), module.values.len());
        let symbols = Symbols::build(module);
        let recursion = Recursion::analyze(&symbols);
        let mut emitter = Emitter::new(&symbols, &recursion, &self.config);
        let mut diagnostics = Vec::new();

        for ix in 0..symbols.decls.len() {
            log::trace!("type {} as {}", symbols.decls[ix].key, symbols.decls[ix].ident);
            if let Err(err) = emitter.declaration(ix) {
                report(&mut *self.sink, &err);
                diagnostics.push(err);
            }
        }
        for value in &module.values {
            log::trace!("value {}", value.name);
            if let Err(err) = emitter.value(value) {
                report(&mut *self.sink, &err);
                diagnostics.push(err);
            }
        }

        let module_ident = naming::module_ident(&module.name);
        let (imports, source) = emitter.finish(&module.name, &module_ident);
        let artifact = Artifact {
            module: module_ident,
            source,
            imports,
            diagnostics,
        };

        if let Some(dump) = self.dump.as_mut() {
            let name = format!("{}.rs", artifact.module);
            if let Err(err) = dump.dump(&name, artifact.source.as_bytes()) {
                self.sink.emit(Severity::Warning, &[&"could not dump ", &name, &": ", &err]);
            }
        }

        if artifact.is_valid() {
            log::debug!("module {} generated", artifact.module);
            Ok(artifact)
        } else {
            Err(GenerateError::Invalid(Box::new(artifact)))
        }
    }
}

#[cfg(test)]
mod fixture;
#[cfg(test)]
mod tests;
