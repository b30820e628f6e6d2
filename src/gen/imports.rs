//! `use` directives of a generated module
//!
//! Runtime items are gathered into a single `use` of the runtime crate, and
//! every type referenced from another generated module gets a `use` of its
//! own. Both sets are ordered, so the output does not depend on the order in
//! which references were encountered.

use std::collections::BTreeSet;

#[derive(Clone, Debug, Default)]
pub struct Imports {
    runtime: BTreeSet<&'static str>,
    external: BTreeSet<(String, String)>,
}

impl Imports {
    /// Records an item of the runtime crate, as a path relative to its root
    pub fn runtime(&mut self, item: &'static str) {
        self.runtime.insert(item);
    }

    /// Records a type defined in the generated module `module`
    pub fn external(&mut self, module: String, ident: String) {
        self.external.insert((module, ident));
    }

    pub fn merge(&mut self, other: Imports) {
        self.runtime.extend(other.runtime);
        self.external.extend(other.external);
    }

    pub fn is_empty(&self) -> bool {
        self.runtime.is_empty() && self.external.is_empty()
    }

    /// The directives, runtime items first
    pub fn render(&self, runtime_path: &str) -> Vec<String> {
        let mut ret = Vec::with_capacity(1 + self.external.len());
        match self.runtime.len() {
            0 => (),
            1 => ret.extend(self.runtime.iter().map(|item| format!("use {runtime_path}::{item};"))),
            _ => {
                let items: Vec<&str> = self.runtime.iter().copied().collect();
                ret.push(format!("use {runtime_path}::{{{}}};", items.join(", ")));
            }
        }
        ret.extend(
            self.external
                .iter()
                .map(|(module, ident)| format!("use super::{module}::{ident};")),
        );
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicated_and_sorted() {
        let mut imports = Imports::default();
        imports.runtime("Encode");
        imports.runtime("Decode");
        imports.runtime("Encode");
        imports.external("pkix_common".to_owned(), "Name".to_owned());
        imports.external("pkix_common".to_owned(), "Extension".to_owned());
        imports.external("pkix_common".to_owned(), "Name".to_owned());
        assert_eq!(
            imports.render("berium"),
            [
                "use berium::{Decode, Encode};",
                "use super::pkix_common::Extension;",
                "use super::pkix_common::Name;",
            ]
        );
    }

    #[test]
    fn single_runtime_item() {
        let mut imports = Imports::default();
        imports.runtime("tag::Context");
        assert_eq!(imports.render("crate"), ["use crate::tag::Context;"]);
        assert!(Imports::default().render("berium").is_empty());
    }

    #[test]
    fn merge_unions() {
        let mut a = Imports::default();
        a.runtime("Encode");
        let mut b = Imports::default();
        b.runtime("Encode");
        b.external("common".to_owned(), "Name".to_owned());
        a.merge(b);
        assert!(!a.is_empty());
        assert_eq!(a.render("berium"), ["use berium::Encode;", "use super::common::Name;"]);
    }
}
