//! Rust identifiers for ASN.1 names
//!
//! ASN.1 identifiers may contain hyphens and follow no particular case
//! convention. Type references become `UpperCamelCase`, members and modules
//! `snake_case`, and values `SCREAMING_SNAKE_CASE`; reserved words are
//! escaped as raw identifiers where Rust allows it.

use std::collections::HashSet;

use crate::schema::MemberDefinition;

/// Splits an ASN.1 identifier into words at hyphens, underscores and case changes
///
/// Runs of capitals are kept together as an acronym, and digits stay with
/// the word they follow: `TBSCertificate` is `["TBS", "Certificate"]` and
/// `id-pe-authorityInfoAccess` is `["id", "pe", "authority", "Info", "Access"]`.
pub fn words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut ret = Vec::new();
    let mut current = String::new();
    for (ix, &ch) in chars.iter().enumerate() {
        if ch == '-' || ch == '_' || ch == '.' {
            if !current.is_empty() {
                ret.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[ix - 1];
            let next_lower = chars.get(ix + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                ret.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        ret.push(current);
    }
    ret
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Whether `ident` can be used as written
fn is_plain_ident(ident: &str) -> bool {
    syn::parse_str::<syn::Ident>(ident).is_ok()
}

fn escaped(ident: String) -> String {
    match ident.as_str() {
        "self" | "Self" | "super" | "crate" => format!("{ident}_"),
        _ if ident.starts_with(|c: char| c.is_ascii_digit()) => format!("_{ident}"),
        _ if !is_plain_ident(&ident) => format!("r#{ident}"),
        _ => ident,
    }
}

pub fn type_ident(name: &str) -> String {
    escaped(words(name).iter().map(|w| capitalized(w)).collect())
}

pub fn field_ident(name: &str) -> String {
    let joined = words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    escaped(joined)
}

pub fn value_ident(name: &str) -> String {
    let joined = words(name)
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_");
    escaped(joined)
}

pub fn module_ident(name: &str) -> String {
    field_ident(name)
}

/// Name of the declaration hoisted out of member `label` of type `parent`
pub fn hoisted_ident(parent: &str, label: &str) -> String {
    format!("{}{}", type_ident(parent), type_ident(label))
}

/// Allocates identifiers within one namespace, suffixing repeats with `_2`, `_3`, ...
#[derive(Debug, Default)]
pub struct Namespace {
    used: HashSet<String>,
}

impl Namespace {
    pub fn claim(&mut self, ident: String) -> String {
        if self.used.insert(ident.clone()) {
            return ident;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{ident}_{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Labels of the members of one structured type, in declaration order
///
/// Named members keep their ASN.1 identifier. Members written without one are
/// labelled `anon_0`, `anon_1`, ... counting only the anonymous members.
pub fn member_labels(members: &[MemberDefinition]) -> Vec<String> {
    let mut anonymous = 0;
    members
        .iter()
        .map(|member| match &member.name {
            Some(name) => name.clone(),
            None => {
                let label = format!("anon_{anonymous}");
                anonymous += 1;
                label
            }
        })
        .collect()
}
