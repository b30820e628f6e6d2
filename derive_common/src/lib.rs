//! Input analysis shared by `encode_derive` and `decode_derive`
//!
//! Both derive macros classify their input into a [`Model`] and then emit
//! code over the same per-member tag plans, so that encoding and decoding
//! of a type can never disagree on how a member is framed.
//!
//! The `#[asn1(...)]` attribute is accepted at two levels:
//!
//! * on the type: `set`, `extensible`, `tag = "..."`
//! * on a field or variant: `tag = "..."`, `optional`, `default = "path"`
//!
//! Tag strings use ASN.1 notation, outermost first, e.g.
//! `"[APPLICATION 3] IMPLICIT [0]"`. A step without a class keyword is
//! context-specific; a step without `IMPLICIT` or `EXPLICIT` is explicit.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Expr, Fields, Ident, LitStr, Type};

/// Path under which generated code refers to the runtime crate
pub fn runtime() -> TokenStream {
    quote!(::berium)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassKeyword {
    Universal,
    Application,
    Context,
    Private,
}

/// One tagging step parsed from a tag string
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub class: ClassKeyword,
    pub number: u32,
    pub explicit: bool,
}

/// Parses a chain of tagging steps such as `"[APPLICATION 3] IMPLICIT [0]"`
pub fn parse_steps(text: &str) -> Result<Vec<Step>, String> {
    let spaced = text.replace('[', " [ ").replace(']', " ] ");
    let mut tokens = spaced.split_whitespace().peekable();
    let mut steps = Vec::new();
    while let Some(open) = tokens.next() {
        if open != "[" {
            return Err(format!("expected `[`, found `{open}`"));
        }
        let mut class = ClassKeyword::Context;
        let mut token = tokens.next().ok_or("unterminated tag")?;
        match token {
            "UNIVERSAL" => class = ClassKeyword::Universal,
            "APPLICATION" => class = ClassKeyword::Application,
            "PRIVATE" => class = ClassKeyword::Private,
            _ => (),
        }
        if class != ClassKeyword::Context {
            token = tokens.next().ok_or("missing tag number")?;
        }
        let number = token
            .parse::<u32>()
            .map_err(|_| format!("invalid tag number `{token}`"))?;
        match tokens.next() {
            Some("]") => (),
            Some(other) => return Err(format!("expected `]`, found `{other}`")),
            None => return Err("unterminated tag".to_owned()),
        }
        let explicit = match tokens.peek() {
            Some(&"IMPLICIT") => {
                tokens.next();
                false
            }
            Some(&"EXPLICIT") => {
                tokens.next();
                true
            }
            _ => true,
        };
        steps.push(Step {
            class,
            number,
            explicit,
        });
    }
    Ok(steps)
}

/// Tokens for a `&[TagStep]` slice literal
pub fn steps_tokens(steps: &[Step]) -> TokenStream {
    let rt = runtime();
    let items = steps.iter().map(|step| {
        let class = match step.class {
            ClassKeyword::Universal => quote!(Universal),
            ClassKeyword::Application => quote!(Application),
            ClassKeyword::Context => quote!(Context),
            ClassKeyword::Private => quote!(Private),
        };
        let ctor = if step.explicit { quote!(explicit) } else { quote!(implicit) };
        let number = step.number;
        quote!(#rt::tag::TagStep::#ctor(#rt::tag::Class::#class, #number))
    });
    quote!(&[#(#items),*])
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Structure {
    Sequence,
    Set,
}

#[derive(Default)]
pub struct ContainerAttrs {
    pub set: bool,
    pub extensible: bool,
    pub tag: Vec<Step>,
}

#[derive(Default)]
struct MemberAttrs {
    tag: Vec<Step>,
    optional: bool,
    default: Option<syn::Path>,
}

pub enum Presence {
    Required,
    Optional,
    Default(syn::Path),
}

/// A named field of a SEQUENCE or SET
pub struct Member<'a> {
    pub ident: &'a Ident,
    /// Type of the encoded value; the `T` of an `Option<T>` field
    pub ty: &'a Type,
    pub tag: Vec<Step>,
    pub presence: Presence,
}

/// A one-field variant of a CHOICE
pub struct Alternative<'a> {
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub tag: Vec<Step>,
}

pub enum Shape<'a> {
    Structure(Structure, Vec<Member<'a>>),
    Newtype(&'a Type),
    Choice(Vec<Alternative<'a>>),
    Enumerated(Vec<(&'a Ident, i64)>),
}

pub struct Model<'a> {
    pub ident: &'a Ident,
    pub container: ContainerAttrs,
    pub shape: Shape<'a>,
}

impl<'a> Model<'a> {
    /// Classifies a derive input
    pub fn analyze(ast: &'a DeriveInput) -> syn::Result<Self> {
        if !ast.generics.params.is_empty() {
            return Err(syn::Error::new(
                ast.generics.span(),
                "generic types cannot derive ASN.1 codecs",
            ));
        }
        let container = container_attrs(&ast.attrs)?;
        let shape = match &ast.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => {
                    let structure = if container.set { Structure::Set } else { Structure::Sequence };
                    let members = named.named.iter().map(member).collect::<syn::Result<_>>()?;
                    Shape::Structure(structure, members)
                }
                Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                    Shape::Newtype(&unnamed.unnamed[0].ty)
                }
                _ => {
                    return Err(syn::Error::new(
                        ast.ident.span(),
                        "expected a struct with named fields or a single-field tuple struct",
                    ))
                }
            },
            Data::Enum(data) if data.variants.is_empty() => {
                return Err(syn::Error::new(ast.ident.span(), "empty enums have no encoding"))
            }
            Data::Enum(data) if data.variants.iter().all(|v| matches!(v.fields, Fields::Unit)) => {
                Shape::Enumerated(enumeration(data)?)
            }
            Data::Enum(data) => {
                let alternatives = data
                    .variants
                    .iter()
                    .map(|variant| match &variant.fields {
                        Fields::Unnamed(fields) if fields.unnamed.len() == 1 => Ok(Alternative {
                            ident: &variant.ident,
                            ty: &fields.unnamed[0].ty,
                            tag: member_attrs(&variant.attrs)?.tag,
                        }),
                        _ => Err(syn::Error::new(
                            variant.span(),
                            "CHOICE alternatives must have exactly one unnamed field",
                        )),
                    })
                    .collect::<syn::Result<_>>()?;
                Shape::Choice(alternatives)
            }
            Data::Union(_) => return Err(syn::Error::new(ast.ident.span(), "unions are not supported")),
        };
        if container.set && !matches!(shape, Shape::Structure(..)) {
            return Err(syn::Error::new(ast.ident.span(), "`set` applies only to structs with named fields"));
        }
        Ok(Model {
            ident: &ast.ident,
            container,
            shape,
        })
    }

    /// Name used in error values
    pub fn name(&self) -> String {
        self.ident.to_string()
    }

    pub fn container_steps(&self) -> TokenStream {
        steps_tokens(&self.container.tag)
    }
}

/// Tokens declaring `const PLANS: [TagPlan; K]`, the effective plan of each
/// member in declaration order
pub fn plans<'b>(members: impl Iterator<Item = (&'b Type, &'b [Step])>) -> TokenStream {
    let rt = runtime();
    let entries: Vec<TokenStream> = members
        .map(|(ty, steps)| {
            let steps = steps_tokens(steps);
            quote!(<#ty as #rt::conv::Asn1Type>::TAGS.with_steps(#steps))
        })
        .collect();
    let count = entries.len();
    quote! {
        const PLANS: [#rt::tag::TagPlan; #count] = [#(#entries),*];
    }
}

/// Name of the local binding holding member `ix` during decoding
pub fn local(ix: usize) -> Ident {
    format_ident!("__m{}", ix)
}

fn container_attrs(attrs: &[syn::Attribute]) -> syn::Result<ContainerAttrs> {
    let mut ret = ContainerAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("asn1")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("set") {
                ret.set = true;
            } else if meta.path.is_ident("extensible") {
                ret.extensible = true;
            } else if meta.path.is_ident("tag") {
                ret.tag = tag_value(&meta.value()?.parse()?)?;
            } else {
                return Err(meta.error("unrecognized container attribute"));
            }
            Ok(())
        })?;
    }
    Ok(ret)
}

fn member_attrs(attrs: &[syn::Attribute]) -> syn::Result<MemberAttrs> {
    let mut ret = MemberAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("asn1")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("optional") {
                ret.optional = true;
            } else if meta.path.is_ident("tag") {
                ret.tag = tag_value(&meta.value()?.parse()?)?;
            } else if meta.path.is_ident("default") {
                let lit: LitStr = meta.value()?.parse()?;
                ret.default = Some(lit.parse()?);
            } else {
                return Err(meta.error("unrecognized member attribute"));
            }
            Ok(())
        })?;
    }
    Ok(ret)
}

fn tag_value(lit: &LitStr) -> syn::Result<Vec<Step>> {
    parse_steps(&lit.value()).map_err(|msg| syn::Error::new(lit.span(), msg))
}

/// The `T` of a type written `Option<T>`
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else { return None };
    let last = path.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    match &last.arguments {
        syn::PathArguments::AngleBracketed(args) if args.args.len() == 1 => match &args.args[0] {
            syn::GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn member(field: &syn::Field) -> syn::Result<Member<'_>> {
    let attrs = member_attrs(&field.attrs)?;
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
    let inner = option_inner(&field.ty);
    let (ty, presence) = match (attrs.default, inner) {
        (Some(_), Some(_)) => {
            return Err(syn::Error::new(field.span(), "a DEFAULT member cannot also be an Option"))
        }
        (Some(path), None) => (&field.ty, Presence::Default(path)),
        (None, Some(inner)) => (inner, Presence::Optional),
        (None, None) if attrs.optional => {
            return Err(syn::Error::new(field.ty.span(), "optional members must have type Option<T>"))
        }
        (None, None) => (&field.ty, Presence::Required),
    };
    Ok(Member {
        ident,
        ty,
        tag: attrs.tag,
        presence,
    })
}

fn discriminant(expr: &Expr) -> syn::Result<i64> {
    let invalid = || syn::Error::new(expr.span(), "expected an integer literal discriminant");
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(int), ..
        }) => int.base10_parse::<i64>(),
        Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => discriminant(expr)?.checked_neg().ok_or_else(invalid),
        Expr::Group(group) => discriminant(&group.expr),
        Expr::Paren(paren) => discriminant(&paren.expr),
        _ => Err(invalid()),
    }
}

fn enumeration(data: &syn::DataEnum) -> syn::Result<Vec<(&Ident, i64)>> {
    let mut next = 0i64;
    let mut ret = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        let value = match &variant.discriminant {
            Some((_, expr)) => discriminant(expr)?,
            None => next,
        };
        if ret.iter().any(|&(_, v)| v == value) {
            return Err(syn::Error::new(variant.span(), format!("duplicate enumeration value {value}")));
        }
        next = value.checked_add(1).unwrap_or(value);
        ret.push((&variant.ident, value));
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_strings() {
        assert_eq!(
            parse_steps("[APPLICATION 3] IMPLICIT [0]").unwrap(),
            vec![
                Step {
                    class: ClassKeyword::Application,
                    number: 3,
                    explicit: false
                },
                Step {
                    class: ClassKeyword::Context,
                    number: 0,
                    explicit: true
                },
            ]
        );
        assert_eq!(parse_steps("").unwrap(), vec![]);
        assert!(parse_steps("[x]").is_err());
        assert!(parse_steps("[1").is_err());
        assert!(parse_steps("1]").is_err());
    }

    #[test]
    fn shapes() {
        let ast: DeriveInput = syn::parse_quote! {
            #[asn1(set, tag = "[5]")]
            struct S {
                a: i32,
                #[asn1(tag = "[0] IMPLICIT")]
                b: Option<bool>,
                #[asn1(default = "zero")]
                c: i64,
            }
        };
        let model = Model::analyze(&ast).unwrap();
        assert_eq!(model.container.tag.len(), 1);
        let Shape::Structure(Structure::Set, members) = model.shape else {
            panic!("expected SET");
        };
        assert!(matches!(members[0].presence, Presence::Required));
        assert!(matches!(members[1].presence, Presence::Optional));
        assert!(matches!(members[2].presence, Presence::Default(_)));

        let ast: DeriveInput = syn::parse_quote! {
            enum E { A = -1, B, C = 5 }
        };
        let Shape::Enumerated(values) = Model::analyze(&ast).unwrap().shape else {
            panic!("expected ENUMERATED");
        };
        let values: Vec<i64> = values.into_iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![-1, 0, 5]);
    }

    #[test]
    fn rejected_inputs() {
        let generic: DeriveInput = syn::parse_quote!(struct G<T> { t: T });
        assert!(Model::analyze(&generic).is_err());
        let mixed: DeriveInput = syn::parse_quote!(enum M { A, B(u8) });
        assert!(Model::analyze(&mixed).is_err());
        let bad_optional: DeriveInput = syn::parse_quote!(struct O { #[asn1(optional)] a: u8 });
        assert!(Model::analyze(&bad_optional).is_err());
    }
}
