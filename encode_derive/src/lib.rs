extern crate proc_macro;

use derive_common::{plans, runtime, Alternative, Member, Model, Presence, Shape, Structure};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse_macro_input;

/// Derives `Asn1Type` and `Encode`
///
/// Named-field structs become SEQUENCE (or SET, with `#[asn1(set)]`), enums
/// with one-field variants become CHOICE, field-less enums become ENUMERATED
/// and single-field tuple structs are transparent, optionally tagged, newtypes.
#[proc_macro_derive(Encode, attributes(asn1))]
pub fn encode_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as syn::DeriveInput);
    match Model::analyze(&ast) {
        Ok(model) => impl_encode(&model).into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn impl_encode(model: &Model<'_>) -> TokenStream2 {
    let rt = runtime();
    let name = model.ident;
    let steps = model.container_steps();

    let (tags, body) = match &model.shape {
        Shape::Structure(structure, members) => {
            let number = match structure {
                Structure::Sequence => quote!(#rt::tag::number::SEQUENCE),
                Structure::Set => quote!(#rt::tag::number::SET),
            };
            let write = match structure {
                Structure::Sequence => sequence_write(members),
                Structure::Set => set_write(members),
            };
            (quote!(#rt::tag::TagPlan::constructed(#number).with_steps(#steps)), write)
        }
        Shape::Newtype(inner) => (
            quote!(<#inner as #rt::conv::Asn1Type>::TAGS.with_steps(#steps)),
            quote! {
                fn write_content<__M: #rt::mode::Mode, __U: #rt::conv::target::Target>(
                    &self,
                    buf: &mut __U,
                ) -> #rt::error::CodecResult<usize> {
                    #rt::conv::Encode::write_content::<__M, __U>(&self.0, buf)
                }

                fn content_len<__M: #rt::mode::Mode>(&self) -> #rt::error::CodecResult<usize> {
                    #rt::conv::Encode::content_len::<__M>(&self.0)
                }

                fn selected_tag(&self) -> Option<#rt::tag::Tag> {
                    #rt::conv::Encode::selected_tag(&self.0)
                }
            },
        ),
        Shape::Choice(alternatives) => (
            quote!(#rt::tag::TagPlan::EMPTY.with_steps(#steps)),
            choice_write(alternatives),
        ),
        Shape::Enumerated(values) => {
            let arms = values.iter().map(|(ident, value)| quote!(Self::#ident => #value));
            (
                quote!(#rt::prim::enumerated::TAGS.with_steps(#steps)),
                quote! {
                    fn write_content<__M: #rt::mode::Mode, __U: #rt::conv::target::Target>(
                        &self,
                        buf: &mut __U,
                    ) -> #rt::error::CodecResult<usize> {
                        let value: i64 = match self { #(#arms),* };
                        Ok(#rt::prim::enumerated::write_enumerated(value, buf))
                    }
                },
            )
        }
    };

    quote! {
        impl #rt::conv::Asn1Type for #name {
            const TAGS: #rt::tag::TagPlan = #tags;
        }

        impl #rt::conv::Encode for #name {
            #body
        }
    }
}

fn member_plans(members: &[Member<'_>]) -> TokenStream2 {
    plans(members.iter().map(|m| (m.ty, m.tag.as_slice())))
}

/// Statement appending member `ix`, given an expression `value` of type `&T`
fn write_one(member: &Member<'_>, ix: usize, value: TokenStream2) -> TokenStream2 {
    let rt = runtime();
    let ty = member.ty;
    quote! {
        n += #rt::conv::member::write_member::<__M, #ty, __U>(#value, &PLANS[#ix], buf)?;
    }
}

/// Statement adding the encoded length of member `ix`, given `value: &T`
fn len_one(member: &Member<'_>, ix: usize, value: TokenStream2) -> TokenStream2 {
    let rt = runtime();
    let ty = member.ty;
    quote! {
        n += #rt::conv::member::member_len::<__M, #ty>(#value, &PLANS[#ix])?;
    }
}

/// One statement per member, applying `step` only to members that are present
/// on the wire
fn present_members(
    members: &[Member<'_>],
    step: fn(&Member<'_>, usize, TokenStream2) -> TokenStream2,
) -> Vec<TokenStream2> {
    members
        .iter()
        .enumerate()
        .map(|(ix, member)| {
            let field = member.ident;
            match &member.presence {
                Presence::Required => step(member, ix, quote!(&self.#field)),
                Presence::Optional => {
                    let body = step(member, ix, quote!(value));
                    quote! {
                        if let Some(value) = &self.#field {
                            #body
                        }
                    }
                }
                Presence::Default(default) => {
                    let body = step(member, ix, quote!(&self.#field));
                    quote! {
                        if self.#field != #default() {
                            #body
                        }
                    }
                }
            }
        })
        .collect()
}

/// `content_len` for SEQUENCE and SET, which share a length regardless of
/// member order
fn structure_len(members: &[Member<'_>]) -> TokenStream2 {
    let rt = runtime();
    let plans = member_plans(members);
    let lens = present_members(members, len_one);
    quote! {
        fn content_len<__M: #rt::mode::Mode>(&self) -> #rt::error::CodecResult<usize> {
            #plans
            let mut n = 0usize;
            #(#lens)*
            Ok(n)
        }
    }
}

fn sequence_write(members: &[Member<'_>]) -> TokenStream2 {
    let rt = runtime();
    let plans = member_plans(members);
    let writes = present_members(members, write_one);
    let len = structure_len(members);
    quote! {
        fn write_content<__M: #rt::mode::Mode, __U: #rt::conv::target::Target>(
            &self,
            buf: &mut __U,
        ) -> #rt::error::CodecResult<usize> {
            #plans
            let mut n = 0usize;
            #(#writes)*
            Ok(n)
        }

        #len
    }
}

fn set_write(members: &[Member<'_>]) -> TokenStream2 {
    let rt = runtime();
    let plans = member_plans(members);
    let entries = members.iter().enumerate().map(|(ix, member)| {
        let field = member.ident;
        let tag = match &member.presence {
            Presence::Required => quote!(#rt::conv::Encode::outer_tag(&self.#field, &PLANS[#ix])),
            Presence::Optional => quote! {
                self.#field.as_ref().and_then(|value| #rt::conv::Encode::outer_tag(value, &PLANS[#ix]))
            },
            Presence::Default(default) => quote! {
                if self.#field != #default() {
                    #rt::conv::Encode::outer_tag(&self.#field, &PLANS[#ix])
                } else {
                    None
                }
            },
        };
        quote!((#tag, #ix))
    });
    let arms = members.iter().enumerate().map(|(ix, member)| {
        let field = member.ident;
        let write = match &member.presence {
            Presence::Optional => {
                let write = write_one(member, ix, quote!(value));
                quote! {
                    if let Some(value) = &self.#field {
                        #write
                    }
                }
            }
            Presence::Required | Presence::Default(_) => write_one(member, ix, quote!(&self.#field)),
        };
        quote!(#ix => { #write })
    });
    let len = structure_len(members);
    quote! {
        fn write_content<__M: #rt::mode::Mode, __U: #rt::conv::target::Target>(
            &self,
            buf: &mut __U,
        ) -> #rt::error::CodecResult<usize> {
            #plans
            let order = #rt::conv::member::set_order(
                [#(#entries),*],
                <__M as #rt::mode::Mode>::IS_DER,
            );
            let mut n = 0usize;
            for (tag, ix) in order {
                if tag.is_none() {
                    continue;
                }
                match ix {
                    #(#arms)*
                    _ => (),
                }
            }
            Ok(n)
        }

        #len
    }
}

fn choice_write(alternatives: &[Alternative<'_>]) -> TokenStream2 {
    let rt = runtime();
    let plans = plans(alternatives.iter().map(|a| (a.ty, a.tag.as_slice())));
    let write_arms = alternatives.iter().enumerate().map(|(ix, alt)| {
        let (variant, ty) = (alt.ident, alt.ty);
        quote! {
            Self::#variant(value) => #rt::conv::member::write_member::<__M, #ty, __U>(value, &PLANS[#ix], buf)
        }
    });
    let len_arms = alternatives.iter().enumerate().map(|(ix, alt)| {
        let (variant, ty) = (alt.ident, alt.ty);
        quote! {
            Self::#variant(value) => #rt::conv::member::member_len::<__M, #ty>(value, &PLANS[#ix])
        }
    });
    let tag_arms = alternatives.iter().enumerate().map(|(ix, alt)| {
        let variant = alt.ident;
        quote!(Self::#variant(value) => #rt::conv::Encode::outer_tag(value, &PLANS[#ix]))
    });
    quote! {
        fn write_content<__M: #rt::mode::Mode, __U: #rt::conv::target::Target>(
            &self,
            buf: &mut __U,
        ) -> #rt::error::CodecResult<usize> {
            #plans
            match self {
                #(#write_arms),*
            }
        }

        fn content_len<__M: #rt::mode::Mode>(&self) -> #rt::error::CodecResult<usize> {
            #plans
            match self {
                #(#len_arms),*
            }
        }

        fn selected_tag(&self) -> Option<#rt::tag::Tag> {
            #plans
            match self {
                #(#tag_arms),*
            }
        }
    }
}
