extern crate proc_macro;

use derive_common::{local, plans, runtime, Alternative, Member, Model, Presence, Shape, Structure};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse_macro_input;

/// Derives `Decode` for the same shapes of type as the `Encode` derive,
/// which provides the `Asn1Type` implementation this relies on
#[proc_macro_derive(Decode, attributes(asn1))]
pub fn decode_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as syn::DeriveInput);
    match Model::analyze(&ast) {
        Ok(model) => impl_decode(&model).into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn impl_decode(model: &Model<'_>) -> TokenStream2 {
    let rt = runtime();
    let name = model.ident;
    let ty_name = model.name();
    let extensible = model.container.extensible;

    let body = match &model.shape {
        Shape::Structure(Structure::Sequence, members) => sequence_parse(members, &ty_name, extensible),
        Shape::Structure(Structure::Set, members) => set_parse(members, &ty_name, extensible),
        Shape::Newtype(inner) => quote! {
            fn parse_content<__M: #rt::mode::Mode, __P: #rt::parse::Parser>(
                p: &mut __P,
            ) -> #rt::error::CodecResult<Self> {
                <#inner as #rt::conv::Decode>::parse_content::<__M, __P>(p).map(Self)
            }

            fn accepts_untagged(tag: #rt::tag::Tag) -> bool {
                <#inner as #rt::conv::Decode>::accepts_untagged(tag)
            }

            fn parse_untagged<__M: #rt::mode::Mode, __P: #rt::parse::Parser>(
                p: &mut __P,
            ) -> #rt::error::CodecResult<Self> {
                <#inner as #rt::conv::Decode>::parse_untagged::<__M, __P>(p).map(Self)
            }
        },
        Shape::Choice(alternatives) => choice_parse(alternatives, &ty_name),
        Shape::Enumerated(values) => {
            let arms = values.iter().map(|(ident, value)| quote!(#value => Some(Self::#ident)));
            quote! {
                fn parse_content<__M: #rt::mode::Mode, __P: #rt::parse::Parser>(
                    p: &mut __P,
                ) -> #rt::error::CodecResult<Self> {
                    #rt::prim::enumerated::read_enumerated::<__M, __P, Self>(p, #ty_name, |value| match value {
                        #(#arms,)*
                        _ => None,
                    })
                }
            }
        }
    };

    quote! {
        impl #rt::conv::Decode for #name {
            #body
        }
    }
}

fn member_plans(members: &[Member<'_>]) -> TokenStream2 {
    plans(members.iter().map(|m| (m.ty, m.tag.as_slice())))
}

fn field_inits(members: &[Member<'_>]) -> Vec<TokenStream2> {
    members
        .iter()
        .enumerate()
        .map(|(ix, member)| {
            let (field, binding) = (member.ident, local(ix));
            quote!(#field: #binding)
        })
        .collect()
}

fn sequence_parse(members: &[Member<'_>], ty_name: &str, extensible: bool) -> TokenStream2 {
    let rt = runtime();
    let plans = member_plans(members);
    let reads = members.iter().enumerate().map(|(ix, member)| {
        let (ty, binding) = (member.ty, local(ix));
        let field = member.ident.to_string();
        let read = match &member.presence {
            Presence::Required => quote! {
                #rt::conv::member::read_required::<__M, #ty, __P>(p, &PLANS[#ix], #ty_name, #field)?
            },
            Presence::Optional => quote! {
                #rt::conv::member::read_optional::<__M, #ty, __P>(p, &PLANS[#ix])?
            },
            Presence::Default(default) => quote! {
                #rt::conv::member::read_defaulted::<__M, #ty, __P>(p, &PLANS[#ix], #default)?
            },
        };
        quote!(let #binding = #read;)
    });
    let rest = extensible.then(|| quote!(#rt::conv::member::skip_remaining::<__M, __P>(p)?;));
    let inits = field_inits(members);
    quote! {
        fn parse_content<__M: #rt::mode::Mode, __P: #rt::parse::Parser>(
            p: &mut __P,
        ) -> #rt::error::CodecResult<Self> {
            #plans
            #(#reads)*
            #rest
            Ok(Self { #(#inits),* })
        }
    }
}

fn set_parse(members: &[Member<'_>], ty_name: &str, extensible: bool) -> TokenStream2 {
    let rt = runtime();
    let plans = member_plans(members);
    let slots = members.iter().enumerate().map(|(ix, member)| {
        let (ty, binding) = (member.ty, local(ix));
        quote!(let mut #binding: Option<#ty> = None;)
    });
    let matches = members.iter().enumerate().map(|(ix, member)| {
        let (ty, binding) = (member.ty, local(ix));
        let check = match &member.presence {
            Presence::Default(default) => quote! {
                #rt::conv::member::check_not_default::<__M, #ty>(&value, #default, offset)?;
            },
            Presence::Required | Presence::Optional => quote!(),
        };
        quote! {
            if #rt::conv::member::accepts::<#ty>(&PLANS[#ix], tag) {
                if #binding.is_some() {
                    return Err(#rt::conv::member::duplicate_member(offset, #ty_name));
                }
                let value = #rt::conv::read_tagged::<__M, #ty, __P>(p, PLANS[#ix].as_slice())?;
                #check
                #binding = Some(value);
                continue;
            }
        }
    });
    let unmatched = if extensible {
        quote!(#rt::tlv::skip_tlv::<__M, __P>(p)?;)
    } else {
        quote!(return Err(#rt::conv::member::unknown_member(offset, #ty_name));)
    };
    let finals = members.iter().enumerate().map(|(ix, member)| {
        let binding = local(ix);
        let field = member.ident.to_string();
        let value = match &member.presence {
            Presence::Required => quote! {
                match #binding {
                    Some(value) => value,
                    None => return Err(#rt::conv::member::missing(p, #ty_name, #field)),
                }
            },
            Presence::Optional => quote!(#binding),
            Presence::Default(default) => quote!(#binding.unwrap_or_else(#default)),
        };
        quote!(let #binding = #value;)
    });
    let inits = field_inits(members);
    quote! {
        fn parse_content<__M: #rt::mode::Mode, __P: #rt::parse::Parser>(
            p: &mut __P,
        ) -> #rt::error::CodecResult<Self> {
            #plans
            #(#slots)*
            let mut prev: Option<#rt::tag::Tag> = None;
            while let Some(tag) = #rt::conv::member::peek_tag(p)? {
                let offset = #rt::parse::Parser::offset(p);
                #rt::conv::member::check_set_order::<__M>(prev, tag, offset)?;
                prev = Some(tag);
                #(#matches)*
                #unmatched
            }
            #(#finals)*
            Ok(Self { #(#inits),* })
        }
    }
}

fn choice_parse(alternatives: &[Alternative<'_>], ty_name: &str) -> TokenStream2 {
    let rt = runtime();
    let plans = plans(alternatives.iter().map(|a| (a.ty, a.tag.as_slice())));
    let accepts = alternatives.iter().enumerate().map(|(ix, alt)| {
        let ty = alt.ty;
        quote!(#rt::conv::member::accepts::<#ty>(&PLANS[#ix], tag))
    });
    let attempts = alternatives.iter().enumerate().map(|(ix, alt)| {
        let (variant, ty) = (alt.ident, alt.ty);
        quote! {
            if #rt::conv::member::accepts::<#ty>(&PLANS[#ix], tag) {
                return #rt::conv::read_tagged::<__M, #ty, __P>(p, PLANS[#ix].as_slice()).map(Self::#variant);
            }
        }
    });
    quote! {
        fn parse_content<__M: #rt::mode::Mode, __P: #rt::parse::Parser>(
            p: &mut __P,
        ) -> #rt::error::CodecResult<Self> {
            <Self as #rt::conv::Decode>::parse_untagged::<__M, __P>(p)
        }

        fn accepts_untagged(tag: #rt::tag::Tag) -> bool {
            #plans
            false #(|| #accepts)*
        }

        fn parse_untagged<__M: #rt::mode::Mode, __P: #rt::parse::Parser>(
            p: &mut __P,
        ) -> #rt::error::CodecResult<Self> {
            #plans
            let offset = #rt::parse::Parser::offset(p);
            let tag = #rt::conv::member::next_tag(p)?;
            #(#attempts)*
            Err(#rt::conv::member::no_alternative(offset, #ty_name, tag))
        }
    }
}
