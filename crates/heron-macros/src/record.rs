//! Expansion of `#[derive(Record)]`.

use crate::parse::{RecordField, RecordInput};
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

/// Expands the derive into `Record` and `Param` impls.
pub fn expand_record(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let record = RecordInput::parse(input)?;
    Ok(generate(&record))
}

fn generate(record: &RecordInput) -> TokenStream {
    let ident = &record.ident;
    let name = ident.to_string();

    let specs = record.bound_fields().map(|(field, binding)| {
        let field_name = field.ident.to_string();
        let variant = binding.variant();
        let source_name = &binding.name;
        let default = match &binding.default {
            Some(default) => quote! { ::core::option::Option::Some(#default) },
            None => quote! { ::core::option::Option::None },
        };
        quote! {
            ::heron::FieldSpec::new(#field_name, ::heron::SourceKind::#variant, #source_name, #default)
        }
    });

    let mut index = 0usize;
    let inits = record.fields.iter().map(|field| {
        let init = field_init(field, &mut index);
        let field_ident = &field.ident;
        quote! { #field_ident: #init }
    });

    quote! {
        #[automatically_derived]
        impl ::heron::Record for #ident {
            const NAME: &'static str = #name;
            const FIELDS: &'static [::heron::FieldSpec] = &[#(#specs),*];

            fn assemble<S: ::heron::Serial>(
                assembler: &::heron::Assembler<'_, S>,
            ) -> ::core::result::Result<Self, ::heron::DispatchError> {
                ::core::result::Result::Ok(Self {
                    #(#inits,)*
                })
            }
        }

        #[automatically_derived]
        impl ::heron::Param for #ident {
            const KIND: ::heron::ParamKind = ::heron::ParamKind::Record;
            const BY_REF: bool = false;

            fn provide<S: ::heron::Serial>(
                planner: &::heron::Planner<'_, S>,
            ) -> ::core::result::Result<Self, ::heron::DispatchError> {
                planner.record::<Self>()
            }
        }

        #[automatically_derived]
        impl ::heron::Param for ::std::boxed::Box<#ident> {
            const KIND: ::heron::ParamKind = ::heron::ParamKind::Record;
            const BY_REF: bool = true;

            fn provide<S: ::heron::Serial>(
                planner: &::heron::Planner<'_, S>,
            ) -> ::core::result::Result<Self, ::heron::DispatchError> {
                planner.record::<#ident>().map(::std::boxed::Box::new)
            }
        }
    }
}

fn field_init(field: &RecordField, index: &mut usize) -> TokenStream {
    let Some(binding) = &field.binding else {
        return quote! { ::core::default::Default::default() };
    };

    let position = *index;
    *index += 1;
    let spec = quote! { &<Self as ::heron::Record>::FIELDS[#position] };

    if binding.is_file() {
        quote! { assembler.file(#spec)? }
    } else {
        quote! { assembler.bind(#spec)? }
    }
}
