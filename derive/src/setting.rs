use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields};

pub(crate) fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let inner = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => &fields.unnamed[0].ty,
            _ => return Err(newtype_error(input)),
        },
        _ => return Err(newtype_error(input)),
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::tagconf::Setting for #ident #ty_generics #where_clause {
            const KIND: ::tagconf::ValueKind = <#inner as ::tagconf::Setting>::KIND;

            fn decode(value: &::tagconf::Value) -> ::core::result::Result<Self, ::tagconf::DecodeError> {
                <#inner as ::tagconf::Setting>::decode(value).map(Self)
            }

            fn parse_literal(literal: &str) -> ::core::result::Result<Self, ::tagconf::DecodeError> {
                <#inner as ::tagconf::Setting>::parse_literal(literal).map(Self)
            }

            fn is_zero(&self) -> bool {
                <#inner as ::tagconf::Setting>::is_zero(&self.0)
            }

            fn to_value(&self) -> ::tagconf::Value {
                <#inner as ::tagconf::Setting>::to_value(&self.0)
            }
        }
    })
}

fn newtype_error(input: &DeriveInput) -> Error {
    Error::new_spanned(
        &input.ident,
        "Setting can only be derived for tuple structs with exactly one field",
    )
}
