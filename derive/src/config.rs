use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Error, Fields, Visibility};

use crate::attrs::FieldAttrs;

fn opt(value: &Option<String>) -> TokenStream {
    match value {
        Some(s) => quote!(::core::option::Option::Some(#s)),
        None => quote!(::core::option::Option::None),
    }
}

pub(crate) fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new_spanned(
                    &input.ident,
                    "Config can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input.ident,
                "Config can only be derived for structs",
            ));
        }
    };

    let mut schemas = Vec::new();
    let mut mut_arms = Vec::new();
    let mut ref_arms = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let Some(ident) = &field.ident else {
            continue;
        };
        let attrs = FieldAttrs::from_field(field)?;
        let name = ident.unraw().to_string();
        let exported = !matches!(field.vis, Visibility::Inherited);
        let embedded = attrs.embed;

        let kind = if !exported || attrs.is_skipped() {
            quote!(Opaque)
        } else if attrs.is_record() {
            mut_arms.push(quote!(#index => ::core::option::Option::Some(
                ::tagconf::FieldMut::Record(&mut self.#ident)
            )));
            ref_arms.push(quote!(#index => ::core::option::Option::Some(
                ::tagconf::FieldRef::Record(&self.#ident)
            )));
            quote!(Record)
        } else {
            mut_arms.push(quote!(#index => ::core::option::Option::Some(
                ::tagconf::FieldMut::Leaf(&mut self.#ident)
            )));
            ref_arms.push(quote!(#index => ::core::option::Option::Some(
                ::tagconf::FieldRef::Leaf(&self.#ident)
            )));
            quote!(Leaf)
        };

        let key = opt(&attrs.key);
        let default = opt(&attrs.default);
        let flag = opt(&attrs.flag);
        let env = opt(&attrs.env);
        let required = opt(&attrs.required);
        let validation = opt(&attrs.validation);
        schemas.push(quote! {
            ::tagconf::FieldSchema {
                name: #name,
                tags: ::tagconf::Tags {
                    key: #key,
                    default: #default,
                    flag: #flag,
                    env: #env,
                    required: #required,
                    validation: #validation,
                },
                kind: ::tagconf::FieldKind::#kind,
                embedded: #embedded,
                exported: #exported,
            }
        });
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::tagconf::Config for #ident #ty_generics #where_clause {
            fn fields(&self) -> &'static [::tagconf::FieldSchema] {
                const FIELDS: &[::tagconf::FieldSchema] = &[#(#schemas),*];
                FIELDS
            }

            fn field_mut(&mut self, index: usize) -> ::core::option::Option<::tagconf::FieldMut<'_>> {
                match index {
                    #(#mut_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_ref(&self, index: usize) -> ::core::option::Option<::tagconf::FieldRef<'_>> {
                match index {
                    #(#ref_arms,)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}
