//! Derive macros for [tagconf](https://docs.rs/tagconf).
//!
//! `#[derive(Config)]` describes a struct's fields to the loader and
//! `#[derive(Setting)]` lets a newtype stand in for the type it wraps.
//! Generated code refers to `::tagconf`, so the main crate must be a
//! dependency under that name.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod config;
mod setting;

/// Implement `tagconf::Config` for a struct with named fields.
///
/// Field options go in `#[conf(...)]`: `key`, `default`, `env`, `flag`,
/// `validation` (string literals), `required` (bare, or a string literal)
/// and the `nested` / `embed` markers for record-typed fields.
#[proc_macro_derive(Config, attributes(conf))]
pub fn derive_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    config::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Implement `tagconf::Setting` for a single-field tuple struct by
/// delegating to the wrapped type.
#[proc_macro_derive(Setting)]
pub fn derive_setting(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    setting::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
