//! Static registration macro.
//!
//! This module contains:
//! - `#[register]` - Attribute macro submitting a feature constructor to `inventory`

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Ident, ItemFn, LitStr, ReturnType, Token,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

/// Arguments for the `#[register]` macro.
///
/// Either empty, a bare string literal, or `name = "..."`.
struct RegisterArgs {
    name: Option<LitStr>,
}

impl Parse for RegisterArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            return Ok(RegisterArgs { name: None });
        }
        if input.peek(LitStr) {
            let name = input.parse()?;
            return Ok(RegisterArgs { name: Some(name) });
        }

        let ident: Ident = input.parse()?;
        if ident != "name" {
            return Err(syn::Error::new(
                ident.span(),
                format!("unknown attribute: {}", ident),
            ));
        }
        input.parse::<Token![=]>()?;
        let name = input.parse()?;
        Ok(RegisterArgs { name: Some(name) })
    }
}

/// Implementation of the `#[register]` macro.
pub fn register_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as RegisterArgs);
    let input = parse_macro_input!(item as ItemFn);

    let fn_name = &input.sig.ident;

    if !input.sig.inputs.is_empty() {
        return syn::Error::new_spanned(
            &input.sig.inputs,
            "feature constructor must take no arguments",
        )
        .to_compile_error()
        .into();
    }
    if let ReturnType::Default = input.sig.output {
        return syn::Error::new_spanned(
            &input.sig,
            "feature constructor must return the feature: fn() -> impl Feature",
        )
        .to_compile_error()
        .into();
    }
    if input.sig.asyncness.is_some() {
        return syn::Error::new_spanned(
            &input.sig.asyncness,
            "feature constructor must not be async",
        )
        .to_compile_error()
        .into();
    }

    let name = args
        .name
        .unwrap_or_else(|| LitStr::new(&fn_name.to_string(), fn_name.span()));

    let expanded = quote! {
        #input

        ::toggled::submit_feature!(#name, #fn_name);
    };

    TokenStream::from(expanded)
}
