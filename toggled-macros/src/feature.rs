//! Feature-related macros.
//!
//! This module contains:
//! - `#[feature]` - Attribute macro deriving `Feature` from an inherent impl block

use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::{
    Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, Receiver, parse_macro_input,
};

const PREDICATE: &str = "active_if";

/// Options from a method's `#[operation(...)]` attribute.
#[derive(Default)]
struct OperationArgs {
    name: Option<LitStr>,
    skip: bool,
}

impl OperationArgs {
    /// Parse and strip every `#[operation(...)]` attribute.
    fn take(attrs: &mut Vec<Attribute>) -> syn::Result<Self> {
        let mut args = OperationArgs::default();
        let mut errors = Vec::new();

        attrs.retain(|attr| {
            if !attr.path().is_ident("operation") {
                return true;
            }
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    args.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    args.skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown operation attribute, expected `name` or `skip`"))
                }
            });
            if let Err(err) = parsed {
                errors.push(err);
            }
            false
        });

        match combine(errors) {
            Some(err) => Err(err),
            None => Ok(args),
        }
    }
}

/// Fold errors into one so that all of them are reported.
fn combine(errors: Vec<syn::Error>) -> Option<syn::Error> {
    errors.into_iter().reduce(|mut first, err| {
        first.combine(err);
        first
    })
}

/// Whether the method takes `&self`.
fn is_shared_ref_receiver(method: &ImplItemFn) -> bool {
    matches!(
        method.sig.inputs.first(),
        Some(FnArg::Receiver(Receiver {
            reference: Some(_),
            mutability: None,
            ..
        }))
    )
}

/// Implementation of the `#[feature]` macro.
pub fn feature_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::TokenStream::from(attr).into_iter().next().map_or_else(
                proc_macro2::Span::call_site,
                |token| token.span(),
            ),
            "#[feature] takes no arguments",
        )
        .to_compile_error()
        .into();
    }

    let mut input = parse_macro_input!(item as ItemImpl);
    match expand(&mut input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => {
            let err = err.to_compile_error();
            TokenStream::from(quote! {
                #input
                #err
            })
        }
    }
}

fn expand(input: &mut ItemImpl) -> syn::Result<proc_macro2::TokenStream> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[feature] must be placed on an inherent impl block",
        ));
    }

    let mut has_predicate = false;
    let mut seen = HashSet::new();
    let mut registrations = Vec::new();
    let mut errors = Vec::new();

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let args = match OperationArgs::take(&mut method.attrs) {
            Ok(args) => args,
            Err(err) => {
                errors.push(err);
                continue;
            }
        };

        let ident = &method.sig.ident;
        if ident == PREDICATE {
            if args.name.is_some() || args.skip {
                errors.push(syn::Error::new_spanned(
                    ident,
                    "`active_if` is the activation predicate and cannot be an operation",
                ));
            }
            has_predicate = true;
            continue;
        }
        if args.skip {
            continue;
        }
        if !is_shared_ref_receiver(method) {
            if args.name.is_some() {
                errors.push(syn::Error::new_spanned(
                    &method.sig,
                    "operations must take `&self`",
                ));
            }
            continue;
        }

        let name = args
            .name
            .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
        if !seen.insert(name.value()) {
            errors.push(syn::Error::new_spanned(
                &name,
                format!("operation `{}` is already defined", name.value()),
            ));
            continue;
        }
        registrations.push(quote! {
            ops.add(#name, Self::#ident);
        });
    }

    if !has_predicate {
        errors.push(syn::Error::new_spanned(
            &input.self_ty,
            "#[feature] requires `fn active_if(&self, context: Context<'_>, options: &[&dyn Any]) -> bool`",
        ));
    }
    if let Some(err) = combine(errors) {
        return Err(err);
    }

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #input

        impl #impl_generics ::toggled::Feature for #self_ty #where_clause {
            fn active_if(
                &self,
                context: ::toggled::Context<'_>,
                options: &[&dyn ::core::any::Any],
            ) -> bool {
                <#self_ty>::active_if(self, context, options)
            }

            fn operations(ops: &mut ::toggled::Operations<Self>) {
                #(#registrations)*
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand_err(mut input: ItemImpl) -> String {
        match expand(&mut input) {
            Ok(tokens) => panic!("expected an error, got `{tokens}`"),
            Err(err) => err
                .into_iter()
                .map(|err| err.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    #[test]
    fn test_expands_shared_ref_methods() {
        let mut input: ItemImpl = parse_quote! {
            impl Shouter {
                fn active_if(&self, context: Context<'_>, options: &[&dyn Any]) -> bool { true }
                fn shout(&self, text: &str) {}
                #[operation(name = "whisper")]
                fn quietly(&self, text: &str) {}
                #[operation(skip)]
                fn push(&self, entry: String) {}
                fn reset(&mut self) {}
                fn fresh() -> Self { Self }
            }
        };

        let tokens = expand(&mut input).unwrap().to_string();
        let emitted = |expected: proc_macro2::TokenStream| tokens.contains(&expected.to_string());

        assert!(emitted(quote!(impl ::toggled::Feature for Shouter)));
        assert!(emitted(quote!(ops.add("shout", Self::shout);)));
        assert!(emitted(quote!(ops.add("whisper", Self::quietly);)));
        assert!(!emitted(quote!(Self::push)));
        assert!(!emitted(quote!(Self::reset)));
        assert!(!emitted(quote!(Self::fresh)));
        assert!(!tokens.contains("skip"));
    }

    #[test]
    fn test_named_mut_receiver_is_rejected() {
        let message = expand_err(parse_quote! {
            impl Shouter {
                fn active_if(&self, context: Context<'_>, options: &[&dyn Any]) -> bool { true }
                #[operation(name = "reset")]
                fn reset(&mut self) {}
            }
        });
        assert_eq!(message, "operations must take `&self`");
    }

    #[test]
    fn test_named_associated_fn_is_rejected() {
        let message = expand_err(parse_quote! {
            impl Shouter {
                fn active_if(&self, context: Context<'_>, options: &[&dyn Any]) -> bool { true }
                #[operation(name = "fresh")]
                fn fresh() -> Self { Self }
            }
        });
        assert_eq!(message, "operations must take `&self`");
    }

    #[test]
    fn test_duplicate_operation_names() {
        let message = expand_err(parse_quote! {
            impl Shouter {
                fn active_if(&self, context: Context<'_>, options: &[&dyn Any]) -> bool { true }
                fn shout(&self, text: &str) {}
                #[operation(name = "shout")]
                fn yell(&self, text: &str) {}
            }
        });
        assert_eq!(message, "operation `shout` is already defined");
    }

    #[test]
    fn test_missing_predicate() {
        let message = expand_err(parse_quote! {
            impl Shouter {
                fn shout(&self, text: &str) {}
            }
        });
        assert!(message.starts_with("#[feature] requires `fn active_if"));
    }

    #[test]
    fn test_all_errors_are_reported() {
        let message = expand_err(parse_quote! {
            impl Shouter {
                #[operation(name = "reset")]
                fn reset(&mut self) {}
                #[operation(colour = "red")]
                fn paint(&self) {}
            }
        });
        let lines: Vec<_> = message.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "operations must take `&self`");
        assert!(lines[1].starts_with("unknown operation attribute"));
    }

    #[test]
    fn test_trait_impl_is_rejected() {
        let message = expand_err(parse_quote! {
            impl Feature for Shouter {}
        });
        assert_eq!(message, "#[feature] must be placed on an inherent impl block");
    }
}
