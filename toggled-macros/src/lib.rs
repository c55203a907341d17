//! Procedural macros for toggled.
//!
//! Use these through the `toggled` facade (`toggled::feature`,
//! `toggled::register`); the generated code refers to `::toggled` paths.

use proc_macro::TokenStream;

mod feature;
mod register;

/// Derive a `Feature` implementation from an inherent impl block.
///
/// The block must define
/// `fn active_if(&self, context: Context<'_>, options: &[&dyn Any]) -> bool`.
/// Every other method taking `&self` becomes an operation named after the
/// method.
///
/// - `#[operation(name = "...")]` renames an operation
/// - `#[operation(skip)]` keeps a method out of the table
///
/// # Example
///
/// ```rust,ignore
/// struct Greeter;
///
/// #[toggled::feature]
/// impl Greeter {
///     fn active_if(&self, _context: Context<'_>, _options: &[&dyn Any]) -> bool {
///         true
///     }
///
///     fn greet(&self, name: &str) {
///         println!("hello {name}");
///     }
///
///     #[operation(name = "wave")]
///     fn greet_silently(&self, _name: &str) {}
///
///     #[operation(skip)]
///     fn helper(&self) {}
/// }
/// ```
#[proc_macro_attribute]
pub fn feature(attr: TokenStream, item: TokenStream) -> TokenStream {
    feature::feature_impl(attr, item)
}

/// Submit a feature constructor for static registration.
///
/// The feature is registered under the given name, or under the function
/// name when none is given. Requires the `inventory` feature of `toggled`.
///
/// # Example
///
/// ```rust,ignore
/// #[toggled::register("greeter")]
/// fn greeter() -> Greeter {
///     Greeter
/// }
/// ```
#[proc_macro_attribute]
pub fn register(attr: TokenStream, item: TokenStream) -> TokenStream {
    register::register_impl(attr, item)
}
