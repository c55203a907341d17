//! Type-erased invocation context.

use std::any::{Any, TypeId, type_name};
use std::fmt;

const NONE_TYPE_NAME: &str = "<none>";

/// The borrowed value handed to a feature invocation.
///
/// A context is either absent ([`Context::none`]) or a reference to a value
/// of some concrete `'static` type. The concrete type is checked against an
/// operation's declared parameter before the operation runs, and recovered
/// inside the operation through [`Context::downcast_ref`].
///
/// # Example
///
/// ```rust
/// use toggled_core::Context;
///
/// let name = String::from("hi");
/// let ctx = Context::from(&name);
/// assert_eq!(ctx.downcast_ref::<String>().map(String::as_str), Some("hi"));
/// assert!(Context::none().is_none());
/// ```
#[derive(Clone, Copy)]
pub struct Context<'a> {
    value: Option<&'a dyn Any>,
    type_name: &'static str,
}

impl<'a> Context<'a> {
    /// The absent context.
    pub const fn none() -> Self {
        Self {
            value: None,
            type_name: NONE_TYPE_NAME,
        }
    }

    /// Wrap a reference to a concrete value.
    pub fn of<T: Any>(value: &'a T) -> Self {
        Self {
            value: Some(value),
            type_name: type_name::<T>(),
        }
    }

    /// Returns `true` for the absent context.
    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    /// The [`TypeId`] of the wrapped value, if any.
    pub fn type_id(&self) -> Option<TypeId> {
        self.value.map(<dyn Any>::type_id)
    }

    /// The name of the wrapped value's type, or `"<none>"`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id() == Some(TypeId::of::<T>())
    }

    /// Borrow the wrapped value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        self.value.and_then(|value| value.downcast_ref::<T>())
    }

    /// Borrow the wrapped value as text.
    ///
    /// Both `String` and `&'static str` contexts are text.
    pub fn as_str(&self) -> Option<&'a str> {
        let value = self.value?;
        value
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| value.downcast_ref::<&'static str>().copied())
    }

    /// Returns `true` if the wrapped value is text.
    pub fn is_text(&self) -> bool {
        self.is::<String>() || self.is::<&'static str>()
    }
}

impl Default for Context<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl<'a, T: Any> From<&'a T> for Context<'a> {
    fn from(value: &'a T) -> Self {
        Self::of(value)
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&self.type_name).finish()
    }
}
