//! # Operation Table
//!
//! Every feature exposes its operations through an explicit table built at
//! registration time: a map from operation name to a typed handler wrapped
//! in a uniform `(feature, context)` shape, plus the handler's declared
//! [`Signature`].
//!
//! The signature is what lets the invoker reject a call before the handler
//! is entered: an operation that doesn't take exactly one argument, or
//! whose parameter type doesn't match the supplied [`Context`], is never
//! called.
//!
//! # Handler Shapes
//!
//! | handler | arity | parameter |
//! |---|---|---|
//! | `Fn(&F)` | 0 | - |
//! | `Fn(&F, &A)` | 1 | [`Param::Ref`] |
//! | `Fn(&F, Option<&A>)` | 1 | [`Param::Nullable`] |
//! | `Fn(&F, &str)` | 1 | [`Param::Text`] |
//! | `Fn(&F, Option<&str>)` | 1 | [`Param::NullableText`] |
//! | `Fn(&F, Context<'_>)` | 1 | [`Param::Any`] |
//! | `Fn(&F, &A, &B)` | 2 | two [`Param::Ref`] |
//! | `Fn(&F, &A, &B, &C)` | 3 | three [`Param::Ref`] |
//!
//! Handlers return `()` or `Result<(), E>`; see [`IntoOutcome`].

use crate::{context::Context, error::BoxError};
use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt,
};

/// The declared type of one operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Requires a present context of exactly this type.
    Ref {
        /// Type id of the parameter.
        id: TypeId,
        /// Type name of the parameter.
        name: &'static str,
    },
    /// Accepts a context of this type, or the absent context.
    Nullable {
        /// Type id of the parameter.
        id: TypeId,
        /// Type name of the parameter.
        name: &'static str,
    },
    /// Requires a present `String` or `&'static str` context.
    Text,
    /// Accepts a text context, or the absent context.
    NullableText,
    /// Accepts every context, including the absent one.
    Any,
}

impl Param {
    /// A parameter declared as `&T`.
    pub fn of<T: Any>() -> Self {
        Param::Ref {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// A parameter declared as `Option<&T>`.
    pub fn nullable<T: Any>() -> Self {
        Param::Nullable {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Check whether a context is assignable to this parameter.
    pub fn accepts(&self, context: &Context<'_>) -> bool {
        match (self, context.type_id()) {
            (Param::Any, _) => true,
            (Param::Ref { id, .. }, Some(found)) => *id == found,
            (Param::Ref { .. }, None) => false,
            (Param::Nullable { id, .. }, Some(found)) => *id == found,
            (Param::Nullable { .. }, None) => true,
            (Param::Text, _) => context.is_text(),
            (Param::NullableText, _) => context.is_none() || context.is_text(),
        }
    }

    /// Human-readable name of the declared type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Param::Ref { name, .. } | Param::Nullable { name, .. } => name,
            Param::Text | Param::NullableText => "str",
            Param::Any => "Context",
        }
    }
}

/// The declared shape of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// Create a signature from its parameter list.
    pub fn new(params: Vec<Param>) -> Self {
        Self { params }
    }

    /// Number of parameters, not counting the feature receiver.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The declared parameters.
    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

type Call<F> = Box<dyn Fn(&F, Context<'_>) -> Result<(), BoxError> + Send + Sync>;

/// A type-erased handler paired with its signature.
pub struct Operation<F> {
    signature: Signature,
    call: Call<F>,
}

impl<F: 'static> Operation<F> {
    /// Create an operation from a uniform-shape handler.
    pub fn new<C>(signature: Signature, call: C) -> Self
    where
        C: Fn(&F, Context<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            signature,
            call: Box::new(call),
        }
    }

    /// An operation whose shape can never be invoked with a single context.
    fn uncallable(signature: Signature) -> Self {
        let arity = signature.arity();
        Self::new(signature, move |_: &F, _: Context<'_>| {
            Err(format!("operation takes {arity} arguments, not a single context").into())
        })
    }

    /// The declared signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Run the handler.
    ///
    /// Callers are expected to have checked the context against
    /// [`Operation::signature`]; a context of the wrong type yields an
    /// error rather than entering the handler.
    pub fn call(&self, feature: &F, context: Context<'_>) -> Result<(), BoxError> {
        (self.call)(feature, context)
    }
}

impl<F> fmt::Debug for Operation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Conversion of an operation's return value into success or fault.
///
/// - `()` → success
/// - `Result<(), E>` → `Err` is a fault, reported like a panic
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid operation return type",
    label = "operations must return `()` or `Result<(), E>`",
    note = "`E` must convert into `Box<dyn Error + Send + Sync>`."
)]
pub trait IntoOutcome {
    /// Convert the return value.
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> IntoOutcome for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// Marker types selecting an [`IntoOperation`] implementation.
///
/// These only exist to keep the handler-shape impls coherent; they are
/// inferred and never named by users.
pub mod marker {
    use std::marker::PhantomData;

    /// `Fn(&F) -> R`
    pub struct Nullary<R>(PhantomData<fn() -> R>);
    /// `Fn(&F, &A) -> R`
    pub struct ByRef<A, R>(PhantomData<fn(&A) -> R>);
    /// `Fn(&F, Option<&A>) -> R`
    pub struct Nullable<A, R>(PhantomData<fn(Option<&A>) -> R>);
    /// `Fn(&F, &str) -> R`
    pub struct Text<R>(PhantomData<fn() -> R>);
    /// `Fn(&F, Option<&str>) -> R`
    pub struct NullableText<R>(PhantomData<fn() -> R>);
    /// `Fn(&F, Context<'_>) -> R`
    pub struct Untyped<R>(PhantomData<fn() -> R>);
    /// `Fn(&F, &A, &B) -> R`
    pub struct ByRef2<A, B, R>(PhantomData<fn(&A, &B) -> R>);
    /// `Fn(&F, &A, &B, &C) -> R`
    pub struct ByRef3<A, B, C, R>(PhantomData<fn(&A, &B, &C) -> R>);
}

/// Conversion of a typed handler into an [`Operation`].
///
/// `M` is a [`marker`] type inferred from the handler's shape.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as an operation of `{F}`",
    label = "unsupported operation shape",
    note = "Operations are `Fn(&F)`, `Fn(&F, &A)`, `Fn(&F, Option<&A>)`, `Fn(&F, &str)`, `Fn(&F, Option<&str>)`, `Fn(&F, Context<'_>)` or take up to three `&T` arguments, returning `()` or `Result<(), E>`."
)]
pub trait IntoOperation<F, M>: Send + Sync + 'static {
    /// Wrap the handler.
    fn into_operation(self) -> Operation<F>;
}

impl<F, H, R> IntoOperation<F, marker::Nullary<R>> for H
where
    F: 'static,
    H: Fn(&F) -> R + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    fn into_operation(self) -> Operation<F> {
        Operation::uncallable(Signature::new(Vec::new()))
    }
}

impl<F, H, A, R> IntoOperation<F, marker::ByRef<A, R>> for H
where
    F: 'static,
    A: Any,
    H: Fn(&F, &A) -> R + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    fn into_operation(self) -> Operation<F> {
        Operation::new(
            Signature::new(vec![Param::of::<A>()]),
            move |feature: &F, context: Context<'_>| {
                let arg = context
                    .downcast_ref::<A>()
                    .ok_or_else(|| mismatch::<A>(&context))?;
                (self)(feature, arg).into_outcome()
            },
        )
    }
}

impl<F, H, A, R> IntoOperation<F, marker::Nullable<A, R>> for H
where
    F: 'static,
    A: Any,
    H: Fn(&F, Option<&A>) -> R + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    fn into_operation(self) -> Operation<F> {
        Operation::new(
            Signature::new(vec![Param::nullable::<A>()]),
            move |feature: &F, context: Context<'_>| {
                let arg = if context.is_none() {
                    None
                } else {
                    Some(
                        context
                            .downcast_ref::<A>()
                            .ok_or_else(|| mismatch::<A>(&context))?,
                    )
                };
                (self)(feature, arg).into_outcome()
            },
        )
    }
}

impl<F, H, R> IntoOperation<F, marker::Text<R>> for H
where
    F: 'static,
    H: Fn(&F, &str) -> R + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    fn into_operation(self) -> Operation<F> {
        Operation::new(
            Signature::new(vec![Param::Text]),
            move |feature: &F, context: Context<'_>| {
                let arg = context.as_str().ok_or_else(|| mismatch::<str>(&context))?;
                (self)(feature, arg).into_outcome()
            },
        )
    }
}

impl<F, H, R> IntoOperation<F, marker::NullableText<R>> for H
where
    F: 'static,
    H: Fn(&F, Option<&str>) -> R + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    fn into_operation(self) -> Operation<F> {
        Operation::new(
            Signature::new(vec![Param::NullableText]),
            move |feature: &F, context: Context<'_>| {
                let arg = if context.is_none() {
                    None
                } else {
                    Some(context.as_str().ok_or_else(|| mismatch::<str>(&context))?)
                };
                (self)(feature, arg).into_outcome()
            },
        )
    }
}

impl<F, H, R> IntoOperation<F, marker::Untyped<R>> for H
where
    F: 'static,
    H: Fn(&F, Context<'_>) -> R + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    fn into_operation(self) -> Operation<F> {
        Operation::new(
            Signature::new(vec![Param::Any]),
            move |feature: &F, context: Context<'_>| (self)(feature, context).into_outcome(),
        )
    }
}

impl<F, H, A, B, R> IntoOperation<F, marker::ByRef2<A, B, R>> for H
where
    F: 'static,
    A: Any,
    B: Any,
    H: Fn(&F, &A, &B) -> R + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    fn into_operation(self) -> Operation<F> {
        Operation::uncallable(Signature::new(vec![Param::of::<A>(), Param::of::<B>()]))
    }
}

impl<F, H, A, B, C, R> IntoOperation<F, marker::ByRef3<A, B, C, R>> for H
where
    F: 'static,
    A: Any,
    B: Any,
    C: Any,
    H: Fn(&F, &A, &B, &C) -> R + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    fn into_operation(self) -> Operation<F> {
        Operation::uncallable(Signature::new(vec![
            Param::of::<A>(),
            Param::of::<B>(),
            Param::of::<C>(),
        ]))
    }
}

fn mismatch<A: ?Sized + Any>(context: &Context<'_>) -> BoxError {
    format!(
        "context is `{}`, but the operation takes `{}`",
        context.type_name(),
        type_name::<A>()
    )
    .into()
}

/// The operation table of a feature of type `F`.
///
/// # Example
///
/// ```rust
/// use toggled_core::Operations;
///
/// struct Hello;
///
/// impl Hello {
///     fn say(&self, name: &str) {
///         println!("hello {name}");
///     }
/// }
///
/// let mut ops = Operations::<Hello>::new();
/// ops.add("say", Hello::say);
/// assert_eq!(ops.signature("say").map(|s| s.arity()), Some(1));
/// ```
pub struct Operations<F> {
    table: HashMap<String, Operation<F>>,
}

impl<F: 'static> Operations<F> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Add a named operation.
    ///
    /// # Panics
    ///
    /// Panics if an operation with the same name is already defined.
    #[track_caller]
    pub fn add<M, H>(&mut self, name: impl Into<String>, handler: H) -> &mut Self
    where
        H: IntoOperation<F, M>,
    {
        let name = name.into();
        assert!(
            !self.table.contains_key(&name),
            "operation `{name}` is already defined"
        );
        self.table.insert(name, handler.into_operation());
        self
    }

    /// Look up an operation by exact name.
    pub fn get(&self, name: &str) -> Option<&Operation<F>> {
        self.table.get(name)
    }

    /// The signature of a named operation.
    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.get(name).map(Operation::signature)
    }

    /// Operation names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    /// Get the number of operations.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if the table has no operations.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<F: 'static> Default for Operations<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: 'static> fmt::Debug for Operations<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.table.iter().map(|(name, op)| (name, op.signature())))
            .finish()
    }
}
