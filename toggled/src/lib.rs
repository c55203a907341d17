//! # toggled - Runtime Feature Toggles
//!
//! `toggled` dispatches named operations to named, swappable features. The
//! caller never depends on a feature's implementation: if the feature is
//! missing, inactive, called the wrong way or broken, a caller-supplied
//! fallback runs instead and listeners are told why.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::any::Any;
//! use toggled::{Context, NO_FALLBACK, Toggles};
//!
//! struct Greeter;
//!
//! #[toggled::feature]
//! impl Greeter {
//!     fn active_if(&self, _context: Context<'_>, _options: &[&dyn Any]) -> bool {
//!         true
//!     }
//!
//!     fn greet(&self, name: &str) {
//!         println!("hello {name}");
//!     }
//! }
//!
//! let toggles = Toggles::new();
//! toggles.register("greeter", Greeter);
//! toggles.add_listener(|event: &toggled::Event| eprintln!("{event}"));
//!
//! toggles.invoke(&"world", "greeter", "greet", NO_FALLBACK, &[]);
//! toggles.invoke(&42_i32, "greeter", "greet", Some(|| println!("fallback")), &[]);
//! toggles.wait();
//! ```
//!
//! ## Fault Latch
//!
//! A feature whose activation predicate or operation panics (or whose
//! operation returns `Err`) is latched as faulted: one `OperationFaulted`
//! event is emitted and every later invocation takes the fallback silently
//! until the feature is registered again.
//!
//! ## Cargo Features
//!
//! - `macros` (default): `#[toggled::feature]` and `#[toggled::register]`
//! - `inventory`: static registration with `submit_feature!` and
//!   `Toggles::with_static_features`

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use toggled_core::{
    // Errors
    BoxError,
    // Contracts
    BoundFeature,
    Context,
    DispatchError,
    ErasedFeature,
    // Events
    Event,
    EventKind,
    Fault,
    Feature,
    // Operation table
    IntoOperation,
    IntoOutcome,
    Listener,
    Operation,
    Operations,
    Param,
    Signature,
};

pub use toggled_std::{
    DEFAULT_THREAD_NAME, Invocation, Invoker, NO_FALLBACK, Notifier, NotifierConfig, Outcome,
    Registry, RegistryEntry, Toggles, TogglesBuilder,
};

/// The process-wide default toggles and free functions over it.
pub mod global {
    pub use toggled_std::global::{
        active_if, add_listener, invoke, is_active, notify_all, register, toggles, try_invoke,
        wait,
    };
}

/// Standard listener implementations.
pub mod listeners {
    pub use toggled_std::listeners::LoggingListener;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use toggled_std::testing::*;
}

/// Static registration support.
#[cfg(feature = "inventory")]
pub mod statics {
    pub use toggled_std::statics::{FeatureRegistration, register_all, registrations};
}

/// Prelude module - common imports for toggled.
///
/// # Usage
///
/// ```rust,ignore
/// use toggled::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Context, Event, EventKind, Feature, Listener, NO_FALLBACK, Operations, Outcome, Toggles,
    };
}

#[cfg(feature = "macros")]
pub use toggled_macros::{feature, register};

#[cfg(feature = "inventory")]
pub use inventory;
#[cfg(feature = "inventory")]
pub use toggled_std::submit_feature;
