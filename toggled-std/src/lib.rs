//! # toggled-std
//!
//! Standard implementations for the toggled feature-toggle dispatcher.
//!
//! This crate provides:
//! - **Registry**: [`Registry`], name to feature with a sticky fault latch
//! - **Invoker**: [`Invoker`], gated dispatch with fallbacks
//! - **Notifier**: [`Notifier`], concurrent event fan-out with [`Notifier::wait`]
//! - **Context object**: [`Toggles`] and [`TogglesBuilder`], plus a
//!   process-wide default in [`global`]
//! - **Standard listeners**: [`listeners::LoggingListener`]
//! - **Static registration** (feature `inventory`): `submit_feature!`

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core contracts
pub use toggled_core;

// Modules
pub mod global;
pub mod invocation;
pub mod invoker;
pub mod listeners;
pub mod notifier;
pub mod registry;
#[cfg(feature = "inventory")]
pub mod statics;
pub mod testing;
pub mod toggles;

pub use invocation::Invocation;
pub use invoker::{Invoker, NO_FALLBACK, Outcome};
pub use notifier::{DEFAULT_THREAD_NAME, Notifier, NotifierConfig};
pub use registry::{Registry, RegistryEntry};
#[cfg(feature = "inventory")]
pub use statics::FeatureRegistration;
pub use toggles::{Toggles, TogglesBuilder};

#[cfg(feature = "inventory")]
pub use inventory;
