//! # toggled-core
//!
//! Core contracts for the toggled feature-toggle dispatcher.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! feature implementations and event listeners that don't need the full
//! `toggled-std` registry and invoker.
//!
//! # Contracts
//!
//! ## [`Feature`]
//!
//! A named, swappable unit of optional behavior. A feature answers one
//! question, "am I active for this context?", and exposes a table of named
//! operations. The table is built once, at registration time, through
//! [`Feature::operations`].
//!
//! ## [`Operations`]
//!
//! The per-feature operation table. Each entry pairs a handler with a
//! [`Signature`] describing how many arguments the handler takes and which
//! context types it accepts. The invoker validates a call against the
//! signature before the handler is ever entered.
//!
//! ## [`Listener`]
//!
//! An observer of dispatch [`Event`]s. Listeners are fanned out to
//! concurrently and never know about each other.
//!
//! # Error Types
//!
//! - [`DispatchError`] - One variant per [`EventKind`], carried as an event payload
//! - [`Fault`] - A panic or an error raised by feature code

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod context;
mod error;
mod event;
mod feature;
mod listener;
mod operation;

// Re-exports
pub use context::Context;
pub use error::{BoxError, DispatchError, Fault};
pub use event::{Event, EventKind};
pub use feature::{BoundFeature, ErasedFeature, Feature};
pub use listener::Listener;
pub use operation::{IntoOperation, IntoOutcome, Operation, Operations, Param, Signature, marker};
