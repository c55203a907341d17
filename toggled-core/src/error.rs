//! Error types for toggled.
//!
//! Nothing here is ever returned to the caller of an invocation. These
//! values travel as [`Event`] payloads so that listeners can inspect what
//! went wrong:
//!
//! - [`DispatchError`] - Why an invocation short-circuited to its fallback
//! - [`Fault`] - What feature code raised while running
//!
//! [`Event`]: crate::Event

use crate::event::EventKind;
use std::any::Any;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure raised by feature code while it was running.
#[derive(Error, Debug)]
pub enum Fault {
    /// The feature code panicked.
    #[error("panicked: {0}")]
    Panic(String),

    /// The operation returned an error.
    #[error(transparent)]
    Error(BoxError),
}

impl Fault {
    /// Build a fault from a payload caught by [`std::panic::catch_unwind`].
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_owned(),
                Err(_) => "non-string panic payload".to_owned(),
            },
        };
        Fault::Panic(message)
    }

    /// Returns `true` if the fault is a caught panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, Fault::Panic(_))
    }
}

impl From<BoxError> for Fault {
    fn from(err: BoxError) -> Self {
        Fault::Error(err)
    }
}

/// Why an invocation short-circuited with reporting.
///
/// There is exactly one variant per [`EventKind`].
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No feature is registered under the requested name.
    #[error("feature has not been registered: `{feature}`")]
    FeatureNotRegistered {
        /// The requested feature name.
        feature: String,
    },

    /// The feature has no operation with the requested name.
    #[error("operation `{operation}` is not found in feature `{feature}`")]
    OperationNotFound {
        /// The feature name.
        feature: String,
        /// The requested operation name.
        operation: String,
    },

    /// The operation (or the activation predicate guarding it) faulted.
    #[error("operation `{operation}` in feature `{feature}` faulted: {fault}")]
    OperationFaulted {
        /// The feature name.
        feature: String,
        /// The operation name.
        operation: String,
        /// The captured fault.
        #[source]
        fault: Fault,
    },

    /// The operation does not take exactly one argument.
    #[error(
        "operation `{operation}` in feature `{feature}` must take exactly one argument, but takes {arity}"
    )]
    OperationArityInvalid {
        /// The feature name.
        feature: String,
        /// The operation name.
        operation: String,
        /// The declared number of arguments.
        arity: usize,
    },

    /// The context is not assignable to the operation's parameter.
    #[error(
        "signature mismatch: context is `{found}`, but operation `{operation}` in feature `{feature}` takes `{expected}`"
    )]
    OperationSignatureMismatch {
        /// The feature name.
        feature: String,
        /// The operation name.
        operation: String,
        /// The declared parameter type.
        expected: &'static str,
        /// The supplied context type.
        found: &'static str,
    },
}

impl DispatchError {
    /// The event kind this error is reported as.
    pub fn kind(&self) -> EventKind {
        match self {
            DispatchError::FeatureNotRegistered { .. } => EventKind::FeatureNotRegistered,
            DispatchError::OperationNotFound { .. } => EventKind::OperationNotFound,
            DispatchError::OperationFaulted { .. } => EventKind::OperationFaulted,
            DispatchError::OperationArityInvalid { .. } => EventKind::OperationArityInvalid,
            DispatchError::OperationSignatureMismatch { .. } => {
                EventKind::OperationSignatureMismatch
            }
        }
    }

    /// The feature the failed invocation targeted.
    pub fn feature(&self) -> &str {
        match self {
            DispatchError::FeatureNotRegistered { feature }
            | DispatchError::OperationNotFound { feature, .. }
            | DispatchError::OperationFaulted { feature, .. }
            | DispatchError::OperationArityInvalid { feature, .. }
            | DispatchError::OperationSignatureMismatch { feature, .. } => feature,
        }
    }

    /// The operation the failed invocation targeted, when it got that far.
    pub fn operation(&self) -> Option<&str> {
        match self {
            DispatchError::FeatureNotRegistered { .. } => None,
            DispatchError::OperationNotFound { operation, .. }
            | DispatchError::OperationFaulted { operation, .. }
            | DispatchError::OperationArityInvalid { operation, .. }
            | DispatchError::OperationSignatureMismatch { operation, .. } => Some(operation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::catch_unwind;

    #[test]
    fn test_fault_from_str_panic() {
        let payload = catch_unwind(|| panic!("expected panic")).unwrap_err();
        let fault = Fault::from_panic(payload);
        assert!(fault.is_panic());
        assert_eq!(fault.to_string(), "panicked: expected panic");
    }

    #[test]
    fn test_fault_from_formatted_panic() {
        let payload = catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(Fault::from_panic(payload).to_string(), "panicked: code 7");
    }

    #[test]
    fn test_fault_from_opaque_panic() {
        let payload = catch_unwind(|| std::panic::panic_any(17_u8)).unwrap_err();
        assert_eq!(
            Fault::from_panic(payload).to_string(),
            "panicked: non-string panic payload"
        );
    }

    #[test]
    fn test_dispatch_error_kind_and_names() {
        let err = DispatchError::OperationArityInvalid {
            feature: "hello".into(),
            operation: "say".into(),
            arity: 2,
        };
        assert_eq!(err.kind(), EventKind::OperationArityInvalid);
        assert_eq!(err.feature(), "hello");
        assert_eq!(err.operation(), Some("say"));

        let err = DispatchError::FeatureNotRegistered {
            feature: "missing".into(),
        };
        assert_eq!(err.kind(), EventKind::FeatureNotRegistered);
        assert_eq!(err.operation(), None);
        assert_eq!(err.to_string(), "feature has not been registered: `missing`");
    }

    #[test]
    fn test_faulted_error_exposes_source() {
        use std::error::Error;

        let err = DispatchError::OperationFaulted {
            feature: "f".into(),
            operation: "op".into(),
            fault: Fault::Panic("boom".into()),
        };
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("panicked: boom"));
    }
}
