//! Dispatch events.

use crate::error::{BoxError, DispatchError};
use std::{error::Error, fmt, sync::Arc};

/// The closed set of conditions an invocation reports.
///
/// Two silent outcomes (a feature already faulted, a feature inactive for
/// the context) are deliberately absent: they are steady states, not
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// No feature is registered under the requested name.
    FeatureNotRegistered,
    /// The feature has no operation with the requested name.
    OperationNotFound,
    /// The operation faulted at runtime.
    OperationFaulted,
    /// The operation does not take exactly one argument.
    OperationArityInvalid,
    /// The context is not assignable to the operation's parameter.
    OperationSignatureMismatch,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 5] = [
        EventKind::FeatureNotRegistered,
        EventKind::OperationNotFound,
        EventKind::OperationFaulted,
        EventKind::OperationArityInvalid,
        EventKind::OperationSignatureMismatch,
    ];

    /// Stable name of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::FeatureNotRegistered => "FeatureNotRegistered",
            EventKind::OperationNotFound => "OperationNotFound",
            EventKind::OperationFaulted => "OperationFaulted",
            EventKind::OperationArityInvalid => "OperationArityInvalid",
            EventKind::OperationSignatureMismatch => "OperationSignatureMismatch",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record describing why an invocation short-circuited.
///
/// Events are cheap to clone: the payload is shared.
#[derive(Debug, Clone)]
pub struct Event {
    kind: EventKind,
    payload: Arc<dyn Error + Send + Sync + 'static>,
}

impl Event {
    /// Create a new event.
    pub fn new(kind: EventKind, payload: impl Into<BoxError>) -> Self {
        Self {
            kind,
            payload: Arc::from(payload.into()),
        }
    }

    /// The event kind.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The payload describing the condition.
    pub fn payload(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.payload
    }

    /// Downcast the payload to a concrete error type.
    pub fn downcast_ref<T: Error + 'static>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// The payload as a [`DispatchError`], which every invoker-produced
    /// event carries.
    pub fn dispatch_error(&self) -> Option<&DispatchError> {
        self.downcast_ref::<DispatchError>()
    }
}

impl From<DispatchError> for Event {
    fn from(err: DispatchError) -> Self {
        Event::new(err.kind(), err)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        let names: Vec<_> = EventKind::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            [
                "FeatureNotRegistered",
                "OperationNotFound",
                "OperationFaulted",
                "OperationArityInvalid",
                "OperationSignatureMismatch",
            ]
        );
    }

    #[test]
    fn test_new_event_keeps_payload() {
        let event = Event::new(EventKind::OperationFaulted, "testerr1");
        assert_eq!(event.kind(), EventKind::OperationFaulted);
        assert_eq!(event.payload().to_string(), "testerr1");
        assert!(event.dispatch_error().is_none());

        let clone = event.clone();
        assert_eq!(clone.kind(), EventKind::OperationFaulted);
        assert_eq!(clone.payload().to_string(), "testerr1");
    }

    #[test]
    fn test_event_from_dispatch_error() {
        let event = Event::from(DispatchError::OperationNotFound {
            feature: "hello".into(),
            operation: "Say3".into(),
        });
        assert_eq!(event.kind(), EventKind::OperationNotFound);

        let err = event.dispatch_error().unwrap();
        assert_eq!(err.feature(), "hello");
        assert_eq!(err.operation(), Some("Say3"));
        assert_eq!(
            event.to_string(),
            "OperationNotFound: operation `Say3` is not found in feature `hello`"
        );
    }
}
