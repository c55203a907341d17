//! Standard listener implementations.

use toggled_core::{Event, EventKind, Listener};

/// A listener that logs every event through `tracing`.
///
/// Faults are logged at `error`, every other kind at `warn`.
///
/// # Example
///
/// ```rust,ignore
/// let toggles = Toggles::builder()
///     .listener(LoggingListener::named("checkout"))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct LoggingListener {
    name: &'static str,
}

impl LoggingListener {
    /// Create a new `LoggingListener` with a default name.
    pub fn new() -> Self {
        Self { name: "toggled" }
    }

    /// Create a new `LoggingListener` with a custom name.
    ///
    /// The name is attached to every log line as the `listener` field.
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }

    /// The name attached to log lines.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for LoggingListener {
    fn listen(&self, event: &Event) {
        let feature = event.dispatch_error().map(|err| err.feature());
        let operation = event.dispatch_error().and_then(|err| err.operation());
        match event.kind() {
            EventKind::OperationFaulted => tracing::error!(
                listener = self.name,
                kind = %event.kind(),
                feature,
                operation,
                payload = %event.payload(),
                "feature event"
            ),
            kind => tracing::warn!(
                listener = self.name,
                %kind,
                feature,
                operation,
                payload = %event.payload(),
                "feature event"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toggled_core::DispatchError;

    #[test]
    fn test_logging_listener_named() {
        assert_eq!(LoggingListener::new().name(), "toggled");
        assert_eq!(LoggingListener::named("checkout").name(), "checkout");
    }

    #[test]
    fn test_logging_listener_accepts_any_payload() {
        let listener = LoggingListener::new();
        listener.listen(&Event::from(DispatchError::FeatureNotRegistered {
            feature: "missing".into(),
        }));
        listener.listen(&Event::new(EventKind::OperationFaulted, "opaque"));
    }
}
