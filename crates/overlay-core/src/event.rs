#![forbid(unsafe_code)]

//! Runtime diagnostic events.
//!
//! Events arrive from the runtime error bus in the order they occurred. Each
//! one carries a producer-assigned [`EventId`] that is unique and monotonic
//! for the lifetime of a session; the overlay never mints ids itself.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Producer-assigned identity of a [`DiagnosticEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct EventId(pub u64);

impl EventId {
    /// Raw id value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EventId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// The thrown value behind an unhandled error or rejection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ErrorReason {
    /// Error class name (`TypeError`, `Error`, ...).
    pub name: String,
    /// Human-readable message.
    pub message: String,
    /// Raw, unresolved stack trace.
    pub stack: String,
}

impl ErrorReason {
    /// Create a reason from its three parts.
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: stack.into(),
        }
    }
}

/// What kind of bus event a [`DiagnosticEvent`] carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "kebab-case")
)]
pub enum DiagnosticPayload {
    /// An exception escaped to the global error handler.
    UnhandledError {
        /// The thrown value.
        reason: ErrorReason,
    },
    /// A promise rejection nobody handled.
    UnhandledRejection {
        /// The rejection value.
        reason: ErrorReason,
    },
    /// Any other bus event kind. Carries no reason and never deduplicates.
    Unsupported {
        /// Bus event type tag, kept for logging.
        kind: String,
    },
}

impl DiagnosticPayload {
    /// Short label used in logs and spans.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::UnhandledError { .. } => "unhandled-error",
            Self::UnhandledRejection { .. } => "unhandled-rejection",
            Self::Unsupported { kind } => kind,
        }
    }
}

/// A single diagnostic event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiagnosticEvent {
    /// Unique, monotonic id assigned by the producer.
    pub id: EventId,
    /// The event body.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub payload: DiagnosticPayload,
}

impl DiagnosticEvent {
    /// Wrap a payload with its id.
    pub fn new(id: impl Into<EventId>, payload: DiagnosticPayload) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    /// Shorthand for an unhandled error event.
    pub fn unhandled_error(id: impl Into<EventId>, reason: ErrorReason) -> Self {
        Self::new(id, DiagnosticPayload::UnhandledError { reason })
    }

    /// Shorthand for an unhandled rejection event.
    pub fn unhandled_rejection(id: impl Into<EventId>, reason: ErrorReason) -> Self {
        Self::new(id, DiagnosticPayload::UnhandledRejection { reason })
    }

    /// The thrown value, if this is an error or rejection.
    #[must_use]
    pub fn reason(&self) -> Option<&ErrorReason> {
        match &self.payload {
            DiagnosticPayload::UnhandledError { reason }
            | DiagnosticPayload::UnhandledRejection { reason } => Some(reason),
            DiagnosticPayload::Unsupported { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_present_for_errors_and_rejections() {
        let reason = ErrorReason::new("TypeError", "x is undefined", "at a (a.js:1:1)");
        let err = DiagnosticEvent::unhandled_error(1, reason.clone());
        let rej = DiagnosticEvent::unhandled_rejection(2, reason.clone());
        assert_eq!(err.reason(), Some(&reason));
        assert_eq!(rej.reason(), Some(&reason));
    }

    #[test]
    fn unsupported_has_no_reason() {
        let ev = DiagnosticEvent::new(
            3,
            DiagnosticPayload::Unsupported {
                kind: "build-ok".into(),
            },
        );
        assert!(ev.reason().is_none());
        assert_eq!(ev.payload.kind(), "build-ok");
    }

    #[test]
    fn event_id_display_and_order() {
        assert_eq!(EventId(42).to_string(), "42");
        assert!(EventId(1) < EventId(2));
        assert_eq!(EventId::from(7).get(), 7);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn payload_serializes_with_type_tag() {
        let ev = DiagnosticEvent::unhandled_rejection(5, ErrorReason::new("Error", "boom", ""));
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["type"], "unhandled-rejection");
        assert_eq!(json["reason"]["message"], "boom");
    }
}
