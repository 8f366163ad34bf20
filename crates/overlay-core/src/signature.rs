#![forbid(unsafe_code)]

//! Stable identity strings for duplicate suppression.
//!
//! Two neighbouring events with the same signature are treated as the same
//! error reported twice (React dev mode double-invokes, re-thrown rejections,
//! etc). Only errors and rejections have a signature; every other event kind
//! derives the empty signature, and empty signatures never match anything,
//! including each other.

use crate::event::{DiagnosticEvent, DiagnosticPayload};

/// Separator between the name, message and stack parts.
///
/// ASCII unit separator; it does not occur in error names, messages or
/// stack traces produced by JS engines.
pub const SIGNATURE_DELIMITER: char = '\u{1f}';

/// Identity string of a [`DiagnosticEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature(String);

impl Signature {
    /// The empty signature (unsupported event kinds).
    #[must_use]
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Raw signature text. Empty for unsupported event kinds.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty signature.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` marks a duplicate of `other`.
    ///
    /// Empty signatures never match, so two adjacent unsupported events are
    /// both kept.
    #[must_use]
    pub fn is_duplicate_of(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.0 == other.0
    }
}

/// Derive the signature of an event. Pure; never fails.
#[must_use]
pub fn signature(event: &DiagnosticEvent) -> Signature {
    match &event.payload {
        DiagnosticPayload::UnhandledError { reason }
        | DiagnosticPayload::UnhandledRejection { reason } => {
            let mut out = String::with_capacity(
                reason.name.len() + reason.message.len() + reason.stack.len() + 2,
            );
            out.push_str(&reason.name);
            out.push(SIGNATURE_DELIMITER);
            out.push_str(&reason.message);
            out.push(SIGNATURE_DELIMITER);
            out.push_str(&reason.stack);
            Signature(out)
        }
        DiagnosticPayload::Unsupported { .. } => Signature::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ErrorReason;

    fn err(id: u64, name: &str, message: &str, stack: &str) -> DiagnosticEvent {
        DiagnosticEvent::unhandled_error(id, ErrorReason::new(name, message, stack))
    }

    fn unsupported(id: u64) -> DiagnosticEvent {
        DiagnosticEvent::new(
            id,
            DiagnosticPayload::Unsupported {
                kind: "build-ok".into(),
            },
        )
    }

    #[test]
    fn same_reason_same_signature_regardless_of_id() {
        let a = signature(&err(1, "Error", "boom", "at x"));
        let b = signature(&err(2, "Error", "boom", "at x"));
        assert_eq!(a, b);
        assert!(b.is_duplicate_of(&a));
    }

    #[test]
    fn error_and_rejection_with_same_reason_match() {
        let reason = ErrorReason::new("Error", "boom", "at x");
        let a = signature(&DiagnosticEvent::unhandled_error(1, reason.clone()));
        let b = signature(&DiagnosticEvent::unhandled_rejection(2, reason));
        assert!(a.is_duplicate_of(&b));
    }

    #[test]
    fn any_differing_part_breaks_the_match() {
        let base = signature(&err(1, "Error", "boom", "at x"));
        assert!(!signature(&err(2, "TypeError", "boom", "at x")).is_duplicate_of(&base));
        assert!(!signature(&err(2, "Error", "bang", "at x")).is_duplicate_of(&base));
        assert!(!signature(&err(2, "Error", "boom", "at y")).is_duplicate_of(&base));
    }

    #[test]
    fn delimiter_prevents_field_boundary_collisions() {
        let a = signature(&err(1, "ab", "c", ""));
        let b = signature(&err(2, "a", "bc", ""));
        assert!(!a.is_duplicate_of(&b));
    }

    #[test]
    fn unsupported_events_have_empty_signature() {
        let sig = signature(&unsupported(1));
        assert!(sig.is_empty());
        assert_eq!(sig.as_str(), "");
    }

    #[test]
    fn empty_signatures_never_match() {
        let a = signature(&unsupported(1));
        let b = signature(&unsupported(2));
        assert_eq!(a, b);
        assert!(!a.is_duplicate_of(&b));
    }

    #[test]
    fn error_with_all_empty_fields_is_not_empty() {
        // Two delimiters remain, so the signature still participates in dedup.
        let a = signature(&err(1, "", "", ""));
        let b = signature(&err(2, "", "", ""));
        assert!(!a.is_empty());
        assert!(a.is_duplicate_of(&b));
    }
}
