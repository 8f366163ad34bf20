#![forbid(unsafe_code)]

//! Property tests for the signature deriver.
//!
//! Invariants:
//! 1. Signatures are a pure function of the reason (id and payload kind do
//!    not participate).
//! 2. Two error signatures match iff name, message and stack all match.
//! 3. Unsupported events never match anything.

use overlay_core::{DiagnosticEvent, DiagnosticPayload, ErrorReason, signature};
use proptest::prelude::*;

fn reason_strategy() -> impl Strategy<Value = ErrorReason> {
    ("[A-Za-z]{0,8}", "[ -~]{0,24}", "[ -~\n]{0,40}")
        .prop_map(|(name, message, stack)| ErrorReason::new(name, message, stack))
}

fn event_strategy() -> impl Strategy<Value = DiagnosticEvent> {
    prop_oneof![
        (any::<u64>(), reason_strategy())
            .prop_map(|(id, r)| DiagnosticEvent::unhandled_error(id, r)),
        (any::<u64>(), reason_strategy())
            .prop_map(|(id, r)| DiagnosticEvent::unhandled_rejection(id, r)),
        (any::<u64>(), "[a-z-]{1,12}").prop_map(|(id, kind)| DiagnosticEvent::new(
            id,
            DiagnosticPayload::Unsupported { kind }
        )),
    ]
}

proptest! {
    #[test]
    fn signature_ignores_id(reason in reason_strategy(), a in any::<u64>(), b in any::<u64>()) {
        let left = signature(&DiagnosticEvent::unhandled_error(a, reason.clone()));
        let right = signature(&DiagnosticEvent::unhandled_rejection(b, reason));
        prop_assert!(left.is_duplicate_of(&right));
    }

    #[test]
    fn match_iff_reasons_equal(a in reason_strategy(), b in reason_strategy()) {
        let left = signature(&DiagnosticEvent::unhandled_error(1, a.clone()));
        let right = signature(&DiagnosticEvent::unhandled_error(2, b.clone()));
        prop_assert_eq!(left.is_duplicate_of(&right), a == b);
    }

    #[test]
    fn duplicate_relation_is_symmetric(a in event_strategy(), b in event_strategy()) {
        let left = signature(&a);
        let right = signature(&b);
        prop_assert_eq!(left.is_duplicate_of(&right), right.is_duplicate_of(&left));
    }

    #[test]
    fn unsupported_never_matches(kind in "[a-z-]{1,12}", other in event_strategy()) {
        let unsupported = DiagnosticEvent::new(0, DiagnosticPayload::Unsupported { kind });
        let sig = signature(&unsupported);
        prop_assert!(sig.is_empty());
        prop_assert!(!sig.is_duplicate_of(&signature(&other)));
        prop_assert!(!signature(&other).is_duplicate_of(&sig));
    }
}
