#![forbid(unsafe_code)]

//! Input builders shared by tests and scenarios.

use std::sync::Arc;

use overlay::{
    DiagnosticEvent, DiagnosticResolver, ErrorReason, ErrorSource, Issue, IssueSeverity,
    ResolveError, ResolvedError,
};

/// An unhandled error whose stack is derived from `message`, so equal
/// messages give equal signatures.
#[must_use]
pub fn runtime_error(id: u64, message: &str) -> DiagnosticEvent {
    DiagnosticEvent::unhandled_error(
        id,
        ErrorReason::new("Error", message, format!("Error: {message}\n    at app.js:1:1")),
    )
}

/// An unhandled rejection, same convention as [`runtime_error`].
#[must_use]
pub fn rejection(id: u64, message: &str) -> DiagnosticEvent {
    DiagnosticEvent::unhandled_rejection(
        id,
        ErrorReason::new("Error", message, format!("Error: {message}\n    at app.js:1:1")),
    )
}

/// Events from `(id, message)` pairs.
#[must_use]
pub fn runtime_errors(pairs: &[(u64, &str)]) -> Vec<DiagnosticEvent> {
    pairs.iter().map(|&(id, msg)| runtime_error(id, msg)).collect()
}

#[must_use]
pub fn compiler_error(title: &str) -> Issue {
    Issue::new(IssueSeverity::Error, title).with_file_path("src/app.ts")
}

#[must_use]
pub fn compiler_warning(title: &str) -> Issue {
    Issue::new(IssueSeverity::Warning, title).with_file_path("src/app.ts")
}

/// Resolve every event to its own reason, with no frames.
#[must_use]
pub fn echo_resolver() -> Arc<dyn DiagnosticResolver> {
    Arc::new(
        |ev: &DiagnosticEvent| -> Result<ResolvedError, ResolveError> {
            Ok(ResolvedError::new(ev.id, ev.reason().cloned().unwrap_or_default()))
        },
    )
}

/// Resolve every event as a server-side error.
#[must_use]
pub fn server_resolver() -> Arc<dyn DiagnosticResolver> {
    Arc::new(
        |ev: &DiagnosticEvent| -> Result<ResolvedError, ResolveError> {
            Ok(ResolvedError::new(ev.id, ev.reason().cloned().unwrap_or_default())
                .with_source(ErrorSource::Server))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay::signature;

    #[test]
    fn equal_messages_share_a_signature() {
        let a = runtime_error(1, "boom");
        let b = runtime_error(2, "boom");
        let c = rejection(3, "boom");
        assert_eq!(signature(&a), signature(&b));
        assert_eq!(signature(&a), signature(&c));
        assert_ne!(signature(&a), signature(&runtime_error(4, "bang")));
    }

    #[test]
    fn echo_keeps_the_id() {
        let ev = runtime_error(9, "boom");
        let resolved = echo_resolver().resolve(&ev).unwrap();
        assert_eq!(resolved.id, ev.id);
        assert_eq!(resolved.reason.message, "boom");
    }
}
