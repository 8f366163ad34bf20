#![forbid(unsafe_code)]

//! A resolver whose behaviour is scripted per event id, and which records
//! every call it receives.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use overlay::{
    DiagnosticEvent, DiagnosticResolver, ErrorSource, EventId, ResolveError, ResolvedError,
};

#[derive(Debug, Default)]
struct Script {
    always_fail: HashSet<EventId>,
    fail_times: HashMap<EventId, u32>,
    sources: HashMap<EventId, ErrorSource>,
}

/// Scripted [`DiagnosticResolver`].
///
/// By default every event resolves to its own reason. Ids can be told to
/// fail always, fail a fixed number of times, or carry an [`ErrorSource`].
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    script: Mutex<Script>,
    calls: Mutex<Vec<EventId>>,
}

impl ScriptedResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every resolution of `id` fails.
    #[must_use]
    pub fn failing(self, id: impl Into<EventId>) -> Self {
        self.script().always_fail.insert(id.into());
        self
    }

    /// The first `times` resolutions of `id` fail.
    #[must_use]
    pub fn failing_times(self, id: impl Into<EventId>, times: u32) -> Self {
        self.script().fail_times.insert(id.into(), times);
        self
    }

    /// Records for `id` carry `source`.
    #[must_use]
    pub fn with_source(self, id: impl Into<EventId>, source: ErrorSource) -> Self {
        self.script().sources.insert(id.into(), source);
        self
    }

    /// Ids passed to [`resolve`](DiagnosticResolver::resolve), in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<EventId> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls for `id`.
    #[must_use]
    pub fn calls_for(&self, id: impl Into<EventId>) -> usize {
        let id = id.into();
        self.calls().iter().filter(|&&c| c == id).count()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticResolver for ScriptedResolver {
    fn resolve(&self, event: &DiagnosticEvent) -> Result<ResolvedError, ResolveError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.id);

        let mut script = self.script();
        if script.always_fail.contains(&event.id) {
            return Err(ResolveError::failed(event.id, "scripted failure"));
        }
        if let Some(remaining) = script.fail_times.get_mut(&event.id)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(ResolveError::failed(event.id, "scripted transient failure"));
        }

        let mut record = ResolvedError::new(event.id, event.reason().cloned().unwrap_or_default());
        if let Some(source) = script.sources.get(&event.id) {
            record = record.with_source(source.clone());
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::runtime_error;

    #[test]
    fn records_calls_in_order() {
        let resolver = ScriptedResolver::new();
        resolver.resolve(&runtime_error(2, "b")).unwrap();
        resolver.resolve(&runtime_error(1, "a")).unwrap();
        assert_eq!(resolver.calls(), vec![EventId(2), EventId(1)]);
        assert_eq!(resolver.calls_for(1), 1);
    }

    #[test]
    fn transient_failures_run_out() {
        let resolver = ScriptedResolver::new().failing_times(3, 2);
        let ev = runtime_error(3, "c");
        assert!(resolver.resolve(&ev).is_err());
        assert!(resolver.resolve(&ev).is_err());
        assert!(resolver.resolve(&ev).is_ok());
    }

    #[test]
    fn permanent_failure_and_source() {
        let resolver = ScriptedResolver::new()
            .failing(1)
            .with_source(2, ErrorSource::EdgeServer);
        assert!(matches!(
            resolver.resolve(&runtime_error(1, "a")),
            Err(ResolveError::Failed { .. })
        ));
        let record = resolver.resolve(&runtime_error(2, "b")).unwrap();
        assert_eq!(record.source, Some(ErrorSource::EdgeServer));
    }
}
