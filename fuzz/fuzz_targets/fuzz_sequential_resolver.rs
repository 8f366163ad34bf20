#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use overlay_core::{DiagnosticEvent, DiagnosticPayload, ErrorReason, ResolvedError};
use overlay_runtime::{
    FailureMode, ResolveError, ResolveRequest, SequentialResolver, is_loading, scan,
};

#[derive(Debug, Arbitrary)]
enum Op {
    /// Append an event whose reason is picked from a tiny alphabet.
    Push { reason: u8, unsupported: bool },
    /// Drop the oldest event.
    Shift,
    Clear,
    /// Complete the request at `index` among those issued and not yet completed.
    Complete { index: u8, ok: bool },
    ToggleFallback,
    Teardown,
}

fuzz_target!(|ops: Vec<Op>| {
    let mut resolver = SequentialResolver::new();
    let mut events: Vec<DiagnosticEvent> = Vec::new();
    let mut issued: Vec<ResolveRequest> = Vec::new();
    let mut next_id = 1_u64;

    for op in ops.into_iter().take(256) {
        match op {
            Op::Push {
                reason,
                unsupported,
            } => {
                let payload = if unsupported {
                    DiagnosticPayload::Unsupported {
                        kind: "build-ok".into(),
                    }
                } else {
                    let r = (reason % 3).to_string();
                    DiagnosticPayload::UnhandledError {
                        reason: ErrorReason::new("Error", r.clone(), r),
                    }
                };
                events.push(DiagnosticEvent::new(next_id, payload));
                next_id += 1;
            }
            Op::Shift => {
                if !events.is_empty() {
                    events.remove(0);
                }
            }
            Op::Clear => events.clear(),
            Op::Complete { index, ok } => {
                if issued.is_empty() {
                    continue;
                }
                let req = issued.remove(index as usize % issued.len());
                let outcome = if ok {
                    Ok(ResolvedError::new(req.ticket().event_id(), ErrorReason::default()))
                } else {
                    Err(ResolveError::failed(req.ticket().event_id(), "fuzz"))
                };
                let live = resolver.in_flight() == Some(req.ticket());
                let before = resolver.cache().len();
                let completion = resolver.complete(req.ticket(), outcome);
                if !live {
                    assert!(!completion.changed_cache(), "stale result touched the cache");
                    assert_eq!(resolver.cache().len(), before);
                }
            }
            Op::ToggleFallback => {
                let mode = match resolver.failure_mode() {
                    FailureMode::Ignore => FailureMode::Fallback,
                    FailureMode::Fallback => FailureMode::Ignore,
                };
                resolver.set_failure_mode(mode);
            }
            Op::Teardown => resolver.teardown(),
        }

        let evaluation = resolver.evaluate(&events);
        if let Some(req) = evaluation.request {
            issued.push(req);
        }

        // At most one issued request is still live.
        let live = issued.iter().filter(|r| !r.token().is_cancelled()).count();
        assert!(live <= 1, "{live} live requests");

        if resolver.is_torn_down() {
            assert!(evaluation.ready.is_empty());
            assert!(resolver.in_flight().is_none());
            continue;
        }

        if events.is_empty() {
            assert!(resolver.cache().is_empty());
        }

        let scanned = scan(&events, resolver.cache());
        assert_eq!(scanned.ready.len(), evaluation.ready.len());
        assert_eq!(
            evaluation.is_loading,
            is_loading(evaluation.ready.len(), events.len())
        );
        assert_eq!(evaluation.next, scanned.next.map(|e| e.id));
        for w in evaluation.ready.windows(2) {
            assert!(w[0].id < w[1].id, "ready list out of order");
        }
    }
});
