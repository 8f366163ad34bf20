//! Property tests for the overlay model.
//!
//! ## Invariants
//!
//! 1. Once idle, the ready list is the input with consecutive duplicates
//!    removed, in input order.
//! 2. With an append-only event list and arbitrary yields, every kept event
//!    is resolved exactly once and duplicates never reach the resolver.
//! 3. At most one resolution task is pending whose result would be applied.

use std::sync::Arc;

use overlay::{ErrorOverlay, EventId, Msg, OverlayConfig, Program};
use overlay_harness::ScriptedResolver;
use overlay_harness::fixtures::runtime_error;
use proptest::prelude::*;

fn arb_messages() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop_oneof![Just("a"), Just("b"), Just("c")], 0..12)
}

fn events(messages: &[&str]) -> Vec<overlay::DiagnosticEvent> {
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| runtime_error(i as u64 + 1, m))
        .collect()
}

fn dedup_ids(messages: &[&str]) -> Vec<EventId> {
    let mut out = Vec::new();
    for (i, m) in messages.iter().enumerate() {
        if i == 0 || messages[i - 1] != *m {
            out.push(EventId(i as u64 + 1));
        }
    }
    out
}

proptest! {
    #[test]
    fn idle_ready_list_is_the_dedup_list(messages in arb_messages()) {
        let backend = Arc::new(ScriptedResolver::new());
        let mut program = Program::new(ErrorOverlay::new(
            Arc::clone(&backend) as Arc<dyn overlay::DiagnosticResolver>,
            OverlayConfig::default(),
            Vec::new(),
            events(&messages),
        ));
        program.init();
        program.run_until_idle();

        prop_assert_eq!(program.model().ready_ids(), dedup_ids(&messages));
        prop_assert!(!program.model().is_loading());
        prop_assert_eq!(program.pending_count(), 0);
    }

    #[test]
    fn append_only_input_resolves_each_kept_event_once(
        messages in arb_messages(),
        yields in prop::collection::vec(0usize..3, 12),
    ) {
        let backend = Arc::new(ScriptedResolver::new());
        let mut program = Program::new(ErrorOverlay::new(
            Arc::clone(&backend) as Arc<dyn overlay::DiagnosticResolver>,
            OverlayConfig::default(),
            Vec::new(),
            Vec::new(),
        ));
        program.init();

        for len in 1..=messages.len() {
            program.send(Msg::SetEvents(events(&messages[..len])));
            for _ in 0..yields[len - 1] {
                program.run_next_task();
            }
            let live = program.model().resolver().in_flight().into_iter().count();
            prop_assert!(live <= 1);
        }
        program.run_until_idle();

        let expected = dedup_ids(&messages);
        prop_assert_eq!(program.model().ready_ids(), expected.clone());
        prop_assert_eq!(backend.calls(), expected);
    }
}
