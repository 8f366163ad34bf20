//! Property-based invariant tests for tab selection and the tab strip.
//!
//! ## Invariants
//!
//! 1. The default tab has content unless nothing does, in which case it is
//!    the runtime errors tab.
//! 2. No tab earlier in priority than the default has content.
//! 3. An update moves the selection only when the default transitions to
//!    compiler errors, and then always onto compiler errors.
//! 4. Strip links are consistent: `next` of one entry is the entry to its
//!    right, whose `prev` points back.

use overlay_widgets::{
    OverlaySummary, TAB_PRIORITY, TabFlags, TabId, TabSelector, TabStrip, default_tab,
};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn arb_flags() -> impl Strategy<Value = TabFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(e, w, r)| TabFlags {
        has_compiler_errors: e,
        has_compiler_warnings: w,
        has_runtime_errors: r,
    })
}

fn arb_tab() -> impl Strategy<Value = TabId> {
    prop_oneof![
        Just(TabId::CompilerErrors),
        Just(TabId::CompilerWarnings),
        Just(TabId::RuntimeErrors),
    ]
}

#[derive(Debug, Clone)]
enum Step {
    Update(TabFlags),
    Select(TabId),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => arb_flags().prop_map(Step::Update),
        1 => arb_tab().prop_map(Step::Select),
    ]
}

fn arb_summary() -> impl Strategy<Value = OverlaySummary> {
    (0usize..4, 0usize..4, 0usize..4, 0usize..4).prop_map(|(e, w, events, ready)| {
        let ready = ready.min(events);
        OverlaySummary {
            compiler_errors: e,
            compiler_warnings: w,
            runtime_events: events,
            runtime_ready: ready,
            is_loading: ready == 0 && events > 1,
            has_server_error: false,
        }
    })
}

// ── 1 + 2. Default tab ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn default_is_highest_priority_with_content(flags in arb_flags()) {
        let tab = default_tab(flags);
        if flags.is_empty() {
            prop_assert_eq!(tab, TabId::RuntimeErrors);
        } else {
            prop_assert!(flags.has(tab));
            let pos = TAB_PRIORITY.iter().position(|&t| t == tab).unwrap();
            for earlier in &TAB_PRIORITY[..pos] {
                prop_assert!(!flags.has(*earlier));
            }
        }
    }
}

// ── 3. Steal rule ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn selection_moves_only_on_compiler_error_transition(
        initial in arb_flags(),
        steps in prop::collection::vec(arb_step(), 1..30),
    ) {
        let mut selector = TabSelector::new(initial);
        prop_assert_eq!(selector.selected(), default_tab(initial));

        for step in steps {
            match step {
                Step::Select(tab) => {
                    selector.select(tab);
                    prop_assert_eq!(selector.selected(), tab);
                }
                Step::Update(flags) => {
                    let before_default = selector.default_tab();
                    let before_selected = selector.selected();
                    let stole = selector.update(flags);
                    let after_default = selector.default_tab();
                    prop_assert_eq!(after_default, default_tab(flags));

                    let transition_to_errors = after_default != before_default
                        && after_default == TabId::CompilerErrors;
                    if transition_to_errors {
                        prop_assert_eq!(selector.selected(), TabId::CompilerErrors);
                        prop_assert_eq!(stole, before_selected != TabId::CompilerErrors);
                    } else {
                        prop_assert!(!stole);
                        prop_assert_eq!(selector.selected(), before_selected);
                    }
                }
            }
        }
    }
}

// ── 4. Strip links ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn strip_links_are_consistent(summary in arb_summary()) {
        let strip = TabStrip::from_summary(&summary);
        let entries = strip.entries();
        let flags = summary.tab_flags();
        prop_assert_eq!(entries.len(), TabId::DISPLAY_ORDER.iter().filter(|&&t| flags.has(t)).count());
        for (i, entry) in entries.iter().enumerate() {
            prop_assert_eq!(entry.prev, i.checked_sub(1).map(|p| entries[p].id));
            prop_assert_eq!(entry.next, entries.get(i + 1).map(|e| e.id));
        }
    }
}
