#![forbid(unsafe_code)]

//! The overlay as a single [`Model`].
//!
//! [`ErrorOverlay`] owns the inputs, the [`SequentialResolver`], the display
//! state machine and the tab selector. Every input change runs the same pure
//! recompute: scan the events against the cache, summarize, re-apply the
//! tab steal rule, and hand back at most one resolution task.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use overlay::prelude::*;
//!
//! let backend: Arc<dyn DiagnosticResolver> = Arc::new(|ev: &DiagnosticEvent| {
//!     let reason = ev.reason().cloned().unwrap_or_default();
//!     Ok::<_, ResolveError>(ResolvedError::new(ev.id, reason))
//! });
//!
//! let events = vec![DiagnosticEvent::unhandled_error(
//!     1,
//!     ErrorReason::new("TypeError", "x is undefined", "at f (a.js:1:1)"),
//! )];
//! let overlay = ErrorOverlay::new(backend, OverlayConfig::default(), Vec::new(), events);
//!
//! let mut program = Program::new(overlay);
//! program.init();
//! assert_eq!(program.pending_count(), 1);
//! program.run_until_idle();
//! assert_eq!(program.model().ready().len(), 1);
//! ```

use std::sync::Arc;

use overlay_core::{DiagnosticEvent, EventId, Issue, IssueBuckets, ResolvedError};
use overlay_runtime::{
    Cmd, Completion, DiagnosticResolver, Model, ResolveError, ResolveRequest, ResolveTicket,
    SequentialResolver,
};
use overlay_widgets::{
    DisplayAction, DisplayState, DisplayStateMachine, OverlaySummary, OverlayView, TabId,
    TabSelector, TriggerEvent, ViewInputs, build_view,
};

use crate::config::OverlayConfig;

/// Messages driving [`ErrorOverlay`].
#[derive(Debug)]
pub enum Msg {
    /// Replace the compiler diagnostics.
    SetIssues(Vec<Issue>),
    /// Replace the runtime event list.
    SetEvents(Vec<DiagnosticEvent>),
    /// Replace both inputs in one recompute.
    SetInputs {
        issues: Vec<Issue>,
        events: Vec<DiagnosticEvent>,
    },
    /// A resolution task finished.
    Resolved {
        ticket: ResolveTicket,
        outcome: Result<ResolvedError, ResolveError>,
    },
    /// Display transition without a trigger event.
    Display(DisplayAction),
    /// The user picked a tab.
    SelectTab(TabId),
    /// The overlay is going away.
    Teardown,
}

/// Dev error overlay state.
pub struct ErrorOverlay {
    config: OverlayConfig,
    backend: Arc<dyn DiagnosticResolver>,
    issues: IssueBuckets,
    events: Vec<DiagnosticEvent>,
    resolver: SequentialResolver,
    ready: Vec<Arc<ResolvedError>>,
    summary: OverlaySummary,
    display: DisplayStateMachine,
    tabs: TabSelector,
    pending: Option<ResolveRequest>,
    last_completion: Option<Completion>,
}

impl std::fmt::Debug for ErrorOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorOverlay")
            .field("config", &self.config)
            .field("events", &self.events.len())
            .field("summary", &self.summary)
            .field("display", &self.display.state())
            .field("tabs", &self.tabs)
            .field("in_flight", &self.resolver.in_flight())
            .finish_non_exhaustive()
    }
}

impl ErrorOverlay {
    /// Mount the overlay on its initial inputs.
    ///
    /// The display starts minimized when only warnings are present and
    /// fullscreen otherwise. That choice is made once, here.
    #[must_use]
    pub fn new(
        backend: Arc<dyn DiagnosticResolver>,
        config: OverlayConfig,
        issues: Vec<Issue>,
        events: Vec<DiagnosticEvent>,
    ) -> Self {
        let resolver = SequentialResolver::with_failure_mode(config.failure.mode);
        let issues = IssueBuckets::partition(&issues);
        let mut overlay = Self {
            config,
            backend,
            issues,
            events,
            resolver,
            ready: Vec::new(),
            summary: OverlaySummary::default(),
            display: DisplayStateMachine::new(DisplayState::Fullscreen),
            tabs: TabSelector::new(Default::default()),
            pending: None,
            last_completion: None,
        };
        overlay.recompute();
        overlay.display = DisplayStateMachine::for_content(overlay.summary.only_has_warnings());
        overlay.tabs = TabSelector::new(overlay.summary.tab_flags());
        overlay
    }

    fn recompute(&mut self) {
        let evaluation = self.resolver.evaluate(&self.events);
        self.ready = evaluation.ready;
        self.summary = OverlaySummary::new(
            &self.issues,
            self.events.len(),
            &self.ready,
            evaluation.is_loading,
        );
        if self.tabs.update(self.summary.tab_flags()) {
            tracing::debug!(
                target: "overlay.tabs",
                tab = %self.tabs.selected(),
                "compiler errors took focus"
            );
        }
        if let Some(request) = evaluation.request {
            // An unflushed request is already cancelled by the retarget.
            self.pending = Some(request);
        }
    }

    fn flush(&mut self) -> Cmd<Msg> {
        match self.pending.take() {
            Some(request) => request.into_task(
                Arc::clone(&self.backend),
                self.config.failure.retry.clone(),
                |ticket, outcome| Msg::Resolved { ticket, outcome },
            ),
            None => Cmd::none(),
        }
    }

    fn on_resolved(
        &mut self,
        ticket: ResolveTicket,
        outcome: Result<ResolvedError, ResolveError>,
    ) -> Cmd<Msg> {
        let completion = self.resolver.complete(ticket, outcome);
        let log = match &completion {
            Completion::Failed(err) => Cmd::log(format!(
                "resolution of event {} failed: {err}",
                ticket.event_id()
            )),
            Completion::FellBack(err) => Cmd::log(format!(
                "resolution of event {} failed, showing placeholder: {err}",
                ticket.event_id()
            )),
            Completion::Applied | Completion::Discarded(_) => Cmd::none(),
        };
        if completion.changed_cache() {
            self.recompute();
            tracing::trace!(
                target: "overlay.resolve",
                ready = self.ready.len(),
                events = self.events.len(),
                "ready list updated"
            );
        }
        self.last_completion = Some(completion);
        log
    }

    /// Apply a display action on behalf of a UI event, suppressing the
    /// event's default behaviour.
    pub fn handle_display(&mut self, action: DisplayAction, trigger: Option<&mut TriggerEvent>) {
        self.display.apply(action, trigger);
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Current summary.
    #[must_use]
    pub fn summary(&self) -> &OverlaySummary {
        &self.summary
    }

    /// Ready runtime errors, in input order.
    #[must_use]
    pub fn ready(&self) -> &[Arc<ResolvedError>] {
        &self.ready
    }

    /// Ids of the ready runtime errors.
    #[must_use]
    pub fn ready_ids(&self) -> Vec<EventId> {
        self.ready.iter().map(|r| r.id).collect()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.summary.is_loading
    }

    /// Stored display state, before the closable override.
    #[must_use]
    pub fn display_state(&self) -> DisplayState {
        self.display.state()
    }

    /// Whether the overlay may currently be dismissed.
    #[must_use]
    pub fn closable(&self) -> bool {
        self.summary.closable(self.config.close_policy)
    }

    #[must_use]
    pub fn selected_tab(&self) -> TabId {
        self.tabs.selected()
    }

    #[must_use]
    pub fn default_tab(&self) -> TabId {
        self.tabs.default_tab()
    }

    /// The resolver, for inspection.
    #[must_use]
    pub fn resolver(&self) -> &SequentialResolver {
        &self.resolver
    }

    /// What the last [`Msg::Resolved`] did.
    #[must_use]
    pub fn last_completion(&self) -> Option<&Completion> {
        self.last_completion.as_ref()
    }
}

impl Model for ErrorOverlay {
    type Message = Msg;
    type View = OverlayView;

    fn init(&mut self) -> Cmd<Msg> {
        self.flush()
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        let log = match msg {
            Msg::SetIssues(issues) => {
                self.issues = IssueBuckets::partition(&issues);
                self.recompute();
                Cmd::none()
            }
            Msg::SetEvents(events) => {
                self.events = events;
                self.recompute();
                Cmd::none()
            }
            Msg::SetInputs { issues, events } => {
                self.issues = IssueBuckets::partition(&issues);
                self.events = events;
                self.recompute();
                Cmd::none()
            }
            Msg::Resolved { ticket, outcome } => self.on_resolved(ticket, outcome),
            Msg::Display(action) => {
                self.display.apply(action, None);
                Cmd::none()
            }
            Msg::SelectTab(tab) => {
                self.tabs.select(tab);
                Cmd::none()
            }
            Msg::Teardown => {
                tracing::debug!(target: "overlay.display", "overlay torn down");
                self.resolver.teardown();
                self.pending = None;
                Cmd::none()
            }
        };
        Cmd::batch(vec![log, self.flush()])
    }

    fn view(&self) -> OverlayView {
        if self.resolver.is_torn_down() {
            return OverlayView::Nothing;
        }
        let closable = self.closable();
        build_view(ViewInputs {
            summary: &self.summary,
            issues: &self.issues,
            ready: &self.ready,
            display: self.display.effective(closable),
            closable,
            default_tab: self.tabs.default_tab(),
            selected_tab: self.tabs.selected(),
        })
    }
}
