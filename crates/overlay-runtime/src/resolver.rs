#![forbid(unsafe_code)]

//! Sequential, single-flight resolution of diagnostic events.
//!
//! Each evaluation walks the event list in order:
//!
//! 1. an event already in the [`ResolutionCache`] is appended to the ready
//!    list;
//! 2. an uncached event whose signature duplicates its raw predecessor is
//!    skipped;
//! 3. the first event that is neither becomes the next target and the walk
//!    stops there.
//!
//! The ready list is therefore always a gap-free prefix of the deduplicated
//! list. Whenever the target's id changes, [`SequentialResolver::evaluate`]
//! hands out exactly one [`ResolveRequest`]; the previous target's liveness
//! flag is cleared so its result, if it ever arrives, is dropped by
//! [`SequentialResolver::complete`].

use std::sync::Arc;

use overlay_core::{DiagnosticEvent, EventId, ResolvedError, signature};

use crate::cache::ResolutionCache;
use crate::cancellation::{CancelReason, CancellationSource, CancellationToken};
use crate::effect_system::{
    record_resolution_applied, record_resolution_discarded, record_resolution_failed,
    record_resolution_started, trace_resolution,
};
use crate::program::{Cmd, TaskSpec};
use crate::retry::{RetryPolicy, run_with_retry};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why a resolution produced no record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The external resolver reported a failure.
    #[error("failed to resolve event {id}: {message}")]
    Failed {
        /// Event that failed.
        id: EventId,
        /// Resolver's description of the failure.
        message: String,
    },
    /// The request's liveness flag was cleared before the resolver ran.
    #[error("resolution of event {0} was cancelled")]
    Cancelled(EventId),
}

impl ResolveError {
    /// Shorthand for [`ResolveError::Failed`].
    pub fn failed(id: impl Into<EventId>, message: impl Into<String>) -> Self {
        Self::Failed {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// The external routine that turns a raw event into a [`ResolvedError`].
///
/// Implemented for any `Fn(&DiagnosticEvent) -> Result<ResolvedError, ResolveError>`.
pub trait DiagnosticResolver: Send + Sync {
    /// Resolve a single event. May fail.
    fn resolve(&self, event: &DiagnosticEvent) -> Result<ResolvedError, ResolveError>;
}

impl<F> DiagnosticResolver for F
where
    F: Fn(&DiagnosticEvent) -> Result<ResolvedError, ResolveError> + Send + Sync,
{
    fn resolve(&self, event: &DiagnosticEvent) -> Result<ResolvedError, ResolveError> {
        self(event)
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Result of one pass over the event list.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan<'a> {
    /// Resolved records, in input order.
    pub ready: Vec<Arc<ResolvedError>>,
    /// First uncached, non-duplicate event, if any.
    pub next: Option<&'a DiagnosticEvent>,
}

/// Walk `events` against `cache`. Pure.
#[must_use]
pub fn scan<'a>(events: &'a [DiagnosticEvent], cache: &ResolutionCache) -> Scan<'a> {
    let mut ready = Vec::new();
    for (i, event) in events.iter().enumerate() {
        if let Some(record) = cache.get(event.id) {
            ready.push(Arc::clone(record));
            continue;
        }
        if i > 0 && signature(event).is_duplicate_of(&signature(&events[i - 1])) {
            continue;
        }
        return Scan {
            ready,
            next: Some(event),
        };
    }
    Scan { ready, next: None }
}

/// Whether the runtime-errors panel should show a loading state.
///
/// True only when nothing is ready yet and more than one event has arrived.
/// A single unresolved event does not count as loading.
#[inline]
#[must_use]
pub const fn is_loading(ready: usize, events: usize) -> bool {
    ready == 0 && events > 1
}

// ---------------------------------------------------------------------------
// Failure policy
// ---------------------------------------------------------------------------

/// What happens when a resolution fails after all retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum FailureMode {
    /// Swallow the failure. Nothing is cached, so the ready list stops at
    /// the failed event until it is no longer the first unresolved one.
    /// Appending events does not move it.
    #[default]
    Ignore,
    /// Cache an `unresolved` placeholder built from the raw reason so later
    /// events keep flowing.
    Fallback,
}

/// Failure handling for resolutions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct FailurePolicy {
    /// What to do once retries are exhausted.
    pub mode: FailureMode,
    /// Retries before giving up.
    pub retry: RetryPolicy,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Identity of one issued resolution.
///
/// The generation increases with every request, so two requests for the
/// same event id never share a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolveTicket {
    generation: u64,
    event_id: EventId,
}

impl ResolveTicket {
    /// Request counter value at issue time.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }

    /// Event being resolved.
    #[inline]
    #[must_use]
    pub const fn event_id(self) -> EventId {
        self.event_id
    }
}

/// A resolution the host must run and report back via
/// [`SequentialResolver::complete`].
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    ticket: ResolveTicket,
    event: DiagnosticEvent,
    cancel: CancellationToken,
}

impl ResolveRequest {
    /// Ticket to pass back on completion.
    #[must_use]
    pub fn ticket(&self) -> ResolveTicket {
        self.ticket
    }

    /// Event to resolve.
    #[must_use]
    pub fn event(&self) -> &DiagnosticEvent {
        &self.event
    }

    /// Liveness flag captured when the request was issued.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run the resolver now, honouring `retry` and the liveness flag.
    ///
    /// Skips the call entirely if the request was already cancelled.
    pub fn execute(
        &self,
        resolver: &dyn DiagnosticResolver,
        retry: &RetryPolicy,
    ) -> Result<ResolvedError, ResolveError> {
        if self.cancel.is_cancelled() {
            return Err(ResolveError::Cancelled(self.ticket.event_id));
        }
        let ticket = self.ticket;
        run_with_retry(retry, &self.cancel, |attempt| {
            trace_resolution(ticket.event_id, ticket.generation, attempt, || {
                resolver.resolve(&self.event)
            })
        })
    }

    /// Wrap this request in a task whose message is built by `wrap`.
    pub fn into_task<M, W>(
        self,
        resolver: Arc<dyn DiagnosticResolver>,
        retry: RetryPolicy,
        wrap: W,
    ) -> Cmd<M>
    where
        M: Send + 'static,
        W: FnOnce(ResolveTicket, Result<ResolvedError, ResolveError>) -> M + Send + 'static,
    {
        let spec = TaskSpec::default().with_name(format!("resolve:{}", self.ticket.event_id));
        Cmd::task_with_spec(spec, move || {
            let outcome = self.execute(resolver.as_ref(), &retry);
            wrap(self.ticket, outcome)
        })
    }
}

/// Output of [`SequentialResolver::evaluate`].
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Resolved records, in input order.
    pub ready: Vec<Arc<ResolvedError>>,
    /// See [`is_loading`].
    pub is_loading: bool,
    /// Id of the first unresolved, non-duplicate event.
    pub next: Option<EventId>,
    /// Present only when the target changed on this evaluation.
    pub request: Option<ResolveRequest>,
}

/// Why [`SequentialResolver::complete`] dropped a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// The resolver was torn down.
    TornDown,
    /// The ticket no longer names the live target.
    Stale,
}

impl DiscardReason {
    /// Short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TornDown => "torn-down",
            Self::Stale => "stale",
        }
    }
}

/// What [`SequentialResolver::complete`] did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Record merged into the cache.
    Applied,
    /// Result dropped; the cache is untouched.
    Discarded(DiscardReason),
    /// Resolution failed and was swallowed ([`FailureMode::Ignore`]).
    Failed(ResolveError),
    /// Resolution failed and a placeholder was cached ([`FailureMode::Fallback`]).
    FellBack(ResolveError),
}

impl Completion {
    /// Whether the cache changed.
    #[must_use]
    pub fn changed_cache(&self) -> bool {
        matches!(self, Self::Applied | Self::FellBack(_))
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetState {
    Pending,
    Settled,
    Failed,
}

#[derive(Debug)]
struct Target {
    ticket: ResolveTicket,
    event: DiagnosticEvent,
    cancel: CancellationSource,
    state: TargetState,
}

/// Owns the cache and the single in-flight target.
#[derive(Debug, Default)]
pub struct SequentialResolver {
    cache: ResolutionCache,
    target: Option<Target>,
    generation: u64,
    torn_down: bool,
    failure_mode: FailureMode,
}

impl SequentialResolver {
    /// Create a resolver with an empty cache and [`FailureMode::Ignore`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with the given failure mode.
    #[must_use]
    pub fn with_failure_mode(mode: FailureMode) -> Self {
        Self {
            failure_mode: mode,
            ..Self::default()
        }
    }

    /// Recompute the ready list for `events`.
    ///
    /// Clears the cache when `events` is empty. Issues a request only when
    /// the next-to-resolve id differs from the current target's, so calling
    /// this repeatedly with the same input is idempotent.
    pub fn evaluate(&mut self, events: &[DiagnosticEvent]) -> Evaluation {
        if self.torn_down {
            return Evaluation::default();
        }

        if events.is_empty() {
            let removed = self.cache.clear();
            if removed > 0 {
                tracing::debug!(target: "overlay.resolve", removed, "cache cleared");
            }
            self.retarget(None, CancelReason::Reset);
            return Evaluation::default();
        }

        let Scan { ready, next } = scan(events, &self.cache);
        let is_loading = is_loading(ready.len(), events.len());
        let next_id = next.map(|event| event.id);
        let request = self.retarget(next, CancelReason::Superseded);

        tracing::trace!(
            target: "overlay.resolve",
            events = events.len(),
            ready = ready.len(),
            is_loading,
            next = ?next_id,
            "evaluated"
        );

        Evaluation {
            ready,
            is_loading,
            next: next_id,
            request,
        }
    }

    fn retarget(
        &mut self,
        next: Option<&DiagnosticEvent>,
        reason: CancelReason,
    ) -> Option<ResolveRequest> {
        let current = self.target.as_ref().map(|t| t.ticket.event_id);
        if next.map(|e| e.id) == current {
            return None;
        }

        if let Some(old) = self.target.take()
            && old.state == TargetState::Pending
        {
            old.cancel.cancel(reason);
            tracing::debug!(
                target: "overlay.resolve",
                event_id = old.ticket.event_id.get(),
                generation = old.ticket.generation,
                reason = %reason,
                "resolution cancelled"
            );
        }

        let event = next?;
        self.generation += 1;
        let ticket = ResolveTicket {
            generation: self.generation,
            event_id: event.id,
        };
        let cancel = CancellationSource::new();
        let request = ResolveRequest {
            ticket,
            event: event.clone(),
            cancel: cancel.token(),
        };
        self.target = Some(Target {
            ticket,
            event: event.clone(),
            cancel,
            state: TargetState::Pending,
        });
        record_resolution_started(ticket.event_id, ticket.generation);
        Some(request)
    }

    /// Fold a finished resolution back in.
    ///
    /// Results for anything but the live, pending target are discarded
    /// without touching the cache.
    pub fn complete(
        &mut self,
        ticket: ResolveTicket,
        outcome: Result<ResolvedError, ResolveError>,
    ) -> Completion {
        if self.torn_down {
            return discard(ticket, DiscardReason::TornDown);
        }
        let failure_mode = self.failure_mode;
        let Some(target) = self.target.as_mut().filter(|t| {
            t.ticket == ticket && t.state == TargetState::Pending && !t.cancel.is_cancelled()
        }) else {
            return discard(ticket, DiscardReason::Stale);
        };

        match outcome {
            Ok(mut record) => {
                if record.id != ticket.event_id {
                    tracing::warn!(
                        target: "overlay.resolve",
                        expected = ticket.event_id.get(),
                        got = record.id.get(),
                        "resolver returned a record for a different id; rekeying"
                    );
                    record.id = ticket.event_id;
                }
                target.state = TargetState::Settled;
                self.cache.merge(record);
                record_resolution_applied(ticket.event_id, ticket.generation, false);
                Completion::Applied
            }
            Err(err) => {
                record_resolution_failed(ticket.event_id, ticket.generation, &err.to_string());
                match failure_mode {
                    FailureMode::Ignore => {
                        target.state = TargetState::Failed;
                        Completion::Failed(err)
                    }
                    FailureMode::Fallback => {
                        target.state = TargetState::Settled;
                        let placeholder = ResolvedError::placeholder(&target.event);
                        self.cache.merge(placeholder);
                        record_resolution_applied(ticket.event_id, ticket.generation, true);
                        Completion::FellBack(err)
                    }
                }
            }
        }
    }

    /// Invalidate everything. Later results are discarded and later
    /// evaluations return nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if let Some(target) = self.target.take() {
            target.cancel.cancel(CancelReason::TornDown);
        }
        tracing::debug!(target: "overlay.resolve", "resolver torn down");
    }

    /// The resolution cache.
    #[must_use]
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Ticket of the live request, if one is pending.
    #[must_use]
    pub fn in_flight(&self) -> Option<ResolveTicket> {
        self.target
            .as_ref()
            .filter(|t| t.state == TargetState::Pending)
            .map(|t| t.ticket)
    }

    /// Id of the current target, whether pending, settled or failed.
    #[must_use]
    pub fn target_id(&self) -> Option<EventId> {
        self.target.as_ref().map(|t| t.ticket.event_id)
    }

    /// Whether the current target failed and was swallowed.
    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|t| t.state == TargetState::Failed)
    }

    /// Active failure mode.
    #[must_use]
    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    /// Change the failure mode for future completions.
    pub fn set_failure_mode(&mut self, mode: FailureMode) {
        self.failure_mode = mode;
    }

    /// Whether [`teardown`](Self::teardown) has run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

fn discard(ticket: ResolveTicket, reason: DiscardReason) -> Completion {
    record_resolution_discarded(ticket.event_id, ticket.generation, reason.as_str());
    Completion::Discarded(reason)
}
