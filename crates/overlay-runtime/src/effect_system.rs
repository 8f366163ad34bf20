#![forbid(unsafe_code)]

//! Effect observability.
//!
//! - **Tracing spans**: `effect.command` around every task the program runs,
//!   and `resolve.task` around each call into the external resolver.
//! - **Counters**: monotonic totals for tasks executed and for each way a
//!   resolution can end (started, applied, discarded, failed).

use std::sync::atomic::{AtomicU64, Ordering};
use web_time::Instant;

use overlay_core::EventId;

// ---------------------------------------------------------------------------
// Monotonic counters
// ---------------------------------------------------------------------------

static EFFECTS_COMMAND_TOTAL: AtomicU64 = AtomicU64::new(0);
static RESOLUTIONS_STARTED_TOTAL: AtomicU64 = AtomicU64::new(0);
static RESOLUTIONS_APPLIED_TOTAL: AtomicU64 = AtomicU64::new(0);
static RESOLUTIONS_DISCARDED_TOTAL: AtomicU64 = AtomicU64::new(0);
static RESOLUTIONS_FAILED_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Total task effects executed.
#[must_use]
pub fn effects_command_total() -> u64 {
    EFFECTS_COMMAND_TOTAL.load(Ordering::Relaxed)
}

/// Total resolution requests issued.
#[must_use]
pub fn resolutions_started_total() -> u64 {
    RESOLUTIONS_STARTED_TOTAL.load(Ordering::Relaxed)
}

/// Total resolution results merged into a cache.
#[must_use]
pub fn resolutions_applied_total() -> u64 {
    RESOLUTIONS_APPLIED_TOTAL.load(Ordering::Relaxed)
}

/// Total resolution results dropped as stale or torn down.
#[must_use]
pub fn resolutions_discarded_total() -> u64 {
    RESOLUTIONS_DISCARDED_TOTAL.load(Ordering::Relaxed)
}

/// Total resolutions that ended in an error.
#[must_use]
pub fn resolutions_failed_total() -> u64 {
    RESOLUTIONS_FAILED_TOTAL.load(Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// Command effect instrumentation
// ---------------------------------------------------------------------------

/// Execute a task effect inside an `effect.command` span.
pub fn trace_command_effect<F, R>(command_type: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    EFFECTS_COMMAND_TOTAL.fetch_add(1, Ordering::Relaxed);

    let start = Instant::now();
    let _span = tracing::debug_span!(
        "effect.command",
        command_type = %command_type,
        duration_us = tracing::field::Empty,
    )
    .entered();

    tracing::debug!(
        target: "overlay.effect",
        command_type = %command_type,
        "command effect started"
    );

    let result = f();
    let duration_us = start.elapsed().as_micros() as u64;

    tracing::debug!(
        target: "overlay.effect",
        command_type = %command_type,
        duration_us = duration_us,
        "command effect completed"
    );

    result
}

// ---------------------------------------------------------------------------
// Resolution instrumentation
// ---------------------------------------------------------------------------

/// Run one call into the external resolver inside a `resolve.task` span.
pub fn trace_resolution<F, R>(event_id: EventId, generation: u64, attempt: u32, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _span = tracing::debug_span!(
        "resolve.task",
        event_id = event_id.get(),
        generation = generation,
        attempt = attempt,
    )
    .entered();
    f()
}

/// A resolution request was issued.
pub fn record_resolution_started(event_id: EventId, generation: u64) {
    RESOLUTIONS_STARTED_TOTAL.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(
        target: "overlay.resolve",
        event_id = event_id.get(),
        generation = generation,
        "resolution started"
    );
}

/// A resolution result was merged into the cache.
pub fn record_resolution_applied(event_id: EventId, generation: u64, placeholder: bool) {
    RESOLUTIONS_APPLIED_TOTAL.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(
        target: "overlay.resolve",
        event_id = event_id.get(),
        generation = generation,
        placeholder = placeholder,
        "resolution applied"
    );
}

/// A resolution result arrived for a target nobody is waiting on.
pub fn record_resolution_discarded(event_id: EventId, generation: u64, reason: &str) {
    RESOLUTIONS_DISCARDED_TOTAL.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(
        target: "overlay.resolve",
        event_id = event_id.get(),
        generation = generation,
        reason = %reason,
        "resolution discarded"
    );
}

/// A resolution failed after all attempts.
pub fn record_resolution_failed(event_id: EventId, generation: u64, error: &str) {
    RESOLUTIONS_FAILED_TOTAL.fetch_add(1, Ordering::Relaxed);
    tracing::warn!(
        target: "overlay.resolve",
        event_id = event_id.get(),
        generation = generation,
        error = %error,
        "resolution failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::registry::LookupSpan;

    #[derive(Debug, Clone)]
    struct CapturedSpan {
        name: String,
        fields: HashMap<String, String>,
    }

    #[derive(Debug, Clone)]
    struct CapturedEvent {
        level: tracing::Level,
        target: String,
        fields: HashMap<String, String>,
    }

    #[derive(Default, Clone)]
    struct SpanCapture {
        spans: Arc<Mutex<Vec<CapturedSpan>>>,
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    struct FieldVisitor(Vec<(String, String)>);

    impl tracing::field::Visit for FieldVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0.push((field.name().to_string(), format!("{value:?}")));
        }
        fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
        fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
    }

    impl<S> tracing_subscriber::Layer<S> for SpanCapture
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = FieldVisitor(Vec::new());
            attrs.record(&mut visitor);
            self.spans.lock().unwrap().push(CapturedSpan {
                name: attrs.metadata().name().to_string(),
                fields: visitor.0.into_iter().collect(),
            });
        }

        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = FieldVisitor(Vec::new());
            event.record(&mut visitor);
            self.events.lock().unwrap().push(CapturedEvent {
                level: *event.metadata().level(),
                target: event.metadata().target().to_string(),
                fields: visitor.0.into_iter().collect(),
            });
        }
    }

    fn with_captured_tracing<F: FnOnce()>(f: F) -> SpanCapture {
        let capture = SpanCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        tracing::subscriber::with_default(subscriber, f);
        capture
    }

    #[test]
    fn trace_command_effect_emits_span_and_events() {
        let capture = with_captured_tracing(|| {
            assert_eq!(trace_command_effect("resolve:1", || 42), 42);
        });
        let spans = capture.spans.lock().unwrap().clone();
        let span = spans
            .iter()
            .find(|s| s.name == "effect.command")
            .expect("effect.command span");
        assert_eq!(span.fields.get("command_type").unwrap(), "resolve:1");

        let events = capture.events.lock().unwrap().clone();
        let completed = events
            .iter()
            .find(|e| {
                e.target == "overlay.effect"
                    && e.fields
                        .get("message")
                        .is_some_and(|m| m.contains("completed"))
            })
            .expect("completed event");
        assert!(completed.fields.contains_key("duration_us"));
    }

    #[test]
    fn trace_resolution_records_ids() {
        let capture = with_captured_tracing(|| {
            trace_resolution(EventId(7), 3, 0, || ());
        });
        let spans = capture.spans.lock().unwrap().clone();
        let span = spans.iter().find(|s| s.name == "resolve.task").unwrap();
        assert_eq!(span.fields.get("event_id").unwrap(), "7");
        assert_eq!(span.fields.get("generation").unwrap(), "3");
        assert_eq!(span.fields.get("attempt").unwrap(), "0");
    }

    #[test]
    fn failure_logs_at_warn() {
        let capture = with_captured_tracing(|| {
            record_resolution_failed(EventId(2), 1, "source map missing");
        });
        let events = capture.events.lock().unwrap().clone();
        assert!(events.iter().any(|e| e.level == tracing::Level::WARN
            && e.target == "overlay.resolve"
            && e.fields.get("error").is_some_and(|v| v == "source map missing")));
    }

    #[test]
    fn counters_are_monotonic() {
        let started = resolutions_started_total();
        let applied = resolutions_applied_total();
        let discarded = resolutions_discarded_total();
        let failed = resolutions_failed_total();
        let commands = effects_command_total();

        record_resolution_started(EventId(1), 1);
        record_resolution_applied(EventId(1), 1, false);
        record_resolution_discarded(EventId(1), 1, "stale");
        record_resolution_failed(EventId(1), 1, "x");
        trace_command_effect("t", || ());

        assert!(resolutions_started_total() > started);
        assert!(resolutions_applied_total() > applied);
        assert!(resolutions_discarded_total() > discarded);
        assert!(resolutions_failed_total() > failed);
        assert!(effects_command_total() > commands);
    }
}
