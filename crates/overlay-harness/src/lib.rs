#![forbid(unsafe_code)]

//! Test harness for the dev error overlay.
//!
//! - [`fixtures`] - event and issue builders, canned resolvers
//! - [`scripted`] - a resolver scripted per event id that records its calls
//! - [`trace_capture`] - in-memory tracing layer for span assertions
//! - [`scenario`] - JSON scenario replay, used by the `overlay-replay` binary

pub mod fixtures;
pub mod scenario;
pub mod scripted;
pub mod trace_capture;

pub use scenario::{Scenario, ScenarioError, Step, StepRecord, write_jsonl};
pub use scripted::ScriptedResolver;
pub use trace_capture::{CapturedEvent, CapturedSpan, TraceCapture};
