#![forbid(unsafe_code)]

//! Overlay Runtime
//!
//! The moving parts behind the dev error overlay: a cooperative Elm-style
//! runtime and the resolution pipeline that runs on top of it.
//!
//! # Key Components
//!
//! - [`Program`] - single-threaded executor; tasks run only at yield points
//! - [`Model`] - trait for application state and behavior
//! - [`Cmd`] - commands for side effects
//! - [`ResolutionCache`] - event id to resolved record
//! - [`SequentialResolver`] - dedup scan plus single-flight resolution
//! - [`CancellationToken`] - advisory liveness flag for in-flight work
//! - [`RetryPolicy`] - deterministic backoff for failed resolutions
//!
//! # How it fits in the system
//! `overlay-core` supplies the data types. This crate decides which events
//! are ready and which one to resolve next. `overlay-widgets` turns the
//! result into display and tab state, and the `overlay` facade wires all of
//! them into one [`Model`].

pub mod cache;
pub mod cancellation;
pub mod effect_system;
pub mod program;
pub mod resolver;
pub mod retry;

pub use cache::ResolutionCache;
pub use cancellation::{CancelReason, CancellationSource, CancellationToken};
pub use program::{Cmd, LOG_CAPACITY, Model, Program, QueuedTask, TaskSpec};
pub use resolver::{
    Completion, DiagnosticResolver, DiscardReason, Evaluation, FailureMode, FailurePolicy,
    ResolveError, ResolveRequest, ResolveTicket, Scan, SequentialResolver, is_loading, scan,
};
pub use retry::{BackoffStrategy, RetryPolicy, run_with_retry};
