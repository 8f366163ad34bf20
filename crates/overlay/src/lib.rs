#![forbid(unsafe_code)]

//! Dev error overlay public facade.
//!
//! This crate provides the surface most hosts need: the [`ErrorOverlay`]
//! model, its [`OverlayConfig`], and re-exports of the common types from the
//! internal crates. Drive the model with a [`Program`], feed it input
//! changes as [`Msg`]s, yield to its resolution tasks, and render
//! whatever [`Program::view`] returns.

pub mod config;
pub mod overlay;

// --- Core re-exports -------------------------------------------------------

pub use overlay_core::{
    DiagnosticEvent, DiagnosticPayload, ErrorReason, ErrorSource, EventId, Issue, IssueBuckets,
    IssueSeverity, ResolvedError, Signature, StackFrame, signature,
};

// --- Runtime re-exports ----------------------------------------------------

pub use overlay_runtime::{
    BackoffStrategy, Cmd, Completion, DiagnosticResolver, FailureMode, FailurePolicy, Model,
    Program, ResolveError, ResolveTicket, RetryPolicy,
};

// --- Widgets re-exports ----------------------------------------------------

pub use overlay_widgets::{
    ClosePolicy, DialogView, DisplayAction, DisplayState, OverlaySummary, OverlayView, Severity,
    TabId, TabStrip, TriggerEvent,
};

pub use crate::config::{ConfigError, OverlayConfig};
pub use crate::overlay::{ErrorOverlay, Msg};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for overlay hosts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A resolution failed outside the overlay's own handling.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Standard result type for overlay APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ClosePolicy, DiagnosticEvent, DiagnosticResolver, DisplayAction, DisplayState,
        ErrorOverlay, ErrorReason, Error, Issue, IssueSeverity, Model, Msg, OverlayConfig,
        OverlayView, Program, ResolveError, ResolvedError, Result, TabId,
    };

    pub use crate::{core, runtime, widgets};
}

pub use overlay_core as core;
pub use overlay_runtime as runtime;
pub use overlay_widgets as widgets;
