#![forbid(unsafe_code)]

//! Derived counts and flags for the presentation layer.

use std::sync::Arc;

use overlay_core::{IssueBuckets, ResolvedError, classify_source};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::tab_selector::TabFlags;

/// Dominant severity of a tab or of the toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Severity {
    Error,
    Warning,
}

/// When the overlay may be dismissed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ClosePolicy {
    /// Always closable.
    #[default]
    Always,
    /// Not closable while runtime errors are loading, compiler errors exist,
    /// or a server-side error is ready.
    BlockWhileBroken,
}

/// Counts and presence flags for one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct OverlaySummary {
    pub compiler_errors: usize,
    pub compiler_warnings: usize,
    /// Raw runtime events, resolved or not.
    pub runtime_events: usize,
    /// Runtime errors ready to display.
    pub runtime_ready: usize,
    pub is_loading: bool,
    /// Any ready error came from the server or edge runtime.
    pub has_server_error: bool,
}

impl OverlaySummary {
    /// Summarize one evaluation.
    #[must_use]
    pub fn new(
        issues: &IssueBuckets,
        runtime_events: usize,
        ready: &[Arc<ResolvedError>],
        is_loading: bool,
    ) -> Self {
        let has_server_error = ready
            .iter()
            .any(|err| classify_source(err).is_some_and(|src| src.is_server()));
        Self {
            compiler_errors: issues.errors.len(),
            compiler_warnings: issues.warnings.len(),
            runtime_events,
            runtime_ready: ready.len(),
            is_loading,
            has_server_error,
        }
    }

    #[must_use]
    pub const fn has_compiler_errors(&self) -> bool {
        self.compiler_errors > 0
    }

    #[must_use]
    pub const fn has_compiler_warnings(&self) -> bool {
        self.compiler_warnings > 0
    }

    /// Any runtime event arrived, whether or not it has resolved yet.
    #[must_use]
    pub const fn has_runtime_errors(&self) -> bool {
        self.runtime_events > 0
    }

    /// No runtime events and no compiler errors.
    ///
    /// Also true for empty content, which renders nothing anyway.
    #[must_use]
    pub const fn only_has_warnings(&self) -> bool {
        !self.has_runtime_errors() && !self.has_compiler_errors()
    }

    /// Nothing to show at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.has_runtime_errors() && !self.has_compiler_errors() && !self.has_compiler_warnings()
    }

    /// Toast severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        if self.only_has_warnings() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    /// Error count shown on the toast: ready runtime errors plus compiler
    /// errors.
    #[must_use]
    pub const fn toast_error_count(&self) -> usize {
        self.runtime_ready + self.compiler_errors
    }

    /// Whether the overlay may be dismissed under `policy`.
    #[must_use]
    pub const fn closable(&self, policy: ClosePolicy) -> bool {
        match policy {
            ClosePolicy::Always => true,
            ClosePolicy::BlockWhileBroken => {
                !self.is_loading && !self.has_compiler_errors() && !self.has_server_error
            }
        }
    }

    /// Flags for the tab selector.
    #[must_use]
    pub const fn tab_flags(&self) -> TabFlags {
        TabFlags {
            has_compiler_errors: self.has_compiler_errors(),
            has_compiler_warnings: self.has_compiler_warnings(),
            has_runtime_errors: self.has_runtime_errors(),
        }
    }
}
