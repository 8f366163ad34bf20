#![forbid(unsafe_code)]

//! What the presentation layer should render.

use std::sync::Arc;

use overlay_core::{Issue, IssueBuckets, ResolvedError};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::display_state::DisplayState;
use crate::summary::{OverlaySummary, Severity};
use crate::tab_selector::TabId;
use crate::tab_strip::TabStrip;

/// Runtime errors panel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RuntimePanel {
    pub is_loading: bool,
    pub errors: Vec<Arc<ResolvedError>>,
}

/// Full tabbed dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DialogView {
    pub tabs: TabStrip,
    pub default_tab: TabId,
    pub selected_tab: TabId,
    /// Whether the dialog offers a close (minimize) control.
    pub closable: bool,
    /// Present only when there are compiler errors.
    pub compiler_errors: Option<Vec<Issue>>,
    /// Present only when there are compiler warnings.
    pub compiler_warnings: Option<Vec<Issue>>,
    /// Present only when runtime events arrived.
    pub runtime: Option<RuntimePanel>,
}

/// Render decision.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize),
    serde(tag = "kind", rename_all = "lowercase")
)]
pub enum OverlayView {
    /// Render nothing.
    Nothing,
    /// Compact summary.
    Toast {
        error_count: usize,
        warning_count: usize,
        severity: Severity,
    },
    /// Tabbed dialog.
    Dialog(DialogView),
}

impl OverlayView {
    /// Whether anything is rendered.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Nothing)
    }

    /// The dialog, if this is one.
    #[must_use]
    pub fn as_dialog(&self) -> Option<&DialogView> {
        match self {
            Self::Dialog(dialog) => Some(dialog),
            _ => None,
        }
    }
}

/// Inputs to [`build_view`].
#[derive(Debug, Clone, Copy)]
pub struct ViewInputs<'a> {
    pub summary: &'a OverlaySummary,
    pub issues: &'a IssueBuckets,
    pub ready: &'a [Arc<ResolvedError>],
    /// Display state after the closable override.
    pub display: DisplayState,
    pub closable: bool,
    pub default_tab: TabId,
    pub selected_tab: TabId,
}

/// Decide what to render.
///
/// Empty content and [`DisplayState::Hidden`] render nothing; minimized is a
/// toast; fullscreen is the dialog.
#[must_use]
pub fn build_view(inputs: ViewInputs<'_>) -> OverlayView {
    let summary = inputs.summary;
    if summary.is_empty() {
        return OverlayView::Nothing;
    }
    match inputs.display {
        DisplayState::Hidden => OverlayView::Nothing,
        DisplayState::Minimized => OverlayView::Toast {
            error_count: summary.toast_error_count(),
            warning_count: summary.compiler_warnings,
            severity: summary.severity(),
        },
        DisplayState::Fullscreen => OverlayView::Dialog(DialogView {
            tabs: TabStrip::from_summary(summary),
            default_tab: inputs.default_tab,
            selected_tab: inputs.selected_tab,
            closable: inputs.closable,
            compiler_errors: summary
                .has_compiler_errors()
                .then(|| inputs.issues.errors.clone()),
            compiler_warnings: summary
                .has_compiler_warnings()
                .then(|| inputs.issues.warnings.clone()),
            runtime: summary.has_runtime_errors().then(|| RuntimePanel {
                is_loading: summary.is_loading,
                errors: inputs.ready.to_vec(),
            }),
        }),
    }
}
