#![forbid(unsafe_code)]

//! Tab strip model: which tabs are visible, what they say, and how they
//! link to each other.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::summary::{OverlaySummary, Severity};
use crate::tab_selector::TabId;

/// One visible tab.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TabEntry {
    pub id: TabId,
    pub label: String,
    pub severity: Severity,
    /// Visible neighbour to the left.
    pub prev: Option<TabId>,
    /// Visible neighbour to the right.
    pub next: Option<TabId>,
}

/// Visible tabs in [`TabId::DISPLAY_ORDER`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct TabStrip {
    entries: Vec<TabEntry>,
}

fn plural(count: usize, noun: &str) -> String {
    let suffix = if count > 1 { "s" } else { "" };
    format!("{count} {noun}{suffix}")
}

impl TabStrip {
    /// Build the strip for a summary. Tabs without content are omitted.
    #[must_use]
    pub fn from_summary(summary: &OverlaySummary) -> Self {
        let flags = summary.tab_flags();
        let visible: Vec<TabId> = TabId::DISPLAY_ORDER
            .into_iter()
            .filter(|&tab| flags.has(tab))
            .collect();

        let entries = visible
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let (label, severity) = match id {
                    TabId::CompilerErrors => (
                        plural(summary.compiler_errors, "Compiler Error"),
                        Severity::Error,
                    ),
                    TabId::CompilerWarnings => (
                        plural(summary.compiler_warnings, "Compiler Warning"),
                        Severity::Warning,
                    ),
                    TabId::RuntimeErrors if summary.is_loading => {
                        ("Loading Runtime Errors ...".to_string(), Severity::Error)
                    }
                    TabId::RuntimeErrors => (
                        plural(summary.runtime_ready, "Runtime Error"),
                        Severity::Error,
                    ),
                };
                TabEntry {
                    id,
                    label,
                    severity,
                    prev: i.checked_sub(1).map(|p| visible[p]),
                    next: visible.get(i + 1).copied(),
                }
            })
            .collect();
        Self { entries }
    }

    /// Visible tabs, left to right.
    #[must_use]
    pub fn entries(&self) -> &[TabEntry] {
        &self.entries
    }

    /// Entry for `id`, if visible.
    #[must_use]
    pub fn get(&self, id: TabId) -> Option<&TabEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Number of visible tabs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No tabs visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
