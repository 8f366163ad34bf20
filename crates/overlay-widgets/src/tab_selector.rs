#![forbid(unsafe_code)]

//! Tab selection.
//!
//! The default tab is the first category in [`TAB_PRIORITY`] that has
//! content. The selected tab is the user's, except that whenever the default
//! *becomes* [`TabId::CompilerErrors`] the selection is overwritten with it:
//! fresh compiler errors steal focus. No other category ever forces a
//! selection change.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dialog tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum TabId {
    /// Compiler issues with error severity.
    CompilerErrors,
    /// Compiler issues with any other severity.
    CompilerWarnings,
    /// Unhandled runtime errors and rejections.
    RuntimeErrors,
}

/// Order in which tabs claim the default.
pub const TAB_PRIORITY: [TabId; 3] = [
    TabId::CompilerErrors,
    TabId::RuntimeErrors,
    TabId::CompilerWarnings,
];

impl TabId {
    /// Order in which tabs appear in the strip.
    pub const DISPLAY_ORDER: [Self; 3] = [
        Self::CompilerErrors,
        Self::CompilerWarnings,
        Self::RuntimeErrors,
    ];

    /// Stable identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompilerErrors => "compiler-errors",
            Self::CompilerWarnings => "compiler-warnings",
            Self::RuntimeErrors => "runtime-errors",
        }
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which categories have content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TabFlags {
    pub has_compiler_errors: bool,
    pub has_compiler_warnings: bool,
    pub has_runtime_errors: bool,
}

impl TabFlags {
    /// Whether `tab` has content.
    #[must_use]
    pub const fn has(self, tab: TabId) -> bool {
        match tab {
            TabId::CompilerErrors => self.has_compiler_errors,
            TabId::CompilerWarnings => self.has_compiler_warnings,
            TabId::RuntimeErrors => self.has_runtime_errors,
        }
    }

    /// Whether no category has content.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.has_compiler_errors && !self.has_compiler_warnings && !self.has_runtime_errors
    }
}

/// First tab in [`TAB_PRIORITY`] with content, falling back to
/// [`TabId::RuntimeErrors`].
#[must_use]
pub fn default_tab(flags: TabFlags) -> TabId {
    TAB_PRIORITY
        .into_iter()
        .find(|&tab| flags.has(tab))
        .unwrap_or(TabId::RuntimeErrors)
}

/// Default and selected tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSelector {
    default: TabId,
    selected: TabId,
}

impl TabSelector {
    /// Start with the selection on the computed default.
    #[must_use]
    pub fn new(flags: TabFlags) -> Self {
        let default = default_tab(flags);
        Self {
            default,
            selected: default,
        }
    }

    /// Recompute the default from fresh flags and apply the steal rule.
    ///
    /// Returns `true` if the selection was overwritten.
    pub fn update(&mut self, flags: TabFlags) -> bool {
        let next = default_tab(flags);
        let transitioned = next != self.default;
        self.default = next;
        if transitioned && next == TabId::CompilerErrors && self.selected != next {
            #[cfg(feature = "tracing")]
            Self::log_switch("steal", self.selected, next);
            self.selected = next;
            return true;
        }
        false
    }

    /// User selection. Returns `true` if it changed.
    pub fn select(&mut self, tab: TabId) -> bool {
        if self.selected == tab {
            return false;
        }
        #[cfg(feature = "tracing")]
        Self::log_switch("select", self.selected, tab);
        self.selected = tab;
        true
    }

    /// Currently selected tab.
    #[must_use]
    pub const fn selected(&self) -> TabId {
        self.selected
    }

    /// Currently computed default tab.
    #[must_use]
    pub const fn default_tab(&self) -> TabId {
        self.default
    }

    #[cfg(feature = "tracing")]
    fn log_switch(reason: &str, from: TabId, to: TabId) {
        tracing::debug!(
            target: "overlay.tabs",
            message = "tabs.switch",
            reason,
            from = from.as_str(),
            to = to.as_str()
        );
    }
}
