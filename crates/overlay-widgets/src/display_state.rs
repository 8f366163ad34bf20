#![forbid(unsafe_code)]

//! Overlay display state machine.
//!
//! Three states, every action reachable from every state. Actions take the
//! input event that triggered them (a click, a key press) and suppress its
//! default behaviour before switching.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the overlay is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum DisplayState {
    /// Full tabbed dialog.
    Fullscreen,
    /// Compact toast with counts.
    Minimized,
    /// Nothing rendered.
    Hidden,
}

impl DisplayState {
    /// Starting state: minimized when only warnings are present, fullscreen
    /// otherwise.
    #[must_use]
    pub const fn initial(only_has_warnings: bool) -> Self {
        if only_has_warnings {
            Self::Minimized
        } else {
            Self::Fullscreen
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fullscreen => "fullscreen",
            Self::Minimized => "minimized",
            Self::Hidden => "hidden",
        }
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum DisplayAction {
    Fullscreen,
    Minimize,
    Hide,
}

impl DisplayAction {
    /// State this action switches to.
    #[must_use]
    pub const fn target(self) -> DisplayState {
        match self {
            Self::Fullscreen => DisplayState::Fullscreen,
            Self::Minimize => DisplayState::Minimized,
            Self::Hide => DisplayState::Hidden,
        }
    }
}

/// The input event behind an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerEvent {
    kind: String,
    default_prevented: bool,
}

impl TriggerEvent {
    /// Wrap an input event of the given kind (`"click"`, `"touchend"`, ...).
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            default_prevented: false,
        }
    }

    /// Event kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Suppress the event's default behaviour.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether [`prevent_default`](Self::prevent_default) was called.
    #[must_use]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Stored display state plus its transition actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayStateMachine {
    state: DisplayState,
}

impl DisplayStateMachine {
    /// Start in `initial`.
    #[must_use]
    pub const fn new(initial: DisplayState) -> Self {
        Self { state: initial }
    }

    /// Start in the state [`DisplayState::initial`] picks.
    #[must_use]
    pub const fn for_content(only_has_warnings: bool) -> Self {
        Self::new(DisplayState::initial(only_has_warnings))
    }

    /// Stored state, before the closable override.
    #[must_use]
    pub const fn state(&self) -> DisplayState {
        self.state
    }

    /// State to render. Non-closable content is always fullscreen.
    #[must_use]
    pub const fn effective(&self, closable: bool) -> DisplayState {
        if closable {
            self.state
        } else {
            DisplayState::Fullscreen
        }
    }

    /// Apply `action` unconditionally. Returns the previous state.
    pub fn apply(
        &mut self,
        action: DisplayAction,
        trigger: Option<&mut TriggerEvent>,
    ) -> DisplayState {
        if let Some(event) = trigger {
            event.prevent_default();
        }
        let previous = self.state;
        self.state = action.target();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "overlay.display",
            message = "display.transition",
            from = previous.as_str(),
            to = self.state.as_str()
        );
        previous
    }

    /// Switch to [`DisplayState::Fullscreen`].
    pub fn fullscreen(&mut self, trigger: Option<&mut TriggerEvent>) {
        self.apply(DisplayAction::Fullscreen, trigger);
    }

    /// Switch to [`DisplayState::Minimized`].
    pub fn minimize(&mut self, trigger: Option<&mut TriggerEvent>) {
        self.apply(DisplayAction::Minimize, trigger);
    }

    /// Switch to [`DisplayState::Hidden`].
    pub fn hide(&mut self, trigger: Option<&mut TriggerEvent>) {
        self.apply(DisplayAction::Hide, trigger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_follows_content() {
        assert_eq!(DisplayState::initial(true), DisplayState::Minimized);
        assert_eq!(DisplayState::initial(false), DisplayState::Fullscreen);
        assert_eq!(
            DisplayStateMachine::for_content(true).state(),
            DisplayState::Minimized
        );
    }

    #[test]
    fn every_action_reaches_its_state_from_every_state() {
        let states = [
            DisplayState::Fullscreen,
            DisplayState::Minimized,
            DisplayState::Hidden,
        ];
        let actions = [
            DisplayAction::Fullscreen,
            DisplayAction::Minimize,
            DisplayAction::Hide,
        ];
        for from in states {
            for action in actions {
                let mut machine = DisplayStateMachine::new(from);
                assert_eq!(machine.apply(action, None), from);
                assert_eq!(machine.state(), action.target());
            }
        }
    }

    #[test]
    fn actions_suppress_trigger_default() {
        let mut machine = DisplayStateMachine::new(DisplayState::Fullscreen);
        let mut click = TriggerEvent::new("click");
        machine.minimize(Some(&mut click));
        assert!(click.is_default_prevented());
        assert_eq!(click.kind(), "click");
        assert_eq!(machine.state(), DisplayState::Minimized);

        let mut tap = TriggerEvent::new("touchend");
        machine.hide(Some(&mut tap));
        assert!(tap.is_default_prevented());
        machine.fullscreen(None);
        assert_eq!(machine.state(), DisplayState::Fullscreen);
    }

    #[test]
    fn repeated_action_is_a_no_op_transition() {
        let mut machine = DisplayStateMachine::new(DisplayState::Hidden);
        machine.hide(None);
        assert_eq!(machine.state(), DisplayState::Hidden);
    }

    #[test]
    fn non_closable_forces_fullscreen() {
        let mut machine = DisplayStateMachine::new(DisplayState::Fullscreen);
        machine.hide(None);
        assert_eq!(machine.effective(true), DisplayState::Hidden);
        assert_eq!(machine.effective(false), DisplayState::Fullscreen);
        assert_eq!(machine.state(), DisplayState::Hidden);
    }
}
