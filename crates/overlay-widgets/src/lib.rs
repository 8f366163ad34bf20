#![forbid(unsafe_code)]

//! Presentation state for the dev error overlay.
//!
//! Nothing here draws. These types decide *what* the rendering layer shows:
//!
//! - [`DisplayStateMachine`] - fullscreen / minimized / hidden
//! - [`TabSelector`] - default and selected tab, with the compiler-error steal
//! - [`TabStrip`] - visible tabs, labels and neighbour links
//! - [`OverlaySummary`] - counts, presence flags and the closable decision
//! - [`OverlayView`] - the final render decision

pub mod display_state;
pub mod summary;
pub mod tab_selector;
pub mod tab_strip;
pub mod view;

pub use display_state::{DisplayAction, DisplayState, DisplayStateMachine, TriggerEvent};
pub use summary::{ClosePolicy, OverlaySummary, Severity};
pub use tab_selector::{TAB_PRIORITY, TabFlags, TabId, TabSelector, default_tab};
pub use tab_strip::{TabEntry, TabStrip};
pub use view::{DialogView, OverlayView, RuntimePanel, ViewInputs, build_view};
