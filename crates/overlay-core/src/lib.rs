#![forbid(unsafe_code)]

//! Core data model for the dev error overlay.
//!
//! # Role in the overlay
//! `overlay-core` owns the immutable inputs the overlay consumes and the
//! resolved records it produces:
//!
//! - [`DiagnosticEvent`] - an unhandled runtime error or rejection, tagged
//!   with a producer-assigned monotonic [`EventId`].
//! - [`Issue`] - a compiler diagnostic with an [`IssueSeverity`].
//! - [`ResolvedError`] - the fully-resolved form of an event, produced by an
//!   external resolution routine.
//! - [`Signature`] - the identity used to suppress consecutive duplicates.
//!
//! Nothing here performs I/O or holds mutable shared state; the runtime and
//! widget crates build their state machines on top of these types.

pub mod event;
pub mod issue;
pub mod resolved;
pub mod signature;

pub use event::{DiagnosticEvent, DiagnosticPayload, ErrorReason, EventId};
pub use issue::{Issue, IssueBuckets, IssueSeverity, ParseSeverityError};
pub use resolved::{ErrorSource, ResolvedError, StackFrame, classify_source};
pub use signature::{SIGNATURE_DELIMITER, Signature, signature};
