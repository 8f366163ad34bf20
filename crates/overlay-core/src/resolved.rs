#![forbid(unsafe_code)]

//! Fully-resolved error records.
//!
//! A [`ResolvedError`] is what the external resolution routine hands back for
//! a [`DiagnosticEvent`](crate::DiagnosticEvent): the original reason plus
//! source-mapped frames and the environment the error came from. The overlay
//! treats it as opaque apart from its `id` and its [`ErrorSource`].

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::event::{DiagnosticEvent, ErrorReason, EventId};

/// Where an error was thrown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum ErrorSource {
    /// Node.js server rendering.
    Server,
    /// Edge runtime.
    EdgeServer,
    /// Browser.
    Client,
    /// Anything else the producer reports.
    Other(String),
}

impl ErrorSource {
    /// Wire name of the source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Server => "server",
            Self::EdgeServer => "edge-server",
            Self::Client => "client",
            Self::Other(s) => s,
        }
    }

    /// Server and edge-server errors break the page for every visitor.
    #[inline]
    #[must_use]
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server | Self::EdgeServer)
    }
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl From<String> for ErrorSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "server" => Self::Server,
            "edge-server" => Self::EdgeServer,
            "client" => Self::Client,
            _ => Self::Other(value),
        }
    }
}

impl From<ErrorSource> for String {
    fn from(value: ErrorSource) -> Self {
        match value {
            ErrorSource::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// One frame of a resolved stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct StackFrame {
    pub method_name: String,
    pub file: Option<String>,
    pub line_number: Option<u32>,
    pub column: Option<u32>,
}

impl StackFrame {
    /// `file:line:column`, dropping the parts that are unknown.
    #[must_use]
    pub fn location(&self) -> String {
        match (&self.file, self.line_number, self.column) {
            (Some(file), Some(line), Some(col)) => format!("{file}:{line}:{col}"),
            (Some(file), Some(line), None) => format!("{file}:{line}"),
            (Some(file), None, _) => file.clone(),
            (None, _, _) => String::from("<unknown>"),
        }
    }
}

/// The fully-resolved form of a [`DiagnosticEvent`], keyed by the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedError {
    /// Id of the event this record resolves.
    pub id: EventId,
    /// The original thrown value.
    pub reason: ErrorReason,
    /// Source-mapped frames, innermost first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub frames: Vec<StackFrame>,
    /// Environment the error came from, if known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: Option<ErrorSource>,
    /// True for placeholder records standing in for a failed resolution.
    #[cfg_attr(feature = "serde", serde(default))]
    pub unresolved: bool,
}

impl ResolvedError {
    /// Create a record with no frames and unknown source.
    pub fn new(id: impl Into<EventId>, reason: ErrorReason) -> Self {
        Self {
            id: id.into(),
            reason,
            frames: Vec::new(),
            source: None,
            unresolved: false,
        }
    }

    /// Set the resolved frames.
    #[must_use]
    pub fn with_frames(mut self, frames: Vec<StackFrame>) -> Self {
        self.frames = frames;
        self
    }

    /// Set the error source.
    #[must_use]
    pub fn with_source(mut self, source: ErrorSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Placeholder for an event whose resolution failed: the raw reason,
    /// no frames, flagged `unresolved`.
    #[must_use]
    pub fn placeholder(event: &DiagnosticEvent) -> Self {
        Self {
            id: event.id,
            reason: event.reason().cloned().unwrap_or_default(),
            frames: Vec::new(),
            source: None,
            unresolved: true,
        }
    }
}

/// Classify where a resolved error came from.
#[inline]
#[must_use]
pub fn classify_source(resolved: &ResolvedError) -> Option<&ErrorSource> {
    resolved.source.as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_parsing() {
        assert_eq!("server".parse::<ErrorSource>(), Ok(ErrorSource::Server));
        assert_eq!(
            "edge-server".parse::<ErrorSource>(),
            Ok(ErrorSource::EdgeServer)
        );
        assert_eq!(
            "worker".parse::<ErrorSource>(),
            Ok(ErrorSource::Other("worker".into()))
        );
    }

    #[test]
    fn parse_and_string_conversion_agree() {
        for text in ["server", "edge-server", "client", "worker", ""] {
            let parsed: ErrorSource = text.parse().unwrap();
            assert_eq!(parsed, ErrorSource::from(text.to_string()));
            assert_eq!(String::from(parsed), text);
        }
    }

    #[test]
    fn server_classification() {
        assert!(ErrorSource::Server.is_server());
        assert!(ErrorSource::EdgeServer.is_server());
        assert!(!ErrorSource::Client.is_server());
        assert!(!ErrorSource::Other("server-ish".into()).is_server());
    }

    #[test]
    fn classify_source_reads_record() {
        let reason = ErrorReason::new("Error", "boom", "");
        let plain = ResolvedError::new(1, reason.clone());
        assert_eq!(classify_source(&plain), None);
        let edge = ResolvedError::new(2, reason).with_source(ErrorSource::EdgeServer);
        assert_eq!(classify_source(&edge), Some(&ErrorSource::EdgeServer));
    }

    #[test]
    fn placeholder_keeps_id_and_reason() {
        let reason = ErrorReason::new("RangeError", "too deep", "at f");
        let event = DiagnosticEvent::unhandled_rejection(9, reason.clone());
        let record = ResolvedError::placeholder(&event);
        assert_eq!(record.id, EventId(9));
        assert_eq!(record.reason, reason);
        assert!(record.unresolved);
        assert!(record.frames.is_empty());
    }

    #[test]
    fn frame_location_formats() {
        let mut frame = StackFrame {
            method_name: "render".into(),
            file: Some("app/page.tsx".into()),
            line_number: Some(12),
            column: Some(4),
        };
        assert_eq!(frame.location(), "app/page.tsx:12:4");
        frame.column = None;
        assert_eq!(frame.location(), "app/page.tsx:12");
        frame.file = None;
        assert_eq!(frame.location(), "<unknown>");
    }
}
