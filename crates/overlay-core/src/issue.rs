#![forbid(unsafe_code)]

//! Compiler issues.
//!
//! Issues are produced by the bundler and arrive as a flat list. The overlay
//! only cares about severity: `bug`, `fatal` and `error` count as compiler
//! errors, everything else is a warning.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Severity of a compiler [`Issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum IssueSeverity {
    /// Internal compiler bug.
    Bug,
    /// Unrecoverable failure.
    Fatal,
    /// Compilation error.
    Error,
    /// Compilation warning.
    Warning,
    /// Hint.
    Hint,
    /// Note.
    Note,
    /// Suggestion.
    Suggestion,
    /// Informational.
    Info,
}

impl IssueSeverity {
    /// All severities, most severe first.
    pub const ALL: [Self; 8] = [
        Self::Bug,
        Self::Fatal,
        Self::Error,
        Self::Warning,
        Self::Hint,
        Self::Note,
        Self::Suggestion,
        Self::Info,
    ];

    /// Whether this severity counts as a compiler error.
    #[inline]
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Bug | Self::Fatal | Self::Error)
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
            Self::Note => "note",
            Self::Suggestion => "suggestion",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown severity string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown issue severity `{0}`")]
pub struct ParseSeverityError(pub String);

impl FromStr for IssueSeverity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

/// A compiler diagnostic. Immutable, produced externally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Issue {
    pub severity: IssueSeverity,
    pub file_path: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub detail: String,
    pub documentation_link: String,
}

impl Default for Issue {
    fn default() -> Self {
        Self {
            severity: IssueSeverity::Error,
            file_path: String::new(),
            category: String::new(),
            title: String::new(),
            description: String::new(),
            detail: String::new(),
            documentation_link: String::new(),
        }
    }
}

impl Issue {
    /// Create an issue with a severity and title.
    pub fn new(severity: IssueSeverity, title: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the file path the issue refers to.
    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = path.into();
        self
    }

    /// Set the issue category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether this issue is a compiler error.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}

/// Issues split into compiler errors and compiler warnings, order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueBuckets {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl IssueBuckets {
    /// Partition a flat issue list by severity.
    #[must_use]
    pub fn partition(issues: &[Issue]) -> Self {
        let (errors, warnings) = issues.iter().cloned().partition(Issue::is_error);
        Self { errors, warnings }
    }

    /// Any compiler errors present.
    #[inline]
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Any compiler warnings present.
    #[inline]
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// No issues at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_severities() {
        let errors: Vec<_> = IssueSeverity::ALL
            .into_iter()
            .filter(|s| s.is_error())
            .collect();
        assert_eq!(
            errors,
            vec![IssueSeverity::Bug, IssueSeverity::Fatal, IssueSeverity::Error]
        );
    }

    #[test]
    fn severity_round_trips_through_str() {
        for sev in IssueSeverity::ALL {
            assert_eq!(sev.as_str().parse::<IssueSeverity>(), Ok(sev));
        }
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let err = "catastrophic".parse::<IssueSeverity>().unwrap_err();
        assert_eq!(err.to_string(), "unknown issue severity `catastrophic`");
    }

    #[test]
    fn partition_preserves_order() {
        let issues = vec![
            Issue::new(IssueSeverity::Warning, "w1"),
            Issue::new(IssueSeverity::Error, "e1"),
            Issue::new(IssueSeverity::Hint, "w2"),
            Issue::new(IssueSeverity::Fatal, "e2"),
        ];
        let buckets = IssueBuckets::partition(&issues);
        let titles = |v: &[Issue]| v.iter().map(|i| i.title.clone()).collect::<Vec<_>>();
        assert_eq!(titles(&buckets.errors), ["e1", "e2"]);
        assert_eq!(titles(&buckets.warnings), ["w1", "w2"]);
        assert!(buckets.has_errors());
        assert!(buckets.has_warnings());
    }

    #[test]
    fn empty_partition() {
        let buckets = IssueBuckets::partition(&[]);
        assert!(buckets.is_empty());
        assert!(!buckets.has_errors());
    }
}
