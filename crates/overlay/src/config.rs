#![forbid(unsafe_code)]

//! Policy-as-data configuration for the overlay.
//!
//! Every field defaults to current behaviour: always closable, failures
//! swallowed, no retries. With the `policy-config` feature the config can be
//! loaded from TOML or JSON.
//!
//! ```toml
//! # overlay.toml
//! close_policy = "block_while_broken"
//!
//! [failure]
//! mode = "fallback"
//!
//! [failure.retry]
//! max_retries = 2
//! backoff = { kind = "exponential", base_ms = 50, max_ms = 400 }
//! ```

#[cfg(feature = "policy-config")]
use std::path::Path;

#[cfg(feature = "policy-config")]
use serde::{Deserialize, Serialize};

use std::time::Duration;

use overlay_runtime::{BackoffStrategy, FailurePolicy};
use overlay_widgets::ClosePolicy;

/// Upper bound on retries per resolution.
pub const MAX_RETRIES: u32 = 10;

/// Upper bound on total backoff per resolution.
pub const MAX_TOTAL_BACKOFF: Duration = Duration::from_secs(30);

/// Overlay configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default, deny_unknown_fields))]
pub struct OverlayConfig {
    /// When the overlay may be dismissed.
    pub close_policy: ClosePolicy,
    /// What happens when a resolution fails.
    pub failure: FailurePolicy,
}

impl OverlayConfig {
    /// Load from a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Check parameter ranges. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let retry = &self.failure.retry;

        if retry.max_retries > MAX_RETRIES {
            errors.push(format!(
                "failure.retry.max_retries must be <= {MAX_RETRIES}, got {}",
                retry.max_retries
            ));
        }

        match retry.backoff {
            BackoffStrategy::Fixed { .. } => {}
            BackoffStrategy::Exponential { base_ms, max_ms }
            | BackoffStrategy::Linear { base_ms, max_ms } => {
                if base_ms == 0 {
                    errors.push("failure.retry.backoff.base_ms must be > 0".into());
                }
                if max_ms < base_ms {
                    errors.push(format!(
                        "failure.retry.backoff.max_ms ({max_ms}) must be >= base_ms ({base_ms})"
                    ));
                }
            }
        }

        // The total is only meaningful once the retry count is in range.
        if retry.max_retries <= MAX_RETRIES {
            let total = retry.total_max_delay();
            if total > MAX_TOTAL_BACKOFF {
                errors.push(format!(
                    "failure.retry total backoff must be <= {}ms, got {}ms",
                    MAX_TOTAL_BACKOFF.as_millis(),
                    total.as_millis()
                ));
            }
        }

        errors
    }

    /// [`validate`](Self::validate), as a `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors loading an [`OverlayConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "policy-config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "policy-config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Out-of-range parameters.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
