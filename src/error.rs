//! Error types for the reassembly engine.
//!
//! Stream conditions such as spurious headers, truncated frames or interleaved
//! senders are not errors: the engine resolves them locally and counts them in
//! [`SessionStats`](crate::SessionStats). The variants here cover the fallible
//! surface around the engine: configuration, transport providers and session
//! control.
//!
//! ## Error Categories
//!
//! - **Configuration Errors**: Invalid values or unreadable config files
//! - **Transport Errors**: Failures reported by a chunk provider
//! - **Session Errors**: Operations on a session that already ended
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use bytescope::ScopeError;
//!
//! let error = ScopeError::transport_failed("serial port went away");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T, E = ScopeError> = std::result::Result<T, E>;

/// Main error type for engine operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScopeError {
    #[error("Invalid configuration for '{field}': {reason}")]
    Config { field: String, reason: String },

    #[error("Config file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error: {details}")]
    ConfigParse {
        details: String,
        #[source]
        source: Option<serde_yaml_ng::Error>,
    },

    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Frame encoding failed: {details}")]
    Encode { details: String },

    #[error("Session has already ended")]
    SessionClosed,
}

impl ScopeError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScopeError::Transport { .. } => true,
            ScopeError::Config { .. } => false,
            ScopeError::ConfigFile { .. } => false,
            ScopeError::ConfigParse { .. } => false,
            ScopeError::Encode { .. } => false,
            ScopeError::SessionClosed => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ScopeError::Config { .. } => vec![
                "Check the value against the documented range",
                "Remove the field to fall back to its default",
            ],
            ScopeError::ConfigFile { .. } => vec![
                "Check the file exists and is readable",
                "Check file permissions",
            ],
            ScopeError::ConfigParse { .. } => vec![
                "Check the YAML syntax",
                "Compare field names with the documented configuration",
            ],
            ScopeError::Transport { .. } => vec![
                "Check the device or peer is still reachable",
                "Reopen the port or rebind the socket",
                "Start a new session",
            ],
            ScopeError::Encode { .. } => vec![
                "Check the pixel buffer holds width * height * 2 bytes",
                "Keep width and height within the profile's limits",
            ],
            ScopeError::SessionClosed => {
                vec!["Start a new session before delivering more data"]
            }
        }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ScopeError::Config { field: field.into(), reason: reason.into() }
    }

    /// Helper constructor for config file errors with path context.
    pub fn config_file_error(path: PathBuf, source: std::io::Error) -> Self {
        ScopeError::ConfigFile { path, source }
    }

    /// Helper constructor for transport errors.
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        ScopeError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        ScopeError::Transport { reason: reason.into(), source: Some(source) }
    }
}

impl From<std::io::Error> for ScopeError {
    fn from(err: std::io::Error) -> Self {
        ScopeError::Transport { reason: err.to_string(), source: Some(Box::new(err)) }
    }
}

impl From<serde_yaml_ng::Error> for ScopeError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        ScopeError::ConfigParse { details: err.to_string(), source: Some(err) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_contain_their_context(
                field in "\\w+",
                reason in ".*"
            ) {
                let config = ScopeError::invalid_config(field.clone(), reason.clone());
                let transport = ScopeError::transport_failed(reason.clone());

                let config_msg = config.to_string();
                prop_assert!(config_msg.contains(&field));
                prop_assert!(config_msg.contains(&reason));
                prop_assert!(transport.to_string().contains(&reason));
            }

            #[test]
            fn io_errors_keep_their_source(message in ".+") {
                let io_err = std::io::Error::other(message.clone());
                let converted: ScopeError = io_err.into();

                prop_assert!(converted.is_retryable());
                let source = std::error::Error::source(&converted);
                prop_assert!(source.is_some());
                prop_assert!(source.map(|s| s.to_string()).unwrap_or_default().contains(&message));
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<ScopeError>();

        let error = ScopeError::SessionClosed;
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retry_classification() {
        assert!(ScopeError::transport_failed("gone").is_retryable());
        assert!(!ScopeError::invalid_config("idle_period_ms", "must be positive").is_retryable());
        assert!(!ScopeError::SessionClosed.is_retryable());
    }

    #[test]
    fn every_variant_offers_suggestions() {
        let errors = [
            ScopeError::invalid_config("max_dimension", "zero"),
            ScopeError::config_file_error(
                PathBuf::from("/missing.yaml"),
                std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            ),
            ScopeError::ConfigParse { details: "bad".to_string(), source: None },
            ScopeError::transport_failed("gone"),
            ScopeError::Encode { details: "short pixel buffer".to_string() },
            ScopeError::SessionClosed,
        ];

        for error in &errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty(), "no suggestions for {error}");
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn yaml_errors_convert_to_parse_errors() {
        let yaml_err = serde_yaml_ng::from_str::<u32>("[not, a, number]").unwrap_err();
        let converted: ScopeError = yaml_err.into();
        assert!(matches!(converted, ScopeError::ConfigParse { source: Some(_), .. }));
    }
}
