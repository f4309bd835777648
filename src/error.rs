//! Structured error types for configuration loading.

use thiserror::Error;

/// Errors surfaced by the configuration subsystem.
///
/// Every message is self-contained: it names the offending location or keys
/// and what the operator should change, so a failed startup never prints a
/// bare "invalid configuration".
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The logical configuration name could not be resolved to any openable
    /// location. Recoverable in exactly one case: the default overlay.
    #[error(
        "cannot locate {name}; if this is a local file, confirm you have provided \
         the {prefix} prefix as part of the URI"
    )]
    ResourceNotFound {
        /// The unresolved logical name or location string.
        name: String,
        /// Required prefix hint for the operator.
        prefix: &'static str,
    },

    /// The resource was found but its contents are not well-formed YAML.
    /// Always fatal, never recovered.
    #[error("invalid yaml in {location}: {message}")]
    Syntax { location: String, message: String },

    /// Invalid environment overrides, unresolvable locations that do not fit
    /// the not-found case, post-decode validation findings, and I/O or
    /// transport failures after the resolution probe succeeded.
    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn not_found(name: impl Into<String>, prefix: &'static str) -> Self {
        Self::ResourceNotFound {
            name: name.into(),
            prefix,
        }
    }

    pub(crate) fn syntax(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Syntax {
            location: location.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid(format!(
            "failed to read {}: {}",
            location.into(),
            message.into()
        ))
    }

    /// Whether this is the recoverable not-found case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
