//! # Error Types
//!
//! Custom error types for WiFi Scope using `thiserror`.
//!
//! Nothing in this taxonomy is fatal to the process: every variant maps to a
//! degraded-but-running state (sampling blocked, synthetic fallback, skipped
//! persistence write).

use thiserror::Error;

/// Main error type for WiFi Scope
#[derive(Debug, Error)]
pub enum WifiScopeError {
    /// Offline, or connected through a network type the WiFi-only contract
    /// disallows. Blocks sampling and is surfaced as a persistent
    /// notification until a later check observes a WiFi link.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// The platform exposes no network telemetry descriptor and no synthetic
    /// sampler is configured.
    #[error("network telemetry unavailable: {0}")]
    TelemetryUnavailable(String),

    /// A screen-to-world strategy could not produce a position.
    ///
    /// Unreachable for the built-in raycast + fixed-depth chain (the
    /// fixed-depth fallback always succeeds), but modeled so future
    /// projector strategies can fail explicitly.
    #[error("projection failure: {0}")]
    Projection(String),

    /// Backend store/fetch error. Logged and surfaced as a transient
    /// notification; never blocks in-memory sampling or marker creation.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration values that parsed but fail validation
    #[error("invalid configuration: {0}")]
    ConfigValidation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for WiFi Scope
pub type Result<T> = std::result::Result<T, WifiScopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_detail() {
        let err = WifiScopeError::Connectivity("device is offline".to_string());
        assert!(err.to_string().contains("device is offline"));

        let err = WifiScopeError::Persistence("insert rejected".to_string());
        assert!(err.to_string().contains("insert rejected"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: WifiScopeError = io.into();
        assert!(matches!(err, WifiScopeError::Io(_)));
    }
}
