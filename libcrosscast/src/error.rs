//! Error types for Crosscast

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrosscastError>;

#[derive(Error, Debug)]
pub enum CrosscastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CrosscastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CrosscastError::InvalidInput(_) => 3,
            CrosscastError::Connection(ConnectionError::Capability(_)) => 2,
            CrosscastError::Connection(_) => 1,
            CrosscastError::Config(_) => 1,
        }
    }

    /// Whether this is a capability error, i.e. a direction was requested
    /// from a connector that does not implement it. These indicate wiring
    /// mistakes and are never recovered from.
    pub fn is_capability(&self) -> bool {
        matches!(
            self,
            CrosscastError::Connection(ConnectionError::Capability(_))
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("At least one connection is required")]
    NoConnections,

    #[error("Duplicate connection name: {0}")]
    DuplicateConnection(String),

    #[error("Poll interval must be at least one second (got {0:?})")]
    PollIntervalTooShort(Duration),

    #[error("Per-cycle rate limit must be at least 1")]
    RateLimitTooLow,
}

#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    #[error("Connection setup failed: {0}")]
    Setup(String),

    #[error("Capability not implemented: {0}")]
    Capability(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Publish failed: {0}")]
    Publish(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = CrosscastError::InvalidInput("empty body".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_capability_error() {
        let error =
            CrosscastError::Connection(ConnectionError::Capability("fetch".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_connection_errors() {
        for connection_error in [
            ConnectionError::Setup("no modes".to_string()),
            ConnectionError::Fetch("timeout".to_string()),
            ConnectionError::Publish("rejected".to_string()),
        ] {
            let error = CrosscastError::Connection(connection_error);
            assert_eq!(error.exit_code(), 1);
        }
    }

    #[test]
    fn test_exit_code_config_error() {
        let error = CrosscastError::Config(ConfigError::NoConnections);
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_is_capability() {
        let capability =
            CrosscastError::Connection(ConnectionError::Capability("publish".to_string()));
        let fetch = CrosscastError::Connection(ConnectionError::Fetch("down".to_string()));

        assert!(capability.is_capability());
        assert!(!fetch.is_capability());
        assert!(!CrosscastError::Config(ConfigError::NoConnections).is_capability());
    }

    #[test]
    fn test_error_message_formatting() {
        let error = CrosscastError::Connection(ConnectionError::Fetch(
            "connection refused".to_string(),
        ));
        assert_eq!(
            format!("{}", error),
            "Connection error: Fetch failed: connection refused"
        );

        let error = CrosscastError::Config(ConfigError::DuplicateConnection(
            "fedi".to_string(),
        ));
        assert_eq!(
            format!("{}", error),
            "Configuration error: Duplicate connection name: fedi"
        );
    }

    #[test]
    fn test_error_conversion_from_connection_error() {
        let error: CrosscastError = ConnectionError::Publish("boom".to_string()).into();
        assert!(matches!(error, CrosscastError::Connection(_)));
    }

    #[test]
    fn test_error_conversion_from_config_error() {
        let error: CrosscastError = ConfigError::RateLimitTooLow.into();
        assert!(matches!(error, CrosscastError::Config(_)));
    }

    #[test]
    fn test_connection_error_clone() {
        let original = ConnectionError::Fetch("transient".to_string());
        let cloned = original.clone();
        assert_eq!(format!("{}", original), format!("{}", cloned));
    }
}
