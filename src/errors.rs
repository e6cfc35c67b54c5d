//! Error types for the Oscar's Grind tracker
//!
//! Session failures are typed and user-facing; configuration and storage
//! failures are wrapped by the root [`GrindError`].

use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Failures reported by session operations.
///
/// Every variant leaves the session untouched: operations either apply fully
/// or return one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Non-numeric, non-finite or non-positive input, or an unknown result
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Operation needs an active session and none exists
    #[error("No active session found. Please set up a new session.")]
    NoActiveSession,

    /// Bet amount is not a whole number of base units
    #[error("Bet must be a multiple of base bet ({base_bet:.2}).")]
    NonMultipleBet { bet: Decimal, base_bet: Decimal },

    /// Bet amount is larger than the current bankroll
    #[error("Bet amount {bet:.2} cannot exceed current bankroll ({bankroll:.2}).")]
    InsufficientBankroll { bet: Decimal, bankroll: Decimal },
}

impl SessionError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SessionError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code used by the API layer
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidInput { .. } => "INVALID_INPUT",
            SessionError::NoActiveSession => "NO_ACTIVE_SESSION",
            SessionError::NonMultipleBet { .. } => "NON_MULTIPLE_BET",
            SessionError::InsufficientBankroll { .. } => "INSUFFICIENT_BANKROLL",
        }
    }
}

/// Configuration and validation errors
#[derive(Debug)]
pub enum ConfigurationError {
    ValidationFailed(String),
    MissingRequired(String),
    InvalidValue { field: String, value: String, reason: String },
    LoadFailed(String),
    SaveFailed(String),
}

/// Session store errors
#[derive(Debug)]
pub enum StorageError {
    WriteFailed(String),
}

/// Root error type for everything outside the pure session core
#[derive(Debug)]
pub enum GrindError {
    Session(SessionError),
    Configuration(ConfigurationError),
    Storage(StorageError),
}

impl fmt::Display for GrindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrindError::Session(e) => write!(f, "Session error: {}", e),
            GrindError::Configuration(e) => write!(f, "Configuration error: {}", e),
            GrindError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            ConfigurationError::MissingRequired(field) => write!(f, "Missing required field: {}", field),
            ConfigurationError::InvalidValue { field, value, reason } => {
                write!(f, "Invalid value for {}: '{}' ({})", field, value, reason)
            }
            ConfigurationError::LoadFailed(msg) => write!(f, "Failed to load configuration: {}", msg),
            ConfigurationError::SaveFailed(msg) => write!(f, "Failed to save configuration: {}", msg),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
        }
    }
}

impl std::error::Error for GrindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GrindError::Session(e) => Some(e),
            GrindError::Configuration(e) => Some(e),
            GrindError::Storage(e) => Some(e),
        }
    }
}

impl std::error::Error for ConfigurationError {}
impl std::error::Error for StorageError {}

impl From<SessionError> for GrindError {
    fn from(e: SessionError) -> Self {
        GrindError::Session(e)
    }
}

impl From<ConfigurationError> for GrindError {
    fn from(e: ConfigurationError) -> Self {
        GrindError::Configuration(e)
    }
}

impl From<StorageError> for GrindError {
    fn from(e: StorageError) -> Self {
        GrindError::Storage(e)
    }
}

impl From<std::io::Error> for GrindError {
    fn from(e: std::io::Error) -> Self {
        GrindError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

impl From<toml::de::Error> for GrindError {
    fn from(e: toml::de::Error) -> Self {
        GrindError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

pub type GrindResult<T> = Result<T, GrindError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::error::Error as _;

    #[test]
    fn test_non_multiple_message_carries_base_unit() {
        let err = SessionError::NonMultipleBet {
            bet: dec!(15),
            base_bet: dec!(10),
        };
        assert_eq!(err.to_string(), "Bet must be a multiple of base bet (10.00).");
        assert_eq!(err.code(), "NON_MULTIPLE_BET");
    }

    #[test]
    fn test_insufficient_bankroll_message() {
        let err = SessionError::InsufficientBankroll {
            bet: dec!(50),
            bankroll: dec!(20.5),
        };
        assert!(err.to_string().contains("50.00"));
        assert!(err.to_string().contains("20.50"));
    }

    #[test]
    fn test_error_conversion_and_source() {
        let err: GrindError = SessionError::NoActiveSession.into();
        assert!(matches!(err, GrindError::Session(SessionError::NoActiveSession)));
        assert!(err.to_string().starts_with("Session error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigurationError::InvalidValue {
            field: "server.port".to_string(),
            value: "0".to_string(),
            reason: "Port cannot be zero".to_string(),
        };
        assert!(err.to_string().contains("server.port"));
        assert!(err.to_string().contains("'0'"));
    }
}
