//! Error types for the tabula store.
//!
//! Only structural misuse and interchange failures are errors. Writes that a
//! schema rejects are recorded in the transaction log instead, and reads of
//! missing ids simply yield `None` or empty collections.

use alloc::string::String;

/// Result type alias for tabula operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for tabula store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A transaction was started while another one is still open, or while
    /// listeners are being dispatched.
    #[error("A transaction is already in progress")]
    TransactionInProgress,
    /// A transaction was finished without having been started.
    #[error("No transaction in progress")]
    NoTransaction,
    /// Interchange input could not be parsed.
    #[error("Malformed JSON: {message}")]
    MalformedJson { message: String },
    /// Interchange input parsed but does not have the expected shape.
    #[error("Invalid content: {message}")]
    InvalidContent { message: String },
    /// A schema definition could not be used.
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },
}

impl Error {
    /// Creates a malformed JSON error.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Error::MalformedJson {
            message: message.into(),
        }
    }

    /// Creates an invalid content error.
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Error::InvalidContent {
            message: message.into(),
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by calling the transaction API out of order.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Error::TransactionInProgress | Error::NoTransaction)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        use alloc::string::ToString;
        if err.is_data() {
            Error::invalid_content(err.to_string())
        } else {
            Error::malformed_json(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::TransactionInProgress;
        assert!(err.to_string().contains("already in progress"));

        let err = Error::malformed_json("EOF while parsing");
        assert!(err.to_string().contains("EOF while parsing"));

        let err = Error::invalid_schema("pets");
        assert!(err.to_string().contains("pets"));
    }

    #[test]
    fn test_error_is_misuse() {
        assert!(Error::NoTransaction.is_misuse());
        assert!(Error::TransactionInProgress.is_misuse());
        assert!(!Error::malformed_json("x").is_misuse());
    }

    #[test]
    fn test_error_from_serde_json() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(Error::from(err), Error::MalformedJson { .. }));

        let err = serde_json::from_str::<alloc::vec::Vec<u8>>("{}").unwrap_err();
        assert!(matches!(Error::from(err), Error::InvalidContent { .. }));
    }
}
