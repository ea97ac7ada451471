//! Unified error system for Moltmob
//!
//! A single error enum covers the whole orchestrator. Variants map the
//! operational taxonomy directly: transient failures are retried on the next
//! tick, protocol failures skip one message, invariant violations freeze the
//! pod, and payment failures hold the pod out of the completed state until an
//! operator reconciles.

use serde::{Deserialize, Serialize};

/// Unified error type for all Moltmob operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum MobError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Description of the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Description of what was not found
        message: String,
    },

    /// Cryptographic operation failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Description of the cryptographic failure
        message: String,
    },

    /// A message on the public feed could not be handled
    ///
    /// Covers malformed envelope tokens and authentication failures. The
    /// offending message is logged and skipped; the tick continues.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol failure
        message: String,
    },

    /// Transient external failure, retried on the next tick
    #[error("Transient error: {message}")]
    Transient {
        /// Description of the transient failure
        message: String,
    },

    /// A domain invariant was violated
    ///
    /// Fatal to the pod's tick: the pod is frozen pending operator
    /// inspection and no further automatic transitions run.
    #[error("Invariant violation: {message}")]
    Invariant {
        /// Description of the violated invariant
        message: String,
    },

    /// Terminal payment failure after retries were exhausted
    #[error("Payment failure: {message}")]
    Payment {
        /// Description of the payment failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure
        message: String,
    },

    /// Storage operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl MobError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a transient error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    /// Create a payment failure error
    pub fn payment(message: impl Into<String>) -> Self {
        Self::Payment {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the failure should be retried on the next tick
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Whether the failure only affects a single feed message
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. } | Self::Crypto { .. })
    }

    /// Whether the failure must freeze the pod
    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::Invariant { .. })
    }
}

/// Result alias used throughout Moltmob
pub type Result<T> = std::result::Result<T, MobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_classification() {
        assert!(MobError::transient("backend timeout").is_transient());
        assert!(MobError::protocol("bad token").is_protocol());
        assert!(MobError::crypto("auth failure").is_protocol());
        assert!(MobError::invariant("backward transition").is_invariant());
        assert!(!MobError::invalid("nope").is_transient());
    }

    #[test]
    fn display_includes_message() {
        let err = MobError::payment("retries exhausted for tx-1");
        assert_eq!(err.to_string(), "Payment failure: retries exhausted for tx-1");
    }
}
